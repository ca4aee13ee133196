//! Docker Compose strategy

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde_yaml::Value;
use tracing::{debug, info};

use crate::deploy::cmd::{CommandRunner, CommandSpec};
use crate::deploy::deployer::{DeployOutcome, DeployStrategy, DeployTarget, StrategyError};
use crate::models::project::DeployType;

/// Compose file names, in lookup order
pub const COMPOSE_FILES: &[&str] = &[
    "docker-compose.yml",
    "docker-compose.yaml",
    "compose.yml",
    "compose.yaml",
];

/// Compose file at the root of the checkout
pub fn find_compose_file(repo_dir: &Path) -> Option<PathBuf> {
    COMPOSE_FILES
        .iter()
        .map(|name| repo_dir.join(name))
        .find(|path| path.is_file())
}

/// Host port published by the first service that publishes one
pub fn first_published_port(compose: &str) -> Option<u16> {
    let doc: Value = serde_yaml::from_str(compose).ok()?;
    let services = doc.get("services")?.as_mapping()?;

    services
        .values()
        .filter_map(|service| service.get("ports")?.as_sequence())
        .flatten()
        .find_map(published_port)
}

fn published_port(entry: &Value) -> Option<u16> {
    match entry {
        // "8080:80", "127.0.0.1:8080:80", "8080:80/tcp". A bare "80" publishes nothing fixed.
        Value::String(s) => {
            let mapping = s.split('/').next()?;
            let parts: Vec<&str> = mapping.split(':').collect();
            if parts.len() < 2 {
                return None;
            }
            parts[parts.len() - 2].parse().ok()
        }
        Value::Mapping(_) => match entry.get("published")? {
            Value::Number(n) => n.as_u64().and_then(|p| u16::try_from(p).ok()),
            Value::String(s) => s.parse().ok(),
            _ => None,
        },
        _ => None,
    }
}

/// Runs `docker-compose up`, falling back to the `docker compose` plugin
pub struct ComposeStrategy {
    runner: Arc<dyn CommandRunner>,
    public_host: String,
}

impl ComposeStrategy {
    pub fn new(runner: Arc<dyn CommandRunner>, public_host: &str) -> Self {
        Self {
            runner,
            public_host: public_host.to_string(),
        }
    }

    fn up_command(program: &str, prefix: &[&str], file: &str, project: &str) -> CommandSpec {
        CommandSpec::new(program)
            .args(prefix.iter().copied())
            .args(["-f", file, "-p", project, "up", "-d", "--build"])
    }
}

#[async_trait]
impl DeployStrategy for ComposeStrategy {
    fn method(&self) -> DeployType {
        DeployType::DockerCompose
    }

    fn applies(&self, repo_dir: &Path) -> bool {
        find_compose_file(repo_dir).is_some()
    }

    async fn deploy(
        &self,
        repo_dir: &Path,
        target: &DeployTarget,
    ) -> Result<DeployOutcome, StrategyError> {
        let path = find_compose_file(repo_dir)
            .ok_or_else(|| StrategyError::new("No compose file found"))?;
        let file = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        info!("Deploying {} with compose file {}", target.name, file);

        let legacy = Self::up_command("docker-compose", &[], &file, &target.name)
            .current_dir(repo_dir)
            .envs(&target.env);
        let first = self.runner.run(&legacy).await.and_then(|o| o.check(&legacy));

        if let Err(legacy_err) = first {
            debug!("docker-compose failed, trying 'docker compose': {}", legacy_err);
            let plugin = Self::up_command("docker", &["compose"], &file, &target.name)
                .current_dir(repo_dir)
                .envs(&target.env);
            self.runner
                .run(&plugin)
                .await
                .and_then(|o| o.check(&plugin))
                .map_err(|e| {
                    StrategyError::new(format!("{}; {}", legacy_err, e))
                })?;
        }

        let url = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => first_published_port(&contents)
                .map(|port| format!("http://{}:{}", self.public_host, port)),
            Err(_) => None,
        };

        Ok(DeployOutcome {
            compose_path: Some(file),
            url,
            ..DeployOutcome::new(DeployType::DockerCompose)
        })
    }
}
