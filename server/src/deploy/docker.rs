//! Docker engine commands and the Dockerfile strategy

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::deploy::cmd::{CommandRunner, CommandSpec};
use crate::deploy::deployer::{DeployOutcome, DeployStrategy, DeployTarget, StrategyError};
use crate::errors::AppError;
use crate::models::project::DeployType;

/// Image tag used for an application slug
pub fn image_tag(name: &str) -> String {
    format!("xistra/{}:latest", name)
}

/// Container name used for an application slug
pub fn container_name(name: &str) -> String {
    format!("xistra-{}", name)
}

/// Thin wrapper over the `docker` CLI
pub struct DockerEngine {
    runner: Arc<dyn CommandRunner>,
    platform: String,
    public_host: String,
}

impl DockerEngine {
    pub fn new(runner: Arc<dyn CommandRunner>, platform: &str, public_host: &str) -> Self {
        Self {
            runner,
            platform: platform.to_string(),
            public_host: public_host.to_string(),
        }
    }

    pub fn public_host(&self) -> &str {
        &self.public_host
    }

    async fn exec(&self, spec: CommandSpec) -> Result<String, AppError> {
        let output = self.runner.run(&spec).await?.check(&spec)?;
        Ok(output.stdout)
    }

    /// `docker buildx build` with BuildKit, loading the result into the local engine
    pub async fn build(&self, context: &Path, dockerfile: &Path, tag: &str) -> Result<(), AppError> {
        info!("Building image {} ({})", tag, self.platform);
        self.exec(
            CommandSpec::new("docker")
                .args(["buildx", "build", "--platform", self.platform.as_str(), "--load", "-t", tag, "-f"])
                .arg(dockerfile.to_string_lossy().into_owned())
                .arg(context.to_string_lossy().into_owned())
                .current_dir(context),
        )
        .await?;
        Ok(())
    }

    /// Replace any container called `name` with a fresh one from `image`; returns the id
    pub async fn run(
        &self,
        image: &str,
        name: &str,
        container_port: Option<u16>,
        env: &[(String, String)],
    ) -> Result<String, AppError> {
        // A previous deploy of the same app owns the name.
        let _ = self
            .runner
            .run(&CommandSpec::new("docker").args(["rm", "-f", name]))
            .await;

        let mut spec = CommandSpec::new("docker").args([
            "run",
            "-d",
            "--name",
            name,
            "--restart",
            "unless-stopped",
        ]);
        if let Some(port) = container_port {
            spec = spec.args(["-p".to_string(), port.to_string()]);
        }
        for (key, value) in env {
            spec = spec.args(["-e".to_string(), format!("{}={}", key, value)]);
        }
        let stdout = self.exec(spec.arg(image)).await?;

        let id = stdout
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .last()
            .ok_or_else(|| AppError::CommandError("docker run printed no container id".into()))?;
        debug!("Started container {} ({})", name, id);
        Ok(id.to_string())
    }

    /// Public URL of `container_port` as published by docker, if any
    pub async fn published_url(&self, container: &str, container_port: u16) -> Option<String> {
        let stdout = self
            .exec(CommandSpec::new("docker").args(["port", container, container_port.to_string().as_str()]))
            .await
            .ok()?;
        let host_port = parse_host_port(&stdout)?;
        Some(format!("http://{}:{}", self.public_host, host_port))
    }

    pub async fn stop_container(&self, container: &str) -> Result<(), AppError> {
        self.exec(CommandSpec::new("docker").args(["stop", container]))
            .await?;
        Ok(())
    }

    pub async fn remove_container(&self, container: &str) -> Result<(), AppError> {
        self.exec(CommandSpec::new("docker").args(["rm", "-f", container]))
            .await?;
        Ok(())
    }

    /// Stop and remove a compose project by name; works without the compose file
    pub async fn compose_down(&self, project: &str) -> Result<(), AppError> {
        self.exec(CommandSpec::new("docker").args(["compose", "-p", project, "down"]))
            .await?;
        Ok(())
    }

    /// Snapshot a container's filesystem into `image`
    pub async fn commit_container(&self, container: &str, image: &str) -> Result<(), AppError> {
        self.exec(CommandSpec::new("docker").args(["commit", container, image]))
            .await?;
        Ok(())
    }

    /// Build `dockerfile`, run it as the target's container and resolve its URL
    pub async fn ship(
        &self,
        method: DeployType,
        repo_dir: &Path,
        dockerfile: &Path,
        target: &DeployTarget,
        container_port: Option<u16>,
    ) -> Result<DeployOutcome, StrategyError> {
        let tag = image_tag(&target.name);
        let name = container_name(&target.name);

        self.build(repo_dir, dockerfile, &tag).await?;

        let container_id = self
            .run(&tag, &name, container_port, &target.env)
            .await
            .map_err(|e| StrategyError::from(e).with_container(&name))?;

        let url = match container_port {
            Some(port) => self.published_url(&container_id, port).await,
            None => None,
        };

        Ok(DeployOutcome {
            container_id: Some(container_id),
            image: Some(tag),
            url,
            ..DeployOutcome::new(method)
        })
    }
}

/// First host port in `docker port` output (`0.0.0.0:49153`, `[::]:49153`)
fn parse_host_port(stdout: &str) -> Option<u16> {
    stdout
        .lines()
        .filter_map(|line| line.trim().rsplit_once(':'))
        .find_map(|(_, port)| port.parse().ok())
}

const DOCKERFILES: &[&str] = &["Dockerfile", "dockerfile"];

/// Dockerfile at the root of the checkout
pub fn find_dockerfile(repo_dir: &Path) -> Option<PathBuf> {
    DOCKERFILES
        .iter()
        .map(|name| repo_dir.join(name))
        .find(|path| path.is_file())
}

/// First port named by an `EXPOSE` instruction
pub fn exposed_port(dockerfile: &str) -> Option<u16> {
    dockerfile.lines().find_map(|line| {
        let line = line.trim();
        let (instruction, rest) = line.split_once(char::is_whitespace)?;
        if !instruction.eq_ignore_ascii_case("EXPOSE") {
            return None;
        }
        let first = rest.split_whitespace().next()?;
        first.split('/').next()?.parse().ok()
    })
}

/// Builds the repository's own Dockerfile
pub struct DockerfileStrategy {
    engine: Arc<DockerEngine>,
}

impl DockerfileStrategy {
    pub fn new(engine: Arc<DockerEngine>) -> Self {
        Self { engine }
    }
}

#[async_trait]
impl DeployStrategy for DockerfileStrategy {
    fn method(&self) -> DeployType {
        DeployType::Dockerfile
    }

    fn applies(&self, repo_dir: &Path) -> bool {
        find_dockerfile(repo_dir).is_some()
    }

    async fn deploy(
        &self,
        repo_dir: &Path,
        target: &DeployTarget,
    ) -> Result<DeployOutcome, StrategyError> {
        let dockerfile = find_dockerfile(repo_dir)
            .ok_or_else(|| StrategyError::new("No Dockerfile found"))?;
        let contents = tokio::fs::read_to_string(&dockerfile)
            .await
            .map_err(|e| StrategyError::new(format!("Unable to read Dockerfile: {}", e)))?;

        self.engine
            .ship(
                DeployType::Dockerfile,
                repo_dir,
                &dockerfile,
                target,
                exposed_port(&contents),
            )
            .await
    }
}
