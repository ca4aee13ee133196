//! Strategy cascade: compose, then Dockerfile, then a generated Dockerfile

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{info, warn};

use crate::deploy::cmd::CommandRunner;
use crate::deploy::compose::ComposeStrategy;
use crate::deploy::docker::{DockerEngine, DockerfileStrategy};
use crate::deploy::generated::GeneratedStrategy;
use crate::models::project::DeployType;

/// What to deploy a checkout as
#[derive(Debug, Clone, Default)]
pub struct DeployTarget {
    /// Docker-safe application slug
    pub name: String,

    /// Environment handed to the container / compose project
    pub env: Vec<(String, String)>,
}

impl DeployTarget {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            env: Vec::new(),
        }
    }

    pub fn with_env(mut self, env: Vec<(String, String)>) -> Self {
        self.env = env;
        self
    }
}

/// Identifiers produced by the strategy that succeeded
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DeployOutcome {
    pub method: DeployType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compose_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Detected project kind, for generated Dockerfiles
    #[serde(skip_serializing_if = "Option::is_none")]
    pub runtime: Option<String>,
}

impl DeployOutcome {
    pub fn new(method: DeployType) -> Self {
        Self {
            method,
            container_id: None,
            image: None,
            compose_path: None,
            url: None,
            runtime: None,
        }
    }
}

/// A failed strategy, with the container it left behind (if any)
#[derive(Debug, Clone)]
pub struct StrategyError {
    pub message: String,
    pub container: Option<String>,
}

impl StrategyError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            container: None,
        }
    }

    pub fn with_container(mut self, container: &str) -> Self {
        self.container = Some(container.to_string());
        self
    }
}

impl From<crate::errors::AppError> for StrategyError {
    fn from(err: crate::errors::AppError) -> Self {
        StrategyError::new(err.to_string())
    }
}

/// One strategy that was tried and failed
#[derive(Debug, Clone, Serialize)]
pub struct StrategyAttempt {
    pub method: DeployType,
    pub error: String,
}

/// Every applicable strategy failed
#[derive(Debug, Clone, Default, Serialize)]
pub struct DeployFailure {
    pub attempts: Vec<StrategyAttempt>,
}

impl fmt::Display for DeployFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "All deployment strategies failed")?;
        for attempt in &self.attempts {
            write!(f, "; {}: {}", attempt.method, attempt.error)?;
        }
        Ok(())
    }
}

impl std::error::Error for DeployFailure {}

#[async_trait]
pub trait DeployStrategy: Send + Sync {
    fn method(&self) -> DeployType;

    /// Cheap discovery check against the checkout
    fn applies(&self, repo_dir: &Path) -> bool;

    async fn deploy(
        &self,
        repo_dir: &Path,
        target: &DeployTarget,
    ) -> Result<DeployOutcome, StrategyError>;
}

/// Tries each strategy in order and stops at the first success
pub struct UniversalDeployer {
    strategies: Vec<Arc<dyn DeployStrategy>>,
    engine: Arc<DockerEngine>,
}

impl UniversalDeployer {
    /// The standard cascade
    pub fn new(engine: Arc<DockerEngine>, runner: Arc<dyn CommandRunner>) -> Self {
        let strategies: Vec<Arc<dyn DeployStrategy>> = vec![
            Arc::new(ComposeStrategy::new(runner, engine.public_host())),
            Arc::new(DockerfileStrategy::new(engine.clone())),
            Arc::new(GeneratedStrategy::new(engine.clone())),
        ];
        Self::with_strategies(strategies, engine)
    }

    pub fn with_strategies(
        strategies: Vec<Arc<dyn DeployStrategy>>,
        engine: Arc<DockerEngine>,
    ) -> Self {
        Self { strategies, engine }
    }

    pub fn engine(&self) -> &Arc<DockerEngine> {
        &self.engine
    }

    /// Deploy the checkout at `repo_dir`
    pub async fn deploy_repository(
        &self,
        repo_dir: &Path,
        target: &DeployTarget,
    ) -> Result<DeployOutcome, DeployFailure> {
        let mut failure = DeployFailure::default();

        for strategy in &self.strategies {
            let method = strategy.method();
            if !strategy.applies(repo_dir) {
                continue;
            }

            info!("Deploying {} with strategy {}", target.name, method);
            match strategy.deploy(repo_dir, target).await {
                Ok(outcome) => {
                    info!("Deployed {} via {}", target.name, method);
                    return Ok(outcome);
                }
                Err(err) => {
                    warn!("Strategy {} failed for {}: {}", method, target.name, err.message);
                    self.cleanup(method, &err).await;
                    failure.attempts.push(StrategyAttempt {
                        method,
                        error: err.message,
                    });
                }
            }
        }

        Err(failure)
    }

    async fn cleanup(&self, method: DeployType, err: &StrategyError) {
        match (&err.container, method) {
            (Some(container), _) => {
                if let Err(e) = self.engine.remove_container(container).await {
                    warn!("Failed to remove container {}: {}", container, e);
                }
            }
            (None, DeployType::DockerCompose) => {
                warn!("Compose deployment failed; its services are left as they are");
            }
            (None, _) => {}
        }
    }
}
