//! Application state management

use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;

use crate::app::options::{AuthOptions, DeployOptions};
use crate::authn::Authenticator;
use crate::db::Db;
use crate::deploy::cmd::{CommandRunner, ProcessRunner};
use crate::deploy::deployer::UniversalDeployer;
use crate::deploy::docker::DockerEngine;
use crate::deploy::git::RepositoryFetcher;
use crate::deploy::service::DeployService;
use crate::errors::AppError;
use crate::models::team::TeamMember;
use crate::verify::{DnsVerifier, DomainVerifier};

/// State shared across handlers
pub struct AppState {
    pub db: Db,
    pub deploys: DeployService,
    pub verifier: Arc<dyn DomainVerifier>,
    pub auth: Authenticator,
    pub backup_dir: PathBuf,
}

impl AppState {
    /// Wire up the production runner and verifier
    pub async fn init(
        db: Db,
        deploy: &DeployOptions,
        auth: AuthOptions,
        backup_dir: PathBuf,
    ) -> Result<Self, AppError> {
        info!("Initializing application state...");

        let runner: Arc<dyn CommandRunner> = Arc::new(ProcessRunner::new(
            deploy.command_timeout,
            deploy.docker_host.clone(),
        ));
        let verifier: Arc<dyn DomainVerifier> = Arc::new(DnsVerifier::default());

        Self::build(db, runner, verifier, deploy, auth, backup_dir).await
    }

    pub async fn build(
        db: Db,
        runner: Arc<dyn CommandRunner>,
        verifier: Arc<dyn DomainVerifier>,
        deploy: &DeployOptions,
        auth: AuthOptions,
        backup_dir: PathBuf,
    ) -> Result<Self, AppError> {
        let engine = Arc::new(DockerEngine::new(
            runner.clone(),
            &deploy.build_platform,
            &deploy.public_host,
        ));
        let deployer = UniversalDeployer::new(engine, runner.clone());
        let deploys = DeployService::new(
            db.pool.clone(),
            RepositoryFetcher::new(runner),
            deployer,
            deploy.work_dir.clone(),
        );

        let auth = Authenticator::new(auth);
        TeamMember::ensure_owner(&db.pool, auth.admin_email()).await?;

        Ok(Self {
            db,
            deploys,
            verifier,
            auth,
            backup_dir,
        })
    }

    pub async fn shutdown(&self) {
        info!("Closing database...");
        self.db.close().await;
    }
}
