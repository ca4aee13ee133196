//! Deploy orchestration: clone, run the cascade, persist the outcome

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use serde::Serialize;
use sqlx::SqlitePool;
use tracing::{error, info, warn};

use openapi_server::models::DeployRequest;

use crate::deploy::deployer::{DeployOutcome, DeployTarget, UniversalDeployer};
use crate::deploy::docker::DockerEngine;
use crate::deploy::fsm::{ProjectEvent, ProjectFsm};
use crate::deploy::git::{CommitInfo, RepositoryFetcher};
use crate::errors::{conflict_on_unique, AppError};
use crate::models::deployment::{Deployment, DeploymentStatus, FinishDeployment};
use crate::models::env_var::EnvironmentVariable;
use crate::models::project::{CreateProject, DeployType, DeployedArtifacts, Project, ProjectStatus};
use crate::models::system_log::{CreateSystemLog, LogSeverity, SystemLog};
use crate::utils::slugify;

const LOG_SOURCE: &str = "deployer";
pub const DUPLICATE_PROJECT: &str = "A project with this name already exists";

/// Result of a successful deploy
#[derive(Debug, Clone, Serialize)]
pub struct DeployReport {
    pub project: Project,
    pub deployment: Deployment,
    pub outcome: DeployOutcome,
}

/// Names with a deploy currently running
#[derive(Debug, Default)]
struct InFlight {
    names: Mutex<HashSet<String>>,
}

impl InFlight {
    fn acquire(&self, name: &str) -> Option<InFlightGuard<'_>> {
        let mut names = self.names.lock().unwrap_or_else(|e| e.into_inner());
        names.insert(name.to_string()).then(|| InFlightGuard {
            owner: self,
            name: name.to_string(),
        })
    }
}

struct InFlightGuard<'a> {
    owner: &'a InFlight,
    name: String,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        let mut names = self.owner.names.lock().unwrap_or_else(|e| e.into_inner());
        names.remove(&self.name);
    }
}

pub struct DeployService {
    pool: SqlitePool,
    fetcher: RepositoryFetcher,
    deployer: UniversalDeployer,
    in_flight: InFlight,
    work_dir: PathBuf,
}

impl DeployService {
    pub fn new(
        pool: SqlitePool,
        fetcher: RepositoryFetcher,
        deployer: UniversalDeployer,
        work_dir: PathBuf,
    ) -> Self {
        Self {
            pool,
            fetcher,
            deployer,
            in_flight: InFlight::default(),
            work_dir,
        }
    }

    pub fn engine(&self) -> &Arc<DockerEngine> {
        self.deployer.engine()
    }

    /// Clone `req.repository_url` and deploy it under `req.name`.
    ///
    /// An existing project with the same name is redeployed.
    pub async fn deploy(&self, req: &DeployRequest) -> Result<DeployReport, AppError> {
        let slug = slugify(&req.name);
        if slug.is_empty() {
            return Err(AppError::ValidationError(
                "Application name must contain letters or digits".to_string(),
            ));
        }

        let _guard = self.in_flight.acquire(&slug).ok_or_else(|| running(&req.name))?;

        let project = self.prepare_project(req).await?;

        // Holding the guard means no deploy is running; a leftover `building` is stale.
        let mut fsm = ProjectFsm::new(match project.status {
            ProjectStatus::Building => ProjectStatus::Failed,
            status => status,
        });
        let status = fsm.process(ProjectEvent::Build)?;
        let project = Project::update_status(&self.pool, project.id, status).await?;
        let deployment = Deployment::start(&self.pool, project.id, req.branch.as_deref()).await?;

        self.log(
            CreateSystemLog::new(
                LogSeverity::Info,
                LOG_SOURCE,
                format!("Deployment of {} started", project.name),
            )
            .for_project(project.id),
        )
        .await;

        let started = Instant::now();
        let (commit, result) = self.run_cascade(&project, req).await;
        let duration_ms = started.elapsed().as_millis() as i64;
        let (commit_hash, commit_message) = match commit {
            Some(CommitInfo { hash, message }) => (Some(hash), Some(message)),
            None => (None, None),
        };

        match result {
            Ok(outcome) => {
                fsm.process(ProjectEvent::Succeeded)?;
                let artifacts = DeployedArtifacts {
                    container_id: outcome.container_id.clone(),
                    image: outcome.image.clone(),
                    compose_path: outcome.compose_path.clone(),
                    url: outcome.url.clone(),
                };
                let project =
                    Project::record_deploy(&self.pool, project.id, outcome.method, &artifacts)
                        .await?;
                let deployment = Deployment::finish(
                    &self.pool,
                    deployment.id,
                    &FinishDeployment {
                        status: DeploymentStatus::Success,
                        method: Some(outcome.method),
                        commit_hash,
                        commit_message,
                        duration_ms,
                        error: None,
                    },
                )
                .await?;

                info!("Deployed {} via {} in {}ms", project.name, outcome.method, duration_ms);
                self.log(
                    CreateSystemLog::new(
                        LogSeverity::Info,
                        LOG_SOURCE,
                        format!("Deployed {} via {}", project.name, outcome.method),
                    )
                    .for_project(project.id),
                )
                .await;

                Ok(DeployReport {
                    project,
                    deployment,
                    outcome,
                })
            }
            Err(message) => {
                let status = fsm.process(ProjectEvent::Failed(message.clone()))?;
                Project::update_status(&self.pool, project.id, status).await?;
                Deployment::finish(
                    &self.pool,
                    deployment.id,
                    &FinishDeployment {
                        status: DeploymentStatus::Failed,
                        method: None,
                        commit_hash,
                        commit_message,
                        duration_ms,
                        error: Some(message.clone()),
                    },
                )
                .await?;

                error!("Deployment of {} failed: {}", project.name, message);
                self.log(
                    CreateSystemLog::new(
                        LogSeverity::Error,
                        LOG_SOURCE,
                        format!("Deployment of {} failed: {}", project.name, message),
                    )
                    .for_project(project.id),
                )
                .await;

                Err(AppError::DeployError(message))
            }
        }
    }

    /// Stop a deployed project's container or compose stack
    pub async fn stop(&self, project: &Project) -> Result<Project, AppError> {
        let mut fsm = ProjectFsm::new(project.status);
        let status = fsm.process(ProjectEvent::Stop)?;

        let engine = self.engine();
        match (project.deploy_type, &project.container_id) {
            (Some(DeployType::DockerCompose), _) => {
                engine.compose_down(&project.slug).await?
            }
            (_, Some(container)) => engine.stop_container(container).await?,
            (_, None) => warn!("Project {} has no container to stop", project.name),
        }

        let project = Project::update_status(&self.pool, project.id, status).await?;
        self.log(
            CreateSystemLog::new(
                LogSeverity::Info,
                LOG_SOURCE,
                format!("Stopped {}", project.name),
            )
            .for_project(project.id),
        )
        .await;
        Ok(project)
    }

    /// Tear down and delete a project. Refused while one of its deploys is running.
    pub async fn delete(&self, project: &Project) -> Result<(), AppError> {
        let _guard = self
            .in_flight
            .acquire(&project.slug)
            .ok_or_else(|| running(&project.name))?;

        self.teardown(project).await;
        if Project::delete(&self.pool, project.id).await? == 0 {
            return Err(AppError::NotFound("Project not found".to_string()));
        }
        Ok(())
    }

    /// Remove whatever a project left running. Failures are only logged.
    async fn teardown(&self, project: &Project) {
        let engine = self.engine();
        let result = match (project.deploy_type, &project.container_id) {
            (Some(DeployType::DockerCompose), _) => {
                engine.compose_down(&project.slug).await
            }
            (_, Some(container)) => engine.remove_container(container).await,
            (_, None) => Ok(()),
        };
        if let Err(e) = result {
            warn!("Failed to tear down {}: {}", project.name, e);
        }
    }

    async fn prepare_project(&self, req: &DeployRequest) -> Result<Project, AppError> {
        let project = match Project::find_by_name(&self.pool, &req.name).await? {
            Some(project) => project,
            None => {
                Project::create(
                    &self.pool,
                    &CreateProject {
                        name: req.name.clone(),
                        repository_url: Some(req.repository_url.clone()),
                        branch: req.branch.clone(),
                        framework: req.framework.clone(),
                    },
                )
                .await
                .map_err(|e| conflict_on_unique(e, DUPLICATE_PROJECT))?
            }
        };

        Ok(Project::update_source(
            &self.pool,
            project.id,
            &req.repository_url,
            req.branch.as_deref(),
            req.framework.as_deref(),
        )
        .await?)
    }

    /// Everything between "building" and a verdict. The checkout is removed on return.
    async fn run_cascade(
        &self,
        project: &Project,
        req: &DeployRequest,
    ) -> (Option<CommitInfo>, Result<DeployOutcome, String>) {
        let workdir = match tempfile::Builder::new()
            .prefix(&format!("xistra-{}-", project.slug))
            .tempdir_in(&self.work_dir)
        {
            Ok(dir) => dir,
            Err(e) => return (None, Err(format!("Failed to create work directory: {}", e))),
        };
        let checkout = workdir.path().join("repo");

        if let Err(e) = self
            .fetcher
            .shallow_clone(&req.repository_url, req.branch.as_deref(), &checkout)
            .await
        {
            return (None, Err(detail(e)));
        }
        let commit = self.fetcher.head_commit(&checkout).await;

        let env = match EnvironmentVariable::pairs_for_project(&self.pool, project.id).await {
            Ok(env) => env,
            Err(e) => return (commit, Err(format!("Failed to load environment: {}", e))),
        };
        let target = DeployTarget::new(&project.slug).with_env(env);

        let result = self
            .deployer
            .deploy_repository(&checkout, &target)
            .await
            .map_err(|failure| failure.to_string());
        (commit, result)
    }

    async fn log(&self, entry: CreateSystemLog) {
        if let Err(e) = SystemLog::create(&self.pool, &entry).await {
            warn!("Failed to write system log: {}", e);
        }
    }
}

fn running(name: &str) -> AppError {
    AppError::Conflict(format!("A deployment of {} is already running", name))
}

/// Error text without the outer variant prefix
fn detail(err: AppError) -> String {
    match err {
        AppError::DeployError(message) => message,
        other => other.to_string(),
    }
}
