//! Projects, their deployments and environment variables

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use openapi_server::models::{CreateProjectRequest, UpsertEnvVarRequest};
use tracing::info;
use uuid::Uuid;

use crate::app::state::AppState;
use crate::errors::{conflict_on_unique, AppError};
use crate::deploy::service::DUPLICATE_PROJECT;
use crate::models::deployment::Deployment;
use crate::models::env_var::EnvironmentVariable;
use crate::models::project::{CreateProject, Project};
use crate::server::handlers::{created, load_project, ok, ApiResult, Created, Deleted};
use crate::validation;

pub async fn list_handler(State(state): State<Arc<AppState>>) -> ApiResult<Vec<Project>> {
    Ok(ok(Project::find_all(&state.db.pool).await?))
}

pub async fn create_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateProjectRequest>, JsonRejection>,
) -> Created<Project> {
    let Json(req) = payload?;
    let data = CreateProject {
        name: validation::project_name(&req.name)?,
        repository_url: req
            .repository_url
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .map(validation::repository_url)
            .transpose()?,
        branch: req.branch,
        framework: req.framework,
    };

    let project = Project::create(&state.db.pool, &data)
        .await
        .map_err(|e| conflict_on_unique(e, DUPLICATE_PROJECT))?;
    info!("Created project {}", project.name);
    Ok(created(project))
}

pub async fn get_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Project> {
    Ok(ok(load_project(&state.db.pool, id).await?))
}

pub async fn delete_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Deleted> {
    let project = load_project(&state.db.pool, id).await?;
    state.deploys.delete(&project).await?;
    info!("Deleted project {}", project.name);
    Ok(ok(Deleted { id }))
}

pub async fn stop_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Project> {
    let project = load_project(&state.db.pool, id).await?;
    Ok(ok(state.deploys.stop(&project).await?))
}

pub async fn deployments_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Vec<Deployment>> {
    load_project(&state.db.pool, id).await?;
    Ok(ok(Deployment::find_by_project_id(&state.db.pool, id).await?))
}

pub async fn list_env_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Vec<EnvironmentVariable>> {
    load_project(&state.db.pool, id).await?;
    let vars = EnvironmentVariable::find_by_project_id(&state.db.pool, id).await?;
    Ok(ok(vars.into_iter().map(EnvironmentVariable::redacted).collect()))
}

pub async fn upsert_env_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    payload: Result<Json<UpsertEnvVarRequest>, JsonRejection>,
) -> ApiResult<EnvironmentVariable> {
    let Json(req) = payload?;
    let key = validation::env_key(&req.key)?;
    load_project(&state.db.pool, id).await?;

    let var = EnvironmentVariable::upsert(
        &state.db.pool,
        id,
        &key,
        &req.value,
        req.is_secret.unwrap_or(false),
    )
    .await?;
    Ok(ok(var.redacted()))
}

pub async fn delete_env_handler(
    State(state): State<Arc<AppState>>,
    Path((id, key)): Path<(Uuid, String)>,
) -> ApiResult<Deleted> {
    if EnvironmentVariable::delete(&state.db.pool, id, &key).await? == 0 {
        return Err(AppError::NotFound(format!("Environment variable {} not found", key)));
    }
    Ok(ok(Deleted { id }))
}
