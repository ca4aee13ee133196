//! Template catalogue and one-shot deploys

use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    Json,
};
use openapi_server::models::{AppTemplate, DeployRequest, TemplateQuery};

use crate::app::state::AppState;
use crate::deploy::service::DeployReport;
use crate::models::project::{Project, ProjectStatus};
use crate::models::template;
use crate::server::handlers::{created, ok, ApiResult, Created};
use crate::validation;

pub async fn templates_handler(
    query: Result<Query<TemplateQuery>, QueryRejection>,
) -> ApiResult<Vec<AppTemplate>> {
    let Query(query) = query?;
    Ok(ok(template::catalogue(query.category.as_deref())))
}

pub async fn deploy_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<DeployRequest>, JsonRejection>,
) -> Created<DeployReport> {
    let Json(req) = payload?;
    let req = DeployRequest {
        name: validation::project_name(&req.name)?,
        repository_url: validation::repository_url(&req.repository_url)?,
        branch: req.branch.filter(|b| !b.trim().is_empty()),
        framework: req.framework,
    };

    let report = state.deploys.deploy(&req).await?;
    Ok(created(report))
}

pub async fn deployed_handler(State(state): State<Arc<AppState>>) -> ApiResult<Vec<Project>> {
    let projects = Project::find_by_status(&state.db.pool, ProjectStatus::Deployed).await?;
    Ok(ok(projects))
}
