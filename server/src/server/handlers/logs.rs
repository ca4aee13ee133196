use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    Json,
};
use openapi_server::models::{CreateLogRequest, LogQuery};

use crate::app::state::AppState;
use crate::errors::AppError;
use crate::models::system_log::{CreateSystemLog, LogFilter, LogSeverity, SystemLog};
use crate::server::handlers::{created, load_project, ok, ApiResult, Created};

const DEFAULT_LIMIT: i64 = 100;
const MAX_LIMIT: i64 = 1000;

fn parse_severity(level: &str) -> Result<LogSeverity, AppError> {
    level
        .parse()
        .map_err(|_| AppError::ValidationError(format!("Invalid log level: {}", level)))
}

pub async fn list_handler(
    State(state): State<Arc<AppState>>,
    query: Result<Query<LogQuery>, QueryRejection>,
) -> ApiResult<Vec<SystemLog>> {
    let Query(query) = query?;
    let filter = LogFilter {
        level: query.level.as_deref().map(parse_severity).transpose()?,
        project_id: query.project_id,
        limit: query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT),
    };
    Ok(ok(SystemLog::find(&state.db.pool, &filter).await?))
}

pub async fn create_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateLogRequest>, JsonRejection>,
) -> Created<SystemLog> {
    let Json(req) = payload?;
    if req.message.trim().is_empty() {
        return Err(AppError::ValidationError("Log message is required".to_string()));
    }
    if let Some(project_id) = req.project_id {
        load_project(&state.db.pool, project_id).await?;
    }

    let entry = CreateSystemLog {
        level: parse_severity(&req.level)?,
        source: req.source.unwrap_or_else(|| "api".to_string()),
        message: req.message,
        project_id: req.project_id,
        metadata: req.metadata,
    };
    Ok(created(SystemLog::create(&state.db.pool, &entry).await?))
}
