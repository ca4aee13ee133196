//! HTTP request handlers

pub mod apps;
pub mod auth;
pub mod backups;
pub mod dashboard;
pub mod domains;
pub mod logs;
pub mod projects;
pub mod system;
pub mod team;

use axum::{http::StatusCode, Json};
use openapi_server::models::ApiResponse;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::project::Project;

pub type ApiResult<T> = Result<Json<ApiResponse<T>>, AppError>;
pub type Created<T> = Result<(StatusCode, Json<ApiResponse<T>>), AppError>;

pub fn ok<T>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse::success(data))
}

pub fn created<T>(data: T) -> (StatusCode, Json<ApiResponse<T>>) {
    (StatusCode::CREATED, Json(ApiResponse::success(data)))
}

/// Acknowledgement body for deletes
#[derive(Debug, serde::Serialize)]
pub struct Deleted {
    pub id: Uuid,
}

pub(crate) async fn load_project(
    pool: &sqlx::SqlitePool,
    id: Uuid,
) -> Result<Project, AppError> {
    Project::find_by_id(pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Project not found".to_string()))
}
