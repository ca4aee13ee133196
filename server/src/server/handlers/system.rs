//! Health and version

use axum::Json;
use openapi_server::models::{HealthResponse, VersionResponse};

use crate::utils::version_info;

pub async fn health_handler() -> Json<HealthResponse> {
    let version = version_info();
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: "xistra".to_string(),
        version: version.version,
    })
}

pub async fn version_handler() -> Json<VersionResponse> {
    let version = version_info();
    Json(VersionResponse {
        version: version.version,
        git_hash: version.git_hash,
        build_time: version.build_time,
    })
}
