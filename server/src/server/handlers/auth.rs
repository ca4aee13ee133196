use std::sync::Arc;

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use openapi_server::models::{LoginRequest, LoginResponse};
use tracing::{info, warn};

use crate::app::state::AppState;
use crate::server::handlers::{ok, ApiResult};

pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<LoginResponse> {
    let Json(req) = payload?;

    let token = state.auth.login(&req.email, &req.password).inspect_err(|_| {
        warn!("Rejected login for {}", req.email);
    })?;
    info!("Issued token for {}", req.email);

    Ok(ok(LoginResponse {
        token: token.raw,
        token_type: "Bearer".to_string(),
        expires_at: token.expires_at,
    }))
}
