//! Bearer-token middleware

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};

use crate::app::state::AppState;
use crate::errors::{AppError, MISSING_TOKEN};

/// Reject requests without a valid bearer token; verified claims go into the
/// request extensions
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    if !state.auth.required() {
        return Ok(next.run(req).await);
    }

    let token = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::unauthorized("Missing bearer token", MISSING_TOKEN))?;

    let claims = state.auth.verify(token)?;
    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}
