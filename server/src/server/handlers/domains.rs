//! Custom domains

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use openapi_server::models::CreateDomainRequest;
use tracing::info;
use uuid::Uuid;

use crate::app::state::AppState;
use crate::errors::{conflict_on_unique, AppError};
use crate::models::domain::{CreateDomain, Domain, DomainStatus};
use crate::server::handlers::{created, load_project, ok, ApiResult, Created, Deleted};
use crate::utils::generate_token;
use crate::validation;

const DUPLICATE: &str = "Domain already exists";

pub async fn list_handler(State(state): State<Arc<AppState>>) -> ApiResult<Vec<Domain>> {
    Ok(ok(Domain::find_all(&state.db.pool).await?))
}

pub async fn create_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateDomainRequest>, JsonRejection>,
) -> Created<Domain> {
    let Json(req) = payload?;
    let domain = validation::domain(&req.domain)?;

    if let Some(project_id) = req.project_id {
        load_project(&state.db.pool, project_id).await?;
    }
    if Domain::find_by_domain(&state.db.pool, &domain).await?.is_some() {
        return Err(AppError::Conflict(DUPLICATE.to_string()));
    }

    let data = CreateDomain {
        domain,
        project_id: req.project_id,
        ssl_enabled: req.ssl_enabled.unwrap_or(true),
        verification_token: generate_token(),
    };
    let domain = Domain::create(&state.db.pool, &data)
        .await
        .map_err(|e| conflict_on_unique(e, DUPLICATE))?;
    info!("Added domain {}", domain.domain);
    Ok(created(domain))
}

pub async fn delete_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Deleted> {
    if Domain::delete(&state.db.pool, id).await? == 0 {
        return Err(AppError::NotFound("Domain not found".to_string()));
    }
    Ok(ok(Deleted { id }))
}

/// Resolve the domain and record the result; verified domains are returned as they are
pub async fn verify_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Domain> {
    let domain = Domain::find_by_id(&state.db.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Domain not found".to_string()))?;
    if domain.status == DomainStatus::Verified {
        return Ok(ok(domain));
    }

    let verification = state.verifier.verify(&domain.domain).await;
    let status = if verification.verified {
        DomainStatus::Verified
    } else {
        DomainStatus::Failed
    };
    info!("Verification of {}: {}", domain.domain, status);

    let domain =
        Domain::record_verification(&state.db.pool, id, status, &verification.records).await?;
    Ok(ok(domain))
}
