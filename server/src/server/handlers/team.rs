//! Team members and invitations

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use openapi_server::models::InviteMemberRequest;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::app::state::AppState;
use crate::errors::{conflict_on_unique, AppError};
use crate::models::team::{TeamInvitation, TeamMember, TeamRole};
use crate::server::handlers::{created, ok, ApiResult, Created, Deleted};
use crate::utils::generate_token;
use crate::validation;

#[derive(Debug, Serialize)]
pub struct TeamOverview {
    pub members: Vec<TeamMember>,
    pub invitations: Vec<TeamInvitation>,
}

pub async fn list_handler(State(state): State<Arc<AppState>>) -> ApiResult<TeamOverview> {
    Ok(ok(TeamOverview {
        members: TeamMember::find_all(&state.db.pool).await?,
        invitations: TeamInvitation::find_pending(&state.db.pool).await?,
    }))
}

pub async fn invite_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<InviteMemberRequest>, JsonRejection>,
) -> Created<TeamInvitation> {
    let Json(req) = payload?;
    let email = validation::email(&req.email)?;
    let role = match req.role.as_deref() {
        Some(role) => role
            .parse::<TeamRole>()
            .map_err(|_| AppError::ValidationError(format!("Invalid role: {}", role)))?,
        None => TeamRole::default(),
    };
    if role == TeamRole::Owner {
        return Err(AppError::ValidationError(
            "Owners cannot be invited".to_string(),
        ));
    }

    let pool = &state.db.pool;
    if TeamMember::find_by_email(pool, &email).await?.is_some() {
        return Err(AppError::Conflict(format!("{} is already a team member", email)));
    }
    if TeamInvitation::find_pending_by_email(pool, &email).await?.is_some() {
        return Err(AppError::Conflict(format!("{} already has a pending invitation", email)));
    }

    let invitation = TeamInvitation::create(pool, &email, role, &generate_token())
        .await
        .map_err(|e| conflict_on_unique(e, "Invitation already exists"))?;
    info!("Invited {} as {}", invitation.email, invitation.role);
    Ok(created(invitation))
}

pub async fn remove_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Deleted> {
    let pool = &state.db.pool;
    let member = TeamMember::find_by_id(pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Team member not found".to_string()))?;

    if member.role == TeamRole::Owner && TeamMember::count_by_role(pool, TeamRole::Owner).await? <= 1 {
        return Err(AppError::Conflict("Cannot remove the last owner".to_string()));
    }

    TeamMember::delete(pool, id).await?;
    info!("Removed team member {}", member.email);
    Ok(ok(Deleted { id }))
}
