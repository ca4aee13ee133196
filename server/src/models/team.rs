//! Team members and pending invitations

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool, Type};
use strum::{Display, EnumString};
use uuid::Uuid;

#[derive(
    Debug, Clone, Copy, Type, Serialize, Deserialize, PartialEq, Eq, EnumString, Display, Default,
)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum TeamRole {
    Owner,
    Admin,
    #[default]
    Developer,
    Viewer,
}

#[derive(Debug, Clone, Copy, Type, Serialize, Deserialize, PartialEq, Eq, EnumString, Display)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum InvitationStatus {
    Pending,
    Accepted,
    Expired,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct TeamMember {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub role: TeamRole,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct TeamInvitation {
    pub id: Uuid,
    pub email: String,
    pub role: TeamRole,
    pub token: String,
    pub status: InvitationStatus,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

const INVITATION_TTL_DAYS: i64 = 7;

impl TeamMember {
    pub async fn find_all(pool: &SqlitePool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, TeamMember>(
            "SELECT id, email, name, role, created_at FROM team_members ORDER BY created_at",
        )
        .fetch_all(pool)
        .await
    }

    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, TeamMember>(
            "SELECT id, email, name, role, created_at FROM team_members WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn find_by_email(
        pool: &SqlitePool,
        email: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, TeamMember>(
            "SELECT id, email, name, role, created_at FROM team_members WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(pool)
        .await
    }

    /// Make sure the configured administrator is listed as an owner
    pub async fn ensure_owner(pool: &SqlitePool, email: &str) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO team_members (id, email, name, role, created_at)
             VALUES ($1, $2, NULL, $3, $4)
             ON CONFLICT (email) DO NOTHING",
        )
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(TeamRole::Owner)
        .bind(Utc::now())
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn count(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM team_members")
            .fetch_one(pool)
            .await
    }

    pub async fn count_by_role(pool: &SqlitePool, role: TeamRole) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM team_members WHERE role = $1")
            .bind(role)
            .fetch_one(pool)
            .await
    }

    pub async fn delete(pool: &SqlitePool, id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM team_members WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}

impl TeamInvitation {
    pub async fn find_pending(pool: &SqlitePool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, TeamInvitation>(
            "SELECT id, email, role, token, status, expires_at, created_at
             FROM team_invitations
             WHERE status = $1 AND expires_at > $2
             ORDER BY created_at DESC",
        )
        .bind(InvitationStatus::Pending)
        .bind(Utc::now())
        .fetch_all(pool)
        .await
    }

    pub async fn find_pending_by_email(
        pool: &SqlitePool,
        email: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, TeamInvitation>(
            "SELECT id, email, role, token, status, expires_at, created_at
             FROM team_invitations
             WHERE email = $1 AND status = $2 AND expires_at > $3",
        )
        .bind(email)
        .bind(InvitationStatus::Pending)
        .bind(Utc::now())
        .fetch_optional(pool)
        .await
    }

    pub async fn create(
        pool: &SqlitePool,
        email: &str,
        role: TeamRole,
        token: &str,
    ) -> Result<Self, sqlx::Error> {
        let now = Utc::now();
        sqlx::query_as::<_, TeamInvitation>(
            "INSERT INTO team_invitations (id, email, role, token, status, expires_at, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING id, email, role, token, status, expires_at, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(role)
        .bind(token)
        .bind(InvitationStatus::Pending)
        .bind(now + Duration::days(INVITATION_TTL_DAYS))
        .bind(now)
        .fetch_one(pool)
        .await
    }
}
