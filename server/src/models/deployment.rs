//! Deployment audit trail: one row per deploy attempt

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool, Type};
use strum::{Display, EnumString};
use uuid::Uuid;

use crate::models::project::DeployType;

#[derive(Debug, Clone, Copy, Type, Serialize, Deserialize, PartialEq, Eq, EnumString, Display)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DeploymentStatus {
    Building,
    Success,
    Failed,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Deployment {
    pub id: Uuid,
    pub project_id: Uuid,
    pub status: DeploymentStatus,
    pub method: Option<DeployType>,
    pub branch: Option<String>,
    pub commit_hash: Option<String>,
    pub commit_message: Option<String>,
    pub duration_ms: Option<i64>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

/// Final state of a deploy attempt
#[derive(Debug, Clone)]
pub struct FinishDeployment {
    pub status: DeploymentStatus,
    pub method: Option<DeployType>,
    pub commit_hash: Option<String>,
    pub commit_message: Option<String>,
    pub duration_ms: i64,
    pub error: Option<String>,
}

const COLUMNS: &str = "id, project_id, status, method, branch, commit_hash, commit_message, \
                       duration_ms, error, created_at, finished_at";

impl Deployment {
    pub async fn start(
        pool: &SqlitePool,
        project_id: Uuid,
        branch: Option<&str>,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Deployment>(&format!(
            "INSERT INTO deployments (id, project_id, status, branch, created_at)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(project_id)
        .bind(DeploymentStatus::Building)
        .bind(branch)
        .bind(Utc::now())
        .fetch_one(pool)
        .await
    }

    pub async fn finish(
        pool: &SqlitePool,
        id: Uuid,
        data: &FinishDeployment,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Deployment>(&format!(
            "UPDATE deployments
             SET status = $2, method = $3, commit_hash = $4, commit_message = $5,
                 duration_ms = $6, error = $7, finished_at = $8
             WHERE id = $1
             RETURNING {COLUMNS}"
        ))
        .bind(id)
        .bind(data.status)
        .bind(data.method)
        .bind(&data.commit_hash)
        .bind(&data.commit_message)
        .bind(data.duration_ms)
        .bind(&data.error)
        .bind(Utc::now())
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_project_id(
        pool: &SqlitePool,
        project_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Deployment>(&format!(
            "SELECT {COLUMNS} FROM deployments WHERE project_id = $1 ORDER BY created_at DESC"
        ))
        .bind(project_id)
        .fetch_all(pool)
        .await
    }

    pub async fn count(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM deployments")
            .fetch_one(pool)
            .await
    }

    pub async fn count_by_status(
        pool: &SqlitePool,
        status: DeploymentStatus,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM deployments WHERE status = $1")
            .bind(status)
            .fetch_one(pool)
            .await
    }
}
