//! Backup records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool, Type};
use strum::{Display, EnumString};
use uuid::Uuid;

#[derive(
    Debug, Clone, Copy, Type, Serialize, Deserialize, PartialEq, Eq, EnumString, Display, Default,
)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum BackupType {
    /// Snapshot of the control-plane database
    #[default]
    Database,
    /// `docker commit` of a project's running container
    Project,
}

#[derive(Debug, Clone, Copy, Type, Serialize, Deserialize, PartialEq, Eq, EnumString, Display)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum BackupStatus {
    Completed,
    Failed,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Backup {
    pub id: Uuid,
    pub project_id: Option<Uuid>,
    pub name: String,
    pub backup_type: BackupType,
    pub status: BackupStatus,
    /// File path or image reference, depending on the type
    pub location: Option<String>,
    pub size_bytes: Option<i64>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateBackup {
    pub id: Uuid,
    pub project_id: Option<Uuid>,
    pub name: String,
    pub backup_type: BackupType,
    pub status: BackupStatus,
    pub location: Option<String>,
    pub size_bytes: Option<i64>,
    pub error: Option<String>,
}

const COLUMNS: &str =
    "id, project_id, name, backup_type, status, location, size_bytes, error, created_at";

impl Backup {
    pub async fn find_all(pool: &SqlitePool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Backup>(&format!(
            "SELECT {COLUMNS} FROM backups ORDER BY created_at DESC"
        ))
        .fetch_all(pool)
        .await
    }

    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Backup>(&format!("SELECT {COLUMNS} FROM backups WHERE id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn create(pool: &SqlitePool, data: &CreateBackup) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Backup>(&format!(
            "INSERT INTO backups (id, project_id, name, backup_type, status, location, size_bytes, error, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING {COLUMNS}"
        ))
        .bind(data.id)
        .bind(data.project_id)
        .bind(&data.name)
        .bind(data.backup_type)
        .bind(data.status)
        .bind(&data.location)
        .bind(data.size_bytes)
        .bind(&data.error)
        .bind(Utc::now())
        .fetch_one(pool)
        .await
    }

    pub async fn delete(pool: &SqlitePool, id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM backups WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
