//! Per-project environment variables

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

const MASK: &str = "********";

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct EnvironmentVariable {
    pub id: Uuid,
    pub project_id: Uuid,
    pub key: String,
    pub value: String,
    pub is_secret: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

const COLUMNS: &str = "id, project_id, key, value, is_secret, created_at, updated_at";

impl EnvironmentVariable {
    /// Copy safe to hand to API clients: secret values are masked
    pub fn redacted(mut self) -> Self {
        if self.is_secret {
            self.value = MASK.to_string();
        }
        self
    }

    pub async fn find_by_project_id(
        pool: &SqlitePool,
        project_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, EnvironmentVariable>(&format!(
            "SELECT {COLUMNS} FROM environment_variables WHERE project_id = $1 ORDER BY key"
        ))
        .bind(project_id)
        .fetch_all(pool)
        .await
    }

    /// `(key, value)` pairs in the form handed to containers
    pub async fn pairs_for_project(
        pool: &SqlitePool,
        project_id: Uuid,
    ) -> Result<Vec<(String, String)>, sqlx::Error> {
        let vars = Self::find_by_project_id(pool, project_id).await?;
        Ok(vars.into_iter().map(|v| (v.key, v.value)).collect())
    }

    /// Insert or replace the variable identified by `(project_id, key)`
    pub async fn upsert(
        pool: &SqlitePool,
        project_id: Uuid,
        key: &str,
        value: &str,
        is_secret: bool,
    ) -> Result<Self, sqlx::Error> {
        let now = Utc::now();
        sqlx::query_as::<_, EnvironmentVariable>(&format!(
            "INSERT INTO environment_variables (id, project_id, key, value, is_secret, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $6)
             ON CONFLICT (project_id, key)
             DO UPDATE SET value = excluded.value, is_secret = excluded.is_secret, updated_at = excluded.updated_at
             RETURNING {COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(project_id)
        .bind(key)
        .bind(value)
        .bind(is_secret)
        .bind(now)
        .fetch_one(pool)
        .await
    }

    pub async fn delete(pool: &SqlitePool, project_id: Uuid, key: &str) -> Result<u64, sqlx::Error> {
        let result =
            sqlx::query("DELETE FROM environment_variables WHERE project_id = $1 AND key = $2")
                .bind(project_id)
                .bind(key)
                .execute(pool)
                .await?;
        Ok(result.rows_affected())
    }
}
