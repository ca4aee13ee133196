//! Custom domains attached to projects

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow, SqlitePool, Type};
use strum::{Display, EnumString};
use uuid::Uuid;

/// Verification state. `pending -> {verified, failed}`; failed domains may be re-checked.
#[derive(
    Debug, Clone, Copy, Type, Serialize, Deserialize, PartialEq, Eq, EnumString, Display, Default,
)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DomainStatus {
    #[default]
    Pending,
    Verified,
    Failed,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Domain {
    pub id: Uuid,
    pub domain: String,
    pub project_id: Option<Uuid>,
    pub status: DomainStatus,
    pub ssl_enabled: bool,
    pub dns_records: Json<serde_json::Value>,
    pub verification_token: String,
    pub verified_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateDomain {
    pub domain: String,
    pub project_id: Option<Uuid>,
    pub ssl_enabled: bool,
    pub verification_token: String,
}

const COLUMNS: &str = "id, domain, project_id, status, ssl_enabled, dns_records, \
                       verification_token, verified_at, created_at, updated_at";

impl Domain {
    pub async fn find_all(pool: &SqlitePool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Domain>(&format!(
            "SELECT {COLUMNS} FROM domains ORDER BY created_at DESC"
        ))
        .fetch_all(pool)
        .await
    }

    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Domain>(&format!("SELECT {COLUMNS} FROM domains WHERE id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_domain(
        pool: &SqlitePool,
        domain: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Domain>(&format!("SELECT {COLUMNS} FROM domains WHERE domain = $1"))
            .bind(domain)
            .fetch_optional(pool)
            .await
    }

    pub async fn create(pool: &SqlitePool, data: &CreateDomain) -> Result<Self, sqlx::Error> {
        let now = Utc::now();
        sqlx::query_as::<_, Domain>(&format!(
            "INSERT INTO domains (id, domain, project_id, status, ssl_enabled, dns_records,
                                  verification_token, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)
             RETURNING {COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&data.domain)
        .bind(data.project_id)
        .bind(DomainStatus::Pending)
        .bind(data.ssl_enabled)
        .bind(Json(serde_json::json!({})))
        .bind(&data.verification_token)
        .bind(now)
        .fetch_one(pool)
        .await
    }

    /// Store the outcome of a verification attempt
    pub async fn record_verification(
        pool: &SqlitePool,
        id: Uuid,
        status: DomainStatus,
        dns_records: &serde_json::Value,
    ) -> Result<Self, sqlx::Error> {
        let now = Utc::now();
        let verified_at = (status == DomainStatus::Verified).then_some(now);
        sqlx::query_as::<_, Domain>(&format!(
            "UPDATE domains
             SET status = $2, dns_records = $3, verified_at = $4, updated_at = $5
             WHERE id = $1
             RETURNING {COLUMNS}"
        ))
        .bind(id)
        .bind(status)
        .bind(Json(dns_records))
        .bind(verified_at)
        .bind(now)
        .fetch_one(pool)
        .await
    }

    pub async fn delete(pool: &SqlitePool, id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM domains WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn count(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM domains")
            .fetch_one(pool)
            .await
    }

    pub async fn count_by_status(
        pool: &SqlitePool,
        status: DomainStatus,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM domains WHERE status = $1")
            .bind(status)
            .fetch_one(pool)
            .await
    }
}
