//! Periodic host resource samples

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};

use crate::telemetry::HostMetrics;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct SystemMetric {
    pub id: i64,
    pub cpu_usage: f64,
    pub memory_percent: f64,
    pub disk_percent: f64,
    pub memory_used: i64,
    pub memory_total: i64,
    pub sampled_at: DateTime<Utc>,
}

impl SystemMetric {
    pub async fn insert(pool: &SqlitePool, metrics: &HostMetrics) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, SystemMetric>(
            "INSERT INTO system_metrics (cpu_usage, memory_percent, disk_percent, memory_used, memory_total, sampled_at)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING id, cpu_usage, memory_percent, disk_percent, memory_used, memory_total, sampled_at",
        )
        .bind(f64::from(metrics.cpu_usage))
        .bind(f64::from(metrics.memory_percent))
        .bind(f64::from(metrics.disk_percent))
        .bind(i64::try_from(metrics.memory_used).unwrap_or(i64::MAX))
        .bind(i64::try_from(metrics.memory_total).unwrap_or(i64::MAX))
        .bind(Utc::now())
        .fetch_one(pool)
        .await
    }

    pub async fn latest(pool: &SqlitePool) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, SystemMetric>(
            "SELECT id, cpu_usage, memory_percent, disk_percent, memory_used, memory_total, sampled_at
             FROM system_metrics ORDER BY id DESC LIMIT 1",
        )
        .fetch_optional(pool)
        .await
    }

    /// Keep only the newest `keep` samples
    pub async fn prune(pool: &SqlitePool, keep: i64) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM system_metrics
             WHERE id NOT IN (SELECT id FROM system_metrics ORDER BY id DESC LIMIT $1)",
        )
        .bind(keep)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }
}
