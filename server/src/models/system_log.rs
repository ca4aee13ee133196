//! Application log entries shown on the dashboard

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow, QueryBuilder, Sqlite, SqlitePool, Type};
use strum::{Display, EnumString};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Type, Serialize, Deserialize, PartialEq, Eq, EnumString, Display)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum LogSeverity {
    Debug,
    Info,
    #[strum(serialize = "warning", to_string = "warn")]
    Warn,
    Error,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct SystemLog {
    pub id: i64,
    pub level: LogSeverity,
    pub source: String,
    pub message: String,
    pub project_id: Option<Uuid>,
    pub metadata: Option<Json<serde_json::Value>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateSystemLog {
    pub level: LogSeverity,
    pub source: String,
    pub message: String,
    pub project_id: Option<Uuid>,
    pub metadata: Option<serde_json::Value>,
}

impl CreateSystemLog {
    pub fn new(level: LogSeverity, source: &str, message: impl Into<String>) -> Self {
        Self {
            level,
            source: source.to_string(),
            message: message.into(),
            project_id: None,
            metadata: None,
        }
    }

    pub fn for_project(mut self, project_id: Uuid) -> Self {
        self.project_id = Some(project_id);
        self
    }
}

/// Filters for [`SystemLog::find`]
#[derive(Debug, Clone, Default)]
pub struct LogFilter {
    pub level: Option<LogSeverity>,
    pub project_id: Option<Uuid>,
    pub limit: i64,
}

impl SystemLog {
    pub async fn create(pool: &SqlitePool, data: &CreateSystemLog) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, SystemLog>(
            "INSERT INTO system_logs (level, source, message, project_id, metadata, created_at)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING id, level, source, message, project_id, metadata, created_at",
        )
        .bind(data.level)
        .bind(&data.source)
        .bind(&data.message)
        .bind(data.project_id)
        .bind(data.metadata.as_ref().map(Json))
        .bind(Utc::now())
        .fetch_one(pool)
        .await
    }

    /// Newest first
    pub async fn find(pool: &SqlitePool, filter: &LogFilter) -> Result<Vec<Self>, sqlx::Error> {
        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT id, level, source, message, project_id, metadata, created_at FROM system_logs WHERE 1 = 1",
        );
        if let Some(level) = filter.level {
            query.push(" AND level = ").push_bind(level);
        }
        if let Some(project_id) = filter.project_id {
            query.push(" AND project_id = ").push_bind(project_id);
        }
        query
            .push(" ORDER BY id DESC LIMIT ")
            .push_bind(filter.limit);

        query.build_query_as::<SystemLog>().fetch_all(pool).await
    }
}
