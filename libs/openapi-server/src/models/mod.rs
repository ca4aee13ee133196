//! XistraCloud API models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Envelope wrapping every JSON response body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Machine readable error code (e.g. `TOKEN_EXPIRED`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            code: None,
        }
    }

    pub fn error(message: impl Into<String>, code: Option<&str>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
            code: code.map(str::to_string),
        }
    }
}

/// Health response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
}

/// Version response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionResponse {
    pub version: String,
    pub git_hash: String,
    pub build_time: String,
}

/// Login request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Issued access token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub token_type: String,
    pub expires_at: DateTime<Utc>,
}

/// Create project request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProjectRequest {
    pub name: String,
    #[serde(default)]
    pub repository_url: Option<String>,
    #[serde(default)]
    pub branch: Option<String>,
    #[serde(default)]
    pub framework: Option<String>,
}

/// Deploy a Git repository as an application
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeployRequest {
    pub name: String,
    pub repository_url: String,
    #[serde(default)]
    pub branch: Option<String>,
    #[serde(default)]
    pub framework: Option<String>,
}

/// Create domain request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDomainRequest {
    pub domain: String,
    #[serde(default)]
    pub project_id: Option<Uuid>,
    #[serde(default)]
    pub ssl_enabled: Option<bool>,
}

/// Create or replace an environment variable
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpsertEnvVarRequest {
    pub key: String,
    pub value: String,
    #[serde(default)]
    pub is_secret: Option<bool>,
}

/// Append a system log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateLogRequest {
    pub level: String,
    pub message: String,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub project_id: Option<Uuid>,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

/// Filters for listing system logs
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogQuery {
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub project_id: Option<Uuid>,
    #[serde(default)]
    pub limit: Option<i64>,
}

/// Create backup request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateBackupRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub project_id: Option<Uuid>,
    /// `database` (default) or `project`
    #[serde(default)]
    pub backup_type: Option<String>,
}

/// Invite a team member
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InviteMemberRequest {
    pub email: String,
    #[serde(default)]
    pub role: Option<String>,
}

/// Filters for the template catalogue
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TemplateQuery {
    #[serde(default)]
    pub category: Option<String>,
}

/// One-click application template
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppTemplate {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: String,
    pub repository_url: String,
    pub framework: String,
    pub default_port: u16,
}

/// Host resource usage snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemSnapshot {
    pub cpu_usage: f64,
    pub memory_percent: f64,
    pub disk_percent: f64,
    pub sampled_at: DateTime<Utc>,
}

/// Dashboard counters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardStats {
    pub total_projects: i64,
    pub deployed_projects: i64,
    pub building_projects: i64,
    pub failed_projects: i64,
    pub total_domains: i64,
    pub verified_domains: i64,
    pub total_deployments: i64,
    pub successful_deployments: i64,
    pub team_members: i64,
    pub system: Option<SystemSnapshot>,
}
