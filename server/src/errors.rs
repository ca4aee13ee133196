//! Error types for the XistraCloud server

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use openapi_server::models::ApiResponse;
use thiserror::Error;
use tracing::error;

/// Token has expired
pub const TOKEN_EXPIRED: &str = "TOKEN_EXPIRED";
/// Token is malformed or signed with another key
pub const INVALID_TOKEN: &str = "INVALID_TOKEN";
/// No bearer token on a protected route
pub const MISSING_TOKEN: &str = "MISSING_TOKEN";
/// Login with the wrong email or password
pub const INVALID_CREDENTIALS: &str = "INVALID_CREDENTIALS";

/// Main error type for the server
#[derive(Error, Debug)]
pub enum AppError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    #[error("{message}")]
    Unauthorized { message: String, code: &'static str },

    #[error("{0}")]
    ValidationError(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Deployment error: {0}")]
    DeployError(String),

    #[error("Command error: {0}")]
    CommandError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Shutdown error: {0}")]
    ShutdownError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn unauthorized(message: impl Into<String>, code: &'static str) -> Self {
        AppError::Unauthorized {
            message: message.into(),
            code,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) | AppError::JsonError(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> Option<&'static str> {
        match self {
            AppError::Unauthorized { code, .. } => Some(code),
            _ => None,
        }
    }

    /// Message shown to API clients. Storage and IO details stay in the server log.
    fn public_message(&self) -> String {
        match self {
            AppError::IoError(_)
            | AppError::DatabaseError(_)
            | AppError::MigrationError(_)
            | AppError::ConfigError(_)
            | AppError::ServerError(_)
            | AppError::ShutdownError(_)
            | AppError::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        }
        let body = ApiResponse::<()>::error(self.public_message(), self.code());
        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::ValidationError(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::ValidationError(rejection.body_text())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

/// Map a unique-constraint violation to a conflict, leave everything else alone
pub fn conflict_on_unique(err: sqlx::Error, message: &str) -> AppError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AppError::Conflict(message.to_string())
        }
        _ => AppError::DatabaseError(err),
    }
}
