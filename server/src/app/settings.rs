//! Settings file and environment overrides

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::AppError;
use crate::filesys::file::File;
use crate::logs::LogLevel;

/// Server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Emit JSON logs on stdout
    #[serde(default)]
    pub log_json: bool,

    /// Directory for rolling log files
    #[serde(default)]
    pub log_dir: Option<PathBuf>,

    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_database_url")]
    pub database_url: String,

    /// HS256 signing secret; a random one is generated outside production
    #[serde(default)]
    pub jwt_secret: Option<String>,

    /// `production` forces authentication
    #[serde(default = "default_app_env")]
    pub app_env: String,

    /// Docker daemon address, exported to child processes as `DOCKER_HOST`
    #[serde(default)]
    pub docker_socket: Option<String>,

    #[serde(default = "default_admin_email")]
    pub admin_email: String,

    /// Login is disabled while unset
    #[serde(default)]
    pub admin_password: Option<String>,

    /// Host name used in published URLs
    #[serde(default = "default_public_host")]
    pub public_host: String,

    #[serde(default = "default_command_timeout")]
    pub command_timeout_secs: u64,

    #[serde(default = "default_build_platform")]
    pub build_platform: String,

    #[serde(default = "default_max_concurrent_requests")]
    pub max_concurrent_requests: usize,

    #[serde(default = "default_metrics_interval")]
    pub metrics_interval_secs: u64,

    /// Number of metric samples kept
    #[serde(default = "default_metrics_retention")]
    pub metrics_retention: i64,

    #[serde(default = "default_backup_dir")]
    pub backup_dir: PathBuf,

    /// Parent of the temporary checkout directories
    #[serde(default)]
    pub work_dir: Option<PathBuf>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3001
}

fn default_database_url() -> String {
    "sqlite://xistra.db".to_string()
}

fn default_app_env() -> String {
    "development".to_string()
}

fn default_admin_email() -> String {
    "admin@xistra.local".to_string()
}

fn default_public_host() -> String {
    "localhost".to_string()
}

fn default_command_timeout() -> u64 {
    600
}

fn default_build_platform() -> String {
    "linux/amd64".to_string()
}

fn default_max_concurrent_requests() -> usize {
    256
}

fn default_metrics_interval() -> u64 {
    60
}

fn default_metrics_retention() -> i64 {
    1440
}

fn default_backup_dir() -> PathBuf {
    PathBuf::from("backups")
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            log_json: false,
            log_dir: None,
            host: default_host(),
            port: default_port(),
            database_url: default_database_url(),
            jwt_secret: None,
            app_env: default_app_env(),
            docker_socket: None,
            admin_email: default_admin_email(),
            admin_password: None,
            public_host: default_public_host(),
            command_timeout_secs: default_command_timeout(),
            build_platform: default_build_platform(),
            max_concurrent_requests: default_max_concurrent_requests(),
            metrics_interval_secs: default_metrics_interval(),
            metrics_retention: default_metrics_retention(),
            backup_dir: default_backup_dir(),
            work_dir: None,
        }
    }
}

impl Settings {
    /// Read `path` (when given), then apply the process environment
    pub async fn load(path: Option<&Path>) -> Result<Self, AppError> {
        let mut settings = match path {
            Some(path) => {
                info!("Loading settings from {}", path.display());
                File::new(path).read_json::<Settings>().await.map_err(|e| {
                    AppError::ConfigError(format!("Failed to read {}: {}", path.display(), e))
                })?
            }
            None => Settings::default(),
        };
        settings.apply_env(|key| std::env::var(key).ok())?;
        settings.validate()?;
        Ok(settings)
    }

    /// Override fields from environment variables looked up through `lookup`
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = var("PORT") {
            self.port = parse_var("PORT", &v)?;
        }
        if let Some(v) = var("HOST") {
            self.host = v;
        }
        if let Some(v) = var("DATABASE_URL") {
            self.database_url = v;
        }
        if let Some(v) = var("JWT_SECRET") {
            self.jwt_secret = Some(v);
        }
        if let Some(v) = var("APP_ENV").or_else(|| var("NODE_ENV")) {
            self.app_env = v;
        }
        if let Some(v) = var("DOCKER_SOCKET") {
            self.docker_socket = Some(v);
        }
        if let Some(v) = var("ADMIN_EMAIL") {
            self.admin_email = v;
        }
        if let Some(v) = var("ADMIN_PASSWORD") {
            self.admin_password = Some(v);
        }
        if let Some(v) = var("PUBLIC_HOST") {
            self.public_host = v;
        }
        if let Some(v) = var("LOG_LEVEL") {
            self.log_level = v.parse().map_err(AppError::ConfigError)?;
        }
        if let Some(v) = var("LOG_DIR") {
            self.log_dir = Some(PathBuf::from(v));
        }
        if let Some(v) = var("COMMAND_TIMEOUT_SECS") {
            self.command_timeout_secs = parse_var("COMMAND_TIMEOUT_SECS", &v)?;
        }
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.app_env.eq_ignore_ascii_case("production")
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.is_production() && self.jwt_secret.is_none() {
            return Err(AppError::ConfigError(
                "JWT_SECRET must be set in production".to_string(),
            ));
        }
        if self.command_timeout_secs == 0 {
            return Err(AppError::ConfigError(
                "command_timeout_secs must be positive".to_string(),
            ));
        }
        if self.max_concurrent_requests == 0 {
            return Err(AppError::ConfigError(
                "max_concurrent_requests must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, AppError> {
    value
        .trim()
        .parse()
        .map_err(|_| AppError::ConfigError(format!("Invalid value for {}: {}", key, value)))
}
