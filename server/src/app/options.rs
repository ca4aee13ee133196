//! Application configuration options

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use tracing::warn;

use crate::app::settings::Settings;
use crate::logs::LogOptions;
use crate::utils::generate_token;
use crate::workers::metrics;

/// Main application options
#[derive(Debug)]
pub struct AppOptions {
    pub server: ServerOptions,
    pub auth: AuthOptions,
    pub deploy: DeployOptions,
    pub logging: LogOptions,

    pub database_url: String,

    /// Where database backups are written
    pub backup_dir: PathBuf,

    pub metrics_worker: metrics::Options,

    /// Maximum delay for graceful shutdown
    pub max_shutdown_delay: Duration,
}

impl From<Settings> for AppOptions {
    fn from(settings: Settings) -> Self {
        let auth = AuthOptions::from_settings(&settings);
        Self {
            server: ServerOptions {
                host: settings.host,
                port: settings.port,
                max_concurrent_requests: settings.max_concurrent_requests,
            },
            auth,
            deploy: DeployOptions {
                public_host: settings.public_host,
                docker_host: settings.docker_socket,
                command_timeout: Duration::from_secs(settings.command_timeout_secs),
                build_platform: settings.build_platform,
                work_dir: settings.work_dir.unwrap_or_else(std::env::temp_dir),
            },
            logging: LogOptions {
                log_level: settings.log_level,
                stdout: true,
                log_dir: settings.log_dir,
                json_format: settings.log_json,
            },
            database_url: settings.database_url,
            backup_dir: settings.backup_dir,
            metrics_worker: metrics::Options {
                interval: Duration::from_secs(settings.metrics_interval_secs.max(1)),
                retention: settings.metrics_retention,
            },
            max_shutdown_delay: Duration::from_secs(30),
        }
    }
}

/// HTTP server options
#[derive(Debug, Clone)]
pub struct ServerOptions {
    pub host: String,
    pub port: u16,
    /// Requests served at once; the rest wait
    pub max_concurrent_requests: usize,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3001,
            max_concurrent_requests: 256,
        }
    }
}

/// Authentication options
#[derive(Debug)]
pub struct AuthOptions {
    /// Reject unauthenticated requests to protected routes
    pub required: bool,
    pub jwt_secret: SecretString,
    pub admin_email: String,
    pub admin_password: Option<SecretString>,
    pub token_ttl: Duration,
}

impl AuthOptions {
    fn from_settings(settings: &Settings) -> Self {
        let jwt_secret = match &settings.jwt_secret {
            Some(secret) => secret.clone(),
            None => {
                warn!("JWT_SECRET is not set; using a per-process secret");
                generate_token()
            }
        };
        Self {
            required: settings.is_production() || settings.admin_password.is_some(),
            jwt_secret: SecretString::from(jwt_secret),
            admin_email: settings.admin_email.to_ascii_lowercase(),
            admin_password: settings.admin_password.clone().map(SecretString::from),
            token_ttl: Duration::from_secs(24 * 60 * 60),
        }
    }

    /// Open access, for local development and tests
    pub fn disabled() -> Self {
        Self {
            required: false,
            jwt_secret: SecretString::from(generate_token()),
            admin_email: "admin@xistra.local".to_string(),
            admin_password: None,
            token_ttl: Duration::from_secs(24 * 60 * 60),
        }
    }
}

/// Deployment options
#[derive(Debug, Clone)]
pub struct DeployOptions {
    /// Host name used in published URLs
    pub public_host: String,

    /// Exported to docker / compose as `DOCKER_HOST`
    pub docker_host: Option<String>,

    /// Upper bound for any single shelled-out command
    pub command_timeout: Duration,

    /// `docker buildx --platform`
    pub build_platform: String,

    pub work_dir: PathBuf,
}

impl Default for DeployOptions {
    fn default() -> Self {
        Self {
            public_host: "localhost".to_string(),
            docker_host: None,
            command_timeout: Duration::from_secs(600),
            build_platform: "linux/amd64".to_string(),
            work_dir: std::env::temp_dir(),
        }
    }
}
