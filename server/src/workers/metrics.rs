//! Periodic host metrics sampler

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use sqlx::SqlitePool;
use tracing::{debug, error, info};

use crate::errors::AppError;
use crate::models::system_metric::SystemMetric;
use crate::telemetry::collect_metrics;

/// Metrics worker options
#[derive(Debug, Clone)]
pub struct Options {
    /// Sampling interval
    pub interval: Duration,

    /// Number of samples kept in the database
    pub retention: i64,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
            retention: 1440,
        }
    }
}

/// Run the metrics worker
pub async fn run<S, F>(
    options: &Options,
    pool: &SqlitePool,
    sleep_fn: S,
    mut shutdown_signal: Pin<Box<dyn Future<Output = ()> + Send>>,
) where
    S: Fn(Duration) -> F,
    F: Future<Output = ()>,
{
    info!("Metrics worker starting...");

    loop {
        if let Err(e) = sample(options, pool).await {
            error!("Failed to record system metrics: {}", e);
        }

        tokio::select! {
            _ = &mut shutdown_signal => {
                info!("Metrics worker shutting down...");
                return;
            }
            _ = sleep_fn(options.interval) => {}
        }
    }
}

async fn sample(options: &Options, pool: &SqlitePool) -> Result<(), AppError> {
    let metrics = tokio::task::spawn_blocking(collect_metrics)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    SystemMetric::insert(pool, &metrics).await?;
    let pruned = SystemMetric::prune(pool, options.retention).await?;
    debug!(
        "Recorded metrics (cpu {:.1}%, mem {:.1}%), pruned {}",
        metrics.cpu_usage, metrics.memory_percent, pruned
    );
    Ok(())
}
