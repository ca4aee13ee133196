//! Main application run loop

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::app::options::AppOptions;
use crate::app::state::AppState;
use crate::db::Db;
use crate::errors::AppError;
use crate::server::serve::serve;
use crate::workers::metrics;

/// Run the XistraCloud server until `shutdown_signal` resolves
pub async fn run(
    options: AppOptions,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<(), AppError> {
    info!("Initializing XistraCloud...");

    let (shutdown_tx, _shutdown_rx): (broadcast::Sender<()>, _) = broadcast::channel(1);
    let mut shutdown_manager = ShutdownManager::new(shutdown_tx.clone(), options.max_shutdown_delay);

    if let Err(e) = init(options, &shutdown_tx, &mut shutdown_manager).await {
        error!("Failed to start server: {}", e);
        shutdown_manager.shutdown().await?;
        return Err(e);
    }

    shutdown_signal.await;
    info!("Shutdown signal received, shutting down...");

    drop(shutdown_tx);
    shutdown_manager.shutdown().await
}

// =============================== INITIALIZATION ================================== //

async fn init(
    options: AppOptions,
    shutdown_tx: &broadcast::Sender<()>,
    shutdown_manager: &mut ShutdownManager,
) -> Result<(), AppError> {
    let db = Db::connect(&options.database_url).await?;
    let app_state = Arc::new(
        AppState::init(db, &options.deploy, options.auth, options.backup_dir).await?,
    );
    shutdown_manager.with_app_state(app_state.clone())?;

    init_metrics_worker(
        options.metrics_worker,
        app_state.clone(),
        shutdown_manager,
        shutdown_tx.subscribe(),
    )?;

    let mut shutdown_rx = shutdown_tx.subscribe();
    let server_handle = serve(&options.server, app_state, async move {
        let _ = shutdown_rx.recv().await;
    })
    .await?;
    shutdown_manager.with_server_handle(server_handle)?;

    Ok(())
}

fn init_metrics_worker(
    options: metrics::Options,
    app_state: Arc<AppState>,
    shutdown_manager: &mut ShutdownManager,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), AppError> {
    info!("Initializing metrics worker...");

    let handle = tokio::spawn(async move {
        metrics::run(
            &options,
            &app_state.db.pool,
            tokio::time::sleep,
            Box::pin(async move {
                let _ = shutdown_rx.recv().await;
            }),
        )
        .await;
    });

    shutdown_manager.with_metrics_worker_handle(handle)
}

// ================================= SHUTDOWN ===================================== //

struct ShutdownManager {
    shutdown_tx: broadcast::Sender<()>,
    max_shutdown_delay: Duration,
    app_state: Option<Arc<AppState>>,
    server_handle: Option<JoinHandle<Result<(), AppError>>>,
    metrics_worker_handle: Option<JoinHandle<()>>,
}

impl ShutdownManager {
    fn new(shutdown_tx: broadcast::Sender<()>, max_shutdown_delay: Duration) -> Self {
        Self {
            shutdown_tx,
            max_shutdown_delay,
            app_state: None,
            server_handle: None,
            metrics_worker_handle: None,
        }
    }

    fn with_app_state(&mut self, state: Arc<AppState>) -> Result<(), AppError> {
        if self.app_state.is_some() {
            return Err(AppError::ShutdownError("app_state already set".to_string()));
        }
        self.app_state = Some(state);
        Ok(())
    }

    fn with_metrics_worker_handle(&mut self, handle: JoinHandle<()>) -> Result<(), AppError> {
        if self.metrics_worker_handle.is_some() {
            return Err(AppError::ShutdownError("metrics_handle already set".to_string()));
        }
        self.metrics_worker_handle = Some(handle);
        Ok(())
    }

    fn with_server_handle(
        &mut self,
        handle: JoinHandle<Result<(), AppError>>,
    ) -> Result<(), AppError> {
        if self.server_handle.is_some() {
            return Err(AppError::ShutdownError("server_handle already set".to_string()));
        }
        self.server_handle = Some(handle);
        Ok(())
    }

    async fn shutdown(&mut self) -> Result<(), AppError> {
        let _ = self.shutdown_tx.send(());

        match tokio::time::timeout(self.max_shutdown_delay, self.shutdown_impl()).await {
            Ok(result) => result,
            Err(_) => {
                error!(
                    "Shutdown timed out after {:?}, forcing shutdown...",
                    self.max_shutdown_delay
                );
                std::process::exit(1);
            }
        }
    }

    async fn shutdown_impl(&mut self) -> Result<(), AppError> {
        info!("Shutting down XistraCloud...");

        // 1. Metrics worker
        if let Some(handle) = self.metrics_worker_handle.take() {
            handle.await.map_err(|e| AppError::ShutdownError(e.to_string()))?;
        }

        // 2. HTTP server, draining in-flight requests
        if let Some(handle) = self.server_handle.take() {
            handle.await.map_err(|e| AppError::ShutdownError(e.to_string()))??;
        }

        // 3. App state
        if let Some(app_state) = self.app_state.take() {
            app_state.shutdown().await;
        }

        info!("Shutdown complete");
        Ok(())
    }
}
