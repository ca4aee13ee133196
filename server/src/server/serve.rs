//! HTTP server setup

use std::future::Future;
use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::app::options::ServerOptions;
use crate::app::state::AppState;
use crate::authn::guard::require_auth;
use crate::errors::AppError;
use crate::server::handlers::{
    apps, auth, backups, dashboard, domains, logs, projects, system, team,
};

/// Build the API router
pub fn router(state: Arc<AppState>, max_concurrent_requests: usize) -> Router {
    let protected = Router::new()
        // Apps
        .route("/apps/deploy", post(apps::deploy_handler))
        .route("/apps/deployed", get(apps::deployed_handler))
        // Dashboard
        .route("/dashboard/stats", get(dashboard::stats_handler))
        // Projects
        .route(
            "/projects",
            get(projects::list_handler).post(projects::create_handler),
        )
        .route(
            "/projects/{id}",
            get(projects::get_handler).delete(projects::delete_handler),
        )
        .route("/projects/{id}/stop", post(projects::stop_handler))
        .route("/projects/{id}/deployments", get(projects::deployments_handler))
        .route(
            "/projects/{id}/env",
            get(projects::list_env_handler).post(projects::upsert_env_handler),
        )
        .route("/projects/{id}/env/{key}", delete(projects::delete_env_handler))
        // Domains
        .route(
            "/domains",
            get(domains::list_handler).post(domains::create_handler),
        )
        .route("/domains/{id}", delete(domains::delete_handler))
        .route("/domains/{id}/verify", post(domains::verify_handler))
        // Logs
        .route("/logs", get(logs::list_handler).post(logs::create_handler))
        // Backups
        .route(
            "/backups",
            get(backups::list_handler).post(backups::create_handler),
        )
        .route("/backups/{id}", delete(backups::delete_handler))
        // Team
        .route("/team", get(team::list_handler))
        .route("/team/invitations", post(team::invite_handler))
        .route("/team/{id}", delete(team::remove_handler))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        // Health and version
        .route("/health", get(system::health_handler))
        .route("/version", get(system::version_handler))
        .route("/auth/login", post(auth::login_handler))
        .route("/apps/templates", get(apps::templates_handler))
        .merge(protected)
        // State and middleware
        .with_state(state)
        .layer(ConcurrencyLimitLayer::new(max_concurrent_requests))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Start the HTTP server
pub async fn serve(
    options: &ServerOptions,
    state: Arc<AppState>,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<JoinHandle<Result<(), AppError>>, AppError> {
    let app = router(state, options.max_concurrent_requests);

    let addr = format!("{}:{}", options.host, options.port);
    info!("Starting HTTP server on {}", addr);

    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::ServerError(e.to_string()))?;

    let handle = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal)
            .await
            .map_err(|e| AppError::ServerError(e.to_string()))
    });

    Ok(handle)
}
