//! HTTP admin server for feature flags.
//!
//! Hosts a [`FlagManager`](manager::FlagManager) behind REST endpoints for
//! listing, staging, discarding and saving flag edits, with structured
//! logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use manager::{FlagManager, InMemoryFlagBackend, ManagerError, RecordingNotificationSink};
use metrics_exporter_prometheus::PrometheusHandle;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::Config;
use routes::flags::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::render))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/flags", get(routes::flags::list))
        .route("/flags/columns", get(routes::flags::column_layout))
        .route("/flags/refresh", post(routes::flags::refresh))
        .route(
            "/flags/drafts",
            post(routes::flags::stage).delete(routes::flags::discard),
        )
        .route("/flags/save", post(routes::flags::save))
        .route("/notifications", get(routes::flags::notifications))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the application state over `backend` and mounts the manager,
/// which performs the first table load.
pub async fn create_default_state(
    config: &Config,
    backend: InMemoryFlagBackend,
) -> Result<Arc<AppState>, ManagerError> {
    let notifications = RecordingNotificationSink::new();
    let mut manager = FlagManager::new(
        config.manager_config(),
        backend.clone(),
        backend.clone(),
        notifications.clone(),
    );
    manager.initialize().await?;

    Ok(Arc::new(AppState {
        manager: Mutex::new(manager),
        backend,
        notifications,
    }))
}
