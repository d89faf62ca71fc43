//! Health check endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use manager::Lifecycle;
use serde::Serialize;

use crate::routes::flags::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub lifecycle: Lifecycle,
}

/// GET /health: reports whether the flag manager is mounted.
pub async fn check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let lifecycle = state.manager.lock().await.lifecycle();
    let status = if lifecycle == Lifecycle::Mounted {
        "ok"
    } else {
        "degraded"
    };
    Json(HealthResponse { status, lifecycle })
}
