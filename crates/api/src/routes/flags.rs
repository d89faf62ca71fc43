//! Flag table, draft and save endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use domain::{Column, DraftRow, FlagRecord, columns};
use manager::{
    FlagManager, InMemoryFlagBackend, Notification, RecordingNotificationSink, SaveOutcome,
    SaveState,
};
use serde::Serialize;
use tokio::sync::Mutex;

use crate::error::ApiError;

/// The flag manager as wired by the admin server.
pub type AdminManager =
    FlagManager<InMemoryFlagBackend, InMemoryFlagBackend, RecordingNotificationSink>;

/// Shared application state accessible from all handlers.
pub struct AppState {
    /// Requests are serialised through the lock; the manager is single-owner.
    pub manager: Mutex<AdminManager>,
    pub backend: InMemoryFlagBackend,
    pub notifications: RecordingNotificationSink,
}

// -- Response types --

#[derive(Serialize)]
pub struct FlagsResponse {
    pub rows: Vec<FlagRecord>,
    pub drafts: Vec<DraftRow>,
    pub save_state: SaveState,
    pub loaded_at: Option<String>,
}

#[derive(Serialize)]
pub struct RefreshResponse {
    pub rows: usize,
}

#[derive(Serialize)]
pub struct DraftsResponse {
    pub drafts: usize,
}

#[derive(Serialize)]
pub struct DiscardResponse {
    pub discarded: usize,
}

#[derive(Serialize)]
pub struct SaveResponse {
    pub outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl From<SaveOutcome> for SaveResponse {
    fn from(outcome: SaveOutcome) -> Self {
        match outcome {
            SaveOutcome::Saved(summary) => SaveResponse {
                outcome: "saved",
                updated: Some(summary.updated),
                created: Some(summary.created),
                message: None,
            },
            SaveOutcome::Failed(err) => SaveResponse {
                outcome: "failed",
                updated: None,
                created: None,
                message: Some(err.message),
            },
        }
    }
}

// -- Handlers --

/// GET /flags: current table, pending drafts and save state.
#[tracing::instrument(skip(state))]
pub async fn list(State(state): State<Arc<AppState>>) -> Json<FlagsResponse> {
    let manager = state.manager.lock().await;
    Json(FlagsResponse {
        rows: manager.rows().to_vec(),
        drafts: manager.drafts().to_vec(),
        save_state: manager.save_state(),
        loaded_at: manager.table().loaded_at().map(|t| t.to_rfc3339()),
    })
}

/// GET /flags/columns: grid column layout.
pub async fn column_layout() -> Json<Vec<Column>> {
    Json(columns())
}

/// POST /flags/refresh: re-fetch the table from the listing service.
#[tracing::instrument(skip(state))]
pub async fn refresh(
    State(state): State<Arc<AppState>>,
) -> Result<Json<RefreshResponse>, ApiError> {
    let rows = state.manager.lock().await.refresh().await?;
    Ok(Json(RefreshResponse { rows }))
}

/// POST /flags/drafts: stage one edited row.
#[tracing::instrument(skip(state, draft))]
pub async fn stage(
    State(state): State<Arc<AppState>>,
    Json(draft): Json<DraftRow>,
) -> Result<(StatusCode, Json<DraftsResponse>), ApiError> {
    if draft.is_empty() {
        return Err(ApiError::BadRequest(
            "Draft must change at least one field".to_string(),
        ));
    }
    let drafts = state.manager.lock().await.stage(draft)?;
    Ok((StatusCode::ACCEPTED, Json(DraftsResponse { drafts })))
}

/// DELETE /flags/drafts: discard every pending draft.
#[tracing::instrument(skip(state))]
pub async fn discard(
    State(state): State<Arc<AppState>>,
) -> Result<Json<DiscardResponse>, ApiError> {
    let discarded = state.manager.lock().await.discard_drafts()?;
    Ok(Json(DiscardResponse { discarded }))
}

/// POST /flags/save: batch-save the pending drafts.
///
/// A failed batch is a 200 with `outcome: "failed"`; the failure is also
/// on the notification feed.
#[tracing::instrument(skip(state))]
pub async fn save(State(state): State<Arc<AppState>>) -> Result<Json<SaveResponse>, ApiError> {
    let outcome = state.manager.lock().await.save().await?;
    Ok(Json(outcome.into()))
}

/// GET /notifications: every notification emitted so far.
pub async fn notifications(State(state): State<Arc<AppState>>) -> Json<Vec<Notification>> {
    Json(state.notifications.notifications())
}
