//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use manager::{FetchError, ManagerError};

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Bad request from the client.
    BadRequest(String),
    /// Flag manager error.
    Manager(ManagerError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Manager(err) => manager_error_to_response(err),
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn manager_error_to_response(err: ManagerError) -> (StatusCode, String) {
    match &err {
        ManagerError::NotMounted { .. } => (StatusCode::CONFLICT, err.to_string()),
        ManagerError::Fetch(FetchError::Service(_)) => (StatusCode::BAD_GATEWAY, err.to_string()),
        ManagerError::Fetch(FetchError::Malformed(_)) => {
            tracing::error!(error = %err, "listing returned a malformed response");
            (StatusCode::BAD_GATEWAY, err.to_string())
        }
    }
}

impl From<ManagerError> for ApiError {
    fn from(err: ManagerError) -> Self {
        ApiError::Manager(err)
    }
}
