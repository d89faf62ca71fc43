//! Error types for the flag workflow.

use common::RecordId;
use domain::ProjectionError;
use thiserror::Error;

use crate::state::Lifecycle;

/// Errors returned by an external listing or mutation service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    /// The service refused the request; the message is meant for users.
    #[error("{0}")]
    Rejected(String),

    /// The targeted record does not exist.
    #[error("Record not found: {0}")]
    NotFound(RecordId),

    /// The service could not be reached.
    #[error("Service unavailable: {0}")]
    Unavailable(String),
}

impl ServiceError {
    /// Returns the body message shown to users.
    pub fn message(&self) -> String {
        match self {
            ServiceError::Rejected(msg) | ServiceError::Unavailable(msg) => msg.clone(),
            ServiceError::NotFound(id) => format!("Record {id} does not exist"),
        }
    }
}

/// Errors that can occur while fetching the flag table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The listing service failed.
    #[error("Listing service error: {0}")]
    Service(#[from] ServiceError),

    /// The listing response could not be projected.
    #[error("Malformed listing response: {0}")]
    Malformed(#[from] ProjectionError),
}

/// A failed batch save.
///
/// Only the earliest failure to arrive is kept.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Batch save failed: {message}")]
pub struct SaveError {
    /// Body message of the first failed mutation.
    pub message: String,
}

/// Errors returned by [`FlagManager`](crate::FlagManager) operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ManagerError {
    /// The manager is not mounted.
    #[error("Manager is not mounted (lifecycle: {lifecycle})")]
    NotMounted { lifecycle: Lifecycle },

    /// Fetching the table failed.
    #[error(transparent)]
    Fetch(#[from] FetchError),
}
