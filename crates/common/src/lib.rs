//! Shared types for the feature flag workspace.

pub mod types;

pub use types::RecordId;
