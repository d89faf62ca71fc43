//! Domain error types.

use thiserror::Error;

/// Errors raised while projecting a listing response into flag rows.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProjectionError {
    /// A field carried a value of the wrong JSON type.
    #[error("Malformed field '{field}' on record '{record}': expected {expected}")]
    Malformed {
        record: String,
        field: &'static str,
        expected: &'static str,
    },
}
