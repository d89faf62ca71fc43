//! Mutation service trait.

use async_trait::async_trait;
use common::RecordId;
use domain::FieldMap;

use crate::error::ServiceError;

/// The record as stored after a successful mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct MutationResult {
    pub id: RecordId,
    pub fields: FieldMap,
}

/// Write API supporting create and update by identifier.
#[async_trait]
pub trait MutationService: Send + Sync {
    /// Creates a record in `collection` with the given field values.
    async fn create(
        &self,
        collection: &str,
        fields: FieldMap,
    ) -> Result<MutationResult, ServiceError>;

    /// Updates the given fields of an existing record.
    async fn update(&self, id: &RecordId, fields: FieldMap) -> Result<MutationResult, ServiceError>;
}
