//! Listing service trait.

use async_trait::async_trait;
use domain::{ListRecordsResponse, ListRequest};

use crate::error::ServiceError;

/// Read API returning one page of records for a named list view.
#[async_trait]
pub trait ListingService: Send + Sync {
    /// Fetches the first page described by `request`.
    async fn fetch(&self, request: &ListRequest) -> Result<ListRecordsResponse, ServiceError>;
}
