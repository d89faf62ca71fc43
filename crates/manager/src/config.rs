//! Reader configuration.

use domain::{COLLECTION, FlagField, ListRequest};

/// Which collection and list view the manager reads, and how.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagerConfig {
    /// Collection API name; new records are created here too.
    pub collection: String,
    pub list_view: String,
    pub page_size: u32,
    pub sort_field: FlagField,
}

impl ManagerConfig {
    /// Builds the listing request for the configured page.
    pub fn list_request(&self) -> ListRequest {
        ListRequest::for_flags(
            self.collection.clone(),
            self.list_view.clone(),
            self.sort_field,
            self.page_size,
        )
    }
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            collection: COLLECTION.to_string(),
            list_view: "All".to_string(),
            page_size: 10,
            sort_field: FlagField::Name,
        }
    }
}
