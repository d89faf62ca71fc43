//! Flag reader: fetch one page and project it into rows.

use domain::{FlagRecord, ListRequest, project_records};

use crate::error::FetchError;
use crate::services::listing::ListingService;
use crate::subscription::{Subscribers, Subscription};

/// Fetches the flag table from a listing service.
///
/// Every successful fetch is published to the registered subscribers. A
/// failed fetch is logged and publishes nothing.
pub struct FlagReader<L: ListingService> {
    listing: L,
    request: ListRequest,
    subscribers: Subscribers,
}

impl<L: ListingService> FlagReader<L> {
    /// Creates a reader issuing `request` against `listing`.
    pub fn new(listing: L, request: ListRequest) -> Self {
        Self {
            listing,
            request,
            subscribers: Subscribers::new(),
        }
    }

    pub fn request(&self) -> &ListRequest {
        &self.request
    }

    pub fn subscribers(&self) -> &Subscribers {
        &self.subscribers
    }

    /// Registers a callback receiving every freshly fetched table.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: FnMut(Vec<FlagRecord>) + Send + 'static,
    {
        self.subscribers.subscribe(callback)
    }

    /// Fetches the first page and projects it, preserving listing order.
    #[tracing::instrument(
        skip(self),
        fields(collection = %self.request.collection, list_view = %self.request.list_view)
    )]
    pub async fn fetch(&self) -> Result<Vec<FlagRecord>, FetchError> {
        metrics::counter!("flag_fetches_total").increment(1);

        let rows = match self.load().await {
            Ok(rows) => rows,
            Err(e) => {
                metrics::counter!("flag_fetch_failures_total").increment(1);
                tracing::error!(error = %e, "failed to fetch feature flags");
                return Err(e);
            }
        };

        tracing::debug!(rows = rows.len(), "feature flags fetched");
        self.subscribers.publish(&rows);
        Ok(rows)
    }

    async fn load(&self) -> Result<Vec<FlagRecord>, FetchError> {
        let response = self.listing.fetch(&self.request).await?;
        if response.next_page_token.is_some() {
            tracing::debug!(
                page_size = self.request.page_size,
                "listing has more records than one page; only the first page is shown"
            );
        }
        Ok(project_records(&response)?)
    }
}
