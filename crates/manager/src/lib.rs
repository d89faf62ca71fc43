//! Feature flag administration workflow.
//!
//! This crate wires a listing service and a mutation service into an
//! editable flag table:
//! - [`FlagReader`] fetches one page of flags and publishes it to subscribers
//! - [`FlagWriter`] saves a batch of draft rows concurrently
//! - [`FlagManager`] owns the table, the draft set and the save state machine
//!
//! External collaborators are traits in [`services`], each with an
//! in-memory implementation for tests and local runs.

pub mod config;
pub mod error;
pub mod manager;
pub mod reader;
pub mod services;
pub mod state;
pub mod subscription;
pub mod writer;

pub use config::ManagerConfig;
pub use error::{FetchError, ManagerError, SaveError, ServiceError};
pub use manager::{FlagManager, FlagTable, SaveOutcome};
pub use reader::FlagReader;
pub use services::{
    InMemoryFlagBackend, ListingService, MutationResult, MutationService, Notification,
    NotificationSink, RecordingNotificationSink, TracingNotificationSink, Variant,
};
pub use state::{Lifecycle, SaveState};
pub use subscription::{Subscribers, Subscription};
pub use writer::{BatchSummary, FlagWriter, Mutation};
