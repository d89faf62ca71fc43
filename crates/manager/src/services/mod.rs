//! External service traits and in-memory implementations.

pub mod listing;
pub mod memory;
pub mod mutation;
pub mod notification;

pub use listing::ListingService;
pub use memory::InMemoryFlagBackend;
pub use mutation::{MutationResult, MutationService};
pub use notification::{
    Notification, NotificationSink, RecordingNotificationSink, TracingNotificationSink, Variant,
};
