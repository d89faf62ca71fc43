//! Domain layer for feature flag administration.
//!
//! This crate provides the data shapes shared by the reader and writer:
//! - [`FlagRecord`], the flat row shown in the admin grid
//! - [`DraftRow`], a sparse user edit waiting to be saved
//! - [`FlagField`] and [`Column`], the fixed editable columns
//! - [`ListRequest`] / [`ListRecordsResponse`] and the projection between them

pub mod error;
pub mod fields;
pub mod listing;
pub mod record;

pub use error::ProjectionError;
pub use fields::{COLLECTION, Column, ColumnKind, FlagField, columns};
pub use listing::{FieldValue, ListRecordsResponse, ListRequest, RawRecord, project_records};
pub use record::{DraftRow, FieldMap, FlagRecord};
