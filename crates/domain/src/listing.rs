//! Listing request/response shapes and the projection into flag rows.

use std::collections::HashMap;

use common::RecordId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ProjectionError;
use crate::fields::{COLLECTION, FlagField};
use crate::record::{FieldMap, FlagRecord};

/// A request for one page of a named list view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListRequest {
    /// Collection API name, e.g. `Feature_Flag__c`.
    pub collection: String,
    /// List view API name, e.g. `All`.
    pub list_view: String,
    /// Qualified field names (`<collection>.<field>`) to return.
    pub fields: Vec<String>,
    /// Qualified field names to sort by, in priority order.
    pub sort_by: Vec<String>,
    /// Maximum number of records in the page.
    pub page_size: u32,
}

impl ListRequest {
    /// Builds a request for every flag field of `collection`, sorted by `sort_field`.
    pub fn for_flags(
        collection: impl Into<String>,
        list_view: impl Into<String>,
        sort_field: FlagField,
        page_size: u32,
    ) -> Self {
        let collection = collection.into();
        let fields = FlagField::ALL
            .iter()
            .map(|f| f.qualified(&collection))
            .collect();
        let sort_by = vec![sort_field.qualified(&collection)];
        Self {
            collection,
            list_view: list_view.into(),
            fields,
            sort_by,
            page_size,
        }
    }

    /// Returns the unqualified field names requested.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| unqualify(f))
    }

    /// Returns the unqualified name of the primary sort field, if any.
    pub fn primary_sort_field(&self) -> Option<&str> {
        self.sort_by.first().map(|f| unqualify(f))
    }
}

impl Default for ListRequest {
    fn default() -> Self {
        Self::for_flags(COLLECTION, "All", FlagField::Name, 10)
    }
}

fn unqualify(field: &str) -> &str {
    field.rsplit_once('.').map_or(field, |(_, name)| name)
}

/// A single field's value as returned by the listing service.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FieldValue {
    #[serde(default)]
    pub value: Value,
    #[serde(
        rename = "displayValue",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub display_value: Option<String>,
}

impl FieldValue {
    pub fn new(value: impl Into<Value>) -> Self {
        Self {
            value: value.into(),
            display_value: None,
        }
    }
}

/// A raw record from the listing service.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RawRecord {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub fields: HashMap<String, FieldValue>,
}

impl RawRecord {
    /// Builds a raw record from stored field values.
    pub fn new(id: &RecordId, fields: &FieldMap) -> Self {
        Self {
            id: id.to_string(),
            fields: fields
                .iter()
                .map(|(name, value)| (name.clone(), FieldValue::new(value.clone())))
                .collect(),
        }
    }

    /// Returns the value of `field`, or `None` if it is missing or null.
    fn value(&self, field: FlagField) -> Option<&Value> {
        self.fields
            .get(field.api_name())
            .map(|f| &f.value)
            .filter(|v| !v.is_null())
    }

    fn malformed(&self, field: FlagField, expected: &'static str) -> ProjectionError {
        ProjectionError::Malformed {
            record: self.id.clone(),
            field: field.api_name(),
            expected,
        }
    }

    fn string(&self, field: FlagField) -> Result<Option<String>, ProjectionError> {
        match self.value(field) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(_) => Err(self.malformed(field, "string")),
        }
    }

    fn boolean(&self, field: FlagField) -> Result<Option<bool>, ProjectionError> {
        match self.value(field) {
            None => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(*b)),
            Some(_) => Err(self.malformed(field, "boolean")),
        }
    }

    fn number(&self, field: FlagField) -> Result<Option<f64>, ProjectionError> {
        match self.value(field) {
            None => Ok(None),
            Some(Value::Number(n)) => n
                .as_f64()
                .map(Some)
                .ok_or_else(|| self.malformed(field, "number")),
            Some(_) => Err(self.malformed(field, "number")),
        }
    }

    /// Projects this record into a flat flag row.
    pub fn project(&self) -> Result<FlagRecord, ProjectionError> {
        Ok(FlagRecord {
            id: RecordId::parse(&self.id),
            name: self.string(FlagField::Name)?,
            description: self.string(FlagField::Description)?,
            is_active: self.boolean(FlagField::IsActive)?,
            percentage_rollout: self.number(FlagField::PercentageRollout)?,
        })
    }
}

/// One page of records from the listing service.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ListRecordsResponse {
    #[serde(default)]
    pub records: Vec<RawRecord>,
    #[serde(
        rename = "nextPageToken",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub next_page_token: Option<String>,
}

/// Projects every record of a listing response, preserving order.
///
/// Fails on the first record with a mistyped field; no partial result is returned.
pub fn project_records(response: &ListRecordsResponse) -> Result<Vec<FlagRecord>, ProjectionError> {
    response.records.iter().map(RawRecord::project).collect()
}
