//! Flag rows and draft edits.

use std::collections::BTreeMap;

use common::RecordId;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::fields::FlagField;

/// Field values keyed by API name, as passed to the mutation service.
pub type FieldMap = BTreeMap<String, Value>;

/// A feature flag as shown in the admin grid.
///
/// Every field is optional: the listing service may omit any of them and
/// the projection keeps them absent rather than failing.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FlagRecord {
    #[serde(
        rename = "Id",
        default,
        deserialize_with = "deserialize_record_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<RecordId>,

    #[serde(rename = "Name", default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(
        rename = "Description__c",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<String>,

    #[serde(
        rename = "Is_Active__c",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub is_active: Option<bool>,

    #[serde(
        rename = "Percentage_Rollout__c",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub percentage_rollout: Option<f64>,
}

impl FlagRecord {
    /// Returns true if the record has been persisted.
    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    /// Returns the active flag, treating an absent value as `false`.
    pub fn is_active(&self) -> bool {
        self.is_active.unwrap_or(false)
    }
}

/// A user edit that has not been saved yet.
///
/// Only the fields the user touched are set. A draft with an [`id`](Self::id)
/// updates that record; a draft without one creates a new record.
///
/// Each field is `None` when untouched and `Some(None)` when the user cleared
/// the cell. A cleared cell is sent to the mutation service as `null`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DraftRow {
    #[serde(
        rename = "Id",
        default,
        deserialize_with = "deserialize_record_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<RecordId>,

    #[serde(
        rename = "Name",
        default,
        deserialize_with = "deserialize_edit",
        skip_serializing_if = "Option::is_none"
    )]
    pub name: Option<Option<String>>,

    #[serde(
        rename = "Description__c",
        default,
        deserialize_with = "deserialize_edit",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<Option<String>>,

    #[serde(
        rename = "Is_Active__c",
        default,
        deserialize_with = "deserialize_edit",
        skip_serializing_if = "Option::is_none"
    )]
    pub is_active: Option<Option<bool>>,

    #[serde(
        rename = "Percentage_Rollout__c",
        default,
        deserialize_with = "deserialize_edit",
        skip_serializing_if = "Option::is_none"
    )]
    pub percentage_rollout: Option<Option<f64>>,
}

impl DraftRow {
    /// Creates an empty draft for a new record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty draft editing an existing record.
    pub fn for_record(id: impl Into<RecordId>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(Some(name.into()));
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(Some(description.into()));
        self
    }

    pub fn with_active(mut self, active: bool) -> Self {
        self.is_active = Some(Some(active));
        self
    }

    pub fn with_rollout(mut self, percentage: f64) -> Self {
        self.percentage_rollout = Some(Some(percentage));
        self
    }

    /// Marks `field` as cleared.
    pub fn cleared(mut self, field: FlagField) -> Self {
        match field {
            FlagField::Name => self.name = Some(None),
            FlagField::Description => self.description = Some(None),
            FlagField::IsActive => self.is_active = Some(None),
            FlagField::PercentageRollout => self.percentage_rollout = Some(None),
        }
        self
    }

    /// Returns the target record ID, if the draft edits an existing record.
    ///
    /// A blank ID counts as absent.
    pub fn record_id(&self) -> Option<&RecordId> {
        self.id.as_ref().filter(|id| !id.as_str().is_empty())
    }

    /// Returns true if no field has been edited.
    pub fn is_empty(&self) -> bool {
        self.fields().is_empty()
    }

    /// Returns the edited fields keyed by API name, with cleared cells as
    /// `null`. The ID is never included.
    pub fn fields(&self) -> FieldMap {
        let mut fields = FieldMap::new();
        let mut put = |field: FlagField, value: Option<Value>| {
            if let Some(value) = value {
                fields.insert(field.api_name().to_string(), value);
            }
        };
        put(FlagField::Name, edit_value(&self.name));
        put(FlagField::Description, edit_value(&self.description));
        put(FlagField::IsActive, edit_value(&self.is_active));
        put(FlagField::PercentageRollout, edit_value(&self.percentage_rollout));
        fields
    }

    /// Folds a later edit of the same row into this one. Fields touched in
    /// `later` win, including cleared ones; untouched fields keep their
    /// current value.
    pub fn merge(&mut self, later: DraftRow) {
        if later.id.is_some() {
            self.id = later.id;
        }
        if later.name.is_some() {
            self.name = later.name;
        }
        if later.description.is_some() {
            self.description = later.description;
        }
        if later.is_active.is_some() {
            self.is_active = later.is_active;
        }
        if later.percentage_rollout.is_some() {
            self.percentage_rollout = later.percentage_rollout;
        }
    }
}

fn edit_value<T>(edit: &Option<Option<T>>) -> Option<Value>
where
    T: Clone + Into<Value>,
{
    edit.as_ref().map(|value| value.clone().map_or(Value::Null, Into::into))
}

/// Reads a present field as `Some`, so an explicit `null` becomes `Some(None)`.
fn deserialize_edit<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Reads an optional ID, mapping blank strings to `None`.
fn deserialize_record_id<'de, D>(deserializer: D) -> Result<Option<RecordId>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(RecordId::parse))
}
