//! In-memory flag backend implementing both listing and mutation.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::RecordId;
use domain::{
    COLLECTION, DraftRow, FieldMap, FieldValue, FlagField, FlagRecord, ListRecordsResponse,
    ListRequest, RawRecord,
};
use serde_json::Value;

use crate::error::ServiceError;
use crate::services::listing::ListingService;
use crate::services::mutation::{MutationResult, MutationService};

/// The only list view the backend knows about.
const ALL_VIEW: &str = "All";

#[derive(Debug, Clone)]
struct StoredRecord {
    collection: String,
    fields: FieldMap,
    last_modified: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct InMemoryFlagState {
    records: HashMap<RecordId, StoredRecord>,
    fail_on_fetch: Option<String>,
    fail_on_create: Option<String>,
    fail_on_update: HashMap<RecordId, String>,
    fetch_calls: usize,
    create_calls: usize,
    update_calls: usize,
}

/// In-memory flag store for tests and local runs.
///
/// Clones share the same records, so a test can keep one handle for
/// seeding and assertions while the manager owns another.
#[derive(Debug, Clone, Default)]
pub struct InMemoryFlagBackend {
    state: Arc<RwLock<InMemoryFlagState>>,
}

impl InMemoryFlagBackend {
    /// Creates an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, InMemoryFlagState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, InMemoryFlagState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Stores a flag directly, bypassing call counters and failure switches.
    pub fn seed(&self, draft: DraftRow) -> RecordId {
        let id = draft.record_id().cloned().unwrap_or_else(RecordId::generate);
        let record = StoredRecord {
            collection: COLLECTION.to_string(),
            fields: draft.fields(),
            last_modified: Utc::now(),
        };
        self.write().records.insert(id.clone(), record);
        id
    }

    /// Makes every fetch fail with `message` until cleared with `None`.
    pub fn set_fail_on_fetch(&self, message: Option<&str>) {
        self.write().fail_on_fetch = message.map(str::to_string);
    }

    /// Makes every create fail with `message` until cleared with `None`.
    pub fn set_fail_on_create(&self, message: Option<&str>) {
        self.write().fail_on_create = message.map(str::to_string);
    }

    /// Makes updates of `id` fail with `message` until cleared with `None`.
    pub fn set_fail_on_update(&self, id: &RecordId, message: Option<&str>) {
        let mut state = self.write();
        match message {
            Some(msg) => {
                state.fail_on_update.insert(id.clone(), msg.to_string());
            }
            None => {
                state.fail_on_update.remove(id);
            }
        }
    }

    /// Returns the stored record as a flag row.
    pub fn get(&self, id: &RecordId) -> Option<FlagRecord> {
        let state = self.read();
        let stored = state.records.get(id)?;
        RawRecord::new(id, &stored.fields).project().ok()
    }

    /// Returns when the record was last written.
    pub fn last_modified(&self, id: &RecordId) -> Option<DateTime<Utc>> {
        self.read().records.get(id).map(|r| r.last_modified)
    }

    pub fn record_count(&self) -> usize {
        self.read().records.len()
    }

    /// Number of fetch calls received, including failed ones.
    pub fn fetch_calls(&self) -> usize {
        self.read().fetch_calls
    }

    /// Number of create calls received, including failed ones.
    pub fn create_calls(&self) -> usize {
        self.read().create_calls
    }

    /// Number of update calls received, including failed ones.
    pub fn update_calls(&self) -> usize {
        self.read().update_calls
    }
}

/// Orders two field values for sorting. Missing and null values sort last.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let (a, b) = (a.filter(|v| !v.is_null()), b.filter(|v| !v.is_null()));
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(Value::String(x)), Some(Value::String(y))) => {
            x.to_lowercase().cmp(&y.to_lowercase())
        }
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.total_cmp(&y)
        }
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(x), Some(y)) => x.to_string().cmp(&y.to_string()),
    }
}

#[async_trait]
impl ListingService for InMemoryFlagBackend {
    async fn fetch(&self, request: &ListRequest) -> Result<ListRecordsResponse, ServiceError> {
        let mut state = self.write();
        state.fetch_calls += 1;

        if let Some(message) = &state.fail_on_fetch {
            return Err(ServiceError::Unavailable(message.clone()));
        }
        if request.list_view != ALL_VIEW {
            return Err(ServiceError::Rejected(format!(
                "List view '{}' does not exist for {}",
                request.list_view, request.collection
            )));
        }

        let mut matching: Vec<(&RecordId, &StoredRecord)> = state
            .records
            .iter()
            .filter(|(_, r)| r.collection == request.collection)
            .collect();

        let sort_field = request.primary_sort_field();
        matching.sort_by(|(a_id, a), (b_id, b)| {
            let ordering = match sort_field {
                Some(field) => compare_values(
                    a.fields.get(field).filter(|v| !v.is_null()),
                    b.fields.get(field).filter(|v| !v.is_null()),
                ),
                None => Ordering::Equal,
            };
            ordering.then_with(|| a_id.cmp(b_id))
        });

        let page_size = request.page_size as usize;
        let has_more = matching.len() > page_size;

        let records = matching
            .into_iter()
            .take(page_size)
            .map(|(id, stored)| RawRecord {
                id: id.to_string(),
                fields: request
                    .field_names()
                    .map(|name| {
                        let value = stored.fields.get(name).cloned().unwrap_or(Value::Null);
                        (name.to_string(), FieldValue::new(value))
                    })
                    .collect(),
            })
            .collect();

        Ok(ListRecordsResponse {
            records,
            next_page_token: has_more.then(|| page_size.to_string()),
        })
    }
}

#[async_trait]
impl MutationService for InMemoryFlagBackend {
    async fn create(
        &self,
        collection: &str,
        fields: FieldMap,
    ) -> Result<MutationResult, ServiceError> {
        let mut state = self.write();
        state.create_calls += 1;

        if let Some(message) = &state.fail_on_create {
            return Err(ServiceError::Rejected(message.clone()));
        }
        let name = FlagField::Name.api_name();
        let has_name = fields
            .get(name)
            .and_then(Value::as_str)
            .is_some_and(|s| !s.is_empty());
        if !has_name {
            return Err(ServiceError::Rejected(format!(
                "Required fields are missing: [{name}]"
            )));
        }

        let id = RecordId::generate();
        state.records.insert(
            id.clone(),
            StoredRecord {
                collection: collection.to_string(),
                fields: fields.clone(),
                last_modified: Utc::now(),
            },
        );

        Ok(MutationResult { id, fields })
    }

    async fn update(&self, id: &RecordId, fields: FieldMap) -> Result<MutationResult, ServiceError> {
        let mut state = self.write();
        state.update_calls += 1;

        if let Some(message) = state.fail_on_update.get(id) {
            return Err(ServiceError::Rejected(message.clone()));
        }

        let stored = state
            .records
            .get_mut(id)
            .ok_or_else(|| ServiceError::NotFound(id.clone()))?;
        stored.fields.extend(fields);
        stored.last_modified = Utc::now();

        Ok(MutationResult {
            id: id.clone(),
            fields: stored.fields.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn flag(name: &str, active: bool, rollout: f64) -> DraftRow {
        DraftRow::new()
            .with_name(name)
            .with_active(active)
            .with_rollout(rollout)
    }

    #[tokio::test]
    async fn test_fetch_sorts_by_name_and_limits_page() {
        let backend = InMemoryFlagBackend::new();
        for name in ["delta", "alpha", "Charlie", "bravo"] {
            backend.seed(flag(name, true, 10.0));
        }

        let request = ListRequest {
            page_size: 3,
            ..ListRequest::default()
        };
        let response = backend.fetch(&request).await.unwrap();

        let names: Vec<_> = response
            .records
            .iter()
            .map(|r| r.fields["Name"].value.as_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["alpha", "bravo", "Charlie"]);
        assert_eq!(response.next_page_token.as_deref(), Some("3"));
        assert_eq!(backend.fetch_calls(), 1);
    }

    #[tokio::test]
    async fn test_fetch_returns_requested_fields_only() {
        let backend = InMemoryFlagBackend::new();
        backend.seed(DraftRow::new().with_name("solo"));

        let mut request = ListRequest::default();
        request.fields.truncate(2);
        let response = backend.fetch(&request).await.unwrap();

        let fields = &response.records[0].fields;
        assert_eq!(fields.len(), 2);
        assert_eq!(fields["Name"].value, json!("solo"));
        assert_eq!(fields["Description__c"].value, Value::Null);
        assert!(response.next_page_token.is_none());
    }

    #[tokio::test]
    async fn test_fetch_unknown_view_is_rejected() {
        let backend = InMemoryFlagBackend::new();
        let request = ListRequest {
            list_view: "Recent".to_string(),
            ..ListRequest::default()
        };
        let err = backend.fetch(&request).await.unwrap_err();
        assert!(matches!(err, ServiceError::Rejected(_)));
    }

    #[tokio::test]
    async fn test_fail_on_fetch() {
        let backend = InMemoryFlagBackend::new();
        backend.set_fail_on_fetch(Some("network down"));
        let err = backend.fetch(&ListRequest::default()).await.unwrap_err();
        assert_eq!(err, ServiceError::Unavailable("network down".to_string()));

        backend.set_fail_on_fetch(None);
        assert!(backend.fetch(&ListRequest::default()).await.is_ok());
    }

    #[tokio::test]
    async fn test_create_and_update() {
        let backend = InMemoryFlagBackend::new();
        let created = backend
            .create(COLLECTION, flag("checkout", false, 0.0).fields())
            .await
            .unwrap();
        assert_eq!(backend.record_count(), 1);

        let patch = DraftRow::for_record(created.id.clone()).with_active(true);
        let updated = backend.update(&created.id, patch.fields()).await.unwrap();
        assert_eq!(updated.fields["Is_Active__c"], json!(true));
        assert_eq!(updated.fields["Name"], json!("checkout"));

        let row = backend.get(&created.id).unwrap();
        assert!(row.is_active());
        assert!(backend.last_modified(&created.id).is_some());
        assert_eq!(backend.create_calls(), 1);
        assert_eq!(backend.update_calls(), 1);
    }

    #[tokio::test]
    async fn test_create_requires_name() {
        let backend = InMemoryFlagBackend::new();
        let err = backend
            .create(COLLECTION, DraftRow::new().with_active(true).fields())
            .await
            .unwrap_err();
        assert_eq!(err.message(), "Required fields are missing: [Name]");
        assert_eq!(backend.record_count(), 0);
    }

    #[tokio::test]
    async fn test_update_missing_record() {
        let backend = InMemoryFlagBackend::new();
        let id = RecordId::new("missing");
        let err = backend.update(&id, FieldMap::new()).await.unwrap_err();
        assert_eq!(err, ServiceError::NotFound(id));
    }

    #[tokio::test]
    async fn test_fail_on_update_targets_one_record() {
        let backend = InMemoryFlagBackend::new();
        let a = backend.seed(flag("a", true, 1.0));
        let b = backend.seed(flag("b", true, 1.0));
        backend.set_fail_on_update(&a, Some("locked"));

        assert!(backend.update(&a, FieldMap::new()).await.is_err());
        assert!(backend.update(&b, FieldMap::new()).await.is_ok());

        backend.set_fail_on_update(&a, None);
        assert!(backend.update(&a, FieldMap::new()).await.is_ok());
    }

    #[test]
    fn test_compare_values_nulls_last() {
        let a = json!("a");
        assert_eq!(compare_values(Some(&a), None), Ordering::Less);
        assert_eq!(compare_values(None, Some(&a)), Ordering::Greater);
        assert_eq!(
            compare_values(Some(&json!(5)), Some(&json!(40.5))),
            Ordering::Less
        );
        assert_eq!(
            compare_values(Some(&Value::Null), Some(&a)),
            Ordering::Greater
        );
    }

    #[tokio::test]
    async fn test_update_clears_null_fields() {
        let backend = InMemoryFlagBackend::new();
        let id = backend.seed(flag("a", true, 40.0).with_description("temporary"));

        let cleared = DraftRow::for_record(id.clone())
            .cleared(FlagField::Description)
            .cleared(FlagField::PercentageRollout);
        backend.update(&id, cleared.fields()).await.unwrap();

        let row = backend.get(&id).unwrap();
        assert_eq!(row.description, None);
        assert_eq!(row.percentage_rollout, None);
        assert_eq!(row.name.as_deref(), Some("a"));
        assert!(row.is_active());
    }
}
