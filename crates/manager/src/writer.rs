//! Flag writer: batch save of draft rows.

use common::RecordId;
use domain::{DraftRow, FieldMap};
use futures_util::StreamExt;
use futures_util::stream::FuturesUnordered;
use serde::Serialize;

use crate::error::{SaveError, ServiceError};
use crate::services::mutation::{MutationResult, MutationService};

/// The mutation call a single draft row turns into.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    Create { collection: String, fields: FieldMap },
    Update { id: RecordId, fields: FieldMap },
}

impl Mutation {
    /// Routes a draft: a draft with an ID updates it, any other draft creates
    /// a record in `collection`.
    pub fn plan(draft: &DraftRow, collection: &str) -> Self {
        match draft.record_id() {
            Some(id) => Mutation::Update {
                id: id.clone(),
                fields: draft.fields(),
            },
            None => Mutation::Create {
                collection: collection.to_string(),
                fields: draft.fields(),
            },
        }
    }

    /// Returns `"create"` or `"update"`.
    pub fn operation(&self) -> &'static str {
        match self {
            Mutation::Create { .. } => "create",
            Mutation::Update { .. } => "update",
        }
    }
}

/// Counts of a fully successful batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub updated: usize,
    pub created: usize,
}

impl BatchSummary {
    pub fn total(&self) -> usize {
        self.updated + self.created
    }
}

/// Saves draft rows through a mutation service.
pub struct FlagWriter<M: MutationService> {
    mutation: M,
    collection: String,
}

impl<M: MutationService> FlagWriter<M> {
    /// Creates a writer; new records go into `collection`.
    pub fn new(mutation: M, collection: impl Into<String>) -> Self {
        Self {
            mutation,
            collection: collection.into(),
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Saves every draft with one concurrent call per row.
    ///
    /// Resolves once all calls have settled. Succeeds only if every call
    /// succeeded; otherwise returns the message of the earliest failure to
    /// arrive. Rows that did succeed stay written.
    #[tracing::instrument(skip(self, drafts), fields(rows = drafts.len()))]
    pub async fn save_batch(&self, drafts: &[DraftRow]) -> Result<BatchSummary, SaveError> {
        let plan: Vec<Mutation> = drafts
            .iter()
            .map(|draft| Mutation::plan(draft, &self.collection))
            .collect();

        let mut pending: FuturesUnordered<_> = plan
            .iter()
            .map(|mutation| async move { (mutation, self.execute(mutation).await) })
            .collect();

        let mut summary = BatchSummary::default();
        let mut first_failure: Option<String> = None;

        while let Some((mutation, result)) = pending.next().await {
            match (mutation, result) {
                (Mutation::Create { .. }, Ok(_)) => summary.created += 1,
                (Mutation::Update { .. }, Ok(_)) => summary.updated += 1,
                (mutation, Err(e)) => {
                    tracing::warn!(
                        operation = mutation.operation(),
                        target = %target(mutation),
                        error = %e,
                        "flag mutation failed"
                    );
                    first_failure.get_or_insert_with(|| e.message());
                }
            }
        }

        match first_failure {
            Some(message) => Err(SaveError { message }),
            None => Ok(summary),
        }
    }

    async fn execute(&self, mutation: &Mutation) -> Result<MutationResult, ServiceError> {
        metrics::counter!("flag_mutations_total", "operation" => mutation.operation())
            .increment(1);
        match mutation {
            Mutation::Create { collection, fields } => {
                self.mutation.create(collection, fields.clone()).await
            }
            Mutation::Update { id, fields } => self.mutation.update(id, fields.clone()).await,
        }
    }
}

fn target(mutation: &Mutation) -> &str {
    match mutation {
        Mutation::Create { collection, .. } => collection.as_str(),
        Mutation::Update { id, .. } => id.as_str(),
    }
}
