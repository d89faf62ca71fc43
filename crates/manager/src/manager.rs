//! The flag admin component: table, drafts, save state and lifecycle.

use chrono::{DateTime, Utc};
use domain::{Column, DraftRow, FlagRecord, columns};
use serde::Serialize;

use crate::config::ManagerConfig;
use crate::error::{ManagerError, SaveError};
use crate::reader::FlagReader;
use crate::services::listing::ListingService;
use crate::services::mutation::MutationService;
use crate::services::notification::{Notification, NotificationSink};
use crate::state::{Lifecycle, SaveState};
use crate::subscription::Subscription;
use crate::writer::{BatchSummary, FlagWriter};

const SUCCESS_TITLE: &str = "Success";
const SUCCESS_MESSAGE: &str = "Feature Flags updated";
const ERROR_TITLE: &str = "Error updating or creating records";

/// The rows from the last successful fetch.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FlagTable {
    rows: Vec<FlagRecord>,
    loaded_at: Option<DateTime<Utc>>,
}

impl FlagTable {
    pub fn rows(&self) -> &[FlagRecord] {
        &self.rows
    }

    /// When the table was last replaced; `None` until the first successful fetch.
    pub fn loaded_at(&self) -> Option<DateTime<Utc>> {
        self.loaded_at
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn replace(&mut self, rows: Vec<FlagRecord>) {
        self.rows = rows;
        self.loaded_at = Some(Utc::now());
    }
}

/// The result of a batch save as seen by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Every row was written; drafts were cleared.
    Saved(BatchSummary),
    /// At least one row failed; drafts were kept.
    Failed(SaveError),
}

impl SaveOutcome {
    pub fn is_saved(&self) -> bool {
        matches!(self, SaveOutcome::Saved(_))
    }
}

/// Lists and edits feature flags.
///
/// The manager owns the in-memory table and the pending draft set. Reads go
/// through a [`FlagReader`], writes through a [`FlagWriter`], and every save
/// ends in exactly one notification on the injected sink.
///
/// Call [`initialize`](Self::initialize) once to mount and load the table and
/// [`dispose`](Self::dispose) to release subscriptions. Dropping the manager
/// disposes it.
pub struct FlagManager<L, M, N>
where
    L: ListingService,
    M: MutationService,
    N: NotificationSink,
{
    config: ManagerConfig,
    reader: FlagReader<L>,
    writer: FlagWriter<M>,
    notifier: N,
    table: FlagTable,
    drafts: Vec<DraftRow>,
    save_state: SaveState,
    lifecycle: Lifecycle,
}

impl<L, M, N> FlagManager<L, M, N>
where
    L: ListingService,
    M: MutationService,
    N: NotificationSink,
{
    /// Creates an unmounted manager.
    pub fn new(config: ManagerConfig, listing: L, mutation: M, notifier: N) -> Self {
        let reader = FlagReader::new(listing, config.list_request());
        let writer = FlagWriter::new(mutation, config.collection.clone());
        Self {
            config,
            reader,
            writer,
            notifier,
            table: FlagTable::default(),
            drafts: Vec::new(),
            save_state: SaveState::Idle,
            lifecycle: Lifecycle::Created,
        }
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    pub fn table(&self) -> &FlagTable {
        &self.table
    }

    pub fn rows(&self) -> &[FlagRecord] {
        self.table.rows()
    }

    pub fn drafts(&self) -> &[DraftRow] {
        &self.drafts
    }

    pub fn save_state(&self) -> SaveState {
        self.save_state
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    /// Returns the grid column layout.
    pub fn columns(&self) -> Vec<Column> {
        columns()
    }

    fn ensure_mounted(&self) -> Result<(), ManagerError> {
        match self.lifecycle {
            Lifecycle::Mounted => Ok(()),
            lifecycle => Err(ManagerError::NotMounted { lifecycle }),
        }
    }

    /// Mounts the manager and loads the table.
    ///
    /// A failed first load is logged and leaves the table empty; the manager
    /// stays mounted. Initializing an already mounted manager does nothing.
    #[tracing::instrument(skip(self))]
    pub async fn initialize(&mut self) -> Result<(), ManagerError> {
        match self.lifecycle {
            Lifecycle::Mounted => return Ok(()),
            Lifecycle::Disposed => {
                return Err(ManagerError::NotMounted {
                    lifecycle: Lifecycle::Disposed,
                });
            }
            Lifecycle::Created => {}
        }

        self.lifecycle = Lifecycle::Mounted;
        tracing::info!(collection = %self.config.collection, "flag manager mounted");

        if let Err(e) = self.refresh().await {
            tracing::debug!(error = %e, "initial load failed, table left empty");
        }
        Ok(())
    }

    /// Unmounts the manager: releases every subscription and drops the drafts.
    pub fn dispose(&mut self) {
        if self.lifecycle == Lifecycle::Disposed {
            return;
        }
        let released = self.reader.subscribers().len();
        self.reader.subscribers().clear();
        self.drafts.clear();
        self.lifecycle = Lifecycle::Disposed;
        tracing::info!(released, "flag manager disposed");
    }

    /// Registers a callback receiving every freshly loaded table.
    ///
    /// Allowed before [`initialize`](Self::initialize) so the first load is seen.
    pub fn subscribe<F>(&self, callback: F) -> Result<Subscription, ManagerError>
    where
        F: FnMut(Vec<FlagRecord>) + Send + 'static,
    {
        if self.lifecycle == Lifecycle::Disposed {
            return Err(ManagerError::NotMounted {
                lifecycle: self.lifecycle,
            });
        }
        Ok(self.reader.subscribe(callback))
    }

    /// Re-fetches the table, replacing it wholesale.
    ///
    /// On failure the current table is left untouched. Returns the row count.
    pub async fn refresh(&mut self) -> Result<usize, ManagerError> {
        self.ensure_mounted()?;
        let rows = self.reader.fetch().await?;
        let count = rows.len();
        self.table.replace(rows);
        tracing::info!(rows = count, "flag table refreshed");
        Ok(count)
    }

    /// Adds an edit to the draft set.
    ///
    /// An edit of a row that already has a draft is merged into it; edits of
    /// new rows are appended. Returns the number of pending drafts.
    pub fn stage(&mut self, draft: DraftRow) -> Result<usize, ManagerError> {
        self.ensure_mounted()?;

        let existing = draft
            .record_id()
            .and_then(|id| self.drafts.iter().position(|d| d.record_id() == Some(id)));
        match existing {
            Some(index) => self.drafts[index].merge(draft),
            None => self.drafts.push(draft),
        }
        Ok(self.drafts.len())
    }

    /// Drops every pending draft. Returns how many were dropped.
    pub fn discard_drafts(&mut self) -> Result<usize, ManagerError> {
        self.ensure_mounted()?;
        let discarded = self.drafts.len();
        self.drafts.clear();
        Ok(discarded)
    }

    /// Saves the draft set as one batch.
    ///
    /// On success the drafts are cleared, a success notification is sent and
    /// the table is refreshed. On failure a single error notification carries
    /// the first failure's message and the drafts are kept for a retry. An
    /// empty draft set issues no calls and counts as a success.
    ///
    /// Only lifecycle misuse returns `Err`; save failures are an `Ok(Failed)`.
    #[tracing::instrument(skip(self), fields(drafts = self.drafts.len()))]
    pub async fn save(&mut self) -> Result<SaveOutcome, ManagerError> {
        self.ensure_mounted()?;
        metrics::counter!("flag_saves_total").increment(1);
        let started = std::time::Instant::now();

        if !self.save_state.can_save() {
            // A previous save future was dropped before it settled.
            tracing::warn!(state = %self.save_state, "resetting interrupted save");
            self.save_state = SaveState::Idle;
        }
        self.transition(SaveState::Saving);
        let result = self.writer.save_batch(&self.drafts).await;

        let outcome = match result {
            Ok(summary) => {
                self.transition(SaveState::Saved);
                self.drafts.clear();
                self.notifier
                    .notify(Notification::success(SUCCESS_TITLE, SUCCESS_MESSAGE));
                tracing::info!(
                    updated = summary.updated,
                    created = summary.created,
                    "feature flags saved"
                );

                if let Err(e) = self.refresh().await {
                    tracing::debug!(error = %e, "refresh after save failed");
                }
                SaveOutcome::Saved(summary)
            }
            Err(err) => {
                self.transition(SaveState::Failed);
                metrics::counter!("flag_save_failures_total").increment(1);
                self.notifier
                    .notify(Notification::error(ERROR_TITLE, err.message.clone()));
                tracing::warn!(
                    error = %err,
                    drafts = self.drafts.len(),
                    "feature flag save failed"
                );
                SaveOutcome::Failed(err)
            }
        };

        self.transition(SaveState::Idle);
        metrics::histogram!("flag_save_duration_seconds")
            .record(started.elapsed().as_secs_f64());
        Ok(outcome)
    }

    fn transition(&mut self, next: SaveState) {
        debug_assert!(
            self.save_state.can_transition_to(next),
            "illegal save transition {} -> {}",
            self.save_state,
            next
        );
        tracing::debug!(from = %self.save_state, to = %next, "save state transition");
        self.save_state = next;
    }
}

impl<L, M, N> Drop for FlagManager<L, M, N>
where
    L: ListingService,
    M: MutationService,
    N: NotificationSink,
{
    fn drop(&mut self) {
        self.dispose();
    }
}
