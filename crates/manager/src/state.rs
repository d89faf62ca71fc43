//! Save state machine and component lifecycle.

use serde::{Deserialize, Serialize};

/// The state of a batch save.
///
/// State transitions (per save invocation):
/// ```text
/// Idle ──► Saving ──┬──► Saved ──► Idle   (after the refresh)
///                   └──► Failed ──► Idle  (drafts kept for a retry)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum SaveState {
    /// No save in progress.
    #[default]
    Idle,

    /// Mutation calls are in flight.
    Saving,

    /// Every call succeeded; the table is being refreshed.
    Saved,

    /// At least one call failed.
    Failed,
}

impl SaveState {
    /// Returns true if a new save may start.
    pub fn can_save(&self) -> bool {
        matches!(self, SaveState::Idle)
    }

    /// Returns true once the batch has settled one way or the other.
    pub fn is_settled(&self) -> bool {
        matches!(self, SaveState::Saved | SaveState::Failed)
    }

    /// Returns true if `next` is a legal successor of this state.
    pub fn can_transition_to(&self, next: SaveState) -> bool {
        matches!(
            (self, next),
            (SaveState::Idle, SaveState::Saving)
                | (SaveState::Saving, SaveState::Saved)
                | (SaveState::Saving, SaveState::Failed)
                | (SaveState::Saved, SaveState::Idle)
                | (SaveState::Failed, SaveState::Idle)
        )
    }

    /// Returns the state name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            SaveState::Idle => "Idle",
            SaveState::Saving => "Saving",
            SaveState::Saved => "Saved",
            SaveState::Failed => "Failed",
        }
    }
}

impl std::fmt::Display for SaveState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Where the manager is in its mount lifecycle.
///
/// `Created ──► Mounted ──► Disposed`; a manager that was never mounted
/// may be disposed directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Lifecycle {
    #[default]
    Created,
    Mounted,
    Disposed,
}

impl Lifecycle {
    pub fn as_str(&self) -> &'static str {
        match self {
            Lifecycle::Created => "Created",
            Lifecycle::Mounted => "Mounted",
            Lifecycle::Disposed => "Disposed",
        }
    }
}

impl std::fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
