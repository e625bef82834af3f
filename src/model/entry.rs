use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::code::{ChangeSummary, CodeState};

/// Description prefix for entries that re-apply a past state.
pub const RESTORED_DESCRIPTION: &str = "Restored from history";

/// Description of the single entry left after the stack is cleared.
pub const RESET_DESCRIPTION: &str = "History reset";

/// Description of entries seeded from the remote version chain.
pub const LOADED_DESCRIPTION: &str = "Loaded from version history";

/// Description of the sentinel entry a fresh stack starts with.
pub const INITIAL_DESCRIPTION: &str = "Initial state";

/// One position in the local undo/redo stack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub code: CodeState,
    /// Chat message whose AI diff produced this state; absent for user saves.
    pub message_id: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub description: String,
    pub change_summary: Option<ChangeSummary>,
    pub is_successful: bool,
}

impl HistoryEntry {
    pub fn new(code: CodeState, description: impl Into<String>) -> Self {
        Self {
            code,
            message_id: None,
            timestamp: Utc::now(),
            description: description.into(),
            change_summary: None,
            is_successful: true,
        }
    }

    pub fn with_message(mut self, message_id: impl Into<String>) -> Self {
        self.message_id = Some(message_id.into());
        self
    }

    pub fn with_summary(mut self, summary: ChangeSummary) -> Self {
        self.change_summary = Some(summary);
        self
    }

    pub fn with_success(mut self, is_successful: bool) -> Self {
        self.is_successful = is_successful;
        self
    }

    /// Replayed states (restores and resets) are never written to the
    /// version store; they would duplicate records already in the chain.
    pub fn is_replay(&self) -> bool {
        self.description.starts_with(RESTORED_DESCRIPTION)
            || self.description.starts_with(RESET_DESCRIPTION)
    }
}
