use crate::model::code::CodeState;
use crate::model::entry::{HistoryEntry, INITIAL_DESCRIPTION, LOADED_DESCRIPTION, RESET_DESCRIPTION};
use crate::model::version::ReconstructedStep;

// ---------------------------------------------------------------------------
// HistoryStack: local undo/redo of code states
// ---------------------------------------------------------------------------

/// Undo/redo stack with a cursor.
///
/// The stack is never empty and `0 <= current_index < len()` always holds.
/// Pushing after moving back discards the entries ahead of the cursor.
/// Callers serialize mutations; there is no internal locking.
#[derive(Debug, Clone)]
pub struct HistoryStack {
    entries: Vec<HistoryEntry>,
    current_index: usize,
}

impl HistoryStack {
    /// Start with a single sentinel entry holding `initial`.
    pub fn new(initial: CodeState) -> Self {
        Self {
            entries: vec![HistoryEntry::new(initial, INITIAL_DESCRIPTION)],
            current_index: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Never true: the stack always holds at least its initial entry.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current(&self) -> &HistoryEntry {
        &self.entries[self.current_index]
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&HistoryEntry> {
        self.entries.get(index)
    }

    pub fn can_go_back(&self) -> bool {
        self.current_index > 0
    }

    pub fn can_go_forward(&self) -> bool {
        self.current_index + 1 < self.entries.len()
    }

    /// Drop everything after the cursor, append `entry` and move onto it.
    pub fn push(&mut self, entry: HistoryEntry) {
        self.entries.truncate(self.current_index + 1);
        self.entries.push(entry);
        self.current_index = self.entries.len() - 1;
    }

    /// Step back one entry. Returns `None` at the first entry.
    pub fn go_back(&mut self) -> Option<&HistoryEntry> {
        if !self.can_go_back() {
            return None;
        }
        self.current_index -= 1;
        Some(self.current())
    }

    /// Step forward one entry. Returns `None` at the last entry.
    pub fn go_forward(&mut self) -> Option<&HistoryEntry> {
        if !self.can_go_forward() {
            return None;
        }
        self.current_index += 1;
        Some(self.current())
    }

    /// Collapse to one entry holding the current editor buffers.
    pub fn clear(&mut self, current: CodeState) {
        self.entries = vec![HistoryEntry::new(current, RESET_DESCRIPTION)];
        self.current_index = 0;
    }

    /// Replace the stack with reconstructed steps, cursor on the latest.
    /// An empty slice leaves the stack untouched.
    pub fn seed(&mut self, steps: &[ReconstructedStep]) {
        if steps.is_empty() {
            return;
        }

        self.entries = steps
            .iter()
            .map(|step| HistoryEntry {
                message_id: step.message_id.clone(),
                change_summary: step.change_summary.clone(),
                ..HistoryEntry::new(step.code(), LOADED_DESCRIPTION)
            })
            .collect();
        self.current_index = self.entries.len() - 1;
    }
}
