use tracing::{debug, info, warn};

use crate::history::HistoryStack;
use crate::merge::merge;
use crate::model::changes::CodeChanges;
use crate::model::code::{ChangeSummary, CodeState};
use crate::model::entry::{HistoryEntry, RESTORED_DESCRIPTION};
use crate::model::version::SiteCode;
use crate::reconstruct::reconstruct_from_versions;
use crate::store::client::{PersistRequest, VersionClient};
use crate::store::queue::{PersistQueue, PersistTicket};

/// Description used for entries produced by an applied AI response.
pub const AI_CHANGE_DESCRIPTION: &str = "AI change";

// ---------------------------------------------------------------------------
// EditorSession: buffers, undo/redo and persistence for one site
// ---------------------------------------------------------------------------

/// Editor state for one site.
///
/// Every push goes through [`EditorSession::push`], which records the entry
/// locally and queues it for the version store in the same order. The local
/// stack stays authoritative if persistence fails.
pub struct EditorSession {
    site_code: SiteCode,
    buffers: CodeState,
    history: HistoryStack,
    persister: PersistQueue,
}

impl EditorSession {
    pub fn new(site_code: impl Into<SiteCode>, initial: CodeState, persister: PersistQueue) -> Self {
        Self {
            site_code: site_code.into(),
            history: HistoryStack::new(initial.clone()),
            buffers: initial,
            persister,
        }
    }

    pub fn site_code(&self) -> &str {
        &self.site_code
    }

    /// Current editor contents, saved or not.
    pub fn buffers(&self) -> &CodeState {
        &self.buffers
    }

    pub fn history(&self) -> &HistoryStack {
        &self.history
    }

    /// Replace the editor contents without recording history.
    pub fn set_buffers(&mut self, code: CodeState) {
        self.buffers = code;
    }

    /// Record the current buffers as a user save.
    pub async fn save(&mut self, description: impl Into<String>) -> PersistTicket {
        let previous = self.history.current().code.clone();
        let summary = ChangeSummary::between(&previous, &self.buffers);
        let entry = HistoryEntry::new(self.buffers.clone(), description).with_summary(summary);
        self.push(entry).await
    }

    /// Merge an AI response into the buffers and record the result.
    ///
    /// A response that leaves both buffers unchanged (an empty or
    /// unparseable diff) adds no history entry and writes nothing; `None`
    /// is returned.
    pub async fn apply_ai_changes(
        &mut self,
        changes: &CodeChanges,
        message_id: impl Into<String>,
    ) -> Option<PersistTicket> {
        let before = self.buffers.clone();
        let merged = merge(&before, changes);
        let message_id = message_id.into();
        if merged == before {
            warn!(site = %self.site_code, message_id = %message_id, "AI change left the code unchanged");
            return None;
        }

        let summary = ChangeSummary::between(&before, &merged);
        let entry = HistoryEntry::new(merged, AI_CHANGE_DESCRIPTION)
            .with_message(message_id)
            .with_summary(summary);

        Some(self.push(entry).await)
    }

    /// Push `entry` onto the stack and queue it for persistence.
    pub async fn push(&mut self, entry: HistoryEntry) -> PersistTicket {
        let previous = self.history.current().code.clone();
        self.buffers = entry.code.clone();
        self.history.push(entry.clone());

        self.persister
            .enqueue(PersistRequest::new(self.site_code.clone(), Some(previous), entry))
            .await
    }

    /// Move back one entry. Returns false at the first entry.
    pub fn undo(&mut self) -> bool {
        match self.history.go_back() {
            Some(entry) => {
                self.buffers = entry.code.clone();
                true
            }
            None => false,
        }
    }

    /// Move forward one entry. Returns false at the last entry.
    pub fn redo(&mut self) -> bool {
        match self.history.go_forward() {
            Some(entry) => {
                self.buffers = entry.code.clone();
                true
            }
            None => false,
        }
    }

    /// Re-apply a past entry as the newest one. Not written to the store.
    pub async fn restore_entry(&mut self, index: usize) -> Option<PersistTicket> {
        let past = self.history.get(index)?.clone();
        let entry = HistoryEntry {
            message_id: past.message_id,
            change_summary: None,
            ..HistoryEntry::new(past.code, format!("{RESTORED_DESCRIPTION} (step {index})"))
        };
        Some(self.push(entry).await)
    }

    /// Collapse the history to the current buffers.
    pub fn reset_history(&mut self) {
        self.history.clear(self.buffers.clone());
    }

    /// Seed the stack from the remote chain. Returns the number of steps
    /// loaded; zero leaves the session as it was.
    pub async fn load_remote_history(&mut self, client: &VersionClient) -> usize {
        let versions = client.get_all_versions(&self.site_code).await;
        let steps = reconstruct_from_versions(&versions);
        if steps.is_empty() {
            debug!(site = %self.site_code, "no remote history");
            return 0;
        }

        self.history.seed(&steps);
        self.buffers = self.history.current().code.clone();
        info!(site = %self.site_code, steps = steps.len(), "loaded remote history");
        steps.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::generate_patch;
    use crate::store::version::InMemoryVersionStore;
    use std::sync::Arc;

    fn session(store: Arc<InMemoryVersionStore>) -> EditorSession {
        let queue = PersistQueue::new(Arc::new(VersionClient::new(store)));
        EditorSession::new("site", CodeState::empty(), queue)
    }

    #[tokio::test]
    async fn test_save_pushes_and_persists() {
        let store = Arc::new(InMemoryVersionStore::new());
        let mut session = session(store.clone());

        session.set_buffers(CodeState::new("a();\n", ""));
        let record = session.save("Saved").await.wait().await.unwrap().unwrap();

        assert_eq!(session.history().len(), 2);
        assert_eq!(record.javascript.as_deref(), Some("a();\n"));
        assert_eq!(store.version_count().await, 1);
    }

    #[tokio::test]
    async fn test_apply_ai_changes_records_message() {
        let store = Arc::new(InMemoryVersionStore::new());
        let mut session = session(store);
        session.set_buffers(CodeState::new("console.log(1)", ""));

        let changes = CodeChanges::javascript(generate_patch(
            "console.log(1)",
            "console.log(2)",
            "javascript",
        ));
        let record = session
            .apply_ai_changes(&changes, "msg-1")
            .await
            .unwrap()
            .wait()
            .await
            .unwrap()
            .unwrap();

        assert_eq!(session.buffers(), &CodeState::new("console.log(2)", ""));
        let entry = session.history().current();
        assert_eq!(entry.message_id.as_deref(), Some("msg-1"));
        assert!(entry.is_successful);
        assert_eq!(record.metadata.message_id.as_deref(), Some("msg-1"));
    }

    #[tokio::test]
    async fn test_unapplied_ai_changes_leave_no_trace() {
        let store = Arc::new(InMemoryVersionStore::new());
        let mut session = session(store.clone());
        session.set_buffers(CodeState::new("x = 1;", ""));

        let garbage = CodeChanges::javascript("garbage reply");
        assert!(session.apply_ai_changes(&garbage, "msg-2").await.is_none());

        let empty = CodeChanges::javascript(generate_patch("x = 1;", "x = 1;", "javascript"));
        assert!(session.apply_ai_changes(&empty, "msg-3").await.is_none());

        assert_eq!(session.buffers(), &CodeState::new("x = 1;", ""));
        assert_eq!(session.history().len(), 1);
        assert_eq!(store.version_count().await, 0);
    }

    #[tokio::test]
    async fn test_undo_redo_move_buffers() {
        let store = Arc::new(InMemoryVersionStore::new());
        let mut session = session(store);

        session.set_buffers(CodeState::new("one", ""));
        let _ = session.save("Saved").await;
        session.set_buffers(CodeState::new("two", ""));
        let _ = session.save("Saved").await;

        assert!(session.undo());
        assert_eq!(session.buffers().javascript, "one");
        assert!(session.undo());
        assert_eq!(session.buffers().javascript, "");
        assert!(!session.undo());

        assert!(session.redo());
        assert!(session.redo());
        assert!(!session.redo());
        assert_eq!(session.buffers().javascript, "two");
    }

    #[tokio::test]
    async fn test_restore_and_reset_are_not_persisted() {
        let store = Arc::new(InMemoryVersionStore::new());
        let mut session = session(store.clone());

        session.set_buffers(CodeState::new("v1", ""));
        session.save("Saved").await.wait().await.unwrap();

        let restored = session.restore_entry(0).await.unwrap().wait().await.unwrap();
        assert!(restored.is_none());
        assert_eq!(session.buffers(), &CodeState::empty());
        assert_eq!(session.history().len(), 3);

        session.reset_history();
        assert_eq!(session.history().len(), 1);
        assert_eq!(store.version_count().await, 1);

        assert!(session.restore_entry(7).await.is_none());
    }

    #[tokio::test]
    async fn test_load_remote_history_seeds_stack() {
        let store = Arc::new(InMemoryVersionStore::new());
        {
            let mut writer = session(store.clone());
            for js in ["a\n", "a\nb\n", "a\nb\nc\n"] {
                writer.set_buffers(CodeState::new(js, ""));
                writer.save("Saved").await.wait().await.unwrap();
            }
        }

        let mut reader = session(store.clone());
        let client = VersionClient::new(store);
        assert_eq!(reader.load_remote_history(&client).await, 3);
        assert_eq!(reader.buffers().javascript, "a\nb\nc\n");
        assert_eq!(reader.history().current_index(), 2);

        assert!(reader.undo());
        assert_eq!(reader.buffers().javascript, "a\nb\n");
    }

    #[tokio::test]
    async fn test_load_empty_remote_history_keeps_session() {
        let store = Arc::new(InMemoryVersionStore::new());
        let mut reader = session(store.clone());
        reader.set_buffers(CodeState::new("draft", ""));

        assert_eq!(reader.load_remote_history(&VersionClient::new(store)).await, 0);
        assert_eq!(reader.buffers().javascript, "draft");
        assert_eq!(reader.history().len(), 1);
    }
}
