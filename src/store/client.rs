use std::sync::Arc;
use tracing::{debug, warn};

use crate::config::{HistoryConfig, DEFAULT_SNAPSHOT_INTERVAL};
use crate::diff::generate_patch;
use crate::error::PagesmithResult;
use crate::model::code::CodeState;
use crate::model::entry::HistoryEntry;
use crate::model::version::{NewVersion, SiteCode, VersionMetadata, VersionRecord};
use crate::store::version::VersionStore;

/// One history step to persist: the state before and the entry just pushed.
#[derive(Debug, Clone)]
pub struct PersistRequest {
    pub site_code: SiteCode,
    /// Code of the entry preceding `entry`; `None` means empty buffers.
    pub previous: Option<CodeState>,
    pub entry: HistoryEntry,
}

impl PersistRequest {
    pub fn new(site_code: impl Into<SiteCode>, previous: Option<CodeState>, entry: HistoryEntry) -> Self {
        Self {
            site_code: site_code.into(),
            previous,
            entry,
        }
    }
}

// ---------------------------------------------------------------------------
// VersionClient: read/write policy over a VersionStore
// ---------------------------------------------------------------------------

/// Wraps a [`VersionStore`] with the history persistence policy.
///
/// Reads degrade to "no history" on failure so a cold start can proceed.
/// Writes propagate their errors.
#[derive(Clone)]
pub struct VersionClient {
    store: Arc<dyn VersionStore>,
    snapshot_interval: u32,
}

impl VersionClient {
    pub fn new(store: Arc<dyn VersionStore>) -> Self {
        Self {
            store,
            snapshot_interval: DEFAULT_SNAPSHOT_INTERVAL,
        }
    }

    /// Client with the configured snapshot interval.
    pub fn from_config(store: Arc<dyn VersionStore>, config: &HistoryConfig) -> Self {
        Self::new(store).with_snapshot_interval(config.snapshot_interval)
    }

    /// Write a full snapshot once this many patches would be chained.
    pub fn with_snapshot_interval(mut self, interval: u32) -> Self {
        self.snapshot_interval = interval.max(1);
        self
    }

    pub fn snapshot_interval(&self) -> u32 {
        self.snapshot_interval
    }

    /// Latest record for the site, or `None` when there is none or the
    /// store cannot be reached.
    pub async fn get_head(&self, site_code: &str) -> Option<VersionRecord> {
        match self.store.head(site_code).await {
            Ok(head) => head,
            Err(err) => {
                warn!(site = site_code, error = %err, "failed to fetch version head");
                None
            }
        }
    }

    /// The site's full chain, ascending by `created_at`. Empty on failure.
    pub async fn get_all_versions(&self, site_code: &str) -> Vec<VersionRecord> {
        match self.store.list(site_code).await {
            Ok(mut versions) => {
                versions.sort_by_key(|record| record.created_at);
                versions
            }
            Err(err) => {
                warn!(site = site_code, error = %err, "failed to fetch version chain");
                Vec::new()
            }
        }
    }

    pub async fn save_version(&self, site_code: &str, version: NewVersion) -> PagesmithResult<VersionRecord> {
        self.store.append(site_code, version).await
    }

    /// Persist one pushed history entry as a snapshot or a patch.
    ///
    /// Returns `Ok(None)` for replayed entries (restores and resets), which
    /// are never written.
    pub async fn persist_history_step(&self, request: &PersistRequest) -> PagesmithResult<Option<VersionRecord>> {
        let entry = &request.entry;
        if entry.is_replay() {
            debug!(
                site = %request.site_code,
                description = %entry.description,
                "skipping replayed history entry"
            );
            return Ok(None);
        }

        let metadata = VersionMetadata {
            message_id: entry.message_id.clone(),
            change_summary: entry.change_summary.clone(),
        };

        let version = match self.get_head(&request.site_code).await {
            None => {
                debug!(site = %request.site_code, "no head, writing initial snapshot");
                NewVersion::snapshot(None, &entry.code)
            }
            Some(head) => {
                let patch_count = head.patch_count_from_snapshot + 1;
                if patch_count >= self.snapshot_interval {
                    debug!(site = %request.site_code, patch_count, "snapshot interval reached");
                    NewVersion::snapshot(Some(head.id), &entry.code)
                } else {
                    let empty = CodeState::empty();
                    let previous = request.previous.as_ref().unwrap_or(&empty);
                    NewVersion::patch(
                        head.id,
                        generate_patch(&previous.javascript, &entry.code.javascript, "javascript"),
                        generate_patch(&previous.css, &entry.code.css, "css"),
                        patch_count,
                    )
                }
            }
        };

        let record = self
            .save_version(&request.site_code, version.with_metadata(metadata))
            .await?;
        Ok(Some(record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PagesmithError;
    use crate::model::version::VersionKind;
    use crate::store::version::InMemoryVersionStore;
    use async_trait::async_trait;

    /// Store that fails every call.
    struct UnreachableStore;

    #[async_trait]
    impl VersionStore for UnreachableStore {
        async fn head(&self, _site_code: &str) -> PagesmithResult<Option<VersionRecord>> {
            Err(PagesmithError::Unauthorized("token expired".to_string()))
        }

        async fn list(&self, _site_code: &str) -> PagesmithResult<Vec<VersionRecord>> {
            Err(PagesmithError::Remote {
                status: 503,
                message: "down".to_string(),
            })
        }

        async fn append(&self, _site_code: &str, _version: NewVersion) -> PagesmithResult<VersionRecord> {
            Err(PagesmithError::Remote {
                status: 503,
                message: "down".to_string(),
            })
        }
    }

    fn request(previous: &str, current: &str) -> PersistRequest {
        PersistRequest::new(
            "site",
            Some(CodeState::new(previous, "")),
            HistoryEntry::new(CodeState::new(current, ""), "Saved"),
        )
    }

    #[tokio::test]
    async fn test_reads_degrade_on_failure() {
        let client = VersionClient::new(Arc::new(UnreachableStore));
        assert!(client.get_head("site").await.is_none());
        assert!(client.get_all_versions("site").await.is_empty());
    }

    #[tokio::test]
    async fn test_save_failure_propagates() {
        let client = VersionClient::new(Arc::new(UnreachableStore));
        let result = client.persist_history_step(&request("", "a")).await;
        assert!(matches!(result, Err(PagesmithError::Remote { status: 503, .. })));
    }

    #[tokio::test]
    async fn test_first_step_is_snapshot_then_patch() {
        let client = VersionClient::new(Arc::new(InMemoryVersionStore::new()));

        let first = client
            .persist_history_step(&request("", "a\n"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(first.kind, VersionKind::Snapshot);
        assert_eq!(first.javascript.as_deref(), Some("a\n"));
        assert!(first.parent_id.is_none());

        let second = client
            .persist_history_step(&request("a\n", "a\nb\n"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(second.kind, VersionKind::Patch);
        assert_eq!(second.parent_id.as_deref(), Some(first.id.as_str()));
        assert_eq!(second.patch_count_from_snapshot, 1);
        assert_eq!(
            second.js_patch.as_deref(),
            Some("--- javascript\n+++ javascript\n@@ -1,0 +2 @@\n+b\n")
        );
        assert_eq!(second.css_patch.as_deref(), Some(""));
        assert!(second.javascript.is_none());
    }

    #[tokio::test]
    async fn test_replayed_entries_are_skipped() {
        let store = Arc::new(InMemoryVersionStore::new());
        let client = VersionClient::new(store.clone());

        let restored = PersistRequest::new(
            "site",
            None,
            HistoryEntry::new(CodeState::new("x", ""), crate::model::entry::RESTORED_DESCRIPTION),
        );
        assert!(client.persist_history_step(&restored).await.unwrap().is_none());
        assert_eq!(store.version_count().await, 0);
    }

    #[tokio::test]
    async fn test_metadata_is_copied_from_entry() {
        let client = VersionClient::new(Arc::new(InMemoryVersionStore::new()));
        let entry = HistoryEntry::new(CodeState::new("a", ""), "AI change").with_message("msg-42");

        let record = client
            .persist_history_step(&PersistRequest::new("site", None, entry))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.metadata.message_id.as_deref(), Some("msg-42"));
    }

    #[tokio::test]
    async fn test_configured_snapshot_interval() {
        let config = HistoryConfig { snapshot_interval: 3 };
        let client = VersionClient::from_config(Arc::new(InMemoryVersionStore::new()), &config);
        assert_eq!(client.snapshot_interval(), 3);

        let mut kinds = Vec::new();
        let mut previous = String::new();
        for i in 0..5 {
            let current = format!("{previous}line {i}\n");
            let record = client
                .persist_history_step(&request(&previous, &current))
                .await
                .unwrap()
                .unwrap();
            kinds.push((record.kind, record.patch_count_from_snapshot));
            previous = current;
        }

        assert_eq!(
            kinds,
            vec![
                (VersionKind::Snapshot, 0),
                (VersionKind::Patch, 1),
                (VersionKind::Patch, 2),
                (VersionKind::Snapshot, 0),
                (VersionKind::Patch, 1),
            ]
        );
    }
}
