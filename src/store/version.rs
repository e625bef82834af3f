use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::error::{PagesmithError, PagesmithResult};
use crate::model::version::{new_version_id, NewVersion, VersionRecord};

// ---------------------------------------------------------------------------
// VersionStore trait: remote append-only version chains per site
// ---------------------------------------------------------------------------

/// Storage backend for per-site version chains.
///
/// Implementations return errors as-is; the degrade-on-read policy lives in
/// [`crate::store::client::VersionClient`].
#[async_trait]
pub trait VersionStore: Send + Sync {
    /// Most recent record in the site's chain.
    async fn head(&self, site_code: &str) -> PagesmithResult<Option<VersionRecord>>;

    /// Every record in the site's chain, ascending by `created_at`.
    async fn list(&self, site_code: &str) -> PagesmithResult<Vec<VersionRecord>>;

    /// Append a record. The store assigns `id` and `created_at`.
    async fn append(&self, site_code: &str, version: NewVersion) -> PagesmithResult<VersionRecord>;
}

// ---------------------------------------------------------------------------
// InMemoryVersionStore: for testing and the reference server
// ---------------------------------------------------------------------------

/// In-memory store that keeps each site's chain in insertion order.
///
/// Appends must name the current head as parent, and `created_at` is made
/// strictly increasing per site, so time order and parent order agree.
pub struct InMemoryVersionStore {
    chains: RwLock<HashMap<String, Vec<VersionRecord>>>,
}

impl InMemoryVersionStore {
    pub fn new() -> Self {
        Self {
            chains: RwLock::new(HashMap::new()),
        }
    }

    /// Total number of records across all sites.
    pub async fn version_count(&self) -> usize {
        let chains = self.chains.read().await;
        chains.values().map(Vec::len).sum()
    }
}

impl Default for InMemoryVersionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VersionStore for InMemoryVersionStore {
    async fn head(&self, site_code: &str) -> PagesmithResult<Option<VersionRecord>> {
        let chains = self.chains.read().await;
        Ok(chains.get(site_code).and_then(|chain| chain.last()).cloned())
    }

    async fn list(&self, site_code: &str) -> PagesmithResult<Vec<VersionRecord>> {
        let chains = self.chains.read().await;
        Ok(chains.get(site_code).cloned().unwrap_or_default())
    }

    async fn append(&self, site_code: &str, version: NewVersion) -> PagesmithResult<VersionRecord> {
        version.validate()?;

        let mut chains = self.chains.write().await;
        let chain = chains.entry(site_code.to_string()).or_default();
        let head = chain.last();

        let head_id = head.map(|record| record.id.clone());
        if version.parent_id != head_id {
            return Err(PagesmithError::ChainConflict {
                site: site_code.to_string(),
                expected: head_id,
                got: version.parent_id,
            });
        }

        let mut created_at = Utc::now();
        if let Some(head) = head {
            if created_at <= head.created_at {
                created_at = head.created_at + Duration::microseconds(1);
            }
        }

        let record = version.into_record(new_version_id(), site_code, created_at);
        chain.push(record.clone());
        Ok(record)
    }
}
