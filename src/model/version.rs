use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{PagesmithError, PagesmithResult};
use crate::model::code::{ChangeSummary, CodeState};

// ---------------------------------------------------------------------------
// VersionRecord: server-persisted snapshot/patch chain
// ---------------------------------------------------------------------------

/// A version identifier, unique within the version store.
pub type VersionId = String;

/// Identifies the site a chain of versions belongs to.
pub type SiteCode = String;

/// Generate a new version ID.
pub fn new_version_id() -> VersionId {
    Uuid::new_v4().to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VersionKind {
    /// Full content of both buffers.
    Snapshot,
    /// Unified diffs against the parent's reconstructed state.
    Patch,
}

/// Metadata carried alongside a version, copied from the history entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_summary: Option<ChangeSummary>,
}

/// A record as submitted to the store, before it is assigned an id and
/// creation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewVersion {
    pub parent_id: Option<VersionId>,
    #[serde(rename = "type")]
    pub kind: VersionKind,
    pub javascript: Option<String>,
    pub css: Option<String>,
    pub js_patch: Option<String>,
    pub css_patch: Option<String>,
    pub patch_count_from_snapshot: u32,
    #[serde(default)]
    pub metadata: VersionMetadata,
}

impl NewVersion {
    /// A snapshot carrying the full state. The patch counter restarts at zero.
    pub fn snapshot(parent_id: Option<VersionId>, code: &CodeState) -> Self {
        Self {
            parent_id,
            kind: VersionKind::Snapshot,
            javascript: Some(code.javascript.clone()),
            css: Some(code.css.clone()),
            js_patch: None,
            css_patch: None,
            patch_count_from_snapshot: 0,
            metadata: VersionMetadata::default(),
        }
    }

    /// A patch record applied on top of `parent_id`.
    pub fn patch(
        parent_id: VersionId,
        js_patch: impl Into<String>,
        css_patch: impl Into<String>,
        patch_count_from_snapshot: u32,
    ) -> Self {
        Self {
            parent_id: Some(parent_id),
            kind: VersionKind::Patch,
            javascript: None,
            css: None,
            js_patch: Some(js_patch.into()),
            css_patch: Some(css_patch.into()),
            patch_count_from_snapshot,
            metadata: VersionMetadata::default(),
        }
    }

    pub fn with_metadata(mut self, metadata: VersionMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Check the snapshot/patch field invariants.
    pub fn validate(&self) -> PagesmithResult<()> {
        match self.kind {
            VersionKind::Snapshot => {
                if self.javascript.is_none() || self.css.is_none() {
                    return Err(PagesmithError::InvalidRecord(
                        "snapshot must carry javascript and css".to_string(),
                    ));
                }
                if self.js_patch.is_some() || self.css_patch.is_some() {
                    return Err(PagesmithError::InvalidRecord(
                        "snapshot must not carry patches".to_string(),
                    ));
                }
                if self.patch_count_from_snapshot != 0 {
                    return Err(PagesmithError::InvalidRecord(format!(
                        "snapshot patch counter must be 0, got {}",
                        self.patch_count_from_snapshot
                    )));
                }
            }
            VersionKind::Patch => {
                if self.javascript.is_some() || self.css.is_some() {
                    return Err(PagesmithError::InvalidRecord(
                        "patch must not carry full content".to_string(),
                    ));
                }
                if self.patch_count_from_snapshot == 0 {
                    return Err(PagesmithError::InvalidRecord(
                        "patch counter must be at least 1".to_string(),
                    ));
                }
            }
        }
        Ok(())
    }

    /// Attach the store-assigned identity.
    pub fn into_record(
        self,
        id: VersionId,
        site_code: impl Into<SiteCode>,
        created_at: DateTime<Utc>,
    ) -> VersionRecord {
        VersionRecord {
            id,
            site_code: site_code.into(),
            parent_id: self.parent_id,
            kind: self.kind,
            javascript: self.javascript,
            css: self.css,
            js_patch: self.js_patch,
            css_patch: self.css_patch,
            patch_count_from_snapshot: self.patch_count_from_snapshot,
            metadata: self.metadata,
            created_at,
        }
    }
}

/// A stored entry in a site's version chain. Records are append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionRecord {
    pub id: VersionId,
    pub site_code: SiteCode,
    pub parent_id: Option<VersionId>,
    #[serde(rename = "type")]
    pub kind: VersionKind,
    pub javascript: Option<String>,
    pub css: Option<String>,
    pub js_patch: Option<String>,
    pub css_patch: Option<String>,
    pub patch_count_from_snapshot: u32,
    #[serde(default)]
    pub metadata: VersionMetadata,
    pub created_at: DateTime<Utc>,
}

impl VersionRecord {
    pub fn is_snapshot(&self) -> bool {
        self.kind == VersionKind::Snapshot
    }
}

// ---------------------------------------------------------------------------
// ReconstructedStep: one materialized state of a replayed chain
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconstructedStep {
    pub javascript: String,
    pub css: String,
    pub message_id: Option<String>,
    pub change_summary: Option<ChangeSummary>,
}

impl ReconstructedStep {
    pub fn code(&self) -> CodeState {
        CodeState::new(self.javascript.clone(), self.css.clone())
    }
}
