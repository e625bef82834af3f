use tracing::debug;

use crate::diff::apply_patch;
use crate::model::code::CodeState;
use crate::model::version::{ReconstructedStep, VersionKind, VersionRecord};

// ---------------------------------------------------------------------------
// Reconstruction: replay a snapshot/patch chain into full states
// ---------------------------------------------------------------------------

/// Replay a site's version chain into one materialized state per record.
///
/// Records are expected in ascending `created_at` order (as returned by the
/// store). A chain that opens with a patch starts from the empty state, and
/// that empty state is emitted as an extra first step so there is always a
/// state before the first change.
pub fn reconstruct_from_versions(records: &[VersionRecord]) -> Vec<ReconstructedStep> {
    let mut state = CodeState::empty();
    let mut steps = Vec::with_capacity(records.len() + 1);

    for (idx, record) in records.iter().enumerate() {
        match record.kind {
            VersionKind::Snapshot => {
                state.javascript = record.javascript.clone().unwrap_or_default();
                state.css = record.css.clone().unwrap_or_default();
            }
            VersionKind::Patch => {
                if idx == 0 {
                    debug!(version = %record.id, "chain starts without a snapshot");
                    steps.push(step(&state, None));
                }
                if let Some(patch) = &record.js_patch {
                    state.javascript = apply_patch(&state.javascript, patch);
                }
                if let Some(patch) = &record.css_patch {
                    state.css = apply_patch(&state.css, patch);
                }
            }
        }

        steps.push(step(&state, Some(record)));
    }

    steps
}

fn step(state: &CodeState, record: Option<&VersionRecord>) -> ReconstructedStep {
    let metadata = record.map(|r| &r.metadata);
    ReconstructedStep {
        javascript: state.javascript.clone(),
        css: state.css.clone(),
        message_id: metadata.and_then(|m| m.message_id.clone()),
        change_summary: metadata.and_then(|m| m.change_summary.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::generate_patch;
    use crate::model::version::{NewVersion, VersionMetadata};
    use chrono::{Duration, Utc};

    fn chain(versions: Vec<NewVersion>) -> Vec<VersionRecord> {
        let start = Utc::now();
        versions
            .into_iter()
            .enumerate()
            .map(|(i, v)| v.into_record(format!("v{i}"), "site", start + Duration::seconds(i as i64)))
            .collect()
    }

    #[test]
    fn test_empty_chain_has_no_steps() {
        assert!(reconstruct_from_versions(&[]).is_empty());
    }

    #[test]
    fn test_snapshot_then_patches() {
        let s0 = CodeState::new("a\n", "p {}\n");
        let s1 = CodeState::new("a\nb\n", "p {}\n");
        let s2 = CodeState::new("b\n", "p { margin: 0; }\n");

        let records = chain(vec![
            NewVersion::snapshot(None, &s0),
            NewVersion::patch(
                "v0".to_string(),
                generate_patch(&s0.javascript, &s1.javascript, "javascript"),
                generate_patch(&s0.css, &s1.css, "css"),
                1,
            )
            .with_metadata(VersionMetadata {
                message_id: Some("m1".to_string()),
                change_summary: None,
            }),
            NewVersion::patch(
                "v1".to_string(),
                generate_patch(&s1.javascript, &s2.javascript, "javascript"),
                generate_patch(&s1.css, &s2.css, "css"),
                2,
            ),
        ]);

        let steps = reconstruct_from_versions(&records);
        assert_eq!(steps.len(), 3);
        assert_eq!(steps[0].code(), s0);
        assert_eq!(steps[1].code(), s1);
        assert_eq!(steps[1].message_id.as_deref(), Some("m1"));
        assert_eq!(steps[2].code(), s2);
        assert!(steps[2].message_id.is_none());
    }

    #[test]
    fn test_chain_starting_with_patch_emits_empty_base() {
        let records = chain(vec![NewVersion::patch(
            "missing".to_string(),
            generate_patch("", "init();\n", "javascript"),
            "",
            1,
        )]);

        let steps = reconstruct_from_versions(&records);
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].code(), CodeState::empty());
        assert_eq!(steps[1].code(), CodeState::new("init();\n", ""));
    }

    #[test]
    fn test_null_patch_field_leaves_language_alone() {
        let mut patch = NewVersion::patch(
            "v0".to_string(),
            generate_patch("x\n", "y\n", "javascript"),
            "",
            1,
        );
        patch.css_patch = None;

        let records = chain(vec![
            NewVersion::snapshot(None, &CodeState::new("x\n", "keep {}\n")),
            patch,
        ]);

        let steps = reconstruct_from_versions(&records);
        assert_eq!(steps[1].code(), CodeState::new("y\n", "keep {}\n"));
    }

    #[test]
    fn test_snapshot_mid_chain_replaces_state() {
        let records = chain(vec![
            NewVersion::snapshot(None, &CodeState::new("old\n", "")),
            NewVersion::patch("v0".to_string(), "garbage", "", 1),
            NewVersion::snapshot(Some("v1".to_string()), &CodeState::new("new\n", "c\n")),
        ]);

        let steps = reconstruct_from_versions(&records);
        assert_eq!(steps[1].code(), CodeState::new("old\n", ""));
        assert_eq!(steps[2].code(), CodeState::new("new\n", "c\n"));
    }
}
