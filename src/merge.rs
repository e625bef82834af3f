use tracing::debug;

use crate::diff::apply_patch;
use crate::model::changes::{ChangeScope, CodeChanges};
use crate::model::code::CodeState;

/// Apply an AI response's per-language diffs to the current buffers.
///
/// Languages without a diff pass through unchanged. Malformed diffs are not
/// rejected here; they degrade through [`apply_patch`].
pub fn merge(current: &CodeState, changes: &CodeChanges) -> CodeState {
    let scope = changes.scope();
    debug!(?scope, "merging AI changes");

    match scope {
        ChangeScope::Both { javascript, css } => CodeState {
            javascript: apply_patch(&current.javascript, javascript),
            css: apply_patch(&current.css, css),
        },
        ChangeScope::JavascriptOnly(javascript) => CodeState {
            javascript: apply_patch(&current.javascript, javascript),
            css: current.css.clone(),
        },
        ChangeScope::CssOnly(css) => CodeState {
            javascript: current.javascript.clone(),
            css: apply_patch(&current.css, css),
        },
        ChangeScope::Neither => current.clone(),
    }
}
