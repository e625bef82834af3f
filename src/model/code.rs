use serde::{Deserialize, Serialize};
use std::collections::HashSet;

// ---------------------------------------------------------------------------
// CodeState: both editable buffers at one point in time
// ---------------------------------------------------------------------------

/// Snapshot of the JavaScript and CSS buffers injected into a site.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeState {
    pub javascript: String,
    pub css: String,
}

impl CodeState {
    pub fn new(javascript: impl Into<String>, css: impl Into<String>) -> Self {
        Self {
            javascript: javascript.into(),
            css: css.into(),
        }
    }

    /// The empty state a chain without a leading snapshot starts from.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.javascript.is_empty() && self.css.is_empty()
    }
}

// ---------------------------------------------------------------------------
// ChangeSummary: advisory per-language line counts
// ---------------------------------------------------------------------------

/// Lines added and removed in one language.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineDelta {
    pub added: usize,
    pub removed: usize,
}

impl LineDelta {
    /// Counts non-blank lines present on one side but not the other.
    ///
    /// This is a set difference, not a diff: moved or duplicated lines are
    /// not counted. The numbers only feed UI badges.
    pub fn between(old: &str, new: &str) -> Self {
        let old_lines: HashSet<&str> = non_blank_lines(old).collect();
        let new_lines: HashSet<&str> = non_blank_lines(new).collect();

        Self {
            added: non_blank_lines(new)
                .filter(|line| !old_lines.contains(line))
                .count(),
            removed: non_blank_lines(old)
                .filter(|line| !new_lines.contains(line))
                .count(),
        }
    }

    pub fn is_zero(&self) -> bool {
        self.added == 0 && self.removed == 0
    }
}

fn non_blank_lines(text: &str) -> impl Iterator<Item = &str> {
    text.lines().map(str::trim).filter(|line| !line.is_empty())
}

/// Per-language line deltas attached to history entries and version metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSummary {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub javascript: Option<LineDelta>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub css: Option<LineDelta>,
}

impl ChangeSummary {
    /// Summarise the change from `old` to `new`; unchanged languages are omitted.
    pub fn between(old: &CodeState, new: &CodeState) -> Self {
        let javascript = LineDelta::between(&old.javascript, &new.javascript);
        let css = LineDelta::between(&old.css, &new.css);

        Self {
            javascript: (!javascript.is_zero()).then_some(javascript),
            css: (!css.is_zero()).then_some(css),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.javascript.is_none() && self.css.is_none()
    }
}
