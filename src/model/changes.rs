use serde::{Deserialize, Serialize};

/// A diff generated by the AI backend for one language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageChange {
    pub diff: String,
}

impl LanguageChange {
    pub fn new(diff: impl Into<String>) -> Self {
        Self { diff: diff.into() }
    }

    fn has_diff(&self) -> bool {
        !self.diff.trim().is_empty()
    }
}

/// The `changes` payload of an AI response. Either language may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeChanges {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub javascript: Option<LanguageChange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub css: Option<LanguageChange>,
}

/// Which buffers a [`CodeChanges`] payload actually touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeScope<'a> {
    Both { javascript: &'a str, css: &'a str },
    JavascriptOnly(&'a str),
    CssOnly(&'a str),
    Neither,
}

impl CodeChanges {
    pub fn javascript(diff: impl Into<String>) -> Self {
        Self {
            javascript: Some(LanguageChange::new(diff)),
            css: None,
        }
    }

    pub fn css(diff: impl Into<String>) -> Self {
        Self {
            javascript: None,
            css: Some(LanguageChange::new(diff)),
        }
    }

    pub fn with_css(mut self, diff: impl Into<String>) -> Self {
        self.css = Some(LanguageChange::new(diff));
        self
    }

    /// Classify the payload. Entries with a blank diff count as absent.
    pub fn scope(&self) -> ChangeScope<'_> {
        let javascript = self
            .javascript
            .as_ref()
            .filter(|change| change.has_diff())
            .map(|change| change.diff.as_str());
        let css = self
            .css
            .as_ref()
            .filter(|change| change.has_diff())
            .map(|change| change.diff.as_str());

        match (javascript, css) {
            (Some(javascript), Some(css)) => ChangeScope::Both { javascript, css },
            (Some(javascript), None) => ChangeScope::JavascriptOnly(javascript),
            (None, Some(css)) => ChangeScope::CssOnly(css),
            (None, None) => ChangeScope::Neither,
        }
    }
}
