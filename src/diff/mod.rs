//! Unified-diff generation and tolerant patch application.
//!
//! [`apply_patch`] never fails: a patch that cannot be applied strictly goes
//! through a line-oriented fallback, and a patch with no usable hunks leaves
//! the base text untouched.

pub mod apply;
pub mod fallback;
pub mod hunk;
pub mod lines;
pub mod normalize;

use similar::TextDiff;
use thiserror::Error;
use tracing::{debug, warn};

use apply::LineMatch;

pub use normalize::normalize_patch;

/// Why a patch could not be applied strictly. Never escapes this module's
/// public functions; it only drives the fallback.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PatchError {
    #[error("patch contains no hunks")]
    NoHunks,

    #[error("unexpected line {line} in hunk: {content:?}")]
    InvalidLine { line: usize, content: String },

    #[error("hunk {hunk} does not match the base text")]
    HunkMismatch { hunk: usize },
}

/// Produce a unified diff from `old` to `new` with no context lines.
///
/// Identical inputs yield an empty string.
pub fn generate_patch(old: &str, new: &str, label: &str) -> String {
    TextDiff::from_lines(old, new)
        .unified_diff()
        .context_radius(0)
        .header(label, label)
        .to_string()
}

/// Apply a unified diff to `base`, degrading instead of failing.
///
/// The patch is first applied as written, terminators included, which is
/// exact for patches made by [`generate_patch`]. Otherwise it is normalized
/// and matched on line content only; each kept line retains its own
/// terminator.
pub fn apply_patch(base: &str, patch: &str) -> String {
    if patch.trim().is_empty() {
        return base.to_string();
    }

    if let Ok(hunks) = hunk::parse_hunks(patch) {
        match apply::apply_hunks(base, &hunks, LineMatch::Exact) {
            Ok(patched) => return patched,
            Err(err) => debug!(error = %err, "patch does not apply as written, normalizing"),
        }
    }

    let normalized = normalize_patch(patch);
    let hunks = match hunk::parse_hunks(&normalized) {
        Ok(hunks) => hunks,
        Err(err) => {
            warn!(error = %err, "ignoring unparseable patch");
            return base.to_string();
        }
    };

    match apply::apply_hunks(base, &hunks, LineMatch::IgnoreEndings) {
        Ok(patched) => patched,
        Err(err) => {
            warn!(error = %err, hunks = hunks.len(), "strict apply failed, using line fallback");
            fallback::apply_naive(base, &hunks)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_patch_format() {
        let patch = generate_patch("a\nb\nc\n", "a\nB\nc\n", "javascript");
        assert_eq!(patch, "--- javascript\n+++ javascript\n@@ -2 +2 @@\n-b\n+B\n");
    }

    #[test]
    fn test_generate_patch_identical_is_empty() {
        assert_eq!(generate_patch("same\n", "same\n", "css"), "");
    }

    #[test]
    fn test_round_trip_simple_edit() {
        let old = "console.log(1)";
        let new = "console.log(2)";
        assert_eq!(apply_patch(old, &generate_patch(old, new, "javascript")), new);
    }

    #[test]
    fn test_round_trip_varied_edits() {
        let cases = [
            ("", "fresh\ncontent\n"),
            ("gone\nentirely", ""),
            ("a\nb\nc\nd\ne\n", "a\nc\nd\nX\ne\nf\n"),
            ("a", "a\n"),
            ("a\n", "a"),
            ("x\nx\nx\ny\nx\n", "x\ny\nx\nx\n"),
            ("body {\n  color: red;\n}\n", "body {\n  color: blue;\n  margin: 0;\n}\n"),
            ("line1\n\n\nline4", "line1\n\nline3\n\nline4\nline5"),
            ("a\r\nb\n", "a\r\nc\n"),
            ("a\n", "a\r\n"),
            ("x\ra\n", "y\n"),
            ("one\r\ntwo\r\n", "one\r\n2\r\nthree\n"),
        ];

        for (old, new) in cases {
            let patch = generate_patch(old, new, "t");
            assert_eq!(apply_patch(old, &patch), new, "patch:\n{patch}");
        }
    }

    #[test]
    fn test_empty_patch_is_noop() {
        assert_eq!(apply_patch("keep me", ""), "keep me");
        assert_eq!(apply_patch("keep me", "  \n\n"), "keep me");
    }

    #[test]
    fn test_garbage_patch_returns_base() {
        let base = "let x = 1;\n";
        for garbage in ["not a patch", "@@", "+++\n---\n", "```\n```", "\\\\\\"] {
            assert_eq!(apply_patch(base, garbage), base);
        }
    }

    #[test]
    fn test_fenced_patch_without_headers() {
        let patch = "```diff\n@@ -1 +1 @@\n-let x = 1;\n+let x = 2;\n```";
        assert_eq!(apply_patch("let x = 1;\n", patch), "let x = 2;\n");
    }

    #[test]
    fn test_prefixless_context_lines_are_accepted() {
        let base = "function f() {\n  return 1;\n}\n";
        let patch = "@@ -1,3 +1,3 @@\nfunction f() {\n-  return 1;\n+  return 2;\n}";
        assert_eq!(apply_patch(base, patch), "function f() {\n  return 2;\n}\n");
    }

    #[test]
    fn test_crlf_base_is_preserved() {
        let base = "a\r\nb\r\nc\r\n";
        let patch = "@@ -2 +2 @@\n-b\n+B\n";
        assert_eq!(apply_patch(base, patch), "a\r\nB\r\nc\r\n");
    }

    #[test]
    fn test_mixed_endings_survive_foreign_patch() {
        // The patch was written with `\n` only; untouched lines keep theirs.
        let base = "a\r\nb\nc\r\n";
        let patch = "@@ -3 +3 @@\n-c\n+C\n";
        assert_eq!(apply_patch(base, patch), "a\r\nb\nC\r\n");
    }

    #[test]
    fn test_header_like_removal_with_prefixless_context() {
        let patch = "@@ -1,2 +1,2 @@\n--- note\n+++ note\nfoo();";
        assert_eq!(apply_patch("-- note\nfoo();\n", patch), "++ note\nfoo();\n");
    }

    #[test]
    fn test_mismatched_patch_falls_back() {
        // No trailing newline in the base and no marker in the patch.
        let patch = "@@ -1 +1 @@\n-console.log(1)\n+console.log(2)";
        assert_eq!(apply_patch("console.log(1)", patch), "console.log(2)");
    }
}
