//! Clean-up applied to incoming patch text before it is parsed.
//!
//! Patches produced upstream are frequently wrapped in markdown fences,
//! carry `\r\n` endings, omit the `---`/`+++` file headers, or drop the
//! leading space on context lines. Each of those is repaired here.

use super::hunk::{is_file_header, parse_header, HunkProgress, LineKind};

/// Placeholder headers used when a patch only carries hunks.
const PLACEHOLDER_HEADERS: &str = "--- a\n+++ b\n";

/// Produce a patch text the hunk parser accepts.
pub fn normalize_patch(raw: &str) -> String {
    let unix = raw.replace("\r\n", "\n");
    let unfenced = strip_code_fence(&unix);
    let body = unfenced.trim_end_matches('\n');

    let repaired = repair_hunk_lines(body);

    if needs_placeholder_headers(&repaired) {
        format!("{PLACEHOLDER_HEADERS}{repaired}")
    } else {
        repaired
    }
}

/// Remove a surrounding markdown code fence (```diff ... ```), if any.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    if !trimmed.starts_with("```") {
        return text;
    }

    let without_open = match trimmed.find('\n') {
        Some(newline) => &trimmed[newline + 1..],
        None => return "",
    };

    match without_open.rfind("```") {
        Some(close) if without_open[close..].trim() == "```" => &without_open[..close],
        _ => without_open,
    }
}

fn needs_placeholder_headers(text: &str) -> bool {
    let has_hunks = text.lines().any(|line| line.starts_with("@@ -"));
    let has_headers = text
        .lines()
        .any(|line| line.starts_with("---") || line.starts_with("+++"));
    has_hunks && !has_headers
}

/// Give prefix-less lines inside hunks a context prefix.
///
/// Only lines after the first `@@` header are touched; anything before it is
/// preamble (`diff --git`, `index ...`, file headers) and is left alone. A
/// `---`/`+++` pair starts a new file section under the same rule the hunk
/// parser uses.
fn repair_hunk_lines(text: &str) -> String {
    let lines: Vec<&str> = text.split('\n').collect();
    let mut out: Vec<String> = Vec::with_capacity(lines.len());
    let mut open: Option<HunkProgress> = None;

    for (idx, line) in lines.iter().enumerate() {
        if line.starts_with("@@") {
            open = Some(HunkProgress::new(&parse_header(line)));
            out.push((*line).to_string());
            continue;
        }

        let Some(progress) = open.as_mut() else {
            out.push((*line).to_string());
            continue;
        };

        if is_file_header(&lines, idx) && progress.ends_at_file_header() {
            open = None;
            out.push((*line).to_string());
            continue;
        }

        let repaired = if has_legal_prefix(line) {
            (*line).to_string()
        } else {
            format!(" {line}")
        };
        match repaired.chars().next() {
            Some('+') => progress.record(LineKind::Add),
            Some('-') => progress.record(LineKind::Remove),
            Some(' ') => progress.record(LineKind::Context),
            _ => {}
        }
        out.push(repaired);
    }

    out.join("\n")
}

fn has_legal_prefix(line: &str) -> bool {
    matches!(line.chars().next(), Some(' ' | '+' | '-' | '\\'))
}
