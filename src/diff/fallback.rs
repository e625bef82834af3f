use tracing::debug;

use super::hunk::{Hunk, LineKind};
use super::lines::{default_ending, ending_near, line_content, line_ending, split_lines, terminate_inner_lines};

/// How far above the cursor a removed line is searched for.
const BACKWARD_SEARCH: usize = 2;

/// Line-oriented best-effort patching used when strict application fails.
///
/// A cursor starts at each hunk's target line. Context lines advance it,
/// added lines are inserted at it, and removed lines are deleted when found
/// at the cursor or up to two lines above it. Removed lines that cannot be
/// found are skipped. Lines are compared without their terminators; an
/// added line takes the terminator of the line it replaces.
pub fn apply_naive(base: &str, hunks: &[Hunk]) -> String {
    let mut lines: Vec<String> = split_lines(base).into_iter().map(str::to_string).collect();
    let fallback_ending = default_ending(&lines);

    for hunk in hunks {
        let mut cursor = hunk.new_start.saturating_sub(1).min(lines.len());
        let mut ending = ending_near(&lines, cursor, &fallback_ending);

        for line in &hunk.lines {
            match line.kind {
                LineKind::Context => {
                    if let Some(kept) = lines.get(cursor) {
                        ending = line_ending(kept).to_string();
                    }
                    cursor = (cursor + 1).min(lines.len());
                }
                LineKind::Add => {
                    let terminator = if line.has_ending() { ending.as_str() } else { "" };
                    lines.insert(cursor, format!("{}{}", line.text, terminator));
                    cursor += 1;
                }
                LineKind::Remove => match locate(&lines, cursor, &line.text) {
                    Some(found) => {
                        let gone = lines.remove(found);
                        ending = line_ending(&gone).to_string();
                        cursor = found;
                    }
                    None => {
                        debug!(cursor, line = %line.text, "removed line not found near cursor");
                    }
                },
            }
        }
    }

    terminate_inner_lines(&mut lines, &fallback_ending);
    lines.concat()
}

fn locate(lines: &[String], cursor: usize, text: &str) -> Option<usize> {
    (0..=BACKWARD_SEARCH)
        .filter_map(|back| cursor.checked_sub(back))
        .find(|&pos| lines.get(pos).is_some_and(|line| line_content(line) == text))
}
