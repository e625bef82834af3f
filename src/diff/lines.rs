//! Line splitting that keeps each line's own terminator.
//!
//! `\r\n`, `\n` and a lone `\r` all end a line, matching how `similar`
//! tokenizes text when it generates a patch.

/// Split `text` into lines, terminators included. Empty text has no lines.
pub fn split_lines(text: &str) -> Vec<&str> {
    let bytes = text.as_bytes();
    let mut lines = Vec::new();
    let mut start = 0;
    let mut idx = 0;

    while idx < bytes.len() {
        match bytes[idx] {
            b'\r' if bytes.get(idx + 1) == Some(&b'\n') => {
                lines.push(&text[start..idx + 2]);
                idx += 2;
                start = idx;
            }
            b'\r' | b'\n' => {
                lines.push(&text[start..=idx]);
                idx += 1;
                start = idx;
            }
            _ => idx += 1,
        }
    }

    if start < text.len() {
        lines.push(&text[start..]);
    }
    lines
}

/// The terminator of `line`, or "" for an unterminated last line.
pub fn line_ending(line: &str) -> &str {
    &line[line_content(line).len()..]
}

/// `line` without its terminator.
pub fn line_content(line: &str) -> &str {
    line.strip_suffix("\r\n")
        .or_else(|| line.strip_suffix('\n'))
        .or_else(|| line.strip_suffix('\r'))
        .unwrap_or(line)
}

/// Terminator used for lines that have none of their own: the first one
/// found in `lines`, else `\n`.
pub fn default_ending(lines: &[String]) -> String {
    lines
        .iter()
        .map(|line| line_ending(line))
        .find(|ending| !ending.is_empty())
        .unwrap_or("\n")
        .to_string()
}

/// Terminator of the line at `pos`, or of the line before it when `pos` is
/// past the end.
pub fn ending_near(lines: &[String], pos: usize, fallback: &str) -> String {
    lines
        .get(pos)
        .or_else(|| pos.checked_sub(1).and_then(|prev| lines.get(prev)))
        .map(|line| line_ending(line))
        .unwrap_or(fallback)
        .to_string()
}

/// Only the last line may lack a terminator; give every other one `ending`.
pub fn terminate_inner_lines(lines: &mut [String], ending: &str) {
    let Some((_, inner)) = lines.split_last_mut() else {
        return;
    };
    for line in inner.iter_mut().filter(|line| line_ending(line).is_empty()) {
        line.push_str(ending);
    }
}
