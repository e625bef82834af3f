use super::lines::{line_content, line_ending, split_lines};
use super::PatchError;

/// Role of a line inside a hunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Context,
    Remove,
    Add,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HunkLine {
    pub kind: LineKind,
    pub text: String,
    /// Terminator as written in the patch; empty after a
    /// `\ No newline at end of file` marker.
    pub ending: String,
}

impl HunkLine {
    /// The line as it appears in a file, terminator included.
    pub fn full_text(&self) -> String {
        format!("{}{}", self.text, self.ending)
    }

    pub fn has_ending(&self) -> bool {
        !self.ending.is_empty()
    }
}

/// One `@@ -a,b +c,d @@` block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hunk {
    /// 1-based start line in the old file (0 for insertion at the top).
    pub old_start: usize,
    pub old_len: Option<usize>,
    /// 1-based start line in the new file.
    pub new_start: usize,
    pub new_len: Option<usize>,
    pub lines: Vec<HunkLine>,
}

impl Hunk {
    /// Lines the hunk expects to find in the base text.
    pub fn pre_image(&self) -> Vec<String> {
        self.lines
            .iter()
            .filter(|line| line.kind != LineKind::Add)
            .map(HunkLine::full_text)
            .collect()
    }

    /// Lines that replace the pre-image.
    pub fn post_image(&self) -> Vec<String> {
        self.lines
            .iter()
            .filter(|line| line.kind != LineKind::Remove)
            .map(HunkLine::full_text)
            .collect()
    }

    /// 0-based index in the old file where the pre-image begins.
    pub fn old_index(&self) -> usize {
        if self.old_len == Some(0) {
            self.old_start
        } else {
            self.old_start.saturating_sub(1)
        }
    }
}

/// Body lines seen so far in an open hunk, against its header counts.
#[derive(Debug, Clone, Copy)]
pub(super) struct HunkProgress {
    old_len: Option<usize>,
    new_len: Option<usize>,
    old_seen: usize,
    new_seen: usize,
}

impl HunkProgress {
    pub(super) fn new(header: &Hunk) -> Self {
        Self {
            old_len: header.old_len,
            new_len: header.new_len,
            old_seen: 0,
            new_seen: 0,
        }
    }

    pub(super) fn record(&mut self, kind: LineKind) {
        match kind {
            LineKind::Context => {
                self.old_seen += 1;
                self.new_seen += 1;
            }
            LineKind::Remove => self.old_seen += 1,
            LineKind::Add => self.new_seen += 1,
        }
    }

    /// A `---`/`+++` pair ends the hunk once the announced counts are met,
    /// or straight away when the header carried no usable counts. Before
    /// that it is a removed line followed by an added one.
    pub(super) fn ends_at_file_header(&self) -> bool {
        match (self.old_len, self.new_len) {
            (Some(old_len), Some(new_len)) => self.old_seen >= old_len && self.new_seen >= new_len,
            _ => true,
        }
    }
}

/// True when `lines[idx]` and the line after it form a `---`/`+++` pair.
pub(super) fn is_file_header<S: AsRef<str>>(lines: &[S], idx: usize) -> bool {
    lines[idx].as_ref().starts_with("--- ")
        && lines
            .get(idx + 1)
            .is_some_and(|next| next.as_ref().starts_with("+++ "))
}

/// Parse a patch into its hunks.
///
/// Lines keep the terminators they were written with, so hunks parsed from
/// a generated patch match the base text byte for byte. A body line
/// without a terminator (the end of the patch) counts as `\n`-terminated.
/// Header counts are advisory: the body runs until the next `@@` header or
/// file header, so hunks with wrong counts still parse. A header without
/// usable numbers starts at line 1.
pub fn parse_hunks(patch: &str) -> Result<Vec<Hunk>, PatchError> {
    let lines = split_lines(patch);
    let mut hunks: Vec<Hunk> = Vec::new();
    let mut current: Option<(Hunk, HunkProgress)> = None;

    for (idx, line) in lines.iter().enumerate() {
        let content = line_content(line);
        if content.starts_with("@@") {
            hunks.extend(current.take().map(|(hunk, _)| hunk));
            let hunk = parse_header(content);
            let progress = HunkProgress::new(&hunk);
            current = Some((hunk, progress));
            continue;
        }

        let Some((hunk, progress)) = current.as_mut() else {
            // Preamble: file headers, `diff --git`, `index` lines.
            continue;
        };

        if is_file_header(&lines, idx) && progress.ends_at_file_header() {
            hunks.extend(current.take().map(|(hunk, _)| hunk));
            continue;
        }

        // Normalization prefixes stray lines; an empty line is an empty
        // context line.
        let mut chars = content.chars();
        let kind = match chars.next() {
            Some('+') => LineKind::Add,
            Some('-') => LineKind::Remove,
            Some(' ') | None => LineKind::Context,
            Some('\\') => {
                if let Some(last) = hunk.lines.last_mut() {
                    last.ending.clear();
                }
                continue;
            }
            Some(_) => {
                return Err(PatchError::InvalidLine {
                    line: idx + 1,
                    content: content.to_string(),
                })
            }
        };
        let text = chars.as_str();

        let ending = match line_ending(line) {
            "" => "\n",
            ending => ending,
        };
        progress.record(kind);
        hunk.lines.push(HunkLine {
            kind,
            text: text.to_string(),
            ending: ending.to_string(),
        });
    }
    hunks.extend(current.map(|(hunk, _)| hunk));

    hunks.retain(|hunk| !hunk.lines.is_empty());
    if hunks.is_empty() {
        return Err(PatchError::NoHunks);
    }
    Ok(hunks)
}

pub(super) fn parse_header(line: &str) -> Hunk {
    let mut old = (1, None);
    let mut new = (1, None);

    for token in line.trim_start_matches('@').split_whitespace() {
        if token.starts_with("@@") {
            break;
        }
        if let Some(range) = token.strip_prefix('-') {
            old = parse_range(range);
        } else if let Some(range) = token.strip_prefix('+') {
            new = parse_range(range);
        }
    }

    Hunk {
        old_start: old.0,
        old_len: old.1,
        new_start: new.0,
        new_len: new.1,
        lines: Vec::new(),
    }
}

/// `start[,len]`; a missing length means one line.
fn parse_range(range: &str) -> (usize, Option<usize>) {
    let mut parts = range.splitn(2, ',');
    let start = parts.next().and_then(|s| s.parse().ok());
    let len = match parts.next() {
        Some(len) => len.parse().ok(),
        None => start.map(|_| 1),
    };
    (start.unwrap_or(1), len)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_hunk() {
        let hunks = parse_hunks("--- a\n+++ b\n@@ -2,2 +2 @@\n-old\n-gone\n+new").unwrap();
        assert_eq!(hunks.len(), 1);

        let hunk = &hunks[0];
        assert_eq!(hunk.old_start, 2);
        assert_eq!(hunk.old_len, Some(2));
        assert_eq!(hunk.new_start, 2);
        assert_eq!(hunk.new_len, Some(1));
        assert_eq!(hunk.pre_image(), vec!["old\n", "gone\n"]);
        assert_eq!(hunk.post_image(), vec!["new\n"]);
    }

    #[test]
    fn test_no_newline_marker_applies_to_previous_line() {
        let patch = "@@ -1 +1 @@\n-a\n\\ No newline at end of file\n+b\n\\ No newline at end of file";
        let hunks = parse_hunks(patch).unwrap();
        assert_eq!(hunks[0].pre_image(), vec!["a"]);
        assert_eq!(hunks[0].post_image(), vec!["b"]);
    }

    #[test]
    fn test_line_endings_are_kept() {
        let hunks = parse_hunks("@@ -1,2 +1 @@\r\n-x\r-a\r\n+y\n").unwrap();
        assert_eq!(hunks[0].pre_image(), vec!["x\r", "a\r\n"]);
        assert_eq!(hunks[0].post_image(), vec!["y\n"]);
    }

    #[test]
    fn test_insertion_index_uses_old_start() {
        let hunks = parse_hunks("@@ -3,0 +4,2 @@\n+x\n+y").unwrap();
        assert_eq!(hunks[0].old_index(), 3);

        let hunks = parse_hunks("@@ -3,2 +2,0 @@\n-x\n-y").unwrap();
        assert_eq!(hunks[0].old_index(), 2);
    }

    #[test]
    fn test_header_without_numbers_defaults_to_top() {
        let hunks = parse_hunks("@@ @@\n-a\n+b").unwrap();
        assert_eq!(hunks[0].old_start, 1);
        assert_eq!(hunks[0].old_len, None);
        assert_eq!(hunks[0].old_index(), 0);
    }

    #[test]
    fn test_removed_line_that_looks_like_header() {
        // "-- note" removed, "++ note" added: counts say the hunk is not done yet.
        let patch = "@@ -1 +1 @@\n--- note\n+++ note";
        let hunks = parse_hunks(patch).unwrap();
        assert_eq!(hunks.len(), 1);
        assert_eq!(hunks[0].pre_image(), vec!["-- note\n"]);
        assert_eq!(hunks[0].post_image(), vec!["++ note\n"]);
    }

    #[test]
    fn test_multiple_files_split_into_hunks() {
        let patch = "--- a\n+++ a\n@@ -1 +1 @@\n-x\n+y\n--- b\n+++ b\n@@ -1 +1 @@\n-p\n+q";
        let hunks = parse_hunks(patch).unwrap();
        assert_eq!(hunks.len(), 2);
        assert_eq!(hunks[1].post_image(), vec!["q\n"]);
    }

    #[test]
    fn test_garbage_has_no_hunks() {
        assert_eq!(parse_hunks("not a diff at all"), Err(PatchError::NoHunks));
        assert_eq!(parse_hunks(""), Err(PatchError::NoHunks));
    }
}
