use super::hunk::{Hunk, LineKind};
use super::lines::{default_ending, ending_near, line_content, line_ending, split_lines, terminate_inner_lines};
use super::PatchError;

/// How hunk lines are compared with base lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineMatch {
    /// Content and terminator must both match.
    Exact,
    /// Only content is compared. Kept lines retain the base's terminators
    /// and added lines take the terminator of the line they replace.
    IgnoreEndings,
}

impl LineMatch {
    fn same(self, base: &str, expected: &str) -> bool {
        match self {
            LineMatch::Exact => base == expected,
            LineMatch::IgnoreEndings => line_content(base) == line_content(expected),
        }
    }
}

/// Apply hunks strictly: every pre-image must be found in the base.
///
/// Each hunk is looked up at the position its header names, shifted by what
/// earlier hunks added or removed. When the lines are not there, nearby
/// positions are searched outward (closest first, earlier before later).
pub fn apply_hunks(base: &str, hunks: &[Hunk], matching: LineMatch) -> Result<String, PatchError> {
    let mut image: Vec<String> = split_lines(base).into_iter().map(str::to_string).collect();
    let fallback_ending = default_ending(&image);
    let mut offset: isize = 0;

    for (idx, hunk) in hunks.iter().enumerate() {
        let pre = hunk.pre_image();

        let expected = clamp(hunk.old_index() as isize + offset, image.len());
        let pos = find_position(&image, &pre, expected, matching)
            .ok_or(PatchError::HunkMismatch { hunk: idx + 1 })?;

        let post = match matching {
            LineMatch::Exact => hunk.post_image(),
            LineMatch::IgnoreEndings => {
                let lead = ending_near(&image, pos, &fallback_ending);
                carry_endings(hunk, &image[pos..pos + pre.len()], lead)
            }
        };

        let post_len = post.len();
        image.splice(pos..pos + pre.len(), post);

        offset += pos as isize - expected as isize;
        offset += post_len as isize - pre.len() as isize;
    }

    terminate_inner_lines(&mut image, &fallback_ending);
    Ok(image.concat())
}

/// Build the replacement for a matched `region`, keeping the base's own
/// context lines and terminators.
fn carry_endings(hunk: &Hunk, region: &[String], lead: String) -> Vec<String> {
    let mut base_lines = region.iter();
    let mut ending = lead;
    let mut out = Vec::with_capacity(hunk.lines.len());

    for line in &hunk.lines {
        match line.kind {
            LineKind::Context => {
                if let Some(kept) = base_lines.next() {
                    ending = line_ending(kept).to_string();
                    out.push(kept.clone());
                }
            }
            LineKind::Remove => {
                if let Some(gone) = base_lines.next() {
                    ending = line_ending(gone).to_string();
                }
            }
            LineKind::Add => {
                let terminator = if line.has_ending() { ending.as_str() } else { "" };
                out.push(format!("{}{}", line.text, terminator));
            }
        }
    }
    out
}

fn clamp(pos: isize, len: usize) -> usize {
    pos.clamp(0, len as isize) as usize
}

fn find_position(image: &[String], pre: &[String], expected: usize, matching: LineMatch) -> Option<usize> {
    if pre.len() > image.len() {
        return None;
    }
    let last = image.len() - pre.len();
    let expected = expected.min(last);

    let matches_at = |pos: usize| {
        image[pos..pos + pre.len()]
            .iter()
            .zip(pre)
            .all(|(base, want)| matching.same(base, want))
    };

    if matches_at(expected) {
        return Some(expected);
    }

    (1..=last.max(expected)).find_map(|distance| {
        let before = expected.checked_sub(distance).filter(|&pos| matches_at(pos));
        let after = Some(expected + distance).filter(|&pos| pos <= last && matches_at(pos));
        before.or(after)
    })
}
