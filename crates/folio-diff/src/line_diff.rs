//! Line-level diff between two canonical texts.
//!
//! Uses the `similar` crate's Myers implementation, which yields an edit
//! script with the minimum number of inserted and deleted lines. Within each
//! run of changes between two equal lines, every deletion is emitted before
//! every insertion, so the output is the same for the same inputs no matter
//! how the underlying algorithm interleaves them.

use serde::{Deserialize, Serialize};
use similar::{capture_diff_slices, Algorithm, DiffOp};

/// Edit operation applied to one line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineOp {
    Equal,
    Insert,
    Delete,
}

impl LineOp {
    /// Prefix used in unified rendering.
    pub fn prefix(self) -> char {
        match self {
            LineOp::Equal => ' ',
            LineOp::Insert => '+',
            LineOp::Delete => '-',
        }
    }
}

/// One line of an edit script.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffLine {
    pub op: LineOp,
    pub text: String,
}

impl DiffLine {
    fn new(op: LineOp, text: &str) -> Self {
        Self {
            op,
            text: text.to_string(),
        }
    }
}

/// Split on `\n` only. The empty string has no lines; anything else splits
/// exactly, so joining the result with `\n` reproduces the input.
fn split_lines(text: &str) -> Vec<&str> {
    if text.is_empty() {
        Vec::new()
    } else {
        text.split('\n').collect()
    }
}

/// Compute the edit script turning `from` into `to`.
pub fn diff_lines(from: &str, to: &str) -> Vec<DiffLine> {
    let old = split_lines(from);
    let new = split_lines(to);

    let mut out = Vec::with_capacity(old.len().max(new.len()));
    let mut deletes: Vec<&str> = Vec::new();
    let mut inserts: Vec<&str> = Vec::new();

    for op in capture_diff_slices(Algorithm::Myers, &old, &new) {
        match op {
            DiffOp::Equal { old_index, len, .. } => {
                flush(&mut out, &mut deletes, &mut inserts);
                out.extend(
                    old[old_index..old_index + len]
                        .iter()
                        .map(|line| DiffLine::new(LineOp::Equal, line)),
                );
            }
            DiffOp::Delete {
                old_index, old_len, ..
            } => deletes.extend_from_slice(&old[old_index..old_index + old_len]),
            DiffOp::Insert {
                new_index, new_len, ..
            } => inserts.extend_from_slice(&new[new_index..new_index + new_len]),
            DiffOp::Replace {
                old_index,
                old_len,
                new_index,
                new_len,
            } => {
                deletes.extend_from_slice(&old[old_index..old_index + old_len]);
                inserts.extend_from_slice(&new[new_index..new_index + new_len]);
            }
        }
    }
    flush(&mut out, &mut deletes, &mut inserts);
    out
}

fn flush<'a>(out: &mut Vec<DiffLine>, deletes: &mut Vec<&'a str>, inserts: &mut Vec<&'a str>) {
    out.extend(deletes.drain(..).map(|line| DiffLine::new(LineOp::Delete, line)));
    out.extend(inserts.drain(..).map(|line| DiffLine::new(LineOp::Insert, line)));
}

/// Render an edit script as unified-diff body lines joined by `\n`.
pub fn render_unified(lines: &[DiffLine]) -> String {
    lines
        .iter()
        .map(|l| format!("{}{}", l.op.prefix(), l.text))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Rebuild the original text from an edit script (equal + delete lines).
pub fn source_text(lines: &[DiffLine]) -> String {
    join_where(lines, |op| op != LineOp::Insert)
}

/// Rebuild the target text from an edit script (equal + insert lines).
pub fn target_text(lines: &[DiffLine]) -> String {
    join_where(lines, |op| op != LineOp::Delete)
}

fn join_where(lines: &[DiffLine], keep: impl Fn(LineOp) -> bool) -> String {
    lines
        .iter()
        .filter(|l| keep(l.op))
        .map(|l| l.text.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}
