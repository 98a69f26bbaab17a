use folio_crypto::canonical_content;
use folio_types::Content;
use serde::{Deserialize, Serialize};

use crate::line_diff::{diff_lines, render_unified, DiffLine, LineOp};
use crate::section::{summarize_sections, SectionChange};

/// Full comparison of two documents.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentDiff {
    pub lines: Vec<DiffLine>,
    pub unified_diff: String,
    pub section_summary: Vec<SectionChange>,
    pub added_line_count: usize,
    pub removed_line_count: usize,
}

impl DocumentDiff {
    pub fn is_empty(&self) -> bool {
        self.added_line_count == 0 && self.removed_line_count == 0
    }
}

/// Diff two documents through their canonical serializations.
pub fn diff_documents(from: &Content, to: &Content) -> DocumentDiff {
    let lines = diff_lines(&canonical_content(from), &canonical_content(to));
    let added_line_count = lines.iter().filter(|l| l.op == LineOp::Insert).count();
    let removed_line_count = lines.iter().filter(|l| l.op == LineOp::Delete).count();
    DocumentDiff {
        unified_diff: render_unified(&lines),
        section_summary: summarize_sections(from, to),
        lines,
        added_line_count,
        removed_line_count,
    }
}
