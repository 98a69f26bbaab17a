//! Diff engine for Folio.
//!
//! Compares two manuscript revisions without persisting anything: every call
//! recomputes from the two documents. Both documents are first rendered with
//! [`folio_crypto::canonical_content`], so results never depend on map
//! iteration order.
//!
//! # Key Types
//!
//! - [`DiffLine`] / [`LineOp`] -- line-level edit script (Myers, minimal)
//! - [`SectionChange`] / [`SectionAction`] -- per-section classification
//! - [`DocumentDiff`] -- both of the above plus unified text and line counts

pub mod document;
pub mod line_diff;
pub mod section;

pub use document::{diff_documents, DocumentDiff};
pub use line_diff::{diff_lines, render_unified, source_text, target_text, DiffLine, LineOp};
pub use section::{summarize_sections, SectionAction, SectionChange};
