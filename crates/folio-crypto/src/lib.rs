//! Canonical serialization and content hashing for Folio.
//!
//! Hashing, line diffing and section comparison all go through the single
//! routine in [`canonical`], so two documents that are equal as values always
//! produce identical text, hashes and diffs regardless of how their maps were
//! built.

pub mod canonical;
pub mod hasher;

pub use canonical::{canonical_content, canonical_value};
pub use hasher::{commit_hash, content_hash, CommitFields, ContentHasher};
