#![deny(missing_docs)]

//! # Swagger Documents
//!
//! Loading, structural validation and caching of Swagger 2.0 documents.

/// Parsed document type.
pub mod document;
/// Local `$ref` helpers.
pub(crate) mod refs;
/// Serde shims for the document tree.
pub mod shims;
/// Process-lifetime document cache.
pub mod store;
/// Structural conformance checks.
pub(crate) mod validation;

pub use document::SpecDocument;
pub use store::{SpecCache, DEFAULT_SPEC_PATH};
