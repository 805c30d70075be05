#![deny(missing_docs)]

//! # Spec Store
//!
//! Loads documents from disk and keeps them for the lifetime of the cache.
//! There is no eviction: a source is parsed at most once per cache unless two
//! threads race on the first load, in which case the first insert wins.

use crate::error::{GuardError, GuardResult};
use crate::spec::document::SpecDocument;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, info};

/// Default spec file name.
pub const DEFAULT_SPEC_PATH: &str = "swagger.yaml";

/// Cache of parsed documents keyed by source path.
///
/// Owned by whatever composes the validators and shared by reference.
#[derive(Debug, Default)]
pub struct SpecCache {
    documents: RwLock<HashMap<PathBuf, Arc<SpecDocument>>>,
    parses: AtomicUsize,
}

impl SpecCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the document for `source`, reading and validating it on first use.
    ///
    /// The key is the path exactly as given; `./swagger.yaml` and `swagger.yaml`
    /// are distinct entries.
    ///
    /// # Errors
    ///
    /// * `SpecNotFound` if the file cannot be read.
    /// * `SpecFormat` / `SpecSchema` as for [`SpecDocument::parse`].
    pub fn load(&self, source: impl AsRef<Path>) -> GuardResult<Arc<SpecDocument>> {
        let source = source.as_ref();

        if let Some(doc) = self.get(source) {
            debug!(source = %source.display(), "spec cache hit");
            return Ok(doc);
        }

        info!(source = %source.display(), "loading spec document");
        let text = fs::read_to_string(source).map_err(|e| GuardError::SpecNotFound {
            path: source.to_path_buf(),
            source: e,
        })?;
        let parsed = Arc::new(SpecDocument::parse(source, &text)?);
        self.parses.fetch_add(1, Ordering::Relaxed);

        let mut documents = self
            .documents
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let doc = documents
            .entry(source.to_path_buf())
            .or_insert(parsed)
            .clone();
        Ok(doc)
    }

    /// Returns the cached document for `source` without touching the disk.
    pub fn get(&self, source: impl AsRef<Path>) -> Option<Arc<SpecDocument>> {
        self.documents
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(source.as_ref())
            .cloned()
    }

    /// Inserts an already parsed document, keyed by its source.
    ///
    /// Returns the document that ends up cached, which is the existing one if
    /// the source was already present.
    pub fn insert(&self, document: SpecDocument) -> Arc<SpecDocument> {
        let mut documents = self
            .documents
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        documents
            .entry(document.source().to_path_buf())
            .or_insert_with(|| Arc::new(document))
            .clone()
    }

    /// Number of documents parsed from disk by this cache.
    pub fn parse_count(&self) -> usize {
        self.parses.load(Ordering::Relaxed)
    }

    /// Number of cached documents.
    pub fn len(&self) -> usize {
        self.documents
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// True when nothing has been cached yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const MINIMAL: &str = r#"
swagger: "2.0"
info: { title: t, version: "1" }
paths: {}
"#;

    #[test]
    fn test_load_twice_parses_once() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(MINIMAL.as_bytes()).unwrap();

        let cache = SpecCache::new();
        let first = cache.load(file.path()).unwrap();
        let second = cache.load(file.path()).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.parse_count(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_load_missing_file_is_not_found() {
        let cache = SpecCache::new();
        let err = cache.load("definitely/not/here.yaml").unwrap_err();
        assert!(matches!(err, GuardError::SpecNotFound { .. }));
        assert!(cache.is_empty());
        assert_eq!(cache.parse_count(), 0);
    }

    #[test]
    fn test_failed_load_is_not_cached() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"swagger: \"2.0\"\n").unwrap();

        let cache = SpecCache::new();
        assert!(cache.load(file.path()).is_err());
        assert!(cache.get(file.path()).is_none());
    }

    #[test]
    fn test_insert_keeps_existing_entry() {
        let cache = SpecCache::new();
        let a = cache.insert(SpecDocument::parse("mem.yaml", MINIMAL).unwrap());
        let b = cache.insert(SpecDocument::parse("mem.yaml", MINIMAL).unwrap());
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.parse_count(), 0);
    }
}
