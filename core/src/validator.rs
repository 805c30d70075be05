#![deny(missing_docs)]

//! # Swagger Validator
//!
//! Facade binding one document to its operation index. The index is built on first
//! use and memoized on the instance, never shared between instances.

use crate::error::GuardResult;
use crate::http::{GenericRequest, GenericResponse};
use crate::operations::{Operation, OperationIndex};
use crate::request::validate_request;
use crate::response::validate_response;
use crate::spec::{SpecCache, SpecDocument};
use std::path::Path;
use std::sync::{Arc, OnceLock};

/// Validates requests and responses against one document.
#[derive(Debug)]
pub struct SwaggerValidator {
    document: Arc<SpecDocument>,
    operations: OnceLock<OperationIndex>,
}

impl SwaggerValidator {
    /// Wraps an already loaded document.
    pub fn new(document: Arc<SpecDocument>) -> Self {
        Self {
            document,
            operations: OnceLock::new(),
        }
    }

    /// Loads `source` through `cache` and wraps it.
    ///
    /// # Errors
    ///
    /// Any spec loading error from [`SpecCache::load`].
    pub fn open(cache: &SpecCache, source: impl AsRef<Path>) -> GuardResult<Self> {
        Ok(Self::new(cache.load(source)?))
    }

    /// The underlying document.
    pub fn document(&self) -> &Arc<SpecDocument> {
        &self.document
    }

    /// The operation index, built on first call.
    ///
    /// # Errors
    ///
    /// Index construction errors (`DuplicateOperation`, `InvalidSchema`). A failed
    /// build is not memoized.
    pub fn operations(&self) -> GuardResult<&OperationIndex> {
        if let Some(index) = self.operations.get() {
            return Ok(index);
        }
        let index = OperationIndex::build(&self.document)?;
        Ok(self.operations.get_or_init(|| index))
    }

    /// Resolves an operation by id (normalized before lookup).
    ///
    /// # Errors
    ///
    /// `UnknownOperation`, or any index construction error.
    pub fn operation(&self, operation_id: &str) -> GuardResult<&Operation> {
        self.operations()?.resolve(operation_id)
    }

    /// Validates a request for `operation_id`.
    ///
    /// # Errors
    ///
    /// `Request` carrying every violation, or a lookup error.
    pub fn validate_request(&self, operation_id: &str, request: &GenericRequest) -> GuardResult<()> {
        let operation = self.operation(operation_id)?;
        validate_request(operation, request)?;
        Ok(())
    }

    /// Validates a response for `operation_id`.
    ///
    /// # Errors
    ///
    /// The first response failure, or a lookup error.
    pub fn validate_response(
        &self,
        operation_id: &str,
        response: &GenericResponse,
    ) -> GuardResult<()> {
        let operation = self.operation(operation_id)?;
        validate_response(operation, response)
    }
}
