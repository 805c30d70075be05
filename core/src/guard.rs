#![deny(missing_docs)]

//! # Contract Guard
//!
//! Interceptor composed around a request handler: the request is checked before
//! the handler runs and the response after it returns. Both checks can be gated
//! behind a debug environment variable.

use crate::config::GuardConfig;
use crate::error::GuardResult;
use crate::http::{GenericRequest, GenericResponse};
use crate::spec::SpecCache;
use crate::validator::SwaggerValidator;
use std::sync::Arc;
use tracing::{debug, warn};

/// Validates traffic for a single operation.
#[derive(Debug, Clone)]
pub struct ContractGuard {
    validator: Arc<SwaggerValidator>,
    operation_id: String,
    config: GuardConfig,
}

impl ContractGuard {
    /// Creates a guard with the default configuration (always on, both directions).
    pub fn new(validator: Arc<SwaggerValidator>, operation_id: impl Into<String>) -> Self {
        Self {
            validator,
            operation_id: operation_id.into(),
            config: GuardConfig::default(),
        }
    }

    /// Replaces the configuration. `spec_path` is ignored; the validator is already bound.
    pub fn with_config(mut self, config: GuardConfig) -> Self {
        self.config = config;
        self
    }

    /// Loads `config.spec_path` through `cache` and checks that `operation_id` exists.
    ///
    /// # Errors
    ///
    /// Spec loading errors, index construction errors, or `UnknownOperation`.
    pub fn from_config(
        cache: &SpecCache,
        config: &GuardConfig,
        operation_id: impl Into<String>,
    ) -> GuardResult<Self> {
        let validator = SwaggerValidator::open(cache, &config.spec_path)?;
        let operation_id = operation_id.into();
        validator.operation(&operation_id)?;
        Ok(Self::new(Arc::new(validator), operation_id).with_config(config.clone()))
    }

    /// The guarded operation.
    pub fn operation_id(&self) -> &str {
        &self.operation_id
    }

    /// The bound validator.
    pub fn validator(&self) -> &Arc<SwaggerValidator> {
        &self.validator
    }

    /// Whether the debug gate currently lets validation through.
    pub fn is_active(&self) -> bool {
        self.config.gate_open()
    }

    /// Whether [`check_request`](Self::check_request) would validate right now.
    pub fn checks_requests(&self) -> bool {
        self.config.validate_requests && self.is_active()
    }

    /// Whether [`check_response`](Self::check_response) would validate right now.
    pub fn checks_responses(&self) -> bool {
        self.config.validate_responses && self.is_active()
    }

    /// Checks a request, unless request checks are disabled or gated off.
    ///
    /// # Errors
    ///
    /// `Request` with every violation, or a lookup error.
    pub fn check_request(&self, request: &GenericRequest) -> GuardResult<()> {
        if !self.config.validate_requests || !self.gate("request") {
            return Ok(());
        }
        self.validator
            .validate_request(&self.operation_id, request)
            .inspect_err(|e| warn!(operation = %self.operation_id, error = %e, "request rejected"))
    }

    /// Checks a response, unless response checks are disabled or gated off.
    ///
    /// # Errors
    ///
    /// The first response failure, or a lookup error.
    pub fn check_response(&self, response: &GenericResponse) -> GuardResult<()> {
        if !self.config.validate_responses || !self.gate("response") {
            return Ok(());
        }
        self.validator
            .validate_response(&self.operation_id, response)
            .inspect_err(|e| warn!(operation = %self.operation_id, error = %e, "response rejected"))
    }

    /// Runs `handler` between the request and response checks.
    ///
    /// The handler is not invoked when the request check fails.
    ///
    /// # Errors
    ///
    /// Whichever check fails first.
    pub fn intercept<F>(&self, request: &GenericRequest, handler: F) -> GuardResult<GenericResponse>
    where
        F: FnOnce(&GenericRequest) -> GenericResponse,
    {
        self.check_request(request)?;
        let response = handler(request);
        self.check_response(&response)?;
        Ok(response)
    }

    fn gate(&self, direction: &str) -> bool {
        let open = self.is_active();
        if !open {
            debug!(
                operation = %self.operation_id,
                direction,
                env_var = %self.config.debug_env_var,
                "validation skipped, debug gate closed"
            );
        }
        open
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GuardError;
    use crate::spec::SpecDocument;
    use serde_json::json;
    use std::cell::Cell;

    const SUBJECTS: &str = r#"
swagger: "2.0"
info: { title: Subjects, version: "1" }
paths:
  /subjects:
    get:
      operationId: api.views.listSubjects
      parameters:
        - { name: limit, in: query, type: integer }
      responses:
        200:
          description: ok
          schema: { type: array, items: { type: string } }
"#;

    fn guard() -> ContractGuard {
        let doc = SpecDocument::parse("subjects.yaml", SUBJECTS).unwrap();
        ContractGuard::new(
            Arc::new(SwaggerValidator::new(Arc::new(doc))),
            "api.views.listSubjects",
        )
    }

    #[test]
    fn test_intercept_passes_conforming_traffic() {
        let resp = guard()
            .intercept(&GenericRequest::new("/subjects").with_query("limit", "5"), |_| {
                GenericResponse::json(200, json!(["a", "b"]))
            })
            .unwrap();
        assert_eq!(resp.status().as_key(), "200");
    }

    #[test]
    fn test_bad_request_skips_handler() {
        let called = Cell::new(false);
        let err = guard()
            .intercept(&GenericRequest::new("/subjects").with_query("limit", "lots"), |_| {
                called.set(true);
                GenericResponse::json(200, json!([]))
            })
            .unwrap_err();
        assert!(err.is_request_error());
        assert!(!called.get());
    }

    #[test]
    fn test_bad_response_is_reported_after_handler() {
        let err = guard()
            .intercept(&GenericRequest::new("/subjects"), |_| {
                GenericResponse::json(200, json!([1]))
            })
            .unwrap_err();
        assert!(matches!(err, GuardError::SchemaViolation { .. }));
    }

    #[test]
    fn test_disabled_directions_are_skipped() {
        let config = GuardConfig {
            validate_requests: false,
            validate_responses: false,
            ..GuardConfig::default()
        };
        let guard = guard().with_config(config);
        assert!(!guard.checks_requests());
        assert!(!guard.checks_responses());
        assert!(guard
            .check_request(&GenericRequest::new("/subjects").with_query("limit", "lots"))
            .is_ok());
        assert!(guard.check_response(&GenericResponse::json(500, json!({}))).is_ok());
    }

    #[test]
    fn test_closed_gate_skips_validation() {
        let config = GuardConfig {
            debug_only: true,
            debug_env_var: "SPECGUARD_TEST_GATE_NEVER_SET".to_string(),
            ..GuardConfig::default()
        };
        let guard = guard().with_config(config);
        assert!(!guard.is_active());
        assert!(!guard.checks_requests());
        assert!(guard.check_response(&GenericResponse::json(123, json!({}))).is_ok());
    }
}
