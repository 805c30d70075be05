#![deny(missing_docs)]

//! # Specguard Core
//!
//! Validates HTTP traffic against a Swagger 2.0 contract.
//!
//! A [`SpecCache`] loads documents once per source, a [`SwaggerValidator`] indexes
//! the operations of one document, and the request / response validators check
//! [`GenericRequest`] / [`GenericResponse`] values against a single operation.
//! [`ContractGuard`] layers both checks around a handler.

/// Shared error types.
pub mod error;

/// Document loading, structural checks and caching.
pub mod spec;

/// JSON Schema evaluation of document fragments.
pub mod schema;

/// Operation lookup table.
pub mod operations;

/// Framework-agnostic request and response.
pub mod http;

/// Request validation.
pub mod request;

/// Response validation.
pub mod response;

/// Document-bound validator facade.
pub mod validator;

/// Guard settings.
pub mod config;

/// Request/response interceptor.
pub mod guard;

/// Actix Web integration.
#[cfg(feature = "actix")]
pub mod actix;

#[cfg(feature = "actix")]
pub use actix::{generic_request, generic_response, ContractValidation};
pub use config::GuardConfig;
pub use error::{
    GuardError, GuardResult, ParamLocation, ParamViolation, RequestViolations, ViolationKind,
};
pub use guard::ContractGuard;
pub use http::{GenericRequest, GenericResponse, Payload, Status, UploadedFile};
pub use operations::{Operation, OperationIndex};
pub use request::validate_request;
pub use response::validate_response;
pub use spec::{SpecCache, SpecDocument, DEFAULT_SPEC_PATH};
pub use validator::SwaggerValidator;
