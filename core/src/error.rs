//! # Error Handling
//!
//! Provides the unified `GuardError` enum used across the workspace, plus the
//! per-parameter violation records collected by request validation.

use derive_more::Display;
use std::fmt;
use std::path::PathBuf;

/// Where a declared parameter is read from on an incoming request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ParamLocation {
    /// A templated segment of the URL path (`/subjects/{id}`).
    Path,
    /// The query string.
    Query,
    /// A request header (matched case-insensitively).
    Header,
    /// A url-encoded or multipart form field.
    FormData,
    /// An uploaded file (`in: formData`, `type: file`).
    File,
    /// The request body, validated as a whole JSON value.
    Body,
}

impl ParamLocation {
    /// Returns the spelling used in Swagger documents and error messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            ParamLocation::Path => "path",
            ParamLocation::Query => "query",
            ParamLocation::Header => "header",
            ParamLocation::FormData => "formData",
            ParamLocation::File => "file",
            ParamLocation::Body => "body",
        }
    }
}

impl fmt::Display for ParamLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classification of a single parameter failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViolationKind {
    /// Required parameter absent from the request.
    Missing,
    /// Value could not be coerced to, or is not of, the declared type.
    Type,
    /// Value does not satisfy the declared `format`.
    Format,
    /// Value is not one of the declared `enum` members.
    Enum,
    /// Any other declared constraint (`pattern`, bounds, lengths, ...).
    Constraint,
    /// Body text is not valid JSON, or not an object/array.
    Decode,
    /// Body value fails its JSON Schema.
    Schema,
}

impl ViolationKind {
    /// Lowercase name used in rendered error bodies.
    pub fn as_str(&self) -> &'static str {
        match self {
            ViolationKind::Missing => "missing",
            ViolationKind::Type => "type",
            ViolationKind::Format => "format",
            ViolationKind::Enum => "enum",
            ViolationKind::Constraint => "constraint",
            ViolationKind::Decode => "decode",
            ViolationKind::Schema => "schema",
        }
    }
}

/// A single parameter that failed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamViolation {
    /// Declared parameter name.
    pub name: String,
    /// Declared parameter location.
    pub location: ParamLocation,
    /// Failure classification.
    pub kind: ViolationKind,
    /// Human-readable reason.
    pub message: String,
}

impl ParamViolation {
    /// Creates a violation for a required parameter that was not supplied.
    pub fn missing(name: impl Into<String>, location: ParamLocation) -> Self {
        Self {
            name: name.into(),
            location,
            kind: ViolationKind::Missing,
            message: "required parameter is missing".to_string(),
        }
    }

    /// Creates a violation of the given kind.
    pub fn new(
        name: impl Into<String>,
        location: ParamLocation,
        kind: ViolationKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            location,
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for ParamViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} parameter '{}': {}", self.location, self.name, self.message)
    }
}

/// Every violation found in one request, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RequestViolations(pub Vec<ParamViolation>);

impl RequestViolations {
    /// Iterates the collected violations.
    pub fn iter(&self) -> std::slice::Iter<'_, ParamViolation> {
        self.0.iter()
    }

    /// Number of violations.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when nothing was collected.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for RequestViolations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        f.write_str(&parts.join("; "))
    }
}

/// The Global Error Enum.
///
/// One variant per failure kind; spec loading failures are fatal to the load,
/// everything else is fatal to the single validation call that produced it.
#[derive(Debug, Display)]
pub enum GuardError {
    /// The spec source could not be read.
    #[display("Spec file {} could not be read: {source}", path.display())]
    SpecNotFound {
        /// Source identifier that was requested.
        path: PathBuf,
        /// Underlying I/O failure.
        source: std::io::Error,
    },

    /// The spec source is not parseable as YAML/JSON.
    #[display("Spec file {} is not valid YAML: {source}", path.display())]
    SpecFormat {
        /// Source identifier that was requested.
        path: PathBuf,
        /// Underlying parser failure.
        source: serde_yaml::Error,
    },

    /// The spec parses but is not a conformant Swagger 2.0 document.
    #[display("Spec file {} is not a valid Swagger 2.0 document: {}", path.display(), problems.join("; "))]
    SpecSchema {
        /// Source identifier that was requested.
        path: PathBuf,
        /// Every structural problem found.
        problems: Vec<String>,
    },

    /// A schema fragment in the document could not be compiled.
    #[display("Schema for {context} is not a valid JSON Schema: {reason}")]
    InvalidSchema {
        /// Which part of the document the fragment belongs to.
        context: String,
        /// Compiler message.
        reason: String,
    },

    /// No operation is registered under the requested id.
    #[display("An operation with operationId {operation_id} cannot be located")]
    UnknownOperation {
        /// The id as requested by the caller.
        operation_id: String,
    },

    /// Two operations normalize to the same id.
    #[display("Operations {first} and {second} both normalize to operationId {operation_id}")]
    DuplicateOperation {
        /// The normalized id both operations share.
        operation_id: String,
        /// `METHOD path` of the operation seen first.
        first: String,
        /// `METHOD path` of the colliding operation.
        second: String,
    },

    /// The request failed one or more parameter checks.
    #[display("Request does not conform to the contract: {_0}")]
    Request(RequestViolations),

    /// The operation declares nothing for the response status.
    #[display("Operation {operation_id} declares no response for status code {status}")]
    NoMatchingResponse {
        /// Normalized operation id.
        operation_id: String,
        /// Status code in its string form.
        status: String,
    },

    /// Body text is not valid JSON.
    #[display("Response body is not valid JSON: {source}")]
    BodyDecode {
        /// Underlying parser failure.
        source: serde_json::Error,
    },

    /// Body is neither JSON text, an object, nor an array.
    #[display("Response body should be a JSON string, object, or array, found {found}")]
    BodyShape {
        /// The JSON type that was supplied.
        found: &'static str,
    },

    /// The response declares no schema but the body is not empty.
    #[display("Response body should be empty")]
    BodyNotEmpty,

    /// The content type is not one the operation produces.
    #[display("Response content-type '{actual}' is not among the declared content-types [{}]", expected.join(", "))]
    ContentTypeMismatch {
        /// Declared media types.
        expected: Vec<String>,
        /// Media type supplied with the response.
        actual: String,
    },

    /// The content type is declared but has no body validation support.
    #[display("Response content-type '{content_type}' cannot be validated")]
    UnsupportedContentType {
        /// Media type supplied with the response.
        content_type: String,
    },

    /// The body fails its JSON Schema.
    #[display("Response body fails schema at '{pointer}': {reason}")]
    SchemaViolation {
        /// JSON pointer to the first offending value.
        pointer: String,
        /// Human-readable reason.
        reason: String,
    },

    /// A declared response header carries an invalid value.
    #[display("Response header '{name}' is invalid: {reason}")]
    ResponseHeader {
        /// Header name as declared.
        name: String,
        /// Human-readable reason.
        reason: String,
    },
}

impl std::error::Error for GuardError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GuardError::SpecNotFound { source, .. } => Some(source),
            GuardError::SpecFormat { source, .. } => Some(source),
            GuardError::BodyDecode { source } => Some(source),
            _ => None,
        }
    }
}

impl From<RequestViolations> for GuardError {
    fn from(violations: RequestViolations) -> Self {
        GuardError::Request(violations)
    }
}

impl GuardError {
    /// Short, stable name of the failure kind, used in rendered error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            GuardError::SpecNotFound { .. } => "spec_not_found",
            GuardError::SpecFormat { .. } => "spec_format",
            GuardError::SpecSchema { .. } => "spec_schema",
            GuardError::InvalidSchema { .. } => "invalid_schema",
            GuardError::UnknownOperation { .. } => "unknown_operation",
            GuardError::DuplicateOperation { .. } => "duplicate_operation",
            GuardError::Request(_) => "request_violation",
            GuardError::NoMatchingResponse { .. } => "no_matching_response",
            GuardError::BodyDecode { .. } => "body_decode",
            GuardError::BodyShape { .. } => "body_shape",
            GuardError::BodyNotEmpty => "body_not_empty",
            GuardError::ContentTypeMismatch { .. } => "content_type_mismatch",
            GuardError::UnsupportedContentType { .. } => "unsupported_content_type",
            GuardError::SchemaViolation { .. } => "schema_violation",
            GuardError::ResponseHeader { .. } => "response_header",
        }
    }

    /// True for failures caused by the incoming request rather than the server.
    pub fn is_request_error(&self) -> bool {
        matches!(self, GuardError::Request(_))
    }
}

/// Helper type alias for Result using GuardError.
pub type GuardResult<T> = Result<T, GuardError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error, ErrorKind};

    #[test]
    fn test_spec_not_found_keeps_source() {
        let err = GuardError::SpecNotFound {
            path: PathBuf::from("dunno.yaml"),
            source: Error::new(ErrorKind::NotFound, "no such file"),
        };
        assert!(std::error::Error::source(&err).is_some());
        assert_eq!(
            err.to_string(),
            "Spec file dunno.yaml could not be read: no such file"
        );
    }

    #[test]
    fn test_request_violations_display_joins_entries() {
        let violations = RequestViolations(vec![
            ParamViolation::missing("id", ParamLocation::Path),
            ParamViolation::new("limit", ParamLocation::Query, ViolationKind::Type, "expected integer"),
        ]);
        let err: GuardError = violations.into();
        assert!(err.is_request_error());
        assert_eq!(
            err.to_string(),
            "Request does not conform to the contract: path parameter 'id': required parameter is missing; query parameter 'limit': expected integer"
        );
    }

    #[test]
    fn test_content_type_mismatch_names_both_sides() {
        let err = GuardError::ContentTypeMismatch {
            expected: vec!["application/json".into()],
            actual: "application/xml".into(),
        };
        assert_eq!(err.kind(), "content_type_mismatch");
        assert!(err.to_string().contains("application/xml"));
        assert!(err.to_string().contains("[application/json]"));
    }
}
