#![deny(missing_docs)]

//! # Response Validation
//!
//! Checks a [`GenericResponse`] against the response an operation declares for its status.
//! The first failure ends the check.

use crate::error::{GuardError, GuardResult};
use crate::http::GenericResponse;
use crate::operations::{Operation, ResponseSpec};
use crate::request::coerce;
use tracing::debug;

/// Media type assumed when a response carries no content type.
pub const DEFAULT_MEDIA_TYPE: &str = "application/json";

/// Validates `response` against `operation`.
///
/// # Errors
///
/// * `NoMatchingResponse` if neither the status nor `default` is declared.
/// * `BodyNotEmpty` if the declared response has no schema but the body has content.
/// * `ContentTypeMismatch` / `UnsupportedContentType` for media type problems.
/// * `BodyDecode` / `BodyShape` for malformed bodies.
/// * `SchemaViolation` for the first value that fails the body schema.
/// * `ResponseHeader` for a declared header with an invalid value.
pub fn validate_response(operation: &Operation, response: &GenericResponse) -> GuardResult<()> {
    let status = response.status().as_key();
    let declared = operation
        .response_for(&status)
        .ok_or_else(|| GuardError::NoMatchingResponse {
            operation_id: operation.operation_id.clone(),
            status: status.clone(),
        })?;

    let result = validate_body(declared, response).and_then(|()| validate_headers(declared, response));
    if let Err(e) = &result {
        debug!(
            operation = %operation.operation_id,
            status = %status,
            kind = e.kind(),
            "response does not conform"
        );
    }
    result
}

fn validate_body(declared: &ResponseSpec, response: &GenericResponse) -> GuardResult<()> {
    let Some(schema) = &declared.schema else {
        return if response.body().is_empty() {
            Ok(())
        } else {
            Err(GuardError::BodyNotEmpty)
        };
    };

    let media = media_type(response.content_type());
    if !declared.content_types.is_empty()
        && !declared
            .content_types
            .iter()
            .any(|allowed| media_type(allowed) == media)
    {
        return Err(GuardError::ContentTypeMismatch {
            expected: declared.content_types.clone(),
            actual: media,
        });
    }

    if schema.is_file() || media.starts_with("text/") {
        return Ok(());
    }
    if !is_json(&media) {
        return Err(GuardError::UnsupportedContentType { content_type: media });
    }

    let body = response.body().decode()?;
    let context = format!("response {}", declared.status);
    match schema.first_failure(&body, &context)? {
        None => Ok(()),
        Some(failure) => Err(GuardError::SchemaViolation {
            pointer: failure.pointer,
            reason: failure.reason,
        }),
    }
}

fn validate_headers(declared: &ResponseSpec, response: &GenericResponse) -> GuardResult<()> {
    for (name, header) in &declared.headers {
        let Some(raw) = response.header(name) else {
            continue;
        };
        let value = coerce(&header.simple, &[raw.to_string()]).map_err(|reason| {
            GuardError::ResponseHeader {
                name: name.clone(),
                reason,
            }
        })?;
        let context = format!("response {} header {}", declared.status, name);
        if let Some(failure) = header.schema.first_failure(&value, &context)? {
            return Err(GuardError::ResponseHeader {
                name: name.clone(),
                reason: failure.reason,
            });
        }
    }
    Ok(())
}

/// Lowercased media type without parameters; empty means [`DEFAULT_MEDIA_TYPE`].
pub fn media_type(content_type: &str) -> String {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    if essence.is_empty() {
        DEFAULT_MEDIA_TYPE.to_string()
    } else {
        essence
    }
}

fn is_json(media: &str) -> bool {
    media == DEFAULT_MEDIA_TYPE || media.ends_with("+json")
}
