#![deny(missing_docs)]

//! # Request Validation
//!
//! Checks every declared parameter of an operation against a [`GenericRequest`].
//! Violations are collected across all parameters; a single bad value never hides another.

use crate::error::{ParamLocation, ParamViolation, RequestViolations, ViolationKind};
use crate::http::{GenericRequest, Payload};
use crate::operations::{CollectionFormat, Operation, Parameter, SimpleType};
use serde_json::{Number, Value};
use std::collections::BTreeMap;
use tracing::debug;

/// Validates `request` against every parameter declared by `operation`.
///
/// # Errors
///
/// Every violation found, in parameter declaration order.
pub fn validate_request(
    operation: &Operation,
    request: &GenericRequest,
) -> Result<(), RequestViolations> {
    let captures = operation.path.captures(request.path());
    let mut violations = Vec::new();

    for param in &operation.parameters {
        if let Some(violation) = check_parameter(operation, param, request, captures.as_ref()) {
            violations.push(violation);
        }
    }

    if violations.is_empty() {
        Ok(())
    } else {
        debug!(
            operation = %operation.operation_id,
            violations = violations.len(),
            "request does not conform"
        );
        Err(RequestViolations(violations))
    }
}

fn check_parameter(
    operation: &Operation,
    param: &Parameter,
    request: &GenericRequest,
    captures: Option<&BTreeMap<String, String>>,
) -> Option<ParamViolation> {
    let values: Vec<String> = match param.location {
        ParamLocation::Body => return check_body(operation, param, request.body()),
        ParamLocation::File => {
            let absent = request.file(&param.name).is_none();
            return (absent && is_enforced(param)).then(|| missing(param));
        }
        ParamLocation::Path => match captures {
            Some(captures) => captures.get(&param.name).cloned().into_iter().collect(),
            None => {
                return Some(ParamViolation::new(
                    &param.name,
                    param.location,
                    ViolationKind::Missing,
                    format!(
                        "request path '{}' does not match '{}'",
                        request.path(),
                        operation.path.as_str()
                    ),
                ))
            }
        },
        ParamLocation::Query => request.query(&param.name).map(<[String]>::to_vec).unwrap_or_default(),
        ParamLocation::FormData => request.form(&param.name).map(<[String]>::to_vec).unwrap_or_default(),
        ParamLocation::Header => request.header(&param.name).map(str::to_string).into_iter().collect(),
    };

    if values.is_empty() {
        return is_enforced(param).then(|| missing(param));
    }
    if param.allow_empty_value && values.iter().all(String::is_empty) {
        return None;
    }

    let simple = param.simple.as_ref()?;
    let value = match coerce(simple, &values) {
        Ok(value) => value,
        Err(reason) => {
            return Some(ParamViolation::new(
                &param.name,
                param.location,
                ViolationKind::Type,
                reason,
            ))
        }
    };

    schema_violation(operation, param, &value)
}

fn check_body(
    operation: &Operation,
    param: &Parameter,
    body: Option<&Payload>,
) -> Option<ParamViolation> {
    let payload = match body {
        Some(Payload::Text(text)) if text.trim().is_empty() => None,
        other => other,
    };
    let Some(payload) = payload else {
        return is_enforced(param).then(|| missing(param));
    };

    match payload.decode() {
        Ok(value) => schema_violation(operation, param, &value),
        Err(e) => Some(ParamViolation::new(
            &param.name,
            param.location,
            ViolationKind::Decode,
            e.to_string(),
        )),
    }
}

fn schema_violation(operation: &Operation, param: &Parameter, value: &Value) -> Option<ParamViolation> {
    let context = format!("{} parameter {}", operation.signature(), param.name);
    match param.schema.first_failure(value, &context) {
        Ok(None) => None,
        Ok(Some(failure)) => {
            let (kind, message) = if param.location == ParamLocation::Body {
                (
                    ViolationKind::Schema,
                    format!("at '{}': {}", failure.pointer, failure.reason),
                )
            } else {
                (failure.kind, failure.reason)
            };
            Some(ParamViolation::new(&param.name, param.location, kind, message))
        }
        Err(e) => Some(ParamViolation::new(
            &param.name,
            param.location,
            ViolationKind::Schema,
            e.to_string(),
        )),
    }
}

/// A missing parameter only counts when it is required and has nothing to fall back on.
fn is_enforced(param: &Parameter) -> bool {
    param.required && param.default.is_none()
}

fn missing(param: &Parameter) -> ParamViolation {
    ParamViolation::missing(&param.name, param.location)
}

/// Coerces raw string values by their declared Swagger type.
///
/// Repeated values are only meaningful for `multi` arrays; otherwise the first one is used.
pub(crate) fn coerce(simple: &SimpleType, values: &[String]) -> Result<Value, String> {
    if simple.type_name == "array" && simple.collection_format == CollectionFormat::Multi {
        let items = simple.items.as_deref();
        return values
            .iter()
            .map(|raw| coerce_item(items, raw))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array);
    }
    let first = values.first().map(String::as_str).unwrap_or_default();
    coerce_one(simple, first)
}

fn coerce_one(simple: &SimpleType, raw: &str) -> Result<Value, String> {
    match simple.type_name.as_str() {
        "array" => {
            let items = simple.items.as_deref();
            simple
                .collection_format
                .split(raw)
                .into_iter()
                .map(|item| coerce_item(items, item))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array)
        }
        "integer" => raw
            .trim()
            .parse::<i64>()
            .map(Value::from)
            .or_else(|_| raw.trim().parse::<u64>().map(Value::from))
            .map_err(|_| format!("expected integer, found '{}'", raw)),
        "number" => raw
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .ok_or_else(|| format!("expected number, found '{}'", raw)),
        "boolean" => {
            if raw.eq_ignore_ascii_case("true") {
                Ok(Value::Bool(true))
            } else if raw.eq_ignore_ascii_case("false") {
                Ok(Value::Bool(false))
            } else {
                Err(format!("expected boolean, found '{}'", raw))
            }
        }
        _ => Ok(Value::String(raw.to_string())),
    }
}

fn coerce_item(items: Option<&SimpleType>, raw: &str) -> Result<Value, String> {
    match items {
        Some(items) => coerce_one(items, raw),
        None => Ok(Value::String(raw.to_string())),
    }
}
