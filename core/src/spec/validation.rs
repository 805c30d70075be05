#![deny(missing_docs)]

//! # Document Validation
//!
//! Structural conformance checks run before a document is accepted into the cache.
//! Unlike a request or response check, every problem is collected so an author
//! can fix a broken document in one pass.
//!
//! The document is first evaluated against the official Swagger 2.0 JSON Schema
//! (Draft 4), which also covers every embedded schema object. Semantic checks the
//! meta-schema cannot express run on top:
//! - `swagger` is the string `"2.0"` and `info.title` / `info.version` are non-empty strings.
//! - Path keys start with `/` and carry well-formed `{name}` templates.
//! - Every operation declares at least one response under a valid key.
//! - Parameters are well-formed for their location.
//! - Declared operation ids are unique and local `$ref`s resolve.

use crate::spec::refs::{collect_references, follow, resolve_local};
use crate::spec::shims::{ShimSwagger, PARAMETER_LOCATIONS, PARAMETER_TYPES};
use jsonschema::{Draft, Validator};
use regex::Regex;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

const SWAGGER_META_SCHEMA: &str = include_str!("swagger-2.0.json");

fn placeholder_re() -> &'static Regex {
    static PLACEHOLDER_RE: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER_RE.get_or_init(|| Regex::new(r"\{([^{}/]+)\}").expect("Invalid regex"))
}

fn status_re() -> &'static Regex {
    static STATUS_RE: OnceLock<Regex> = OnceLock::new();
    STATUS_RE.get_or_init(|| Regex::new(r"^[1-5][0-9]{2}$").expect("Invalid regex"))
}

fn meta_validator() -> &'static Validator {
    static META_VALIDATOR: OnceLock<Validator> = OnceLock::new();
    META_VALIDATOR.get_or_init(|| {
        let schema: Value =
            serde_json::from_str(SWAGGER_META_SCHEMA).expect("Invalid Swagger 2.0 meta-schema");
        jsonschema::options()
            .with_draft(Draft::Draft4)
            .build(&schema)
            .expect("Invalid Swagger 2.0 meta-schema")
    })
}

/// Evaluates a parsed document against the Swagger 2.0 meta-schema.
///
/// Each problem is prefixed with the JSON pointer of the offending value.
pub(crate) fn validate_meta_schema(raw: &Value) -> Vec<String> {
    meta_validator()
        .iter_errors(raw)
        .map(|err| format!("#{}: {}", err.instance_path, err))
        .collect()
}

/// Returns the placeholder names of a path template, in order.
pub(crate) fn template_names(template: &str) -> Vec<String> {
    placeholder_re()
        .captures_iter(template)
        .map(|cap| cap[1].to_string())
        .collect()
}

/// Validates a parsed document. An empty result means the document is conformant.
pub(crate) fn validate_swagger_root(raw: &Value, shim: &ShimSwagger) -> Vec<String> {
    let mut problems = Vec::new();

    validate_version(shim, &mut problems);
    validate_info(shim, &mut problems);

    if let Some(base_path) = &shim.base_path {
        if !base_path.starts_with('/') {
            problems.push(format!("basePath '{}' must start with '/'", base_path));
        }
    }

    validate_paths(raw, shim, &mut problems);
    validate_references(raw, &mut problems);

    problems
}

fn validate_version(shim: &ShimSwagger, problems: &mut Vec<String>) {
    if let Some(openapi) = &shim.openapi {
        problems.push(format!(
            "OpenAPI 3.x documents are not supported (found openapi: {})",
            openapi
        ));
        return;
    }

    match &shim.swagger {
        None => problems.push("missing required 'swagger' field".to_string()),
        Some(Value::String(v)) if v == "2.0" => {}
        Some(other) => problems.push(format!(
            "'swagger' must be the string \"2.0\", found {}",
            other
        )),
    }
}

fn validate_info(shim: &ShimSwagger, problems: &mut Vec<String>) {
    let Some(info) = &shim.info else {
        problems.push("missing required 'info' object".to_string());
        return;
    };

    for (field, value) in [("title", &info.title), ("version", &info.version)] {
        match value {
            Some(Value::String(s)) if !s.trim().is_empty() => {}
            Some(Value::String(_)) => {
                problems.push(format!("info.{} must be a non-empty string", field))
            }
            Some(other) => problems.push(format!(
                "info.{} must be a string, found {}",
                field, other
            )),
            None => problems.push(format!("missing required 'info.{}'", field)),
        }
    }
}

fn validate_paths(raw: &Value, shim: &ShimSwagger, problems: &mut Vec<String>) {
    let Some(paths) = &shim.paths else {
        problems.push("missing required 'paths' object".to_string());
        return;
    };

    let mut operation_ids: HashMap<String, String> = HashMap::new();

    for (template, item) in &paths.items {
        if !template.starts_with('/') {
            problems.push(format!("path '{}' must start with '/'", template));
        }
        validate_template(template, problems);

        let shared = item.parameters.as_deref().unwrap_or(&[]);
        let shared_context = format!("paths.{}", template);
        validate_parameter_list(raw, shared, &shared_context, problems);

        for (method, op) in item.operations() {
            let context = format!("{} {}", method.to_uppercase(), template);

            if let Some(id) = &op.operation_id {
                if let Some(previous) = operation_ids.insert(id.clone(), context.clone()) {
                    problems.push(format!(
                        "operationId '{}' is declared by both {} and {}",
                        id, previous, context
                    ));
                }
            }

            let own = op.parameters.as_deref().unwrap_or(&[]);
            validate_parameter_list(raw, own, &context, problems);
            validate_path_parameters(raw, template, shared, own, &context, problems);

            match &op.responses {
                None => problems.push(format!("{} is missing required 'responses'", context)),
                Some(responses) => {
                    let declared = responses.keys().filter(|k| !k.starts_with("x-")).count();
                    if declared == 0 {
                        problems.push(format!(
                            "{} must define at least one response",
                            context
                        ));
                    }
                    for (key, response) in responses {
                        if key.starts_with("x-") {
                            continue;
                        }
                        if key != "default" && !status_re().is_match(key) {
                            problems.push(format!(
                                "response key '{}' in {} must be an HTTP status code or 'default'",
                                key, context
                            ));
                        }
                        if !response.is_object() {
                            problems.push(format!(
                                "response '{}' in {} must be an object",
                                key, context
                            ));
                        }
                    }
                }
            }
        }
    }
}

fn validate_template(template: &str, problems: &mut Vec<String>) {
    let stripped = placeholder_re().replace_all(template, "");
    if stripped.contains('{') || stripped.contains('}') {
        problems.push(format!("path '{}' has a malformed template", template));
    }

    let mut seen = HashSet::new();
    for name in template_names(template) {
        if !seen.insert(name.clone()) {
            problems.push(format!(
                "path '{}' declares placeholder '{}' more than once",
                template, name
            ));
        }
    }
}

fn validate_parameter_list(raw: &Value, params: &[Value], context: &str, problems: &mut Vec<String>) {
    let mut seen = HashSet::new();

    for param in params {
        let Some(resolved) = follow(raw, param) else {
            // Reported by the reference pass.
            continue;
        };

        let Some(name) = resolved.get("name").and_then(Value::as_str) else {
            problems.push(format!("parameter in {} is missing 'name'", context));
            continue;
        };
        let location = resolved.get("in").and_then(Value::as_str).unwrap_or("");
        if !PARAMETER_LOCATIONS.contains(&location) {
            problems.push(format!(
                "parameter '{}' in {} has invalid location '{}'",
                name, context, location
            ));
            continue;
        }

        if !seen.insert((name.to_string(), location.to_string())) {
            problems.push(format!(
                "duplicate parameter '{}' in location '{}' in {}",
                name, location, context
            ));
        }

        if location == "body" {
            if resolved.get("schema").is_none() {
                problems.push(format!(
                    "body parameter '{}' in {} is missing 'schema'",
                    name, context
                ));
            }
            continue;
        }

        match resolved.get("type").and_then(Value::as_str) {
            None => problems.push(format!(
                "parameter '{}' in {} is missing 'type'",
                name, context
            )),
            Some(ty) if !PARAMETER_TYPES.contains(&ty) => problems.push(format!(
                "parameter '{}' in {} has invalid type '{}'",
                name, context, ty
            )),
            Some("file") if location != "formData" => problems.push(format!(
                "file parameter '{}' in {} must be in formData",
                name, context
            )),
            Some("array") if resolved.get("items").is_none() => problems.push(format!(
                "array parameter '{}' in {} is missing 'items'",
                name, context
            )),
            Some(_) => {}
        }

        if location == "path" && resolved.get("required") != Some(&Value::Bool(true)) {
            problems.push(format!(
                "path parameter '{}' in {} must be required",
                name, context
            ));
        }
    }
}

fn validate_path_parameters(
    raw: &Value,
    template: &str,
    shared: &[Value],
    own: &[Value],
    context: &str,
    problems: &mut Vec<String>,
) {
    let placeholders: HashSet<String> = template_names(template).into_iter().collect();
    let declared: HashSet<String> = shared
        .iter()
        .chain(own)
        .filter_map(|p| follow(raw, p))
        .filter(|p| p.get("in").and_then(Value::as_str) == Some("path"))
        .filter_map(|p| p.get("name").and_then(Value::as_str).map(str::to_string))
        .collect();

    for name in declared.difference(&placeholders) {
        problems.push(format!(
            "path parameter '{}' in {} does not appear in the path template",
            name, context
        ));
    }
    for name in placeholders.difference(&declared) {
        problems.push(format!(
            "placeholder '{}' in {} has no matching path parameter",
            name, context
        ));
    }
}

fn validate_references(raw: &Value, problems: &mut Vec<String>) {
    let mut references = Vec::new();
    collect_references(raw, "#", &mut references);

    for (location, reference) in references {
        if !reference.starts_with('#') {
            problems.push(format!(
                "external reference '{}' at {} is not supported",
                reference, location
            ));
            continue;
        }
        if resolve_local(raw, &reference).is_none() {
            problems.push(format!(
                "reference '{}' at {} does not resolve",
                reference, location
            ));
        }
    }
}
