#![deny(missing_docs)]

//! # Operation Index
//!
//! Flattens the path/method tree of a document into a lookup table keyed by
//! normalized operation id. Parameters and responses are fully resolved here,
//! so the validators never look at raw `$ref`s.

use crate::error::{GuardError, GuardResult, ParamLocation};
use crate::schema::SchemaSlot;
use crate::spec::refs::follow;
use crate::spec::shims::{ShimOperation, ShimParameter, ShimResponse};
use crate::spec::SpecDocument;
use indexmap::IndexMap;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::debug;

/// Identifier canonicalization.
pub mod naming;
/// Request path matching.
pub mod template;

pub use naming::{derive_operation_id, normalize_operation_id};
pub use template::PathTemplate;

/// Validation keywords carried over from a non-body parameter or header into its schema.
const SIMPLE_KEYWORDS: [&str; 14] = [
    "format",
    "items",
    "enum",
    "pattern",
    "minimum",
    "maximum",
    "exclusiveMinimum",
    "exclusiveMaximum",
    "minLength",
    "maxLength",
    "minItems",
    "maxItems",
    "uniqueItems",
    "multipleOf",
];

/// How array values are serialized into a single string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CollectionFormat {
    /// Comma separated (`a,b`).
    #[default]
    Csv,
    /// Space separated (`a b`).
    Ssv,
    /// Tab separated.
    Tsv,
    /// Pipe separated (`a|b`).
    Pipes,
    /// Repeated keys (`k=a&k=b`).
    Multi,
}

impl CollectionFormat {
    /// Reads a declared `collectionFormat`; unknown or absent values fall back to `csv`.
    pub fn parse(declared: Option<&str>) -> Self {
        match declared {
            Some("ssv") => CollectionFormat::Ssv,
            Some("tsv") => CollectionFormat::Tsv,
            Some("pipes") => CollectionFormat::Pipes,
            Some("multi") => CollectionFormat::Multi,
            _ => CollectionFormat::Csv,
        }
    }

    /// Splits one serialized value into items. `multi` values are not split.
    pub fn split<'a>(&self, raw: &'a str) -> Vec<&'a str> {
        let delimiter = match self {
            CollectionFormat::Csv => ',',
            CollectionFormat::Ssv => ' ',
            CollectionFormat::Tsv => '\t',
            CollectionFormat::Pipes => '|',
            CollectionFormat::Multi => return vec![raw],
        };
        if raw.is_empty() {
            return Vec::new();
        }
        raw.split(delimiter).collect()
    }
}

/// Swagger primitive description of a non-body value (parameter, header, array item).
#[derive(Debug, Clone, PartialEq)]
pub struct SimpleType {
    /// Declared `type`; `string` when absent.
    pub type_name: String,
    /// Item description for `array` types.
    pub items: Option<Box<SimpleType>>,
    /// Serialization of `array` types.
    pub collection_format: CollectionFormat,
}

impl SimpleType {
    /// Reads `type`, `items` and `collectionFormat` from a parameter, header or items object.
    pub fn from_value(value: &Value) -> Self {
        Self {
            type_name: value
                .get("type")
                .and_then(Value::as_str)
                .unwrap_or("string")
                .to_string(),
            items: value
                .get("items")
                .map(|items| Box::new(SimpleType::from_value(items))),
            collection_format: CollectionFormat::parse(
                value.get("collectionFormat").and_then(Value::as_str),
            ),
        }
    }
}

/// A resolved parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    /// Declared name.
    pub name: String,
    /// Where the value is read from.
    pub location: ParamLocation,
    /// Whether the parameter must be supplied.
    pub required: bool,
    /// Declared default.
    pub default: Option<Value>,
    /// Whether an empty value is accepted as-is.
    pub allow_empty_value: bool,
    /// Coercion rules; `None` for body parameters.
    pub simple: Option<SimpleType>,
    /// Schema the (coerced) value is checked against.
    pub schema: SchemaSlot,
}

/// A declared response header.
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderSpec {
    /// Coercion rules.
    pub simple: SimpleType,
    /// Schema the coerced value is checked against.
    pub schema: SchemaSlot,
}

/// A resolved response declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseSpec {
    /// Response key: status code string or `default`.
    pub status: String,
    /// Declared description.
    pub description: Option<String>,
    /// Body schema. `None` means the body must be empty.
    pub schema: Option<SchemaSlot>,
    /// Declared headers keyed by name.
    pub headers: IndexMap<String, HeaderSpec>,
    /// Acceptable media types; empty means unchecked.
    pub content_types: Vec<String>,
}

/// One addressable unit of the contract.
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    /// Normalized identifier used for lookup.
    pub operation_id: String,
    /// `operationId` exactly as declared, if any.
    pub declared_id: Option<String>,
    /// Uppercase HTTP method.
    pub method: String,
    /// Path template matcher (`basePath` applied).
    pub path: PathTemplate,
    /// Parameters after path-level merging, in declaration order.
    pub parameters: Vec<Parameter>,
    /// Responses keyed by status string, in declaration order.
    pub responses: IndexMap<String, ResponseSpec>,
    /// Request media types.
    pub consumes: Vec<String>,
    /// Whether the operation is marked deprecated.
    pub deprecated: bool,
}

impl Operation {
    /// `METHOD template`, used in messages and listings.
    pub fn signature(&self) -> String {
        format!("{} {}", self.method, self.path.as_str())
    }

    /// The response declared for `status`, falling back to `default`.
    pub fn response_for(&self, status: &str) -> Option<&ResponseSpec> {
        self.responses
            .get(status)
            .or_else(|| self.responses.get("default"))
    }
}

/// Operations keyed by normalized id, in document order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OperationIndex {
    operations: IndexMap<String, Operation>,
}

impl OperationIndex {
    /// Walks every path item and method of `document`.
    ///
    /// # Errors
    ///
    /// * `DuplicateOperation` if two operations normalize to the same id.
    /// * `InvalidSchema` if a parameter, response or path template cannot be resolved.
    pub fn build(document: &SpecDocument) -> GuardResult<Self> {
        let shim = document.shim();
        let raw = document.raw();
        let base_path = document.base_path().unwrap_or("");
        let global_produces = shim.produces.clone().unwrap_or_default();
        let global_consumes = shim.consumes.clone().unwrap_or_default();

        let mut operations: IndexMap<String, Operation> = IndexMap::new();
        let Some(paths) = &shim.paths else {
            return Ok(Self { operations });
        };

        for (template, item) in &paths.items {
            let shared = item.parameters.as_deref().unwrap_or(&[]);
            for (method, op) in item.operations() {
                let context = format!("{} {}", method.to_uppercase(), template);
                let operation = build_operation(
                    document,
                    raw,
                    base_path,
                    template,
                    method,
                    op,
                    shared,
                    &global_produces,
                    &global_consumes,
                    &context,
                )?;

                if let Some(existing) = operations.get(&operation.operation_id) {
                    return Err(GuardError::DuplicateOperation {
                        operation_id: operation.operation_id.clone(),
                        first: existing.signature(),
                        second: context,
                    });
                }
                operations.insert(operation.operation_id.clone(), operation);
            }
        }

        debug!(
            source = %document.source().display(),
            operations = operations.len(),
            "operation index built"
        );
        Ok(Self { operations })
    }

    /// Looks up an operation; `operation_id` is normalized first.
    ///
    /// # Errors
    ///
    /// `UnknownOperation` naming the id as requested.
    pub fn resolve(&self, operation_id: &str) -> GuardResult<&Operation> {
        self.get(operation_id)
            .ok_or_else(|| GuardError::UnknownOperation {
                operation_id: operation_id.to_string(),
            })
    }

    /// Looks up an operation without failing.
    pub fn get(&self, operation_id: &str) -> Option<&Operation> {
        self.operations.get(&normalize_operation_id(operation_id))
    }

    /// Operations in document order.
    pub fn iter(&self) -> impl Iterator<Item = &Operation> {
        self.operations.values()
    }

    /// Number of operations.
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// True for documents without operations.
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

#[allow(clippy::too_many_arguments)]
fn build_operation(
    document: &SpecDocument,
    raw: &Value,
    base_path: &str,
    template: &str,
    method: &str,
    op: &ShimOperation,
    shared: &[Value],
    global_produces: &[String],
    global_consumes: &[String],
    context: &str,
) -> GuardResult<Operation> {
    let definitions = document.definitions();

    // Path-level first; operation-level entries replace them by (name, in).
    let mut merged: IndexMap<(String, String), Value> = IndexMap::new();
    for entry in shared.iter().chain(op.parameters.as_deref().unwrap_or(&[])) {
        let resolved = follow(raw, entry).ok_or_else(|| unresolved(context, "parameter"))?;
        let key = (
            string_field(resolved, "name"),
            string_field(resolved, "in"),
        );
        merged.insert(key, resolved.clone());
    }

    let parameters = merged
        .into_values()
        .map(|value| build_parameter(value, definitions, context))
        .collect::<GuardResult<Vec<_>>>()?;

    let content_types = op
        .produces
        .clone()
        .unwrap_or_else(|| global_produces.to_vec());

    let mut responses = IndexMap::new();
    for (status, entry) in op.responses.iter().flatten() {
        if status.starts_with("x-") {
            continue;
        }
        let resolved = follow(raw, entry).ok_or_else(|| unresolved(context, "response"))?;
        let shim: ShimResponse =
            serde_json::from_value(resolved.clone()).map_err(|e| GuardError::InvalidSchema {
                context: format!("{} response {}", context, status),
                reason: e.to_string(),
            })?;
        let headers = shim
            .headers
            .iter()
            .flatten()
            .map(|(name, header)| {
                let header = follow(raw, header).unwrap_or(header);
                (
                    name.clone(),
                    HeaderSpec {
                        simple: SimpleType::from_value(header),
                        schema: SchemaSlot::new(simple_fragment(header), Arc::clone(definitions)),
                    },
                )
            })
            .collect();
        responses.insert(
            status.clone(),
            ResponseSpec {
                status: status.clone(),
                description: shim.description,
                schema: shim
                    .schema
                    .map(|schema| SchemaSlot::new(schema, Arc::clone(definitions))),
                headers,
                content_types: content_types.clone(),
            },
        );
    }

    let declared_id = op.operation_id.clone();
    let operation_id = match &declared_id {
        Some(id) => normalize_operation_id(id),
        None => derive_operation_id(method, template),
    };

    Ok(Operation {
        operation_id,
        declared_id,
        method: method.to_uppercase(),
        path: PathTemplate::compile(base_path, template)?,
        parameters,
        responses,
        consumes: op
            .consumes
            .clone()
            .unwrap_or_else(|| global_consumes.to_vec()),
        deprecated: op.deprecated.unwrap_or(false),
    })
}

fn build_parameter(
    value: Value,
    definitions: &Arc<Map<String, Value>>,
    context: &str,
) -> GuardResult<Parameter> {
    let shim: ShimParameter =
        serde_json::from_value(value.clone()).map_err(|e| GuardError::InvalidSchema {
            context: format!("{} parameter", context),
            reason: e.to_string(),
        })?;

    let location = match (shim.parameter_in.as_str(), shim.schema_type.as_deref()) {
        ("path", _) => ParamLocation::Path,
        ("query", _) => ParamLocation::Query,
        ("header", _) => ParamLocation::Header,
        ("formData", Some("file")) => ParamLocation::File,
        ("formData", _) => ParamLocation::FormData,
        ("body", _) => ParamLocation::Body,
        (other, _) => {
            return Err(GuardError::InvalidSchema {
                context: format!("{} parameter {}", context, shim.name),
                reason: format!("unknown parameter location '{}'", other),
            })
        }
    };

    let (simple, fragment) = if location == ParamLocation::Body {
        (None, shim.schema.clone().unwrap_or_else(|| Value::Object(Map::new())))
    } else {
        (Some(SimpleType::from_value(&value)), simple_fragment(&value))
    };

    Ok(Parameter {
        name: shim.name,
        location,
        required: shim.required,
        default: shim.default,
        allow_empty_value: shim.allow_empty_value.unwrap_or(false),
        simple,
        schema: SchemaSlot::new(fragment, Arc::clone(definitions)),
    })
}

/// JSON Schema for a non-body parameter or header: its `type` plus validation keywords.
fn simple_fragment(value: &Value) -> Value {
    let mut fragment = Map::new();
    if let Some(kind) = value.get("type").and_then(Value::as_str) {
        if kind != "file" {
            fragment.insert("type".to_string(), Value::String(kind.to_string()));
        }
    }
    for keyword in SIMPLE_KEYWORDS {
        if let Some(v) = value.get(keyword) {
            let v = if keyword == "items" { simple_fragment(v) } else { v.clone() };
            fragment.insert(keyword.to_string(), v);
        }
    }
    Value::Object(fragment)
}

fn string_field(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn unresolved(context: &str, what: &str) -> GuardError {
    GuardError::InvalidSchema {
        context: format!("{} {}", context, what),
        reason: "reference cannot be resolved".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    const PETS: &str = r##"
swagger: "2.0"
info: { title: Pets, version: "1" }
basePath: /v1
produces: [application/json]
parameters:
  Limit:
    name: limit
    in: query
    type: integer
    maximum: 100
responses:
  NotFound:
    description: missing
paths:
  /pets/{petId}:
    parameters:
      - { name: petId, in: path, required: true, type: string }
      - { name: verbose, in: query, type: boolean }
    get:
      operationId: pets.fetch
      parameters:
        - { name: verbose, in: query, type: string, enum: [yes, no] }
        - $ref: "#/parameters/Limit"
      responses:
        200:
          description: ok
          schema: { $ref: "#/definitions/Pet" }
          headers:
            X-Rate-Limit: { type: integer }
        404:
          $ref: "#/responses/NotFound"
  /pets:
    post:
      consumes: [application/json]
      produces: [application/xml]
      parameters:
        - { name: pet, in: body, required: true, schema: { $ref: "#/definitions/Pet" } }
        - { name: photo, in: formData, type: file }
      responses:
        default: { description: anything }
definitions:
  Pet:
    type: object
    required: [name]
    properties:
      name: { type: string }
"##;

    fn index() -> OperationIndex {
        let doc = SpecDocument::parse("pets.yaml", PETS).unwrap();
        OperationIndex::build(&doc).unwrap()
    }

    #[test]
    fn test_ids_are_normalized_and_derived() {
        let index = index();
        let ids: Vec<&str> = index.iter().map(|op| op.operation_id.as_str()).collect();
        assert_eq!(ids, vec!["pets_fetch", "post_pets"]);
        assert_eq!(
            index.resolve("pets.fetch").unwrap().declared_id.as_deref(),
            Some("pets.fetch")
        );
    }

    #[test]
    fn test_unknown_operation() {
        let err = index().resolve("dunno").unwrap_err();
        match err {
            GuardError::UnknownOperation { operation_id } => assert_eq!(operation_id, "dunno"),
            other => panic!("expected UnknownOperation, got {:?}", other),
        }
    }

    #[test]
    fn test_operation_parameters_override_path_parameters() {
        let index = index();
        let op = index.resolve("pets_fetch").unwrap();
        let names: Vec<(&str, ParamLocation)> = op
            .parameters
            .iter()
            .map(|p| (p.name.as_str(), p.location))
            .collect();
        assert_eq!(
            names,
            vec![
                ("petId", ParamLocation::Path),
                ("verbose", ParamLocation::Query),
                ("limit", ParamLocation::Query),
            ]
        );
        let verbose = &op.parameters[1];
        assert_eq!(verbose.schema.fragment(), &json!({ "type": "string", "enum": ["yes", "no"] }));
        let limit = &op.parameters[2];
        assert_eq!(limit.schema.fragment(), &json!({ "type": "integer", "maximum": 100 }));
    }

    #[test]
    fn test_responses_are_resolved_with_content_types() {
        let index = index();
        let op = index.resolve("pets_fetch").unwrap();
        let ok = op.response_for("200").unwrap();
        assert_eq!(ok.content_types, vec!["application/json".to_string()]);
        assert!(ok.headers.contains_key("X-Rate-Limit"));
        let missing = op.response_for("404").unwrap();
        assert_eq!(missing.description.as_deref(), Some("missing"));
        assert!(missing.schema.is_none());
        assert!(op.response_for("500").is_none());
    }

    #[test]
    fn test_default_response_and_locations() {
        let index = index();
        let op = index.resolve("post_pets").unwrap();
        assert_eq!(op.response_for("201").unwrap().status, "default");
        assert_eq!(op.response_for("201").unwrap().content_types, vec!["application/xml".to_string()]);
        assert_eq!(op.parameters[0].location, ParamLocation::Body);
        assert!(op.parameters[0].simple.is_none());
        assert_eq!(op.parameters[1].location, ParamLocation::File);
        assert_eq!(op.signature(), "POST /pets");
    }

    #[test]
    fn test_path_template_includes_base_path() {
        let index = index();
        let op = index.resolve("pets_fetch").unwrap();
        let caps = op.path.captures("/v1/pets/7").unwrap();
        assert_eq!(caps.get("petId").map(String::as_str), Some("7"));
    }

    #[test]
    fn test_build_is_deterministic() {
        assert_eq!(index(), index());
    }

    #[test]
    fn test_normalization_collision_is_fatal() {
        let text = r#"
swagger: "2.0"
info: { title: t, version: "1" }
paths:
  /a:
    get:
      operationId: list.things
      responses: { 200: { description: ok } }
  /b:
    get:
      operationId: list_things
      responses: { 200: { description: ok } }
"#;
        let doc = SpecDocument::parse("dup.yaml", text).unwrap();
        match OperationIndex::build(&doc).unwrap_err() {
            GuardError::DuplicateOperation {
                operation_id,
                first,
                second,
            } => {
                assert_eq!(operation_id, "list_things");
                assert_eq!(first, "GET /a");
                assert_eq!(second, "GET /b");
            }
            other => panic!("expected DuplicateOperation, got {:?}", other),
        }
    }

    #[test]
    fn test_collection_format_split() {
        assert_eq!(CollectionFormat::parse(None).split("a,b"), vec!["a", "b"]);
        assert_eq!(CollectionFormat::parse(Some("pipes")).split("a|b"), vec!["a", "b"]);
        assert_eq!(CollectionFormat::parse(Some("ssv")).split("a b"), vec!["a", "b"]);
        assert_eq!(CollectionFormat::Multi.split("a,b"), vec!["a,b"]);
        assert!(CollectionFormat::Csv.split("").is_empty());
    }
}
