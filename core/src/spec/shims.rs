#![deny(missing_docs)]

//! # Document Shims
//!
//! Intermediate deserialization layer for Swagger 2.0 documents.
//! Fields whose type is frequently written loosely in YAML (`swagger: 2.0`,
//! `version: 1.0`) are kept as raw values and checked by the validation pass,
//! so a sloppy document reports a precise problem instead of a serde error.

use indexmap::IndexMap;
use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// HTTP methods a Swagger 2.0 Path Item may declare, in declaration order.
pub const PATH_ITEM_METHODS: [&str; 7] = ["get", "put", "post", "delete", "options", "head", "patch"];

/// Parameter locations allowed by Swagger 2.0.
pub const PARAMETER_LOCATIONS: [&str; 5] = ["query", "header", "path", "formData", "body"];

/// Primitive types allowed on non-body parameters.
pub const PARAMETER_TYPES: [&str; 6] = ["string", "number", "integer", "boolean", "array", "file"];

/// Root of a Swagger 2.0 document.
#[derive(Debug, Clone, Deserialize)]
pub struct ShimSwagger {
    /// Declared Swagger version. Must be the string `"2.0"`.
    pub swagger: Option<Value>,

    /// Present on OpenAPI 3.x documents, which are rejected.
    pub openapi: Option<Value>,

    /// API metadata.
    pub info: Option<ShimInfo>,

    /// Host serving the API.
    pub host: Option<String>,

    /// Prefix applied to every path template.
    #[serde(rename = "basePath")]
    pub base_path: Option<String>,

    /// Transfer protocols.
    pub schemes: Option<Vec<String>>,

    /// Global request media types.
    pub consumes: Option<Vec<String>>,

    /// Global response media types.
    pub produces: Option<Vec<String>>,

    /// Path items.
    pub paths: Option<ShimPaths>,

    /// Reusable schemas, referenced as `#/definitions/{name}`.
    pub definitions: Option<Map<String, Value>>,

    /// Reusable parameters, referenced as `#/parameters/{name}`.
    pub parameters: Option<BTreeMap<String, Value>>,

    /// Reusable responses, referenced as `#/responses/{name}`.
    pub responses: Option<BTreeMap<String, Value>>,

    /// Everything else, including `x-` extensions.
    #[serde(flatten)]
    pub extensions: BTreeMap<String, Value>,
}

/// The Info Object.
#[derive(Debug, Clone, Deserialize)]
pub struct ShimInfo {
    /// API title. Must be a non-empty string.
    pub title: Option<Value>,
    /// API version. Must be a non-empty string.
    pub version: Option<Value>,
    /// Free-form description.
    pub description: Option<String>,
    /// Other fields (contact, license, extensions).
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// The Paths Object, split into path items and `x-` extensions.
#[derive(Debug, Clone, Default)]
pub struct ShimPaths {
    /// Path items keyed by path template, in document order.
    pub items: IndexMap<String, ShimPathItem>,
    /// Spec extensions attached to the Paths Object.
    pub extensions: BTreeMap<String, Value>,
}

impl ShimPaths {
    /// Returns true when no concrete path items are present.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<'de> Deserialize<'de> for ShimPaths {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = IndexMap::<String, Value>::deserialize(deserializer)?;
        let mut items = IndexMap::new();
        let mut extensions = BTreeMap::new();

        for (key, value) in raw {
            if key.starts_with("x-") {
                extensions.insert(key, value);
                continue;
            }
            let path_item = serde_json::from_value::<ShimPathItem>(value).map_err(|e| {
                DeError::custom(format!("Failed to parse path item '{}': {}", key, e))
            })?;
            items.insert(key, path_item);
        }

        Ok(Self { items, extensions })
    }
}

/// A Path Item: the operations available on one path template.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShimPathItem {
    /// GET operation.
    pub get: Option<ShimOperation>,
    /// PUT operation.
    pub put: Option<ShimOperation>,
    /// POST operation.
    pub post: Option<ShimOperation>,
    /// DELETE operation.
    pub delete: Option<ShimOperation>,
    /// OPTIONS operation.
    pub options: Option<ShimOperation>,
    /// HEAD operation.
    pub head: Option<ShimOperation>,
    /// PATCH operation.
    pub patch: Option<ShimOperation>,
    /// Parameters shared by every operation on this path.
    /// Kept raw: each entry is a Parameter Object or a `$ref`.
    pub parameters: Option<Vec<Value>>,
    /// `$ref` and `x-` extensions.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl ShimPathItem {
    /// Returns `(method, operation)` pairs in declaration order.
    pub fn operations(&self) -> Vec<(&'static str, &ShimOperation)> {
        let slots = [
            &self.get,
            &self.put,
            &self.post,
            &self.delete,
            &self.options,
            &self.head,
            &self.patch,
        ];
        PATH_ITEM_METHODS
            .iter()
            .zip(slots)
            .filter_map(|(method, op)| op.as_ref().map(|op| (*method, op)))
            .collect()
    }
}

/// An Operation Object.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShimOperation {
    /// Declared operation identifier.
    #[serde(rename = "operationId")]
    pub operation_id: Option<String>,
    /// Short summary.
    pub summary: Option<String>,
    /// Grouping tags.
    pub tags: Option<Vec<String>>,
    /// Request media types, overriding the global list.
    pub consumes: Option<Vec<String>>,
    /// Response media types, overriding the global list.
    pub produces: Option<Vec<String>>,
    /// Parameter Objects or `$ref`s.
    pub parameters: Option<Vec<Value>>,
    /// Responses keyed by status code string, `default`, or `x-` extension.
    pub responses: Option<IndexMap<String, Value>>,
    /// Whether the operation is deprecated.
    pub deprecated: Option<bool>,
    /// Other fields (description, security, extensions).
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// A Parameter Object after `$ref` resolution.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ShimParameter {
    /// Name of the parameter.
    pub name: String,
    /// Location (`query`, `header`, `path`, `formData`, `body`).
    #[serde(rename = "in")]
    pub parameter_in: String,
    /// Whether the parameter must be supplied.
    #[serde(default)]
    pub required: bool,
    /// Description.
    pub description: Option<String>,
    /// Body schema (`in: body` only).
    pub schema: Option<Value>,
    /// Primitive type (non-body only).
    #[serde(rename = "type")]
    pub schema_type: Option<String>,
    /// Format modifier (e.g. int64, date-time).
    pub format: Option<String>,
    /// Array item description.
    pub items: Option<Value>,
    /// Array serialization (`csv`, `ssv`, `tsv`, `pipes`, `multi`).
    #[serde(rename = "collectionFormat")]
    pub collection_format: Option<String>,
    /// Value assumed when the parameter is not supplied.
    pub default: Option<Value>,
    /// Whether an empty value is accepted (`query` and `formData` only).
    #[serde(rename = "allowEmptyValue")]
    pub allow_empty_value: Option<bool>,
    /// Validation keywords (`enum`, `pattern`, `minimum`, ...) and extensions.
    #[serde(flatten)]
    pub constraints: BTreeMap<String, Value>,
}

/// A Response Object after `$ref` resolution.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ShimResponse {
    /// Description. Required by Swagger, not by this crate.
    pub description: Option<String>,
    /// Body schema. Absent means the body must be empty.
    pub schema: Option<Value>,
    /// Declared response headers, keyed by name.
    pub headers: Option<IndexMap<String, Value>>,
    /// Example payloads keyed by media type.
    pub examples: Option<Value>,
    /// Extensions.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}
