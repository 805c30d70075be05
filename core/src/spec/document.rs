#![deny(missing_docs)]

//! # Specification Document
//!
//! Parses raw text into an immutable, structurally validated Swagger 2.0 document.
//! This is the cache-free entry point; `SpecCache` calls it once per source.

use crate::error::{GuardError, GuardResult};
use crate::spec::shims::ShimSwagger;
use crate::spec::validation::{validate_meta_schema, validate_swagger_root};
use serde_json::{Map, Number, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A parsed and validated Swagger 2.0 document.
#[derive(Debug, Clone)]
pub struct SpecDocument {
    source: PathBuf,
    raw: Value,
    shim: ShimSwagger,
    definitions: Arc<Map<String, Value>>,
}

impl SpecDocument {
    /// Parses and validates a document.
    ///
    /// # Arguments
    ///
    /// * `source` - Identifier of the document, used in error messages.
    /// * `text` - Raw YAML or JSON content.
    ///
    /// # Errors
    ///
    /// * `SpecFormat` if the text is not YAML.
    /// * `SpecSchema` if the text is YAML but not a conformant Swagger 2.0 document.
    pub fn parse(source: impl AsRef<Path>, text: &str) -> GuardResult<Self> {
        let source = source.as_ref().to_path_buf();

        let mut yaml: serde_yaml::Value =
            serde_yaml::from_str(text).map_err(|e| GuardError::SpecFormat {
                path: source.clone(),
                source: e,
            })?;
        yaml.apply_merge().map_err(|e| GuardError::SpecFormat {
            path: source.clone(),
            source: e,
        })?;

        let raw = yaml_to_json(yaml);
        if !raw.is_object() {
            return Err(GuardError::SpecSchema {
                path: source,
                problems: vec!["document root must be a mapping".to_string()],
            });
        }

        let mut problems = validate_meta_schema(&raw);
        let shim: ShimSwagger = match serde_json::from_value(raw.clone()) {
            Ok(shim) => shim,
            Err(e) => {
                problems.push(e.to_string());
                return Err(GuardError::SpecSchema {
                    path: source,
                    problems,
                });
            }
        };

        problems.extend(validate_swagger_root(&raw, &shim));
        if !problems.is_empty() {
            return Err(GuardError::SpecSchema {
                path: source,
                problems,
            });
        }

        let definitions = Arc::new(shim.definitions.clone().unwrap_or_default());

        Ok(Self {
            source,
            raw,
            shim,
            definitions,
        })
    }

    /// Identifier the document was loaded from.
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// The whole document as JSON, with every mapping key stringified.
    pub fn raw(&self) -> &Value {
        &self.raw
    }

    /// Typed view of the document.
    pub fn shim(&self) -> &ShimSwagger {
        &self.shim
    }

    /// Declared `info.title`.
    pub fn title(&self) -> Option<&str> {
        self.shim
            .info
            .as_ref()
            .and_then(|info| info.title.as_ref())
            .and_then(Value::as_str)
    }

    /// Declared `basePath`, if any.
    pub fn base_path(&self) -> Option<&str> {
        self.shim.base_path.as_deref()
    }

    /// Shared `definitions` table, attached to every compiled schema fragment.
    pub fn definitions(&self) -> &Arc<Map<String, Value>> {
        &self.definitions
    }
}

impl PartialEq for SpecDocument {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source && self.raw == other.raw
    }
}

/// Converts a YAML value into JSON, stringifying non-string mapping keys
/// (e.g. an unquoted `200:` status code).
fn yaml_to_json(value: serde_yaml::Value) -> Value {
    use serde_yaml::Value as Yaml;

    match value {
        Yaml::Null => Value::Null,
        Yaml::Bool(b) => Value::Bool(b),
        Yaml::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::from(i)
            } else if let Some(u) = n.as_u64() {
                Value::from(u)
            } else {
                n.as_f64()
                    .and_then(Number::from_f64)
                    .map(Value::Number)
                    .unwrap_or(Value::Null)
            }
        }
        Yaml::String(s) => Value::String(s),
        Yaml::Sequence(items) => Value::Array(items.into_iter().map(yaml_to_json).collect()),
        Yaml::Mapping(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (yaml_key(k), yaml_to_json(v)))
                .collect(),
        ),
        Yaml::Tagged(tagged) => yaml_to_json(tagged.value),
    }
}

fn yaml_key(key: serde_yaml::Value) -> String {
    use serde_yaml::Value as Yaml;

    match key {
        Yaml::String(s) => s,
        Yaml::Number(n) => n.to_string(),
        Yaml::Bool(b) => b.to_string(),
        Yaml::Null => "null".to_string(),
        other => serde_yaml::to_string(&other)
            .map(|s| s.trim().to_string())
            .unwrap_or_default(),
    }
}
