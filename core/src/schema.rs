#![deny(missing_docs)]

//! # Schema Evaluation
//!
//! Wraps a Swagger schema fragment together with the document's `definitions`
//! so `#/definitions/...` references resolve, and evaluates values against it
//! with Draft 4 semantics. Undeclared properties are accepted unless the fragment
//! itself says `additionalProperties: false`.

use crate::error::{GuardError, GuardResult, ViolationKind};
use jsonschema::error::ValidationErrorKind;
use jsonschema::{Draft, Validator};
use serde_json::{json, Map, Value};
use std::fmt;
use std::sync::{Arc, OnceLock};

/// The first failure reported for a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaFailure {
    /// JSON pointer to the offending value (`""` for the root).
    pub pointer: String,
    /// Human-readable reason.
    pub reason: String,
    /// Classification used by parameter checks.
    pub kind: ViolationKind,
}

/// A schema fragment plus its lazily compiled validator.
pub struct SchemaSlot {
    fragment: Value,
    definitions: Arc<Map<String, Value>>,
    compiled: OnceLock<Validator>,
}

impl SchemaSlot {
    /// Creates a slot. Nothing is compiled until the first evaluation.
    pub fn new(fragment: Value, definitions: Arc<Map<String, Value>>) -> Self {
        Self {
            fragment,
            definitions,
            compiled: OnceLock::new(),
        }
    }

    /// The fragment as declared in the document.
    pub fn fragment(&self) -> &Value {
        &self.fragment
    }

    /// Declared `type`, if it is a single string.
    pub fn declared_type(&self) -> Option<&str> {
        self.fragment.get("type").and_then(Value::as_str)
    }

    /// True for `type: file`, which has no JSON representation to validate.
    pub fn is_file(&self) -> bool {
        self.declared_type() == Some("file")
    }

    /// Evaluates `instance` and returns the first failure, if any.
    ///
    /// # Errors
    ///
    /// `InvalidSchema` if the fragment cannot be compiled; `context` names the
    /// fragment in that error.
    pub fn first_failure(&self, instance: &Value, context: &str) -> GuardResult<Option<SchemaFailure>> {
        let validator = self.validator(context)?;
        Ok(validator.validate(instance).err().map(|err| SchemaFailure {
            pointer: err.instance_path.to_string(),
            reason: err.to_string(),
            kind: classify(&err.kind),
        }))
    }

    fn validator(&self, context: &str) -> GuardResult<&Validator> {
        if let Some(validator) = self.compiled.get() {
            return Ok(validator);
        }

        let document = json!({
            "definitions": Value::Object(self.definitions.as_ref().clone()),
            "allOf": [self.fragment.clone()],
        });
        let validator = jsonschema::options()
            .with_draft(Draft::Draft4)
            .should_validate_formats(true)
            .build(&document)
            .map_err(|e| GuardError::InvalidSchema {
                context: context.to_string(),
                reason: e.to_string(),
            })?;

        // A concurrent caller may have won; either compiled value is equivalent.
        Ok(self.compiled.get_or_init(|| validator))
    }
}

fn classify(kind: &ValidationErrorKind) -> ViolationKind {
    match kind {
        ValidationErrorKind::Type { .. } => ViolationKind::Type,
        ValidationErrorKind::Format { .. } => ViolationKind::Format,
        ValidationErrorKind::Enum { .. } => ViolationKind::Enum,
        _ => ViolationKind::Constraint,
    }
}

impl Clone for SchemaSlot {
    fn clone(&self) -> Self {
        Self::new(self.fragment.clone(), Arc::clone(&self.definitions))
    }
}

impl PartialEq for SchemaSlot {
    fn eq(&self, other: &Self) -> bool {
        self.fragment == other.fragment
    }
}

// Validator has no useful Debug output; show the fragment only.
impl fmt::Debug for SchemaSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaSlot")
            .field("fragment", &self.fragment)
            .field("compiled", &self.compiled.get().is_some())
            .finish()
    }
}
