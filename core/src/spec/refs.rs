#![deny(missing_docs)]

//! # Reference Utilities
//!
//! Resolves local `$ref`s (`#/parameters/...`, `#/responses/...`,
//! `#/definitions/...`) against the raw document. External documents are never fetched.

use percent_encoding::percent_decode_str;
use serde_json::Value;

/// Returns the `$ref` string of an object of the form `{"$ref": "..."}`.
pub(crate) fn reference_of(value: &Value) -> Option<&str> {
    value.get("$ref").and_then(Value::as_str)
}

/// Resolves a local reference (`#/a/b`) against the document root.
///
/// Returns `None` for remote references and for pointers that do not resolve.
pub(crate) fn resolve_local<'a>(root: &'a Value, reference: &str) -> Option<&'a Value> {
    let pointer = reference.strip_prefix('#')?;
    if pointer.is_empty() {
        return Some(root);
    }
    let pointer = pointer.strip_prefix('/')?;

    let mut current = root;
    for segment in pointer.split('/') {
        let key = decode_pointer_segment(segment);
        current = match current {
            Value::Object(map) => map.get(&key)?,
            Value::Array(items) => items.get(key.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Follows `$ref` chains until a concrete object is reached.
///
/// Chains longer than the document could legitimately need are treated as cycles.
pub(crate) fn follow<'a>(root: &'a Value, value: &'a Value) -> Option<&'a Value> {
    let mut current = value;
    for _ in 0..32 {
        match reference_of(current) {
            Some(reference) => current = resolve_local(root, reference)?,
            None => return Some(current),
        }
    }
    None
}

/// Decodes a JSON Pointer segment (handles `~1`, `~0` and percent-encoding).
pub(crate) fn decode_pointer_segment(segment: &str) -> String {
    let decoded = segment.replace("~1", "/").replace("~0", "~");
    percent_decode_str(&decoded)
        .decode_utf8_lossy()
        .into_owned()
}

/// Collects every `$ref` string found anywhere inside `value`, with the JSON
/// pointer of the object that carries it.
pub(crate) fn collect_references(value: &Value, pointer: &str, out: &mut Vec<(String, String)>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                if key == "$ref" {
                    if let Value::String(reference) = child {
                        out.push((pointer.to_string(), reference.clone()));
                    }
                    continue;
                }
                let escaped = key.replace('~', "~0").replace('/', "~1");
                collect_references(child, &format!("{}/{}", pointer, escaped), out);
            }
        }
        Value::Array(items) => {
            for (idx, child) in items.iter().enumerate() {
                collect_references(child, &format!("{}/{}", pointer, idx), out);
            }
        }
        _ => {}
    }
}
