#![deny(missing_docs)]

//! # Generic Request / Response
//!
//! Framework-agnostic representations consumed by the validators.
//! Both are built once per validation call and are read-only afterwards:
//! the builders consume `self`, and no `&mut` accessors are exposed.

use crate::error::{GuardError, GuardResult};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// A request or response body as handed over by the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Raw text, expected to be JSON-encoded.
    Text(String),
    /// An already decoded value. Only objects and arrays are accepted.
    Json(Value),
}

impl Payload {
    /// Decodes the payload into a JSON object or array.
    ///
    /// # Errors
    ///
    /// * `BodyDecode` if text is not valid JSON.
    /// * `BodyShape` if a decoded value is neither an object nor an array.
    pub fn decode(&self) -> GuardResult<Value> {
        match self {
            Payload::Text(text) => {
                serde_json::from_str(text).map_err(|e| GuardError::BodyDecode { source: e })
            }
            Payload::Json(value @ (Value::Object(_) | Value::Array(_))) => Ok(value.clone()),
            Payload::Json(other) => Err(GuardError::BodyShape {
                found: json_type_name(other),
            }),
        }
    }

    /// True for bodies that carry no content (`""`, `{}`, `null`).
    pub fn is_empty(&self) -> bool {
        match self {
            Payload::Text(text) => matches!(text.trim(), "" | "{}" | "null"),
            Payload::Json(Value::Null) => true,
            Payload::Json(Value::Object(map)) => map.is_empty(),
            Payload::Json(_) => false,
        }
    }
}

impl Default for Payload {
    fn default() -> Self {
        Payload::Text(String::new())
    }
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        Payload::Json(value)
    }
}

impl From<String> for Payload {
    fn from(text: String) -> Self {
        Payload::Text(text)
    }
}

impl From<&str> for Payload {
    fn from(text: &str) -> Self {
        Payload::Text(text.to_string())
    }
}

/// Name of a JSON value's type, as used in error messages.
pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// An uploaded file. Only presence is validated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadedFile {
    /// Client-supplied file name.
    pub file_name: Option<String>,
    /// Client-supplied media type.
    pub content_type: Option<String>,
    /// File contents.
    pub data: Vec<u8>,
}

/// Framework-agnostic request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenericRequest {
    path: String,
    query: BTreeMap<String, Vec<String>>,
    form: BTreeMap<String, Vec<String>>,
    headers: BTreeMap<String, String>,
    files: BTreeMap<String, UploadedFile>,
    body: Option<Payload>,
}

impl GenericRequest {
    /// Creates a request for `path` with no parameters.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Appends a query value. Repeated keys keep every value in order.
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.entry(key.into()).or_default().push(value.into());
        self
    }

    /// Appends every pair of a url-encoded query string (`a=1&b=2`).
    pub fn with_query_string(mut self, query: &str) -> Self {
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            self.query
                .entry(key.into_owned())
                .or_default()
                .push(value.into_owned());
        }
        self
    }

    /// Appends a form field value.
    pub fn with_form(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.form.entry(key.into()).or_default().push(value.into());
        self
    }

    /// Appends every pair of a url-encoded form body.
    pub fn with_form_urlencoded(mut self, body: &[u8]) -> Self {
        for (key, value) in url::form_urlencoded::parse(body) {
            self.form
                .entry(key.into_owned())
                .or_default()
                .push(value.into_owned());
        }
        self
    }

    /// Sets a header. Names are stored lowercased; a repeated name replaces the value.
    pub fn with_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.as_ref().to_ascii_lowercase(), value.into());
        self
    }

    /// Attaches an uploaded file under a form field name.
    pub fn with_file(mut self, field: impl Into<String>, file: UploadedFile) -> Self {
        self.files.insert(field.into(), file);
        self
    }

    /// Sets the body.
    pub fn with_body(mut self, body: impl Into<Payload>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Request path, without query string.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Every value supplied for a query key.
    pub fn query(&self, key: &str) -> Option<&[String]> {
        self.query.get(key).map(Vec::as_slice)
    }

    /// Every value supplied for a form field.
    pub fn form(&self, key: &str) -> Option<&[String]> {
        self.form.get(key).map(Vec::as_slice)
    }

    /// Header value, looked up case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Uploaded file for a form field.
    pub fn file(&self, field: &str) -> Option<&UploadedFile> {
        self.files.get(field)
    }

    /// Request body, if any.
    pub fn body(&self) -> Option<&Payload> {
        self.body.as_ref()
    }
}

/// A response status as the caller has it: numeric or textual.
///
/// Declared response keys are strings, so lookups always go through [`Status::as_key`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    /// Numeric status code.
    Code(u16),
    /// Status code already in string form.
    Text(String),
}

impl Status {
    /// The status in the string form used as a response key.
    pub fn as_key(&self) -> String {
        match self {
            Status::Code(code) => code.to_string(),
            Status::Text(text) => text.trim().to_string(),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_key())
    }
}

impl From<u16> for Status {
    fn from(code: u16) -> Self {
        Status::Code(code)
    }
}

impl From<&str> for Status {
    fn from(text: &str) -> Self {
        Status::Text(text.to_string())
    }
}

impl From<String> for Status {
    fn from(text: String) -> Self {
        Status::Text(text)
    }
}

/// Framework-agnostic response.
#[derive(Debug, Clone, PartialEq)]
pub struct GenericResponse {
    status: Status,
    body: Payload,
    content_type: String,
    headers: BTreeMap<String, String>,
}

impl GenericResponse {
    /// Creates a response from all four parts. Header names are stored lowercased.
    pub fn new(
        status: impl Into<Status>,
        body: impl Into<Payload>,
        content_type: impl Into<String>,
        headers: BTreeMap<String, String>,
    ) -> Self {
        Self {
            status: status.into(),
            body: body.into(),
            content_type: content_type.into(),
            headers: headers
                .into_iter()
                .map(|(k, v)| (k.to_ascii_lowercase(), v))
                .collect(),
        }
    }

    /// Shorthand for an `application/json` response without headers.
    pub fn json(status: impl Into<Status>, body: impl Into<Payload>) -> Self {
        Self::new(status, body, "application/json", BTreeMap::new())
    }

    /// Status as supplied.
    pub fn status(&self) -> &Status {
        &self.status
    }

    /// Body as supplied.
    pub fn body(&self) -> &Payload {
        &self.body
    }

    /// Content type as supplied, parameters included.
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Header value, looked up case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_text_and_value_decode_identically() {
        let text = Payload::from(r#"{"id": "123", "name": "dunno"}"#);
        let value = Payload::from(json!({ "id": "123", "name": "dunno" }));
        assert_eq!(text.decode().unwrap(), value.decode().unwrap());
    }

    #[test]
    fn test_decode_rejects_scalars() {
        let err = Payload::from(json!(42)).decode().unwrap_err();
        assert!(matches!(err, GuardError::BodyShape { found: "integer" }));
    }

    #[test]
    fn test_decode_rejects_invalid_text() {
        let err = Payload::from("{not json").decode().unwrap_err();
        assert!(matches!(err, GuardError::BodyDecode { .. }));
    }

    #[test]
    fn test_empty_payloads() {
        assert!(Payload::from("").is_empty());
        assert!(Payload::from(" {} ").is_empty());
        assert!(Payload::from(json!(null)).is_empty());
        assert!(!Payload::from(json!([])).is_empty());
    }

    #[test]
    fn test_query_string_keeps_repeated_keys() {
        let req = GenericRequest::new("/subjects").with_query_string("tag=a&tag=b&q=hello%20world");
        assert_eq!(req.query("tag").unwrap(), ["a".to_string(), "b".to_string()]);
        assert_eq!(req.query("q").unwrap(), ["hello world".to_string()]);
        assert!(req.query("missing").is_none());
    }

    #[test]
    fn test_headers_are_case_insensitive() {
        let req = GenericRequest::new("/").with_header("X-Request-Id", "abc");
        assert_eq!(req.header("x-request-id"), Some("abc"));
        let resp = GenericResponse::new(
            200,
            "",
            "text/plain",
            BTreeMap::from([("X-Rate-Limit".to_string(), "10".to_string())]),
        );
        assert_eq!(resp.header("x-rate-limit"), Some("10"));
    }

    #[test]
    fn test_status_normalizes_to_string_key() {
        assert_eq!(Status::from(200).as_key(), "200");
        assert_eq!(Status::from(" 200 ").as_key(), "200");
    }
}
