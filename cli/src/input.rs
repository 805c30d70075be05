#![deny(missing_docs)]

//! # Command Input Helpers
//!
//! Spec loading and argument parsing shared by the subcommands.

use std::fs;
use std::io::Read;
use std::path::Path;

use specguard_core::{SpecCache, SwaggerValidator};

use crate::error::{CliError, CliResult};

/// Loads `spec` and wraps it in a validator.
pub fn load_validator(spec: &Path) -> CliResult<SwaggerValidator> {
    let cache = SpecCache::new();
    Ok(SwaggerValidator::open(&cache, spec)?)
}

/// Reads a body from a file, or from stdin when `source` is `-`.
pub fn read_body(source: &str) -> CliResult<String> {
    if source == "-" {
        let mut text = String::new();
        std::io::stdin().read_to_string(&mut text)?;
        return Ok(text);
    }
    Ok(fs::read_to_string(source)?)
}

/// Splits `key<sep>value`, trimming whitespace around both sides.
pub fn parse_pair(raw: &str, sep: char) -> CliResult<(String, String)> {
    raw.split_once(sep)
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .filter(|(k, _)| !k.is_empty())
        .ok_or_else(|| CliError::Argument(format!("expected KEY{}VALUE, got '{}'", sep, raw)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pair() {
        assert_eq!(
            parse_pair("limit=10", '=').unwrap(),
            ("limit".to_string(), "10".to_string())
        );
        assert_eq!(
            parse_pair("X-Trace-Id: abc", ':').unwrap(),
            ("X-Trace-Id".to_string(), "abc".to_string())
        );
        assert!(parse_pair("novalue", '=').is_err());
        assert!(parse_pair("=value", '=').is_err());
    }

    #[test]
    fn test_read_body_missing_file() {
        assert!(matches!(
            read_body("definitely/not/here.json"),
            Err(CliError::Io(_))
        ));
    }
}
