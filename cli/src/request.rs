#![deny(missing_docs)]

//! # Request Command
//!
//! Validates a captured request against an operation.

use std::io::Write;
use std::path::Path;

use specguard_core::GenericRequest;

use crate::error::CliResult;
use crate::input::{load_validator, parse_pair, read_body};

/// Arguments for the request command.
#[derive(clap::Args, Debug, Clone)]
pub struct RequestArgs {
    /// Operation id, as declared or normalized.
    #[clap(long)]
    pub operation: String,

    /// Request path, including `basePath` (e.g. `/api/subjects/42`).
    #[clap(long)]
    pub path: String,

    /// Query parameter as `key=value`. Repeatable.
    #[clap(long = "query")]
    pub query: Vec<String>,

    /// Header as `Name: value`. Repeatable.
    #[clap(long = "header")]
    pub headers: Vec<String>,

    /// Form field as `key=value`. Repeatable.
    #[clap(long = "form")]
    pub form: Vec<String>,

    /// File holding the request body, or `-` for stdin.
    #[clap(long)]
    pub body: Option<String>,
}

/// Executes the request command. Every violation is printed before the error is returned.
pub fn execute(spec: &Path, args: &RequestArgs, out: &mut impl Write) -> CliResult<()> {
    let validator = load_validator(spec)?;

    let mut request = GenericRequest::new(args.path.as_str());
    for raw in &args.query {
        let (key, value) = parse_pair(raw, '=')?;
        request = request.with_query(key, value);
    }
    for raw in &args.headers {
        let (name, value) = parse_pair(raw, ':')?;
        request = request.with_header(name, value);
    }
    for raw in &args.form {
        let (key, value) = parse_pair(raw, '=')?;
        request = request.with_form(key, value);
    }
    if let Some(source) = &args.body {
        request = request.with_body(read_body(source)?);
    }

    if let Err(e) = validator.validate_request(&args.operation, &request) {
        if let specguard_core::GuardError::Request(violations) = &e {
            for violation in violations.iter() {
                writeln!(out, "{}", violation)?;
            }
        }
        return Err(e.into());
    }

    writeln!(out, "{} {}: OK", args.operation, args.path)?;
    Ok(())
}
