#![deny(missing_docs)]

//! # Response Command
//!
//! Validates a captured response against an operation.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

use specguard_core::GenericResponse;

use crate::error::CliResult;
use crate::input::{load_validator, parse_pair, read_body};

/// Arguments for the response command.
#[derive(clap::Args, Debug, Clone)]
pub struct ResponseArgs {
    /// Operation id, as declared or normalized.
    #[clap(long)]
    pub operation: String,

    /// Response status code.
    #[clap(long)]
    pub status: String,

    /// Response content type.
    #[clap(long, default_value = "application/json")]
    pub content_type: String,

    /// Response header as `Name: value`. Repeatable.
    #[clap(long = "header")]
    pub headers: Vec<String>,

    /// File holding the response body, or `-` for stdin. Omitted means an empty body.
    #[clap(long)]
    pub body: Option<String>,
}

/// Executes the response command.
pub fn execute(spec: &Path, args: &ResponseArgs, out: &mut impl Write) -> CliResult<()> {
    let validator = load_validator(spec)?;

    let headers = args
        .headers
        .iter()
        .map(|raw| parse_pair(raw, ':'))
        .collect::<CliResult<BTreeMap<_, _>>>()?;
    let body = match &args.body {
        Some(source) => read_body(source)?,
        None => String::new(),
    };

    let response = GenericResponse::new(args.status.as_str(), body, args.content_type.as_str(), headers);
    validator.validate_response(&args.operation, &response)?;

    writeln!(out, "{} {}: OK", args.operation, args.status)?;
    Ok(())
}
