#![deny(missing_docs)]

//! # Lint Command
//!
//! Loads a document, runs the structural checks and builds the operation index.

use std::io::Write;
use std::path::Path;

use tracing::info;

use crate::error::CliResult;
use crate::input::load_validator;

/// Executes the lint command.
///
/// # Arguments
///
/// * `spec` - Path to the Swagger document.
/// * `out` - Where the summary line is written.
pub fn execute(spec: &Path, out: &mut impl Write) -> CliResult<()> {
    let validator = load_validator(spec)?;
    let operations = validator.operations()?;
    let title = validator.document().title().unwrap_or("untitled");

    info!(spec = %spec.display(), operations = operations.len(), "spec is valid");
    writeln!(
        out,
        "{}: OK ({}, {} operations)",
        spec.display(),
        title,
        operations.len()
    )?;
    Ok(())
}
