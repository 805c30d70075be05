#![deny(missing_docs)]

//! # Operations Command
//!
//! Lists the indexed operations in document order.

use std::io::Write;
use std::path::Path;

use crate::error::CliResult;
use crate::input::load_validator;

/// Executes the operations command, one `operation_id METHOD path` line per operation.
pub fn execute(spec: &Path, out: &mut impl Write) -> CliResult<()> {
    let validator = load_validator(spec)?;
    for op in validator.operations()?.iter() {
        writeln!(out, "{} {}", op.operation_id, op.signature())?;
    }
    Ok(())
}
