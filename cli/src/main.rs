#![deny(missing_docs)]

//! # Specguard CLI
//!
//! Command Line Interface for checking Swagger 2.0 contracts.
//!
//! Supported Commands:
//! - `lint`: Load and structurally validate a spec document.
//! - `operations`: List indexed operations.
//! - `response`: Validate a captured response.
//! - `request`: Validate a captured request.

use std::io;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use specguard_core::DEFAULT_SPEC_PATH;

use crate::error::CliResult;

mod error;
mod input;
mod lint;
mod operations;
mod request;
mod response;

#[derive(Parser, Debug)]
#[clap(author, version, about = "Swagger 2.0 contract checker")]
struct Cli {
    /// Path to the Swagger document.
    #[clap(long, global = true, env = "SPECGUARD_SPEC", default_value = DEFAULT_SPEC_PATH)]
    spec: PathBuf,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate the document structure and report the operation count.
    Lint,
    /// List operations as `operation_id METHOD path`.
    Operations,
    /// Validate a captured response against an operation.
    Response(response::ResponseArgs),
    /// Validate a captured request against an operation.
    Request(request::RequestArgs),
}

fn main() -> CliResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "specguard=info".into()),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let mut out = io::stdout().lock();

    match &cli.command {
        Commands::Lint => lint::execute(&cli.spec, &mut out)?,
        Commands::Operations => operations::execute(&cli.spec, &mut out)?,
        Commands::Response(args) => response::execute(&cli.spec, args, &mut out)?,
        Commands::Request(args) => request::execute(&cli.spec, args, &mut out)?,
    }

    Ok(())
}
