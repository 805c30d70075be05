#![deny(missing_docs)]

//! # Guard Configuration
//!
//! Settings for composing a [`ContractGuard`](crate::guard::ContractGuard). Every field
//! has a default, so an empty YAML document is a valid configuration.

use crate::error::{GuardError, GuardResult};
use crate::spec::DEFAULT_SPEC_PATH;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable consulted when `debug_only` is set.
pub const DEFAULT_DEBUG_ENV_VAR: &str = "SPECGUARD_DEBUG";

/// Guard settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GuardConfig {
    /// Spec document to validate against.
    pub spec_path: PathBuf,
    /// Only validate while `debug_env_var` is set to a non-empty value.
    pub debug_only: bool,
    /// Variable that switches validation on when `debug_only` is set.
    pub debug_env_var: String,
    /// Check requests before the handler runs.
    pub validate_requests: bool,
    /// Check responses after the handler runs.
    pub validate_responses: bool,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            spec_path: PathBuf::from(DEFAULT_SPEC_PATH),
            debug_only: false,
            debug_env_var: DEFAULT_DEBUG_ENV_VAR.to_string(),
            validate_requests: true,
            validate_responses: true,
        }
    }
}

impl GuardConfig {
    /// Parses a YAML configuration.
    ///
    /// # Errors
    ///
    /// `SpecFormat` naming `<config>` if the text is not a valid configuration.
    pub fn from_yaml_str(text: &str) -> GuardResult<Self> {
        Self::parse(Path::new("<config>"), text)
    }

    /// Reads and parses a YAML configuration file.
    ///
    /// # Errors
    ///
    /// `SpecNotFound` if the file cannot be read, `SpecFormat` if it cannot be parsed.
    pub fn from_file(path: impl AsRef<Path>) -> GuardResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| GuardError::SpecNotFound {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::parse(path, &text)
    }

    fn parse(path: &Path, text: &str) -> GuardResult<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text).map_err(|e| GuardError::SpecFormat {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Whether validation should run, given a way to read environment variables.
    ///
    /// Without `debug_only` validation always runs; with it, only while the
    /// variable is present and non-empty.
    pub fn gate_open_with<F>(&self, lookup: F) -> bool
    where
        F: Fn(&str) -> Option<String>,
    {
        !self.debug_only || lookup(&self.debug_env_var).is_some_and(|v| !v.is_empty())
    }

    /// [`gate_open_with`](Self::gate_open_with) against the process environment.
    pub fn gate_open(&self) -> bool {
        self.gate_open_with(|name| std::env::var(name).ok())
    }
}
