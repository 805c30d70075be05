#![deny(missing_docs)]

//! # Path Templates
//!
//! Matches concrete request paths against `basePath` + a Swagger path template
//! and captures the templated segments.

use crate::error::{GuardError, GuardResult};
use percent_encoding::percent_decode_str;
use regex::Regex;
use std::collections::BTreeMap;
use std::fmt;

/// A compiled path template.
#[derive(Clone)]
pub struct PathTemplate {
    template: String,
    names: Vec<String>,
    matcher: Regex,
}

impl PathTemplate {
    /// Compiles `base_path` + `template`. A trailing `/` on the request is tolerated.
    ///
    /// # Errors
    ///
    /// `InvalidSchema` if the template cannot be turned into a matcher.
    pub fn compile(base_path: &str, template: &str) -> GuardResult<Self> {
        let full = format!("{}{}", base_path.trim_end_matches('/'), template);
        let mut names = Vec::new();
        let mut pattern = String::from("^");
        let mut rest = full.as_str();

        while let Some(open) = rest.find('{') {
            pattern.push_str(&regex::escape(&rest[..open]));
            let Some(close) = rest[open..].find('}') else {
                break;
            };
            names.push(rest[open + 1..open + close].to_string());
            pattern.push_str("([^/]+)");
            rest = &rest[open + close + 1..];
        }
        pattern.push_str(&regex::escape(rest));
        pattern.push_str("/?$");

        let matcher = Regex::new(&pattern).map_err(|e| GuardError::InvalidSchema {
            context: format!("path template {}", template),
            reason: e.to_string(),
        })?;

        Ok(Self {
            template: template.to_string(),
            names,
            matcher,
        })
    }

    /// The template as declared, without `basePath`.
    pub fn as_str(&self) -> &str {
        &self.template
    }

    /// Placeholder names in order of appearance.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Captures percent-decoded placeholder values, or `None` if `path` does not match.
    pub fn captures(&self, path: &str) -> Option<BTreeMap<String, String>> {
        let caps = self.matcher.captures(path)?;
        Some(
            self.names
                .iter()
                .zip(caps.iter().skip(1))
                .filter_map(|(name, m)| {
                    m.map(|m| {
                        let value = percent_decode_str(m.as_str()).decode_utf8_lossy();
                        (name.clone(), value.into_owned())
                    })
                })
                .collect(),
        )
    }
}

impl PartialEq for PathTemplate {
    fn eq(&self, other: &Self) -> bool {
        self.matcher.as_str() == other.matcher.as_str()
    }
}

impl fmt::Debug for PathTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PathTemplate")
            .field("template", &self.template)
            .field("pattern", &self.matcher.as_str())
            .finish()
    }
}
