// src/filter.rs
//
// Copyright, 2025. Signal65 / Futurum Group.
//
//! Inclusion filter applied to every enumerated key.

use regex::Regex;

use crate::error::{AclError, Result};

/// Compiled inclusion pattern, matched (unanchored) against the full key.
#[derive(Debug, Clone)]
pub struct KeyFilter {
    re: Regex,
}

impl KeyFilter {
    /// Compile `pattern` once, up front. Fails fast on an invalid regex.
    pub fn new(pattern: &str) -> Result<Self> {
        let re = Regex::new(pattern).map_err(|source| AclError::PatternCompile {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(Self { re })
    }

    pub fn matches(&self, key: &str) -> bool {
        self.re.is_match(key)
    }

    pub fn as_str(&self) -> &str {
        self.re.as_str()
    }
}
