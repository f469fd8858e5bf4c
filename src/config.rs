// src/config.rs
//
// Copyright, 2025. Signal65 / Futurum Group.
//
//! Resolved, validated configuration for one bulk ACL run.
//!
//! All validation (mandatory bucket, worker count bounds, pattern
//! compilation, grant parsing) happens in `RunConfigBuilder::build`, before
//! any network call. The pipeline assumes it receives a valid `RunConfig`.

use std::time::Duration;

use crate::acl::{parse_grants, AclSpec, CannedAcl};
use crate::constants::{
    DEFAULT_INCLUDE_PATTERN, DEFAULT_PARALLEL, DEFAULT_WRITE_RETRY_DELAY, DRY_RUN_LABEL,
};
use crate::error::{AclError, Result};
use crate::filter::KeyFilter;

/// Dry-run state, read by every worker and never written after startup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DryRun {
    pub active: bool,
    /// Prefix for log lines and the summary; empty for a live run.
    pub label: String,
}

impl DryRun {
    pub fn new(active: bool) -> Self {
        let label = if active { DRY_RUN_LABEL.to_string() } else { String::new() };
        Self { active, label }
    }
}

/// Everything the pipeline needs for one run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub bucket: String,
    pub prefix: String,
    /// Number of workers, always >= 1.
    pub parallel: usize,
    pub acl: AclSpec,
    pub filter: KeyFilter,
    pub dry_run: DryRun,
    pub write_retry_delay: Duration,
}

impl RunConfig {
    pub fn builder(bucket: impl Into<String>) -> RunConfigBuilder {
        RunConfigBuilder::new(bucket)
    }
}

/// Collects raw settings and validates them into a `RunConfig`.
#[derive(Debug, Clone)]
pub struct RunConfigBuilder {
    bucket: String,
    prefix: String,
    parallel: usize,
    canned: CannedAcl,
    grants_json: Option<String>,
    pattern: String,
    dry_run: bool,
    write_retry_delay: Duration,
}

impl RunConfigBuilder {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            prefix: String::new(),
            parallel: DEFAULT_PARALLEL,
            canned: CannedAcl::default(),
            grants_json: None,
            pattern: DEFAULT_INCLUDE_PATTERN.to_string(),
            dry_run: false,
            write_retry_delay: DEFAULT_WRITE_RETRY_DELAY,
        }
    }

    /// Key prefix to recurse under (empty = whole bucket).
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn parallel(mut self, parallel: usize) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn canned_acl(mut self, acl: CannedAcl) -> Self {
        self.canned = acl;
        self
    }

    /// Grant list as JSON. When set, the canned ACL is ignored.
    pub fn grants_json(mut self, json: impl Into<String>) -> Self {
        self.grants_json = Some(json.into());
        self
    }

    /// Inclusion regex matched against the full key.
    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = pattern.into();
        self
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn write_retry_delay(mut self, delay: Duration) -> Self {
        self.write_retry_delay = delay;
        self
    }

    /// Validate and resolve into a `RunConfig`.
    pub fn build(self) -> Result<RunConfig> {
        if self.bucket.trim().is_empty() {
            return Err(AclError::InvalidConfig("bucket is mandatory!".to_string()));
        }
        if self.parallel < 1 {
            return Err(AclError::InvalidConfig(format!(
                "parallel must be at least 1, got {}",
                self.parallel
            )));
        }

        let filter = KeyFilter::new(&self.pattern)?;
        let grants = self.grants_json.as_deref().map(parse_grants).transpose()?;

        Ok(RunConfig {
            bucket: self.bucket,
            prefix: self.prefix,
            parallel: self.parallel,
            acl: AclSpec::from_parts(self.canned, grants),
            filter,
            dry_run: DryRun::new(self.dry_run),
            write_retry_delay: self.write_retry_delay,
        })
    }
}
