// src/error.rs
//
// Copyright, 2025. Signal65 / Futurum Group.
//
//! Error taxonomy for a bulk ACL run.
//!
//! Configuration and listing errors are fatal to the run. Read/write errors
//! are per-object: they are counted and logged, never propagated to the driver.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AclError {
    /// Mandatory setting missing or out of bounds.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to compile regex '{pattern}': {source}")]
    PatternCompile {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("invalid grants: {0}")]
    InvalidGrants(String),

    /// Enumeration failed. Already-queued tasks still drain.
    #[error("failed to list objects in '{bucket}': {source:#}")]
    Listing {
        bucket: String,
        #[source]
        source: anyhow::Error,
    },

    /// Every worker exited while tasks were still being queued.
    #[error("worker pool stopped before '{key}' could be queued")]
    PoolClosed { key: String },

    #[error("failed to read acl on '{key}': {source:#}")]
    ReadAcl {
        key: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("failed to change permissions on '{key}': {source:#}")]
    WriteAcl {
        key: String,
        #[source]
        source: anyhow::Error,
    },
}

pub type Result<T, E = AclError> = std::result::Result<T, E>;
