// src/lib.rs
//
// Copyright, 2025. Signal65 / Futurum Group.
//
// Crate root: public re-exports for the CLI and for embedding.

pub mod constants;
pub mod error;
pub mod acl;
pub mod config;
pub mod filter;
pub mod accountant;

// Storage seam and AWS backend
pub mod store;
pub mod s3_client;

// Pipeline
pub mod enumerator;
pub mod mutator;
pub mod pool;
pub mod runner;

pub use acl::{
    parse_grants, AclSpec, AclWrite, CannedAcl, Grant, Grantee, GranteeType, ObjectAcl, Owner,
    Permission,
};
pub use accountant::{Accountant, Summary};
pub use config::{DryRun, RunConfig, RunConfigBuilder};
pub use error::AclError;
pub use filter::KeyFilter;
pub use mutator::{AclMutator, MutationTask, Outcome};
pub use pool::WorkerPool;
pub use runner::{run, RunReport};
pub use s3_client::{build_client, S3Settings};
pub use store::{AclStore, ListPage, S3AclStore};
