// src/accountant.rs
//
// Copyright, 2025. Signal65 / Futurum Group.
//
//! Run-wide counters.
//!
//! One `Accountant` is created per run and shared by reference (`Arc`) with
//! the driver and every worker. Increments are atomic; the final `Summary`
//! is taken once, after the worker pool has been joined.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Atomic counters for one run.
#[derive(Debug, Default)]
pub struct Accountant {
    seen: AtomicU64,
    matched: AtomicU64,
    succeeded: AtomicU64,
    failed: AtomicU64,
}

impl Accountant {
    pub fn new() -> Self {
        Self::default()
    }

    /// A key came back from the listing.
    pub fn record_seen(&self) {
        self.seen.fetch_add(1, Ordering::Relaxed);
    }

    /// A key passed the inclusion filter and became a task.
    pub fn record_matched(&self) {
        self.matched.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_success(&self) {
        self.succeeded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Read all counters. Only meaningful once every worker has exited:
    /// the pool join provides the happens-before edge for the loads.
    pub fn finish(&self, label: &str) -> Summary {
        Summary {
            label: label.to_string(),
            seen: self.seen.load(Ordering::Acquire),
            matched: self.matched.load(Ordering::Acquire),
            succeeded: self.succeeded.load(Ordering::Acquire),
            failed: self.failed.load(Ordering::Acquire),
        }
    }
}

/// Final counter values for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Summary {
    /// Dry-run label, empty for a live run.
    pub label: String,
    pub seen: u64,
    pub matched: u64,
    pub succeeded: u64,
    pub failed: u64,
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.label.is_empty() {
            write!(f, "{} ", self.label)?;
        }
        write!(
            f,
            "Summary : ACL changed : {}, objects matched regex : {}, total objects : {}, errors : {}",
            self.succeeded, self.matched, self.seen, self.failed
        )
    }
}
