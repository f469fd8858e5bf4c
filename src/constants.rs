// src/constants.rs
//
// Copyright, 2025. Signal65 / Futurum Group.
//
// Defaults shared by the CLI and the library.

use std::time::Duration;

/// Default number of concurrent ACL workers.
pub const DEFAULT_PARALLEL: usize = 32;

/// Inclusion pattern used when none is given: every key matches.
pub const DEFAULT_INCLUDE_PATTERN: &str = ".*";

/// Prefix attached to log lines and the summary during a dry run.
pub const DRY_RUN_LABEL: &str = "DRY RUN:";

/// Pause before the single retry of a failed ACL write.
pub const DEFAULT_WRITE_RETRY_DELAY: Duration = Duration::from_millis(200);
