//
// Copyright, 2025.  Signal65 / Futurum Group.
//
//! Recursively change the ACL of every object under an S3 prefix.
//!
//! Examples:
//! ```bash
//! s3-recursive-acl --bucket my-bucket --path data/ --acl public-read
//! s3-recursive-acl --bucket my-bucket --path logs/ --regex '\.gz$' --parallel 64
//! s3-recursive-acl --bucket my-bucket --dry-run -v \
//!     --grants '[{"Grantee":{"ID":"123456789","Type":"CanonicalUser"},"Permission":"FULL_CONTROL"}]'
//! s3-recursive-acl --completions bash > /etc/bash_completion.d/s3-recursive-acl
//! ```

use std::io::{self, ErrorKind, Write};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{ArgAction, CommandFactory, Parser};
use clap_complete::Shell;
use tracing_subscriber::EnvFilter;

use s3acl::constants::{DEFAULT_INCLUDE_PATTERN, DEFAULT_PARALLEL};
use s3acl::{build_client, run, CannedAcl, RunConfig, S3AclStore, S3Settings};

/// Print a line to stdout, tolerating a closed pipe.
macro_rules! safe_println {
    ($($arg:tt)*) => {
        match writeln!(io::stdout(), $($arg)*) {
            Ok(_) => {},
            Err(e) if e.kind() == ErrorKind::BrokenPipe => {},
            Err(e) => return Err(e.into()),
        }
    };
}

/// Version line plus the build timestamp stamped by `build.rs`.
const VERSION_INFO: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    "\nBuild time : ",
    env!("S3ACL_BUILD_TIME")
);

#[derive(Parser, Debug)]
#[command(name = "s3-recursive-acl", author, version = VERSION_INFO, about)]
struct Cli {
    /// Increase log verbosity: -v = Info, -vv = Debug
    #[arg(short = 'v', long, action = ArgAction::Count)]
    verbose: u8,

    /// Bucket name
    #[arg(long, required_unless_present = "completions")]
    bucket: Option<String>,

    /// Path (key prefix) to recurse under
    #[arg(long, default_value = "")]
    path: String,

    /// AWS region; falls back to AWS_REGION, then AWS_DEFAULT_REGION
    #[arg(long)]
    region: Option<String>,

    /// Endpoint URL, for S3-compatible services
    #[arg(long)]
    endpoint: Option<String>,

    /// AWS credentials profile name
    #[arg(long)]
    profile: Option<String>,

    /// Number of parallel workers; a number too high may exhaust open files or hit a rate limit
    #[arg(long, default_value_t = DEFAULT_PARALLEL)]
    parallel: usize,

    /// Regex a key must match to be updated
    #[arg(long, default_value = DEFAULT_INCLUDE_PATTERN)]
    regex: String,

    /// Canned ACL to assign objects
    #[arg(long, value_enum, default_value_t = CannedAcl::Private)]
    acl: CannedAcl,

    /// If set, --acl is ignored. Grants part of the ACL in JSON, ie:
    /// '[{"Grantee":{"ID":"123456789","Type":"CanonicalUser"},"Permission":"FULL_CONTROL"}]'
    #[arg(long)]
    grants: Option<String>,

    /// Don't change any ACL, only list and probe
    #[arg(long = "dry-run")]
    dry_run: bool,

    /// Print a shell completion script for the given shell and exit
    #[arg(long, value_enum, value_name = "SHELL")]
    completions: Option<Shell>,
}

fn init_logging(verbose: u8) {
    let filter = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_target(false)
        .init();

    // Route `log` records from the AWS SDK dependencies through tracing.
    tracing_log::LogTracer::init().ok();
}

#[tokio::main]
async fn main() -> ExitCode {
    // Loads any variables from .env file that are not already set
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_logging(cli.verbose);

    match real_main(cli).await {
        Ok(code) => code,
        Err(e) => {
            print_fatal(format_args!("{:#}", e), &mut io::stderr());
            ExitCode::FAILURE
        }
    }
}

/// Report a fatal error exactly once. Logging is not used here: the fmt
/// subscriber writes to stdout, where it would repeat the message.
fn print_fatal(err: impl std::fmt::Display, out: &mut dyn Write) {
    let _ = writeln!(out, "Error: {}", err);
}

/// Write the completion script for `shell` to `out`.
fn write_completions(shell: Shell, out: &mut dyn Write) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    clap_complete::generate(shell, &mut cmd, name, out);
}

async fn real_main(cli: Cli) -> Result<ExitCode> {
    if let Some(shell) = cli.completions {
        write_completions(shell, &mut io::stdout());
        return Ok(ExitCode::SUCCESS);
    }

    // Validate everything before the first network call.
    let mut builder = RunConfig::builder(cli.bucket.unwrap_or_default())
        .prefix(cli.path)
        .parallel(cli.parallel)
        .canned_acl(cli.acl)
        .pattern(cli.regex)
        .dry_run(cli.dry_run);
    if let Some(json) = cli.grants {
        builder = builder.grants_json(json);
    }
    let config = builder.build().context("invalid arguments")?;

    let settings = S3Settings {
        region: cli.region,
        endpoint: cli.endpoint,
        profile: cli.profile,
    };

    let client = build_client(&settings).await.context("failed to configure S3 client")?;
    let store = Arc::new(S3AclStore::new(client));

    let report = run(store, &config).await;
    safe_println!("{}", report.summary);

    // Per-object failures are reported in the summary only; the exit code
    // reflects run-fatal errors.
    match report.fatal {
        Some(e) => {
            print_fatal(&e, &mut io::stderr());
            Ok(ExitCode::FAILURE)
        }
        None => Ok(ExitCode::SUCCESS),
    }
}
