// build.rs
//
// Copyright, 2025. Signal65 / Futurum Group.
//
// Stamps the build time into the binary for `--version`.

use chrono::{SecondsFormat, Utc};

fn main() {
    println!(
        "cargo:rustc-env=S3ACL_BUILD_TIME={}",
        Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
    );
}
