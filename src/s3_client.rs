// src/s3_client.rs
//
// Copyright, 2025. Signal65 / Futurum Group.
//
//! S3 client construction: region, optional custom endpoint and profile.

use std::env;

use anyhow::{bail, Result};
use aws_config::BehaviorVersion;
use aws_sdk_s3::{config::Region, Client};
use tracing::debug;

/// Connection settings for the S3 backend.
#[derive(Debug, Clone, Default)]
pub struct S3Settings {
    pub region: Option<String>,
    /// Custom endpoint URL for S3-compatible services.
    pub endpoint: Option<String>,
    /// Named credentials profile.
    pub profile: Option<String>,
}

impl S3Settings {
    /// The region from `--region`, else `AWS_REGION`, else `AWS_DEFAULT_REGION`.
    /// A region is mandatory.
    pub fn resolve_region(&self) -> Result<String> {
        self.region_from(|var| env::var(var).ok())
    }

    fn region_from<F>(&self, lookup: F) -> Result<String>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(region) = self.region.as_deref().filter(|r| !r.is_empty()) {
            return Ok(region.to_string());
        }
        match ["AWS_REGION", "AWS_DEFAULT_REGION"]
            .into_iter()
            .filter_map(&lookup)
            .find(|v| !v.is_empty())
        {
            Some(region) => Ok(region),
            None => bail!("region is mandatory! Pass --region or set AWS_REGION / AWS_DEFAULT_REGION"),
        }
    }
}

/// Build an S3 client from `settings`. Fails when no region can be resolved.
pub async fn build_client(settings: &S3Settings) -> Result<Client> {
    let region = Region::new(settings.resolve_region()?);

    let mut loader = aws_config::defaults(BehaviorVersion::latest()).region(region);

    if let Some(profile) = settings.profile.as_deref().filter(|p| !p.is_empty()) {
        loader = loader.profile_name(profile);
    }

    let endpoint = settings.endpoint.as_deref().filter(|e| !e.is_empty());
    if let Some(endpoint) = endpoint {
        debug!("Using custom S3 endpoint {}", endpoint);
        loader = loader.endpoint_url(endpoint);
    }

    let cfg = loader.load().await;

    // Path-style addressing for S3-compatible endpoints.
    let s3_cfg = aws_sdk_s3::config::Builder::from(&cfg)
        .force_path_style(endpoint.is_some())
        .build();

    Ok(Client::from_conf(s3_cfg))
}
