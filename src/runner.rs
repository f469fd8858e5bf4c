// src/runner.rs
//
// Copyright, 2025. Signal65 / Futurum Group.
//
//! Bulk ACL run: enumerate, filter, queue, mutate, summarize.
//!
//! The driver (the caller's task) walks the listing page by page, filters
//! each key and pushes matched keys onto the worker pool. It never writes to
//! storage itself. A listing error stops the driver, but everything already
//! queued still runs to completion before the summary is taken.

use std::sync::Arc;

use futures::{pin_mut, StreamExt};
use tracing::{error, info};

use crate::accountant::{Accountant, Summary};
use crate::config::RunConfig;
use crate::enumerator::list_pages;
use crate::error::{AclError, Result};
use crate::mutator::{AclMutator, MutationTask};
use crate::pool::WorkerPool;
use crate::store::AclStore;

/// Outcome of one run.
#[derive(Debug)]
pub struct RunReport {
    /// Final counters, taken after every worker exited.
    pub summary: Summary,
    /// Run-fatal error that stopped the driver, if any.
    pub fatal: Option<AclError>,
}

impl RunReport {
    /// `Err` when the run was cut short. Per-object failures are not errors here;
    /// they only show up in `summary.failed`.
    pub fn into_result(self) -> Result<Summary> {
        match self.fatal {
            Some(e) => Err(e),
            None => Ok(self.summary),
        }
    }
}

/// Apply `config.acl` to every matching object under `config.prefix`.
pub async fn run(store: Arc<dyn AclStore>, config: &RunConfig) -> RunReport {
    let label = config.dry_run.label.as_str();
    info!(
        "{} Applying {} to s3://{}/{} (regex '{}', {} workers)",
        label,
        config.acl,
        config.bucket,
        config.prefix,
        config.filter.as_str(),
        config.parallel
    );

    let accountant = Arc::new(Accountant::new());
    let mutator = Arc::new(AclMutator::new(
        Arc::clone(&store),
        config.dry_run.clone(),
        config.write_retry_delay,
    ));
    let pool = WorkerPool::spawn(config.parallel, mutator, Arc::clone(&accountant));

    let fatal = drive(store.as_ref(), config, &pool, &accountant).await.err();
    if let Some(e) = &fatal {
        error!("{} {}; waiting for queued updates to finish", label, e);
    }

    // Barrier: no counter is read before every worker has exited.
    pool.join().await;

    let summary = accountant.finish(label);
    info!("{}", summary);
    RunReport { summary, fatal }
}

/// Producer side: enumerate, filter, enqueue.
async fn drive(
    store: &dyn AclStore,
    config: &RunConfig,
    pool: &WorkerPool,
    accountant: &Accountant,
) -> Result<()> {
    let label = config.dry_run.label.as_str();
    let acl = Arc::new(config.acl.clone());

    let pages = list_pages(store, &config.bucket, &config.prefix);
    pin_mut!(pages);

    while let Some(page) = pages.next().await {
        for key in page? {
            accountant.record_seen();
            if !config.filter.matches(&key) {
                info!("{} Skipping '{}'", label, key);
                continue;
            }
            accountant.record_matched();
            pool.submit(MutationTask {
                bucket: config.bucket.clone(),
                key,
                acl: Arc::clone(&acl),
            })
            .await?;
        }
    }
    Ok(())
}
