// src/mutator.rs
//
// Copyright, 2025. Signal65 / Futurum Group.
//
//! Per-object ACL mutation.
//!
//! Two protocols, picked by the task's `AclSpec`:
//!
//! * **Canned**: a single `put_object_acl` carrying the canned value.
//! * **Explicit**: `get_object_acl` to learn the owner, then `put_object_acl`
//!   with a document made of that owner plus the supplied grants. The grant
//!   list replaces whatever the object had. A failed read fails the object
//!   without any write.
//!
//! A failed write is retried exactly once. Under dry-run no write is ever
//! issued: a read-only probe runs (its failure is only logged) and the
//! object is counted as a success.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::acl::{AclSpec, AclWrite};
use crate::config::DryRun;
use crate::error::{AclError, Result};
use crate::store::AclStore;

/// One unit of work: apply `acl` to `bucket/key`. Consumed by exactly one worker.
#[derive(Debug, Clone)]
pub struct MutationTask {
    pub bucket: String,
    pub key: String,
    pub acl: Arc<AclSpec>,
}

/// Result of one `apply`. The worker maps it to exactly one counter.
#[derive(Debug)]
pub enum Outcome {
    /// The new ACL was written (possibly on the retry).
    Applied,
    /// Dry-run: nothing was written.
    Simulated,
    /// Read or write failed for good. Already logged.
    Failed(AclError),
}

/// Applies ACL changes to single objects.
pub struct AclMutator {
    store: Arc<dyn AclStore>,
    dry_run: DryRun,
    retry_delay: Duration,
}

impl AclMutator {
    pub fn new(store: Arc<dyn AclStore>, dry_run: DryRun, retry_delay: Duration) -> Self {
        Self {
            store,
            dry_run,
            retry_delay,
        }
    }

    /// Mutate one object. Failures are logged here and returned as
    /// `Outcome::Failed`; they never escape as an error.
    pub async fn apply(&self, task: &MutationTask) -> Outcome {
        if self.dry_run.active {
            self.simulate(task).await;
            return Outcome::Simulated;
        }

        match self.mutate(task).await {
            Ok(()) => Outcome::Applied,
            Err(e) => {
                warn!("{} {}", self.dry_run.label, e);
                Outcome::Failed(e)
            }
        }
    }

    async fn mutate(&self, task: &MutationTask) -> Result<()> {
        let write = match task.acl.as_ref() {
            AclSpec::Canned(canned) => AclWrite::Canned(*canned),
            AclSpec::Explicit(grants) => {
                let current = self
                    .store
                    .get_object_acl(&task.bucket, &task.key)
                    .await
                    .map_err(|source| AclError::ReadAcl {
                        key: task.key.clone(),
                        source,
                    })?;
                AclWrite::Document {
                    owner: current.owner,
                    grants: grants.clone(),
                }
            }
        };

        info!("{} Updating '{}'", self.dry_run.label, task.key);
        self.write_with_retry(task, &write).await
    }

    /// One write, plus exactly one retry if it fails.
    async fn write_with_retry(&self, task: &MutationTask, write: &AclWrite) -> Result<()> {
        let first = match self.store.put_object_acl(&task.bucket, &task.key, write).await {
            Ok(()) => return Ok(()),
            Err(e) => e,
        };
        warn!("Write failed on '{}', retrying once: {:#}", task.key, first);

        if !self.retry_delay.is_zero() {
            tokio::time::sleep(self.retry_delay).await;
        }

        self.store
            .put_object_acl(&task.bucket, &task.key, write)
            .await
            .map_err(|source| AclError::WriteAcl {
                key: task.key.clone(),
                source,
            })
    }

    /// Dry-run path: read-only probe, never a write.
    async fn simulate(&self, task: &MutationTask) {
        if let Err(e) = self.store.get_object_acl(&task.bucket, &task.key).await {
            warn!(
                "{} Probe could not read acl on '{}' (the real run would likely fail): {:#}",
                self.dry_run.label, task.key, e
            );
        }
        info!("{} Updating '{}'", self.dry_run.label, task.key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acl::{CannedAcl, Grant, Grantee, ObjectAcl, Owner, Permission};
    use crate::store::ListPage;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Fails the first `write_failures` writes and every read when `fail_read`.
    #[derive(Default)]
    struct FlakyStore {
        write_failures: usize,
        fail_read: bool,
        reads: AtomicUsize,
        writes: Mutex<Vec<AclWrite>>,
    }

    #[async_trait]
    impl AclStore for FlakyStore {
        async fn list_page(&self, _: &str, _: &str, _: Option<String>) -> anyhow::Result<ListPage> {
            unreachable!()
        }

        async fn get_object_acl(&self, _: &str, _: &str) -> anyhow::Result<ObjectAcl> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            if self.fail_read {
                return Err(anyhow!("AccessDenied"));
            }
            Ok(ObjectAcl {
                owner: Some(Owner {
                    id: Some("owner-1".to_string()),
                    display_name: None,
                }),
                grants: Vec::new(),
            })
        }

        async fn put_object_acl(&self, _: &str, _: &str, acl: &AclWrite) -> anyhow::Result<()> {
            let mut writes = self.writes.lock().unwrap();
            writes.push(acl.clone());
            if writes.len() <= self.write_failures {
                return Err(anyhow!("connection reset"));
            }
            Ok(())
        }
    }

    fn task(acl: AclSpec) -> MutationTask {
        MutationTask {
            bucket: "bucket".to_string(),
            key: "dir/obj".to_string(),
            acl: Arc::new(acl),
        }
    }

    fn grants() -> Vec<Grant> {
        vec![Grant {
            grantee: Grantee::canonical_user("abc"),
            permission: Permission::FullControl,
        }]
    }

    fn mutator(store: &Arc<FlakyStore>, dry_run: bool) -> AclMutator {
        AclMutator::new(store.clone(), DryRun::new(dry_run), Duration::ZERO)
    }

    #[tokio::test]
    async fn canned_write_succeeds_first_time() {
        let store = Arc::new(FlakyStore::default());
        let outcome = mutator(&store, false)
            .apply(&task(AclSpec::Canned(CannedAcl::PublicRead)))
            .await;

        assert!(matches!(outcome, Outcome::Applied));
        assert_eq!(*store.writes.lock().unwrap(), vec![AclWrite::Canned(CannedAcl::PublicRead)]);
        assert_eq!(store.reads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn single_failure_is_absorbed_by_retry() {
        let store = Arc::new(FlakyStore {
            write_failures: 1,
            ..Default::default()
        });
        let outcome = mutator(&store, false)
            .apply(&task(AclSpec::Canned(CannedAcl::Private)))
            .await;

        assert!(matches!(outcome, Outcome::Applied));
        assert_eq!(store.writes.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn second_failure_gives_up() {
        let store = Arc::new(FlakyStore {
            write_failures: 2,
            ..Default::default()
        });
        let outcome = mutator(&store, false)
            .apply(&task(AclSpec::Canned(CannedAcl::Private)))
            .await;

        assert!(matches!(outcome, Outcome::Failed(AclError::WriteAcl { .. })));
        assert_eq!(store.writes.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn explicit_grants_replace_with_owner_document() {
        let store = Arc::new(FlakyStore::default());
        let outcome = mutator(&store, false)
            .apply(&task(AclSpec::Explicit(grants())))
            .await;

        assert!(matches!(outcome, Outcome::Applied));
        assert_eq!(store.reads.load(Ordering::SeqCst), 1);
        let writes = store.writes.lock().unwrap();
        match &writes[..] {
            [AclWrite::Document { owner, grants: written }] => {
                assert_eq!(owner.as_ref().and_then(|o| o.id.as_deref()), Some("owner-1"));
                assert_eq!(written, &grants());
            }
            other => panic!("unexpected writes: {other:?}"),
        }
    }

    #[tokio::test]
    async fn failed_read_skips_write() {
        let store = Arc::new(FlakyStore {
            fail_read: true,
            ..Default::default()
        });
        let outcome = mutator(&store, false)
            .apply(&task(AclSpec::Explicit(grants())))
            .await;

        assert!(matches!(outcome, Outcome::Failed(AclError::ReadAcl { .. })));
        assert!(store.writes.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn dry_run_probes_but_never_writes() {
        let store = Arc::new(FlakyStore {
            fail_read: true,
            ..Default::default()
        });
        let m = mutator(&store, true);
        let canned = m.apply(&task(AclSpec::Canned(CannedAcl::Private))).await;
        let explicit = m.apply(&task(AclSpec::Explicit(grants()))).await;

        assert!(matches!(canned, Outcome::Simulated));
        assert!(matches!(explicit, Outcome::Simulated));
        assert_eq!(store.reads.load(Ordering::SeqCst), 2);
        assert!(store.writes.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn retry_waits_for_configured_delay() {
        let store = Arc::new(FlakyStore {
            write_failures: 1,
            ..Default::default()
        });
        let m = AclMutator::new(store.clone(), DryRun::new(false), Duration::from_secs(5));

        let start = tokio::time::Instant::now();
        let outcome = m.apply(&task(AclSpec::Canned(CannedAcl::Private))).await;
        assert!(matches!(outcome, Outcome::Applied));
        assert!(start.elapsed() >= Duration::from_secs(5));
    }
}
