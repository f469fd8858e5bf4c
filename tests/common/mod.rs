// tests/common/mod.rs
//
// Common test utilities: an in-memory `AclStore` that records every call.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use s3acl::{AclStore, AclWrite, CannedAcl, Grant, ListPage, ObjectAcl, Owner};

/// Stored state of one object.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MockObject {
    pub owner: Option<Owner>,
    pub canned: Option<CannedAcl>,
    pub grants: Vec<Grant>,
}

/// In-memory bucket with failure injection and call accounting.
#[derive(Default)]
pub struct MockAclStore {
    objects: Mutex<BTreeMap<String, MockObject>>,
    page_size: usize,
    /// Listing fails when asked for this page index (0-based).
    fail_list_at_page: Option<usize>,
    /// Keys whose ACL read always fails.
    failing_reads: HashSet<String>,
    /// Remaining number of failing writes per key.
    failing_writes: Mutex<HashMap<String, usize>>,
    write_delay: Duration,

    pub list_calls: AtomicUsize,
    pub read_calls: AtomicUsize,
    pub write_calls: AtomicUsize,
    in_flight_writes: AtomicUsize,
    pub peak_in_flight_writes: AtomicUsize,
}

impl MockAclStore {
    /// Bucket holding `keys`, each owned by `owner-<key>`, served 1000 keys per page.
    pub fn with_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let objects = keys
            .into_iter()
            .map(|k| {
                let key = k.into();
                let obj = MockObject {
                    owner: Some(Owner {
                        id: Some(format!("owner-{key}")),
                        display_name: None,
                    }),
                    ..Default::default()
                };
                (key, obj)
            })
            .collect();
        Self {
            objects: Mutex::new(objects),
            page_size: 1000,
            ..Default::default()
        }
    }

    pub fn page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn fail_list_at_page(mut self, page: usize) -> Self {
        self.fail_list_at_page = Some(page);
        self
    }

    pub fn fail_reads_for(mut self, key: &str) -> Self {
        self.failing_reads.insert(key.to_string());
        self
    }

    pub fn fail_writes_for(self, key: &str, times: usize) -> Self {
        self.failing_writes.lock().unwrap().insert(key.to_string(), times);
        self
    }

    pub fn write_delay(mut self, delay: Duration) -> Self {
        self.write_delay = delay;
        self
    }

    pub fn object(&self, key: &str) -> Option<MockObject> {
        self.objects.lock().unwrap().get(key).cloned()
    }

    pub fn writes(&self) -> usize {
        self.write_calls.load(Ordering::SeqCst)
    }

    pub fn reads(&self) -> usize {
        self.read_calls.load(Ordering::SeqCst)
    }

    pub fn peak_writes(&self) -> usize {
        self.peak_in_flight_writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AclStore for MockAclStore {
    async fn list_page(
        &self,
        _bucket: &str,
        prefix: &str,
        continuation: Option<String>,
    ) -> Result<ListPage> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let page_idx: usize = match continuation {
            Some(t) => t.parse()?,
            None => 0,
        };
        if self.fail_list_at_page == Some(page_idx) {
            return Err(anyhow!("AccessDenied: listing refused"));
        }

        let matching: Vec<String> = self
            .objects
            .lock()
            .unwrap()
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect();

        let start = page_idx * self.page_size;
        let end = (start + self.page_size).min(matching.len());
        let keys = matching.get(start..end).map(<[String]>::to_vec).unwrap_or_default();
        let next_token = (end < matching.len()).then(|| (page_idx + 1).to_string());

        Ok(ListPage { keys, next_token })
    }

    async fn get_object_acl(&self, _bucket: &str, key: &str) -> Result<ObjectAcl> {
        self.read_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_reads.contains(key) {
            return Err(anyhow!("AccessDenied: cannot read acl of {key}"));
        }
        let obj = self
            .object(key)
            .ok_or_else(|| anyhow!("NoSuchKey: {key}"))?;
        Ok(ObjectAcl {
            owner: obj.owner,
            grants: obj.grants,
        })
    }

    async fn put_object_acl(&self, _bucket: &str, key: &str, acl: &AclWrite) -> Result<()> {
        self.write_calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight_writes.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight_writes.fetch_max(now, Ordering::SeqCst);

        if !self.write_delay.is_zero() {
            tokio::time::sleep(self.write_delay).await;
        }

        let result = {
            let mut failing = self.failing_writes.lock().unwrap();
            match failing.get_mut(key) {
                Some(n) if *n > 0 => {
                    *n -= 1;
                    Err(anyhow!("InternalError: write to {key} failed"))
                }
                _ => Ok(()),
            }
        };

        if result.is_ok() {
            let mut objects = self.objects.lock().unwrap();
            let obj = objects.entry(key.to_string()).or_default();
            match acl {
                AclWrite::Canned(c) => {
                    obj.canned = Some(*c);
                    obj.grants.clear();
                }
                AclWrite::Document { owner, grants } => {
                    obj.canned = None;
                    obj.owner = owner.clone();
                    obj.grants = grants.clone();
                }
            }
        }

        self.in_flight_writes.fetch_sub(1, Ordering::SeqCst);
        result
    }
}
