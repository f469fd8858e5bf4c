// src/pool.rs
//
// Copyright, 2025. Signal65 / Futurum Group.
//
//! Fixed-size worker pool draining one bounded task queue.
//!
//! The queue holds at most `size` tasks. When every worker is busy and the
//! queue is full, `submit` waits; this bounds in-flight storage requests to
//! the worker count. `join` closes the intake, lets the workers drain what is
//! queued and waits for all of them to exit.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error};

use crate::accountant::Accountant;
use crate::error::{AclError, Result};
use crate::mutator::{AclMutator, MutationTask, Outcome};

pub struct WorkerPool {
    tx: mpsc::Sender<MutationTask>,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawn `size` workers onto the current Tokio runtime. `size` must be >= 1.
    pub fn spawn(size: usize, mutator: Arc<AclMutator>, accountant: Arc<Accountant>) -> Self {
        let size = size.max(1);
        let (tx, rx) = mpsc::channel::<MutationTask>(size);
        let rx = Arc::new(Mutex::new(rx));

        let workers = (0..size)
            .map(|id| {
                tokio::spawn(worker_loop(
                    id,
                    Arc::clone(&rx),
                    Arc::clone(&mutator),
                    Arc::clone(&accountant),
                ))
            })
            .collect();

        Self { tx, workers }
    }

    /// Queue one task, waiting while the queue is full.
    pub async fn submit(&self, task: MutationTask) -> Result<()> {
        self.tx
            .send(task)
            .await
            .map_err(|e| AclError::PoolClosed { key: e.0.key })
    }

    /// Close the intake and wait until every worker has exited.
    ///
    /// Counters may only be read after this returns.
    pub async fn join(self) {
        let WorkerPool { tx, workers } = self;
        drop(tx);

        for (id, handle) in workers.into_iter().enumerate() {
            if let Err(e) = handle.await {
                error!("ACL worker {} terminated abnormally: {}", id, e);
            }
        }
    }
}

async fn worker_loop(
    id: usize,
    rx: Arc<Mutex<mpsc::Receiver<MutationTask>>>,
    mutator: Arc<AclMutator>,
    accountant: Arc<Accountant>,
) {
    loop {
        // Hold the lock only while waiting for the next task.
        let next = rx.lock().await.recv().await;
        let Some(task) = next else {
            break;
        };
        // A panic while updating one object must not lose its count.
        match AssertUnwindSafe(mutator.apply(&task)).catch_unwind().await {
            Ok(Outcome::Applied | Outcome::Simulated) => accountant.record_success(),
            Ok(Outcome::Failed(_)) => accountant.record_failure(),
            Err(_) => {
                error!("ACL worker {} panicked while updating '{}'", id, task.key);
                accountant.record_failure();
            }
        }
    }
    debug!("ACL worker {} exiting", id);
}
