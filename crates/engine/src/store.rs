// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job record store seam used by the runner and supervisor.

use async_trait::async_trait;
use rpk_core::{Event, JobRecord};
use rpk_storage::{Commit, JobFilter, Store, StoreError};
use std::sync::Arc;

/// Atomic per-event commit plus reads.
///
/// `commit` resolves only once the event is durable, and returns the record
/// as committed. Callers publish from that record, never from what they
/// asked for.
#[async_trait]
pub trait JobStore: Clone + Send + Sync + 'static {
    async fn commit(&self, event: Event) -> Result<Commit, StoreError>;

    fn get(&self, id: &str) -> Option<JobRecord>;

    fn list(&self, filter: &JobFilter) -> Vec<JobRecord>;

    fn non_terminal(&self) -> Vec<JobRecord>;
}

/// [`JobStore`] backed by the write-ahead-logged [`Store`].
///
/// Commits run on the blocking pool because they fsync.
#[derive(Clone)]
pub struct WalJobStore {
    store: Arc<Store>,
}

impl WalJobStore {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl JobStore for WalJobStore {
    async fn commit(&self, event: Event) -> Result<Commit, StoreError> {
        let store = Arc::clone(&self.store);
        match tokio::task::spawn_blocking(move || store.commit(event)).await {
            Ok(result) => result,
            // Blocking pool gone (runtime shutting down): nothing was written
            Err(e) => Err(StoreError::Wal(rpk_storage::WalError::Io(
                std::io::Error::other(format!("commit task failed: {e}")),
            ))),
        }
    }

    fn get(&self, id: &str) -> Option<JobRecord> {
        self.store.get(id)
    }

    fn list(&self, filter: &JobFilter) -> Vec<JobRecord> {
        self.store.list(filter)
    }

    fn non_terminal(&self) -> Vec<JobRecord> {
        self.store.non_terminal()
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use memory::MemoryJobStore;

#[cfg(any(test, feature = "test-support"))]
mod memory {
    #![cfg_attr(coverage_nightly, coverage(off))]

    use super::*;
    use parking_lot::Mutex;
    use rpk_storage::MaterializedState;

    /// In-memory [`JobStore`] with the same accept rules as the real store.
    ///
    /// Records every committed event in order and can run a hook after each
    /// commit, before the caller regains control.
    #[derive(Clone, Default)]
    pub struct MemoryJobStore {
        inner: Arc<Mutex<MemoryState>>,
    }

    type CommitHook = Arc<dyn Fn(&JobRecord) + Send + Sync>;

    #[derive(Default)]
    struct MemoryState {
        state: MaterializedState,
        events: Vec<Event>,
        hook: Option<CommitHook>,
    }

    impl MemoryJobStore {
        pub fn new() -> Self {
            Self::default()
        }

        /// Committed events, in commit order.
        pub fn events(&self) -> Vec<Event> {
            self.inner.lock().events.clone()
        }

        /// Called with each committed record, after it is stored.
        pub fn on_commit(&self, hook: impl Fn(&JobRecord) + Send + Sync + 'static) {
            self.inner.lock().hook = Some(Arc::new(hook));
        }
    }

    #[async_trait]
    impl JobStore for MemoryJobStore {
        async fn commit(&self, event: Event) -> Result<Commit, StoreError> {
            let (record, hook) = {
                let mut inner = self.inner.lock();
                if !inner.state.accepts(&event) {
                    return Ok(Commit::Rejected);
                }
                inner.state.apply_event(&event);
                let record = inner.state.jobs.get(event.job_id().as_str()).cloned();
                inner.events.push(event);
                (record, inner.hook.clone())
            };
            let Some(record) = record else {
                return Ok(Commit::Rejected);
            };
            if let Some(hook) = hook {
                hook(&record);
            }
            Ok(Commit::Applied(record))
        }

        fn get(&self, id: &str) -> Option<JobRecord> {
            self.inner.lock().state.get_job(id).cloned()
        }

        fn list(&self, filter: &JobFilter) -> Vec<JobRecord> {
            self.inner
                .lock()
                .state
                .list_jobs(filter)
                .into_iter()
                .cloned()
                .collect()
        }

        fn non_terminal(&self) -> Vec<JobRecord> {
            self.inner
                .lock()
                .state
                .non_terminal_jobs()
                .into_iter()
                .cloned()
                .collect()
        }
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
