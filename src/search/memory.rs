//! In-process search index double
//!
//! A started sync stays running until [`MemorySearchIndex::finish_sync`] is
//! called, which lets tests walk the console through a whole sync cycle.

use super::{IndexError, IndexResult, SearchIndex, SyncJob, SyncStatus};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

#[derive(Default)]
pub struct MemorySearchIndex {
    syncing: AtomicBool,
    started: AtomicU64,
    status_calls: AtomicU64,
    fail: AtomicBool,
}

impl MemorySearchIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn finish_sync(&self) {
        self.syncing.store(false, Ordering::SeqCst);
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn syncs_started(&self) -> u64 {
        self.started.load(Ordering::SeqCst)
    }

    pub fn status_calls(&self) -> u64 {
        self.status_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SearchIndex for MemorySearchIndex {
    async fn start_sync(&self) -> IndexResult<SyncJob> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(IndexError::RequestFailed("injected failure".to_string()));
        }
        if self.syncing.swap(true, Ordering::SeqCst) {
            return Err(IndexError::AlreadySyncing);
        }

        let n = self.started.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(SyncJob {
            execution_id: Some(format!("memory-sync-{}", n)),
        })
    }

    async fn sync_status(&self) -> IndexResult<SyncStatus> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(IndexError::RequestFailed("injected failure".to_string()));
        }

        Ok(if self.syncing.load(Ordering::SeqCst) {
            SyncStatus::Syncing
        } else {
            SyncStatus::Idle
        })
    }
}
