//! Periodic sync status polling
//!
//! Checks once right away and then every `period` (5 seconds by default).
//! The console lock is held for the whole check, so a slow status call
//! delays the next tick instead of overlapping it.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::debug;

use super::{DocumentsApi, DocumentsConsole};

pub struct SyncPoller {
    handle: JoinHandle<()>,
}

impl SyncPoller {
    pub fn spawn<A>(console: Arc<Mutex<DocumentsConsole<A>>>, period: Duration) -> Self
    where
        A: DocumentsApi + 'static,
    {
        let handle = tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                let mut console = console.lock().await;
                console.poll_sync_status().await;
                debug!(syncing = console.syncing, "Polled sync status");
            }
        });

        Self { handle }
    }

    pub fn stop(self) {
        self.handle.abort();
    }
}

impl Drop for SyncPoller {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConsoleConfig;
    use crate::console::fake::FakeApi;
    use crate::search::SearchIndex;
    use crate::storage::MemoryObjectStore;

    #[tokio::test(start_paused = true)]
    async fn test_polls_immediately_then_every_period() {
        let api = FakeApi::new(MemoryObjectStore::new("docs-bucket"));
        let index = api.index.clone();
        let console = Arc::new(Mutex::new(DocumentsConsole::new(api, &ConsoleConfig::default())));

        let poller = SyncPoller::spawn(console.clone(), Duration::from_secs(5));

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(index.status_calls(), 1);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(index.status_calls(), 2);

        index.start_sync().await.unwrap();
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(console.lock().await.syncing);

        poller.stop();
        let calls = index.status_calls();
        tokio::time::sleep(Duration::from_secs(20)).await;
        assert_eq!(index.status_calls(), calls);
    }
}
