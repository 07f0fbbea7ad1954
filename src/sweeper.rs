use std::time::Duration;

use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::status_store::StatusStore;

/// Periodically reclaims expired entries so devices that stop reporting do
/// not hold memory until they are next queried.
pub struct ExpirySweeper {
    store: StatusStore,
    interval: Duration,
    shutdown: CancellationToken,
}

impl ExpirySweeper {
    pub fn new(store: StatusStore, interval: Duration, shutdown: CancellationToken) -> Self {
        Self {
            store,
            interval,
            shutdown,
        }
    }

    /// Runs until `shutdown` is cancelled.
    /// Spawn this via `tokio::spawn`.
    pub async fn run(self) {
        info!(interval_secs = self.interval.as_secs(), "Expiry sweeper started");
        let mut ticker = time::interval(self.interval);

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    self.run_once().await;
                }
            }
        }

        info!("Expiry sweeper stopped");
    }

    async fn run_once(&self) -> usize {
        let removed = self.store.purge_expired().await;
        if removed > 0 {
            let remaining = self.store.len().await;
            debug!(removed, remaining, "Reclaimed expired statuses");
        }
        removed
    }
}
