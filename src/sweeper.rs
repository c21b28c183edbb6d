//! Background eviction of expired records

use crate::store::{unix_now, MemoryStore, Store};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::info;

pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(1);

/// Periodic task that sleeps for `interval`, then sweeps the store
pub struct ExpirySweeper {
    store: MemoryStore,
    interval: Duration,
}

impl ExpirySweeper {
    pub fn new(store: MemoryStore, interval: Duration) -> Self {
        Self { store, interval }
    }

    /// Sweep forever. Ends only with the runtime.
    pub async fn run(self) {
        loop {
            tokio::time::sleep(self.interval).await;
            let deleted = self.store.sweep_expired(unix_now()).await;
            if deleted > 0 {
                info!(deleted, "swept expired keys");
            }
        }
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }
}
