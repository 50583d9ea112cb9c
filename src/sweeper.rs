//! Periodic eviction of aged-out terminal records.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::info;

use crate::registry::Registry;

/// Background task that evicts terminal records once they age past the
/// retention window. Dropping the handle leaves the task running for the
/// process lifetime; call [`Sweeper::shutdown`] to stop it.
#[derive(Debug)]
pub struct Sweeper {
    handle: JoinHandle<()>,
}

impl Sweeper {
    /// Spawn the sweep loop, ticking every `tick` and evicting terminal
    /// records whose end is older than `retention`.
    pub fn spawn(registry: Arc<Registry>, tick: Duration, retention: Duration) -> Self {
        let retention = chrono::Duration::seconds(retention.as_secs() as i64);
        let handle = tokio::spawn(async move {
            let mut ticker = interval(tick);
            loop {
                ticker.tick().await;
                let evicted = registry.sweep_terminal(Utc::now() - retention).await;
                for id in &evicted {
                    info!("evicted execution {}", id);
                }
            }
        });
        Self { handle }
    }

    /// Stop the sweep loop.
    pub fn shutdown(self) {
        self.handle.abort();
    }
}
