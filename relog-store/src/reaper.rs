//! Scheduled reclamation.
//!
//! Lookups are correct without this task; it only keeps memory bounded by
//! calling [`RecordStore::reclaim`] on a fixed interval.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use relog_core::traits::RecordStore;

/// Background task that periodically reclaims expired records.
///
/// The task stops when [`shutdown`](Reaper::shutdown) is awaited or the
/// handle is dropped.
///
/// # Example
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use std::time::Duration;
/// use relog_store::{MemoryStore, Reaper};
///
/// let store = Arc::new(MemoryStore::new());
/// let reaper = Reaper::spawn(store.clone(), Duration::from_secs(60));
/// // ...
/// reaper.shutdown().await;
/// ```
#[derive(Debug)]
pub struct Reaper {
    shutdown_tx: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl Reaper {
    /// Spawns the reaper on the current Tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime, or if `interval` is zero.
    pub fn spawn(store: Arc<dyn RecordStore>, interval: Duration) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(Self::run(store, interval, shutdown_rx));

        info!(interval_secs = interval.as_secs_f64(), "Reaper started");
        Self {
            shutdown_tx,
            task: Some(task),
        }
    }

    async fn run(
        store: Arc<dyn RecordStore>,
        interval: Duration,
        mut shutdown_rx: watch::Receiver<bool>,
    ) {
        let mut ticker = tokio::time::interval(interval);
        // Skip the first immediate tick - wait one full interval first
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match store.reclaim(None).await {
                        Ok(0) => {}
                        Ok(removed) => debug!(removed, "Reaper reclaimed expired records"),
                        Err(e) => warn!(error = %e, "Reaper reclaim failed"),
                    }
                }
                changed = shutdown_rx.changed() => {
                    // Sender dropped or shutdown requested
                    if changed.is_err() || *shutdown_rx.borrow() {
                        break;
                    }
                }
            }
        }

        debug!("Reaper stopped");
    }

    /// Stops the task and waits for it to finish.
    pub async fn shutdown(mut self) {
        let _ = self.shutdown_tx.send(true);
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!(error = %e, "Reaper task ended abnormally");
            }
        }
    }
}

impl Drop for Reaper {
    fn drop(&mut self) {
        let _ = self.shutdown_tx.send(true);
    }
}
