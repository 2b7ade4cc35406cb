use crate::resolver::Resolver;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Shortest interval a sweeper runs at; shorter requests are raised to it.
pub const MIN_SWEEP_INTERVAL: Duration = Duration::from_secs(1);

/// Periodically purges expired links from the durable store.
pub struct CleanupSweeper;

impl CleanupSweeper {
    /// Starts a background task that calls [`Resolver::cleanup`] every
    /// `interval`.
    ///
    /// The first run happens one full `interval` after spawning. A failed
    /// run is logged and the next tick tries again.
    ///
    /// # Arguments
    ///
    /// * `resolver` - The resolver whose `cleanup` is called
    /// * `interval` - Time between runs, raised to [`MIN_SWEEP_INTERVAL`] if shorter
    pub fn spawn(resolver: Arc<dyn Resolver>, interval: Duration) -> SweeperHandle {
        let interval = if interval < MIN_SWEEP_INTERVAL {
            warn!(
                requested = ?interval,
                using = ?MIN_SWEEP_INTERVAL,
                "Cleanup interval too short, raising it"
            );
            MIN_SWEEP_INTERVAL
        } else {
            interval
        };
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately.
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        match resolver.cleanup().await {
                            Ok(0) => debug!("Cleanup found no expired links"),
                            Ok(deleted) => info!(deleted, "Cleaned up expired links"),
                            Err(e) => warn!(error = %e, "Cleanup run failed"),
                        }
                    }
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            break;
                        }
                    }
                }
            }
            debug!("Cleanup sweeper stopped");
        });

        SweeperHandle { shutdown_tx, task }
    }
}

/// Handle to a running [`CleanupSweeper`].
///
/// Dropping the handle also stops the sweeper, at its next wake-up.
pub struct SweeperHandle {
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SweeperHandle {
    /// Signals the sweeper to stop and waits for it to finish. A cleanup
    /// run already in progress completes first.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        if let Err(e) = self.task.await {
            warn!(error = %e, "Cleanup sweeper task ended abnormally");
        }
    }
}
