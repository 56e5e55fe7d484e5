use std::time::Duration;

use tokio::{sync::watch, task::JoinHandle, time};
use tracing::{debug, info};

use crate::storage::Store;

/// Periodically removes expired keys from a [`Store`].
pub struct Sweeper;

impl Sweeper {
    /// Spawns the sweep loop on the current Tokio runtime.
    ///
    /// The first pass runs one `interval` after spawning. The loop ends when
    /// [`SweeperHandle::stop`] is called or the handle is dropped.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a Tokio runtime.
    pub fn spawn(store: Store, interval: Duration) -> SweeperHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(Self::run(store, interval, shutdown_rx));

        SweeperHandle {
            shutdown_tx,
            task: Some(task),
        }
    }

    async fn run(store: Store, interval: Duration, mut shutdown_rx: watch::Receiver<bool>) {
        let mut ticker = time::interval(interval);
        ticker.set_missed_tick_behavior(time::MissedTickBehavior::Delay);
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let removed = store.sweep();
                    if removed > 0 {
                        debug!("Swept {} expired keys", removed);
                    }
                }
                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        break;
                    }
                }
            }
        }

        info!("Expiry sweeper stopped");
    }
}

/// Owner's handle on a running sweeper.
pub struct SweeperHandle {
    shutdown_tx: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl SweeperHandle {
    /// Signals the loop to exit and waits for it.
    pub async fn stop(mut self) {
        let _ = self.shutdown_tx.send(true);
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, |task| task.is_finished())
    }
}

impl Drop for SweeperHandle {
    fn drop(&mut self) {
        let _ = self.shutdown_tx.send(true);
    }
}
