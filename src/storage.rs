use std::{
    collections::HashMap,
    path::Path,
    sync::Arc,
    time::{Duration, SystemTime},
};

use parking_lot::Mutex;
use tracing::{debug, info};

use crate::config::StoreConfig;
use crate::persistence::{snapshot::SnapshotManager, ValueEntry};
use crate::sweeper::{Sweeper, SweeperHandle};
use crate::Result;

/// Reported by [`Store::ttl`] for a key that does not exist or has expired.
pub const TTL_MISSING: i64 = -2;
/// Reported by [`Store::ttl`] for a key that exists without an expiry.
pub const TTL_PERSISTENT: i64 = -1;

struct StoreInner {
    data: Mutex<HashMap<String, ValueEntry>>,
    snapshot: SnapshotManager,
    sweep_interval: Duration,
}

/// Key-value map behind a single lock.
///
/// Every operation holds the lock for its whole critical section, so each
/// call takes effect atomically with respect to every other call and to the
/// sweeper. Nothing spans more than one call.
///
/// Expired entries are never visible: `get` and `ttl` drop them on access,
/// and the sweeper drops the rest in the background.
///
/// Cloning is cheap and every clone shares the same map.
#[derive(Clone)]
pub struct Store {
    inner: Arc<StoreInner>,
}

impl Store {
    /// Builds the store and fills it from the configured snapshot, if any.
    ///
    /// Does not start the sweeper; see [`Store::spawn_sweeper`].
    pub fn open(config: StoreConfig) -> Self {
        info!(
            "Initializing store with snapshot: {:?}, sweep interval: {:?}",
            config.snapshot_path, config.sweep_interval
        );

        let snapshot = SnapshotManager::new(config.snapshot_path);
        let data = snapshot.load();

        Self {
            inner: Arc::new(StoreInner {
                data: Mutex::new(data),
                snapshot,
                sweep_interval: config.sweep_interval,
            }),
        }
    }

    /// Starts the background sweeper at the configured interval.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a Tokio runtime.
    pub fn spawn_sweeper(&self) -> SweeperHandle {
        Sweeper::spawn(self.clone(), self.inner.sweep_interval)
    }

    pub fn snapshot_path(&self) -> &Path {
        self.inner.snapshot.path()
    }

    /// Stores `value` under `key`, replacing any previous value and
    /// clearing any expiry.
    pub fn set(&self, key: String, value: String) {
        self.inner.data.lock().insert(key, ValueEntry::new(value));
    }

    pub fn get(&self, key: &str) -> Option<String> {
        let mut data = self.inner.data.lock();
        let now = SystemTime::now();

        match data.get(key) {
            Some(entry) if !entry.is_expired(now) => Some(entry.value.clone()),
            Some(_) => {
                data.remove(key);
                debug!("Lazily expired {:?}", key);
                None
            }
            None => None,
        }
    }

    pub fn delete(&self, key: &str) {
        self.inner.data.lock().remove(key);
    }

    /// Makes `key` expire `seconds` from now. A missing key is silently
    /// ignored, so callers cannot tell it apart from a successful call.
    pub fn expire(&self, key: &str, seconds: u64) {
        let mut data = self.inner.data.lock();

        if let Some(entry) = data.get_mut(key) {
            // Beyond what SystemTime can represent, the key simply never expires.
            entry.expires_at = SystemTime::now().checked_add(Duration::from_secs(seconds));
        }
    }

    /// Seconds left before `key` expires, rounded down.
    ///
    /// Returns [`TTL_MISSING`] when the key is absent or already expired
    /// (removing it in the latter case) and [`TTL_PERSISTENT`] when it has no
    /// expiry.
    pub fn ttl(&self, key: &str) -> i64 {
        let mut data = self.inner.data.lock();
        let now = SystemTime::now();

        let state = data
            .get(key)
            .map(|entry| (entry.expires_at.is_some(), entry.remaining(now)));

        match state {
            None => TTL_MISSING,
            Some((false, _)) => TTL_PERSISTENT,
            Some((true, Some(left))) => i64::try_from(left.as_secs()).unwrap_or(i64::MAX),
            Some((true, None)) => {
                data.remove(key);
                debug!("Lazily expired {:?}", key);
                TTL_MISSING
            }
        }
    }

    /// Writes the whole map to the snapshot file.
    ///
    /// The lock is held across the write so the image reflects one instant;
    /// every other operation waits until it finishes.
    pub fn persist(&self) -> Result<()> {
        let data = self.inner.data.lock();
        self.inner.snapshot.save(&data)
    }

    /// Number of stored keys, counting expired ones not yet removed.
    pub fn len(&self) -> usize {
        self.inner.data.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes every expired entry and returns how many went away.
    pub(crate) fn sweep(&self) -> usize {
        let mut data = self.inner.data.lock();
        let now = SystemTime::now();
        let before = data.len();

        data.retain(|_, entry| !entry.is_expired(now));

        before - data.len()
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("snapshot", &self.inner.snapshot.path())
            .field("sweep_interval", &self.inner.sweep_interval)
            .finish_non_exhaustive()
    }
}
