use std::path::PathBuf;
use std::time::Duration;

use tracing::warn;

pub const DEFAULT_SNAPSHOT_PATH: &str = "data.snapshot";
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(1);

pub const SNAPSHOT_PATH_ENV: &str = "INMEMSTORE_SNAPSHOT";
pub const SWEEP_INTERVAL_ENV: &str = "INMEMSTORE_SWEEP_INTERVAL_MS";

/// Where the store keeps its snapshot and how often expired keys are swept.
///
/// ```rust
/// use inmemstore::StoreConfig;
/// use std::time::Duration;
///
/// let config = StoreConfig::default()
///     .with_snapshot_path("/tmp/store.snapshot")
///     .with_sweep_interval(Duration::from_millis(500));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub snapshot_path: PathBuf,
    pub sweep_interval: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            snapshot_path: PathBuf::from(DEFAULT_SNAPSHOT_PATH),
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
        }
    }
}

impl StoreConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads `INMEMSTORE_SNAPSHOT` and `INMEMSTORE_SWEEP_INTERVAL_MS`.
    /// Unset or unparsable variables keep their defaults.
    pub fn from_env() -> Self {
        Self::from_vars(
            std::env::var(SNAPSHOT_PATH_ENV).ok(),
            std::env::var(SWEEP_INTERVAL_ENV).ok(),
        )
    }

    fn from_vars(snapshot: Option<String>, interval_ms: Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(path) = snapshot.filter(|p| !p.trim().is_empty()) {
            config.snapshot_path = PathBuf::from(path);
        }

        if let Some(raw) = interval_ms {
            match raw.trim().parse::<u64>() {
                Ok(ms) if ms > 0 => config.sweep_interval = Duration::from_millis(ms),
                _ => warn!(
                    "Ignoring {}={:?}, using {:?}",
                    SWEEP_INTERVAL_ENV, raw, config.sweep_interval
                ),
            }
        }

        config
    }

    pub fn with_snapshot_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.snapshot_path = path.into();
        self
    }

    /// Zero is rejected by the timer, so it is clamped to one millisecond.
    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval.max(Duration::from_millis(1));
        self
    }
}
