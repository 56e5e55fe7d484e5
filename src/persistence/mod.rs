use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};

pub mod snapshot;

/// A stored value and the wall-clock instant after which it is gone.
///
/// `expires_at == None` means the entry never expires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueEntry {
    pub value: String,
    pub expires_at: Option<SystemTime>,
}

impl ValueEntry {
    pub fn new(value: String) -> Self {
        Self {
            value,
            expires_at: None,
        }
    }

    pub fn is_expired(&self, now: SystemTime) -> bool {
        self.expires_at.map_or(false, |expires| expires <= now)
    }

    /// Whole seconds left before expiry, rounded down. `None` when the
    /// entry has no expiry or has already expired.
    pub fn remaining(&self, now: SystemTime) -> Option<Duration> {
        self.expires_at
            .and_then(|expires| expires.duration_since(now).ok())
            .filter(|left| !left.is_zero())
    }
}
