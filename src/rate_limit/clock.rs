//! Wall-clock source for window boundaries.

use std::time::{SystemTime, UNIX_EPOCH};

/// Provides the current wall-clock second.
pub trait Clock: Send + Sync {
    /// Seconds since the Unix epoch.
    fn now_second(&self) -> u64;
}

/// Clock backed by the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_second(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
    }
}
