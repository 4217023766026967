//! Per-session busy flag for cart mutations.
//!
//! At most one cart mutation per shopper session is in flight. A second
//! attempt while the flag is held is rejected rather than queued, so the
//! caller learns immediately that its action was not applied.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use moka::future::Cache;

/// Idle time after which a session's flag is forgotten.
const LOCK_IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Shared busy flag. Clones refer to the same flag.
#[derive(Debug, Clone, Default)]
pub struct BusyFlag(Arc<AtomicBool>);

impl BusyFlag {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the flag, or `None` if it is already held.
    #[must_use]
    pub fn try_acquire(&self) -> Option<BusyGuard> {
        self.0
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| BusyGuard(Arc::clone(&self.0)))
    }

    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Holds the flag until dropped.
#[derive(Debug)]
pub struct BusyGuard(Arc<AtomicBool>);

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Busy flags keyed by session cart key.
#[derive(Clone)]
pub struct CartLocks {
    flags: Cache<String, BusyFlag>,
}

impl Default for CartLocks {
    fn default() -> Self {
        Self::new()
    }
}

impl CartLocks {
    #[must_use]
    pub fn new() -> Self {
        Self {
            flags: Cache::builder()
                .max_capacity(100_000)
                .time_to_idle(LOCK_IDLE_TIMEOUT)
                .build(),
        }
    }

    /// The flag for `key`, created on first use.
    pub async fn flag(&self, key: &str) -> BusyFlag {
        self.flags
            .get_with(key.to_owned(), async { BusyFlag::new() })
            .await
    }
}
