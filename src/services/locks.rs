//! Per-series mutual exclusion
//!
//! A scan and a rename of the same series mutate the same episode-file
//! records and must not interleave; operations on different series may run
//! concurrently. Callers acquire the series' async mutex for the whole
//! scan/clean-up/rename section.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use uuid::Uuid;

/// Lazily created lock per series id
#[derive(Default)]
pub struct SeriesLockMap {
    locks: Mutex<HashMap<Uuid, Arc<AsyncMutex<()>>>>,
}

impl SeriesLockMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the exclusive section for one series, waiting if a scan or
    /// rename of the same series is already in flight.
    pub async fn acquire(&self, series_id: Uuid) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock();
            locks
                .entry(series_id)
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }
}
