//! Keyed async locks.
//!
//! [`KeyedLocks`] hands out one `tokio::sync::Mutex` per key (document id)
//! so that callers working on the same document are serialised while
//! unrelated documents proceed in parallel. Entries are pruned once no
//! guard or waiter references them anymore.

use std::{collections::HashMap, sync::Arc};

use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::trace;

/// A map of per-key async mutexes.
#[derive(Debug, Default)]
pub struct KeyedLocks {
    inner: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquires the lock for `key`, waiting for the current holder if any.
    ///
    /// The returned guard releases the lock when dropped. Dropping the
    /// future while it waits is safe and leaves no lock held.
    pub async fn lock(&self, key: &str) -> OwnedMutexGuard<()> {
        let slot = {
            let mut map = self.inner.lock().await;
            // Drop idle slots: only the map itself still points at them.
            map.retain(|_, m| Arc::strong_count(m) > 1);
            map.entry(key.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        trace!(key, "waiting for keyed lock");
        slot.lock_owned().await
    }

    /// Number of keys currently tracked (held or awaited).
    pub async fn len(&self) -> usize {
        let map = self.inner.lock().await;
        map.values().filter(|m| Arc::strong_count(m) > 1).count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
