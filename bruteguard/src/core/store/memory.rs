use super::{AttemptRecord, AttemptStore, CachedRecord};
use crate::core::StoreError;
use async_trait::async_trait;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, SystemTime};

#[cfg(feature = "ahash")]
use ahash::AHashMap as HashMap;
#[cfg(not(feature = "ahash"))]
use std::collections::HashMap;

// Configuration constants
const DEFAULT_CAPACITY: usize = 1000;
const CAPACITY_OVERHEAD_FACTOR: f64 = 1.3;
const DEFAULT_WINDOW: Duration = Duration::from_millis(360_000);
const DEFAULT_CLEANUP_INTERVAL_SECS: u64 = 60;

/// In-memory attempt store with TTL semantics
///
/// Entries expire after the configured window of write inactivity. Expiry is
/// passive: an expired entry reads as absent immediately, and a full sweep of
/// the map runs inline at most once per cleanup interval, triggered by
/// whichever access crosses the deadline. No background task exists.
///
/// # Example
///
/// ```
/// use bruteguard::MemoryStore;
/// use std::time::Duration;
///
/// let store = MemoryStore::builder()
///     .capacity(100_000)
///     .window(Duration::from_secs(360))
///     .build();
/// ```
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

struct Inner {
    data: HashMap<String, Entry>,
    window: Duration,
    // Track when the next full sweep is due
    next_cleanup: SystemTime,
    cleanup_interval: Duration,
}

struct Entry {
    record: AttemptRecord,
    expires_at: SystemTime,
}

/// Builder for configuring a MemoryStore
///
/// # Example
///
/// ```
/// use bruteguard::MemoryStore;
/// use std::time::Duration;
///
/// let store = MemoryStore::builder()
///     .window(Duration::from_secs(600))
///     .cleanup_interval(Duration::from_secs(120))
///     .build();
/// ```
pub struct MemoryStoreBuilder {
    capacity: usize,
    window: Duration,
    cleanup_interval: Duration,
}

impl MemoryStore {
    /// Create a store with the default window (360s) and capacity.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Create a builder for fine-grained configuration.
    pub fn builder() -> MemoryStoreBuilder {
        MemoryStoreBuilder {
            capacity: DEFAULT_CAPACITY,
            window: DEFAULT_WINDOW,
            cleanup_interval: Duration::from_secs(DEFAULT_CLEANUP_INTERVAL_SECS),
        }
    }

    /// The default TTL applied to writes without an override.
    pub fn window(&self) -> Duration {
        self.lock().window
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.lock().data.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Inner {
    fn get_at(&mut self, key: &str, now: SystemTime) -> Option<CachedRecord> {
        self.maybe_clean_expired(now);
        match self.data.get(key) {
            Some(entry) => match entry.expires_at.duration_since(now) {
                Ok(ttl_remaining) => Some(CachedRecord {
                    record: entry.record,
                    ttl_remaining,
                }),
                // Already past its expiry, not yet swept
                Err(_) => {
                    self.data.remove(key);
                    None
                }
            },
            None => None,
        }
    }

    fn set_at(
        &mut self,
        key: &str,
        record: AttemptRecord,
        ttl_override: Option<Duration>,
        now: SystemTime,
    ) {
        self.maybe_clean_expired(now);
        let ttl = ttl_override.unwrap_or(self.window);
        self.data.insert(
            key.to_string(),
            Entry {
                record,
                expires_at: now + ttl,
            },
        );
    }

    fn maybe_clean_expired(&mut self, now: SystemTime) {
        if now >= self.next_cleanup {
            self.data.retain(|_, entry| entry.expires_at > now);
            self.next_cleanup = now + self.cleanup_interval;
        }
    }
}

#[async_trait]
impl AttemptStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<CachedRecord>, StoreError> {
        Ok(self.lock().get_at(key, SystemTime::now()))
    }

    async fn set(
        &self,
        key: &str,
        record: AttemptRecord,
        ttl_override: Option<Duration>,
    ) -> Result<(), StoreError> {
        self.lock().set_at(key, record, ttl_override, SystemTime::now());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.lock().data.remove(key);
        Ok(())
    }
}

impl MemoryStoreBuilder {
    /// Expected number of tracked identities.
    ///
    /// The map allocates 30% more space to reduce hash collisions.
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Default TTL for writes without an override.
    pub fn window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    /// Minimum time between full sweeps of expired entries.
    pub fn cleanup_interval(mut self, interval: Duration) -> Self {
        self.cleanup_interval = interval;
        self
    }

    pub fn build(self) -> MemoryStore {
        MemoryStore {
            inner: Mutex::new(Inner {
                data: HashMap::with_capacity(
                    (self.capacity as f64 * CAPACITY_OVERHEAD_FACTOR) as usize,
                ),
                window: self.window,
                // First access sweeps the (empty) map and schedules the
                // real deadline from its own clock
                next_cleanup: SystemTime::UNIX_EPOCH,
                cleanup_interval: self.cleanup_interval,
            }),
        }
    }
}
