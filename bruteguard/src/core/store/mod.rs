//! Attempt store contract and implementations
//!
//! The engine treats the store as an injected key-value cache with TTL
//! semantics. A write with no TTL override refreshes the entry's expiry to
//! the store's configured default window — that refresh on every write is
//! what implements the sliding inactivity window.

use super::StoreError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

mod memory;

pub use memory::{MemoryStore, MemoryStoreBuilder};

/// Per-identity bookkeeping, one record per storage key.
///
/// Absence of a record means the identity has never been seen or its window
/// has expired. `last_attempt_at` is a unix timestamp in milliseconds and may
/// sit in the future: when a check still owed a wait, the anchor is advanced
/// past `now` so rapid retries cannot reset the penalty clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub attempts: u32,
    pub last_attempt_at: i64,
}

/// A record read back from the store, with the entry's remaining lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachedRecord {
    pub record: AttemptRecord,
    pub ttl_remaining: Duration,
}

/// Store contract for attempt records (get/set/remove with TTL semantics).
///
/// `ttl_override: None` means "use the store's configured default window";
/// passing `Some` pins the entry's lifetime for that write only. Any
/// underlying failure is normalized into [`StoreError`].
#[async_trait]
pub trait AttemptStore: Send + Sync {
    /// Read the record for `key`, with its remaining TTL.
    async fn get(&self, key: &str) -> Result<Option<CachedRecord>, StoreError>;

    /// Write the record for `key`, refreshing its expiry.
    async fn set(
        &self,
        key: &str,
        record: AttemptRecord,
        ttl_override: Option<Duration>,
    ) -> Result<(), StoreError>;

    /// Remove the record for `key`. Removing an absent key is not an error.
    async fn remove(&self, key: &str) -> Result<(), StoreError>;
}
