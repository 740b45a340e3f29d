//! Advisory in-memory balance cache.
//!
//! The cache is not the source of truth: entries may be stale, absent, or
//! evicted at any time with no effect on correctness, only latency. A miss
//! falls through to the store.

use dashmap::DashMap;
use tracing::debug;

use walletd_common::Balance;

/// Key→balance lookup capability injected into the service.
///
/// Implementations perform no I/O, never block on external calls, and stay
/// safe under overlapping calls from concurrent operations. The eviction
/// policy is the implementation's choice; eviction drops entries silently.
pub trait BalanceCache: Send + Sync {
    /// Look up the last known committed balance for a key.
    fn get(&self, key: &str) -> Option<Balance>;

    /// Record a committed balance for a key, overwriting any prior entry.
    fn set(&self, key: &str, balance: Balance);

    /// Remove a key's entry, if present.
    fn delete(&self, key: &str);
}

impl<C: BalanceCache> BalanceCache for std::sync::Arc<C> {
    fn get(&self, key: &str) -> Option<Balance> {
        (**self).get(key)
    }

    fn set(&self, key: &str, balance: Balance) {
        (**self).set(key, balance)
    }

    fn delete(&self, key: &str) {
        (**self).delete(key)
    }
}

/// Bounded balance cache with least-recently-used eviction.
///
/// The backing cache is internally partitioned, so reads and writes for
/// unrelated wallets do not contend on a single lock.
pub struct LruBalanceCache {
    inner: moka::sync::Cache<String, Balance>,
}

impl LruBalanceCache {
    /// Create a cache holding at most `max_entries` balances.
    pub fn new(max_entries: u64) -> Self {
        let inner = moka::sync::Cache::builder()
            .max_capacity(max_entries)
            .build();
        Self { inner }
    }

    /// Number of entries currently held.
    pub fn len(&self) -> u64 {
        self.inner.entry_count()
    }

    /// Check if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[cfg(test)]
    fn flush(&self) {
        self.inner.run_pending_tasks();
    }
}

impl BalanceCache for LruBalanceCache {
    fn get(&self, key: &str) -> Option<Balance> {
        let balance = self.inner.get(key);
        match balance {
            Some(balance) => debug!(key, balance, "cache hit"),
            None => debug!(key, "cache miss"),
        }
        balance
    }

    fn set(&self, key: &str, balance: Balance) {
        self.inner.insert(key.to_string(), balance);
    }

    fn delete(&self, key: &str) {
        self.inner.invalidate(key);
    }
}

/// Unbounded sharded map cache; entries live until overwritten or deleted.
///
/// Useful where the wallet population is small enough that eviction buys
/// nothing.
#[derive(Default)]
pub struct MapBalanceCache {
    inner: DashMap<String, Balance>,
}

impl MapBalanceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries currently held.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Check if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl BalanceCache for MapBalanceCache {
    fn get(&self, key: &str) -> Option<Balance> {
        self.inner.get(key).map(|entry| *entry)
    }

    fn set(&self, key: &str, balance: Balance) {
        self.inner.insert(key.to_string(), balance);
    }

    fn delete(&self, key: &str) {
        self.inner.remove(key);
    }
}
