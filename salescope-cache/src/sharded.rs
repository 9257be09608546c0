// Copyright 2025 Salescope (https://github.com/salescope)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Sharded TTL key/value store.
//!
//! The shard array is fixed at construction and the shard count must be a
//! power of two so `hash & (count - 1)` is a valid index mask. A key maps
//! to exactly one shard for the lifetime of the cache (xxHash64 with a
//! fixed seed). Operations touch only their target shard's lock; `clear`
//! iterates every shard but there is no global lock to take.
//!
//! Expiration is lazy: `get` treats `now >= expires_at` as a miss. The
//! periodic sweep only reclaims memory.

use parking_lot::RwLock;
use salescope_core::{Result, SalescopeError};
use std::collections::HashMap;
use std::hash::Hasher;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

/// Fixed hash seed so a key maps to the same shard across cache instances.
const SHARD_HASH_SEED: u64 = 0x_73a1_e5c0;

/// Cache construction parameters, fixed for the cache's lifetime.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Number of shards; must be a non-zero power of two.
    pub shard_count: usize,
    /// Interval between best-effort expiry sweeps.
    pub sweep_interval: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            shard_count: 16,
            sweep_interval: Duration::from_secs(60),
        }
    }
}

struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

struct Shard<V> {
    entries: RwLock<HashMap<String, CacheEntry<V>>>,
}

impl<V> Shard<V> {
    fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

/// Cache hit/miss counters snapshot.
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
    /// Entries currently held, including expired ones not yet swept.
    pub entry_count: usize,
}

/// TTL key/value store partitioned into independently locked shards.
pub struct ShardedCache<V> {
    shards: Vec<Shard<V>>,
    mask: u64,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<V: Clone> ShardedCache<V> {
    /// Create a cache with `shard_count` shards.
    ///
    /// Fails unless `shard_count` is a non-zero power of two.
    pub fn new(shard_count: usize) -> Result<Self> {
        if shard_count == 0 || !shard_count.is_power_of_two() {
            return Err(SalescopeError::Config(format!(
                "shard count must be a non-zero power of two, got {}",
                shard_count
            )));
        }

        Ok(Self {
            shards: (0..shard_count).map(|_| Shard::new()).collect(),
            mask: (shard_count - 1) as u64,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        })
    }

    /// Create a cache from a [`CacheConfig`].
    pub fn with_config(config: &CacheConfig) -> Result<Self> {
        Self::new(config.shard_count)
    }

    fn shard_index(&self, key: &str) -> usize {
        let mut hasher = twox_hash::XxHash64::with_seed(SHARD_HASH_SEED);
        hasher.write(key.as_bytes());
        (hasher.finish() & self.mask) as usize
    }

    fn shard_for(&self, key: &str) -> &Shard<V> {
        &self.shards[self.shard_index(key)]
    }

    /// Look up a live entry. Expired entries count as misses and are left
    /// for the sweeper.
    pub fn get(&self, key: &str) -> Option<V> {
        let entries = self.shard_for(key).entries.read();
        match entries.get(key) {
            Some(entry) if Instant::now() < entry.expires_at => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(entry.value.clone())
            }
            _ => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Insert or overwrite `key` with the given time-to-live.
    pub fn set(&self, key: impl Into<String>, value: V, ttl: Duration) {
        let key = key.into();
        let entry = CacheEntry {
            value,
            expires_at: Instant::now() + ttl,
        };
        self.shard_for(&key).entries.write().insert(key, entry);
    }

    /// Remove `key`. Returns whether an entry (live or expired) was present.
    pub fn delete(&self, key: &str) -> bool {
        self.shard_for(key).entries.write().remove(key).is_some()
    }

    /// Whether a live entry exists for `key`. Does not touch hit/miss stats.
    pub fn has(&self, key: &str) -> bool {
        let entries = self.shard_for(key).entries.read();
        matches!(entries.get(key), Some(entry) if Instant::now() < entry.expires_at)
    }

    /// Drop every entry, shard by shard, and reset the counters.
    pub fn clear(&self) {
        for shard in &self.shards {
            shard.entries.write().clear();
        }
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }

    /// Remove expired entries from every shard; returns how many were
    /// dropped. Correctness never depends on this running — `get` already
    /// treats expired entries as absent.
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let mut removed = 0;
        for shard in &self.shards {
            let mut entries = shard.entries.write();
            let before = entries.len();
            entries.retain(|_, entry| now < entry.expires_at);
            removed += before - entries.len();
        }
        removed
    }

    /// Entries currently held, including expired ones not yet swept.
    pub fn len(&self) -> usize {
        self.shards.iter().map(|s| s.entries.read().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    pub fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        CacheStats {
            hits,
            misses,
            hit_rate: if total == 0 {
                0.0
            } else {
                hits as f64 / total as f64
            },
            entry_count: self.len(),
        }
    }
}

impl<V: Clone + Send + Sync + 'static> ShardedCache<V> {
    /// Run [`ShardedCache::sweep`] on a fixed interval until the returned
    /// handle is stopped.
    pub fn spawn_sweeper(cache: Arc<Self>, interval: Duration) -> SweeperHandle {
        let (shutdown, mut shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // interval fires immediately on the first tick
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let removed = cache.sweep();
                        if removed > 0 {
                            debug!(removed, "cache sweep dropped expired entries");
                        }
                    }
                    _ = shutdown_rx.changed() => {
                        debug!("cache sweeper shutting down");
                        break;
                    }
                }
            }
        });

        SweeperHandle { shutdown, handle }
    }
}

/// Handle to a running sweeper task.
pub struct SweeperHandle {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl SweeperHandle {
    /// Signal the sweeper and wait for it to exit.
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        let _ = self.handle.await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    const TTL: Duration = Duration::from_secs(60);

    #[test]
    fn test_shard_count_must_be_power_of_two() {
        assert!(ShardedCache::<u64>::new(0).is_err());
        assert!(ShardedCache::<u64>::new(3).is_err());
        assert!(ShardedCache::<u64>::new(12).is_err());
        assert!(ShardedCache::<u64>::new(1).is_ok());
        assert!(ShardedCache::<u64>::new(16).is_ok());
    }

    #[test]
    fn test_set_then_get() {
        let cache = ShardedCache::new(16).unwrap();
        cache.set("a", 1u64, TTL);
        assert_eq!(cache.get("a"), Some(1));
        assert_eq!(cache.get("b"), None);
    }

    #[test]
    fn test_set_overwrites() {
        let cache = ShardedCache::new(16).unwrap();
        cache.set("a", 1u64, TTL);
        cache.set("a", 2u64, TTL);
        assert_eq!(cache.get("a"), Some(2));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_expiry_is_lazy() {
        let cache = ShardedCache::new(4).unwrap();
        cache.set("a", 1u64, Duration::from_millis(20));
        assert_eq!(cache.get("a"), Some(1));

        thread::sleep(Duration::from_millis(40));

        // Treated as absent, but still resident until a sweep runs.
        assert_eq!(cache.get("a"), None);
        assert!(!cache.has("a"));
        assert_eq!(cache.len(), 1);

        assert_eq!(cache.sweep(), 1);
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn test_sweep_keeps_live_entries() {
        let cache = ShardedCache::new(4).unwrap();
        cache.set("short", 1u64, Duration::from_millis(20));
        cache.set("long", 2u64, TTL);

        thread::sleep(Duration::from_millis(40));

        assert_eq!(cache.sweep(), 1);
        assert_eq!(cache.get("long"), Some(2));
    }

    #[test]
    fn test_delete() {
        let cache = ShardedCache::new(4).unwrap();
        cache.set("a", 1u64, TTL);
        assert!(cache.delete("a"));
        assert!(!cache.delete("a"));
        assert_eq!(cache.get("a"), None);
    }

    #[test]
    fn test_clear_empties_every_shard() {
        let cache = ShardedCache::new(8).unwrap();
        for i in 0..100 {
            cache.set(format!("key-{}", i), i as u64, TTL);
        }
        assert_eq!(cache.len(), 100);

        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.stats().hits, 0);
    }

    #[test]
    fn test_shard_index_is_stable_and_bounded() {
        let cache = ShardedCache::<u64>::new(16).unwrap();
        for i in 0..1000 {
            let key = format!("key-{}", i);
            let idx = cache.shard_index(&key);
            assert!(idx < 16);
            assert_eq!(idx, cache.shard_index(&key));
        }
    }

    #[test]
    fn test_keys_spread_across_shards() {
        let cache = ShardedCache::<u64>::new(16).unwrap();
        let mut seen = std::collections::HashSet::new();
        for i in 0..1000 {
            seen.insert(cache.shard_index(&format!("key-{}", i)));
        }
        // xxHash64 should touch most of 16 shards over 1000 keys.
        assert!(seen.len() >= 12, "only {} shards used", seen.len());
    }

    #[test]
    fn test_concurrent_sets() {
        let cache = Arc::new(ShardedCache::new(16).unwrap());
        let mut handles = vec![];

        for t in 0..4 {
            let cache = Arc::clone(&cache);
            handles.push(thread::spawn(move || {
                for i in 0..1000 {
                    cache.set(format!("key-{}-{}", t, i), (t * 1000 + i) as u64, TTL);
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(cache.len(), 4000);
        for t in 0..4 {
            assert_eq!(cache.get(&format!("key-{}-0", t)), Some((t * 1000) as u64));
        }
    }

    #[test]
    fn test_stats() {
        let cache = ShardedCache::new(4).unwrap();
        cache.set("a", 1u64, TTL);

        cache.get("a");
        cache.get("a");
        cache.get("missing");

        let stats = cache.stats();
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 1);
        assert!((stats.hit_rate - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(stats.entry_count, 1);
    }

    #[tokio::test]
    async fn test_background_sweeper() {
        let cache = Arc::new(ShardedCache::new(4).unwrap());
        cache.set("a", 1u64, Duration::from_millis(10));

        let sweeper = ShardedCache::spawn_sweeper(Arc::clone(&cache), Duration::from_millis(20));
        tokio::time::sleep(Duration::from_millis(80)).await;

        assert_eq!(cache.len(), 0);
        sweeper.stop().await;
    }
}
