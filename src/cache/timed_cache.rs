//! Keyed cache whose entries expire after a fixed TTL.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
struct Entry<V> {
    value: V,
    stored_at: Instant,
}

impl<V> Entry<V> {
    fn is_fresh(&self, ttl: Duration, now: Instant) -> bool {
        now.duration_since(self.stored_at) < ttl
    }
}

#[derive(Debug)]
struct Store<K, V> {
    entries: HashMap<K, Entry<V>>,
    /// Bumped by every `clear`
    generation: u64,
}

/// Thread-safe TTL cache. Clones share the same storage.
///
/// A TTL of zero disables caching: inserts are dropped and every lookup
/// misses. Expired entries are ignored on read and replaced on insert.
///
/// Inserts carry the generation read before the value was computed, so a
/// `clear` issued in the meantime is not undone by a late insert.
#[derive(Clone)]
pub struct TimedCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    store: Arc<RwLock<Store<K, V>>>,
    ttl: Duration,
}

impl<K, V> TimedCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(ttl: Duration) -> Self {
        Self {
            store: Arc::new(RwLock::new(Store {
                entries: HashMap::new(),
                generation: 0,
            })),
            ttl,
        }
    }

    pub fn with_ttl_secs(ttl_seconds: u64) -> Self {
        Self::new(Duration::from_secs(ttl_seconds))
    }

    pub fn is_enabled(&self) -> bool {
        !self.ttl.is_zero()
    }

    /// The current generation; pass it to [`TimedCache::insert_if_current`].
    pub fn generation(&self) -> u64 {
        self.store.read().map(|s| s.generation).unwrap_or(0)
    }

    /// Store `value` under `key` unless the cache was cleared after
    /// `generation` was read. Returns whether the value was stored.
    pub fn insert_if_current(&self, generation: u64, key: K, value: V) -> bool {
        if !self.is_enabled() {
            return false;
        }
        match self.store.write() {
            Ok(mut store) if store.generation == generation => {
                store.entries.insert(
                    key,
                    Entry {
                        value,
                        stored_at: Instant::now(),
                    },
                );
                true
            }
            _ => false,
        }
    }

    /// Fetch a value that has not yet expired.
    pub fn get(&self, key: &K) -> Option<V> {
        let now = Instant::now();
        let store = self.store.read().ok()?;
        store
            .entries
            .get(key)
            .filter(|entry| entry.is_fresh(self.ttl, now))
            .map(|entry| entry.value.clone())
    }

    /// Drop every entry and start a new generation.
    pub fn clear(&self) {
        if let Ok(mut store) = self.store.write() {
            store.entries.clear();
            store.generation = store.generation.wrapping_add(1);
        }
    }

    /// Number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.store.read().map(|s| s.entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K, V> std::fmt::Debug for TimedCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimedCache")
            .field("ttl", &self.ttl)
            .field("entries", &self.len())
            .field("generation", &self.generation())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn insert<V: Clone>(cache: &TimedCache<&'static str, V>, key: &'static str, value: V) {
        assert!(cache.insert_if_current(cache.generation(), key, value));
    }

    #[test]
    fn test_insert_and_get() {
        let cache = TimedCache::with_ttl_secs(60);
        insert(&cache, "stats", 3);
        assert_eq!(cache.get(&"stats"), Some(3));
        assert_eq!(cache.get(&"other"), None);

        insert(&cache, "stats", 4);
        assert_eq!(cache.get(&"stats"), Some(4));
    }

    #[test]
    fn test_entries_expire() {
        let cache = TimedCache::new(Duration::from_millis(50));
        insert(&cache, "stats", 1);
        assert_eq!(cache.get(&"stats"), Some(1));

        thread::sleep(Duration::from_millis(80));
        assert_eq!(cache.get(&"stats"), None);
        assert_eq!(cache.len(), 1);

        insert(&cache, "stats", 2);
        assert_eq!(cache.get(&"stats"), Some(2));
    }

    #[test]
    fn test_zero_ttl_disables_cache() {
        let cache = TimedCache::with_ttl_secs(0);
        assert!(!cache.is_enabled());
        assert!(!cache.insert_if_current(cache.generation(), "stats", 1));
        assert_eq!(cache.get(&"stats"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_clear_bumps_generation() {
        let cache = TimedCache::with_ttl_secs(60);
        insert(&cache, "a", 1);
        insert(&cache, "b", 2);
        let before = cache.generation();

        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.generation(), before + 1);
    }

    #[test]
    fn test_insert_after_clear_is_dropped() {
        let cache = TimedCache::with_ttl_secs(60);
        let generation = cache.generation();

        // A write lands while the value is being computed.
        cache.clear();

        assert!(!cache.insert_if_current(generation, "stats", 7));
        assert_eq!(cache.get(&"stats"), None);

        assert!(cache.insert_if_current(cache.generation(), "stats", 8));
        assert_eq!(cache.get(&"stats"), Some(8));
    }

    #[test]
    fn test_clones_share_storage() {
        let cache = TimedCache::with_ttl_secs(60);
        let other = cache.clone();
        insert(&other, "stats", 9);
        assert_eq!(cache.get(&"stats"), Some(9));

        cache.clear();
        assert_eq!(other.get(&"stats"), None);
        assert_eq!(other.generation(), 1);
    }

    #[test]
    fn test_debug_format() {
        let cache: TimedCache<&str, u32> = TimedCache::with_ttl_secs(60);
        let debug = format!("{:?}", cache);
        assert!(debug.contains("TimedCache"));
        assert!(debug.contains("ttl"));
    }
}
