//! Map-with-expiry cache.
//!
//! A [`TtlCache`] is a keyed store where every entry carries its write
//! timestamp; reads past the TTL are misses and evict the stale entry.
//! Writes are simple key replacements, so no cross-key coordination is
//! needed.

use std::{hash::Hash, time::Duration};

use dashmap::DashMap;
use tokio::time::Instant;

struct Entry<V> {
    value: V,
    written_at: Instant,
}

pub struct TtlCache<K, V> {
    entries: DashMap<K, Entry<V>>,
    ttl: Duration,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Fresh value for the key, or `None`. An expired entry is removed and
    /// reported as a miss.
    pub fn get(&self, key: &K) -> Option<V> {
        let expired = match self.entries.get(key) {
            Some(entry) => {
                if entry.written_at.elapsed() <= self.ttl {
                    return Some(entry.value.clone());
                }
                true
            }
            None => false,
        };
        if expired {
            self.entries.remove(key);
        }
        None
    }

    pub fn insert(&self, key: K, value: V) {
        self.entries.insert(
            key,
            Entry {
                value,
                written_at: Instant::now(),
            },
        );
    }

    /// Targeted invalidation of a single key.
    pub fn remove(&self, key: &K) -> bool {
        self.entries.remove(key).is_some()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
