use std::hash::Hash;
use std::sync::Arc;

use ahash::{AHashMap, RandomState};
use parking_lot::RwLock;

use crate::entry::CacheEntry;

// ---------------------------------------------------------------------------
// Shard
// ---------------------------------------------------------------------------

/// Cache-line padding to prevent false sharing between shards.
#[repr(align(64))]
struct Shard<K, V> {
    map: RwLock<AHashMap<K, Arc<CacheEntry<K, V>>>>,
}

// ---------------------------------------------------------------------------
// ShardedStore
// ---------------------------------------------------------------------------

/// The lookup table: `N` independently-locked shards mapping keys to shared
/// entries.
///
/// Reads take a shard's shared lock only, so the `get` fast path never touches
/// the eviction mutex.  Writes take the exclusive lock of a single shard.
/// Entries handed out are `Arc`-shared with the segment queues; removing a key
/// here does not unlink its segment node — that is the caller's job, under the
/// eviction lock.
pub(crate) struct ShardedStore<K, V> {
    shards: Box<[Shard<K, V>]>,
    /// Always `shards.len() - 1`; shards.len() is a power of two.
    shard_mask: usize,
    /// Hasher used only to compute shard indices.
    build_hasher: RandomState,
}

impl<K: Hash + Eq + Clone, V> ShardedStore<K, V> {
    pub(crate) fn new(num_shards: usize) -> Self {
        debug_assert!(num_shards.is_power_of_two());
        let shards = (0..num_shards)
            .map(|_| Shard {
                map: RwLock::new(AHashMap::new()),
            })
            .collect::<Vec<_>>()
            .into_boxed_slice();

        ShardedStore {
            shards,
            shard_mask: num_shards - 1,
            build_hasher: RandomState::new(),
        }
    }

    #[inline]
    fn shard_index(&self, key: &K) -> usize {
        let h = self.build_hasher.hash_one(key);
        // Use the high bits (better avalanche from ahash).
        ((h >> 32) as usize) & self.shard_mask
    }

    pub(crate) fn get(&self, key: &K) -> Option<Arc<CacheEntry<K, V>>> {
        let idx = self.shard_index(key);
        self.shards[idx].map.read().get(key).map(Arc::clone)
    }

    /// Inserts `entry` for `key`.  Returns the previous entry, if any.
    pub(crate) fn insert(
        &self,
        key: K,
        entry: Arc<CacheEntry<K, V>>,
    ) -> Option<Arc<CacheEntry<K, V>>> {
        let idx = self.shard_index(&key);
        self.shards[idx].map.write().insert(key, entry)
    }

    /// Removes the entry for `key`.  Returns the removed entry, if any.
    pub(crate) fn remove(&self, key: &K) -> Option<Arc<CacheEntry<K, V>>> {
        let idx = self.shard_index(key);
        self.shards[idx].map.write().remove(key)
    }

    pub(crate) fn contains(&self, key: &K) -> bool {
        let idx = self.shard_index(key);
        self.shards[idx].map.read().contains_key(key)
    }

    /// Total number of entries across all shards.
    pub(crate) fn len(&self) -> usize {
        self.shards.iter().map(|s| s.map.read().len()).sum()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.shards.iter().all(|s| s.map.read().is_empty())
    }

    /// Removes all entries from every shard.
    pub(crate) fn clear(&self) {
        for shard in self.shards.iter() {
            shard.map.write().clear();
        }
    }
}
