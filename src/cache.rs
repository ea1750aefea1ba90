use std::hash::Hash;
use std::sync::Arc;

use ahash::RandomState;
use parking_lot::Mutex;

use crate::ai::predictor::LinearPredictor;
use crate::config::CacheConfig;
use crate::entry::CacheEntry;
use crate::metrics::stats::{CacheStats, StatsCounter};
use crate::policy::admission::AdmissionPolicy;
use crate::policy::segments::{Segment, SegmentedLru};
use crate::policy::sketch::FrequencySketch;
use crate::probe::SizeProbe;
use crate::store::sharded::ShardedStore;
use crate::time::now_millis;

// ---------------------------------------------------------------------------
// Policy state
// ---------------------------------------------------------------------------

/// Everything guarded by the eviction lock: the segment queues plus the
/// admission policy (which owns the predictor and its training buffer).
pub(crate) struct PolicyState<K, V> {
    segments: SegmentedLru<K, V>,
    admission: AdmissionPolicy,
}

// ---------------------------------------------------------------------------
// Cache interior
// ---------------------------------------------------------------------------

/// Shared interior of a [`Cache`].
pub(crate) struct Inner<K, V> {
    store: ShardedStore<K, V>,
    policy: Mutex<PolicyState<K, V>>,
    /// Lock-free; incremented from the read path without the policy lock.
    sketch: FrequencySketch,
    /// Hasher for the key hash cached on each entry; the sketch and the
    /// admission policy both consume that one hash.
    build_hasher: RandomState,
    probe: Box<dyn SizeProbe<K, V>>,
    stats: StatsCounter,
    config: CacheConfig,
}

// ---------------------------------------------------------------------------
// Cache handle
// ---------------------------------------------------------------------------

/// A concurrent in-memory cache using the W-TinyLFU admission policy with an
/// optional learned scoring layer.
///
/// Capacity is partitioned into three segments:
///
/// | Segment       | Share            | Role |
/// |---------------|------------------|------|
/// | **Window**    | ~1 % of capacity | Absorbs every new entry; shields arrivals from premature rejection |
/// | **Probation** | ~20 % of main    | Candidates awaiting proof; the eviction victim pool |
/// | **Protected** | ~80 % of main    | Entries that demonstrated both recency and frequency |
///
/// New entries always enter the window.  Window overflow turns the window's
/// LRU entry into a *candidate*: while the main area has room the candidate
/// moves into probation unchallenged; once main is full it must beat
/// probation's LRU entry (the *victim*) to displace it.  With the learned
/// path warmed up that duel blends a per-entry value prediction with the
/// sketch frequency; before that it is the classic strict frequency
/// comparison, where ties keep the incumbent.
///
/// # Example
/// ```
/// use cortado::CacheBuilder;
///
/// let cache: cortado::Cache<String, String> =
///     CacheBuilder::new().maximum_size(100).build().unwrap();
/// cache.put("hello".to_string(), "world".to_string());
/// assert_eq!(cache.get(&"hello".to_string()), Some(std::sync::Arc::new("world".to_string())));
/// ```
pub struct Cache<K, V> {
    inner: Arc<Inner<K, V>>,
}

impl<K, V> Clone for Cache<K, V> {
    fn clone(&self) -> Self {
        Cache {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K, V> Cache<K, V>
where
    K: Hash + Eq + Clone + Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    pub(crate) fn new(config: CacheConfig, probe: Box<dyn SizeProbe<K, V>>) -> Self {
        let predictor =
            LinearPredictor::new(config.max_training_examples, config.learning_rate);
        let admission = AdmissionPolicy::new(predictor, config.ai_weight, config.enable_ai);
        let segments = SegmentedLru::new(
            config.maximum_size,
            config.probation_size(),
            config.protected_size(),
        );

        Cache {
            inner: Arc::new(Inner {
                store: ShardedStore::new(config.num_shards),
                policy: Mutex::new(PolicyState {
                    segments,
                    admission,
                }),
                sketch: FrequencySketch::with_capacity(config.maximum_size),
                build_hasher: RandomState::new(),
                probe,
                stats: StatsCounter::new(),
                config,
            }),
        }
    }

    /// Returns a [`CacheBuilder`](crate::CacheBuilder) with default parameters.
    pub fn builder() -> crate::CacheBuilder<K, V> {
        crate::CacheBuilder::new()
    }

    // -----------------------------------------------------------------------
    // Hot-path: get
    // -----------------------------------------------------------------------

    /// Returns the value for `key`, recording the access for the frequency
    /// sketch, the statistics, and the predictor.
    pub fn get(&self, key: &K) -> Option<Arc<V>> {
        let Some(entry) = self.inner.store.get(key) else {
            self.inner.stats.record_miss();
            return None;
        };

        let now = now_millis();
        // Lock-free metadata updates; the policy lock is taken only for the
        // segment move and the training observation.
        entry.record_access(now);
        self.inner.sketch.increment(entry.key_hash());
        self.inner.stats.record_hit();

        {
            let mut policy = self.inner.policy.lock();
            policy.admission.record_access(&entry, true, now);
            policy.segments.promote(key);
        }

        Some(entry.value())
    }

    // -----------------------------------------------------------------------
    // Hot-path: put
    // -----------------------------------------------------------------------

    /// Inserts `value` for `key`.  If the key already exists the value is
    /// replaced in place; otherwise the new entry enters the admission window
    /// and any overflow cascades through the admission filter.
    pub fn put(&self, key: K, value: V) {
        let now = now_millis();

        if let Some(entry) = self.inner.store.get(&key) {
            let size = self.inner.probe.size_of(&key, &value);
            entry.set_value(value, size, now);
            self.inner.sketch.increment(entry.key_hash());
            self.inner.policy.lock().segments.promote(&key);
            return;
        }

        let size = self.inner.probe.size_of(&key, &value);
        let key_hash = self.inner.build_hasher.hash_one(&key);
        let entry = Arc::new(CacheEntry::new(
            key,
            key_hash,
            value,
            size,
            self.inner.config.feature_history_size,
            now,
        ));
        self.inner.sketch.increment(key_hash);

        let mut policy = self.inner.policy.lock();
        self.install(&mut policy, entry);
        self.drain_window(&mut policy, now);

        // Opportunistic aging, once per insert rather than per increment.
        let threshold = 10 * self.inner.config.maximum_size as u64;
        if self.inner.sketch.should_reset(threshold) {
            self.inner.sketch.reset();
        }
    }

    // -----------------------------------------------------------------------
    // Removal
    // -----------------------------------------------------------------------

    /// Removes the entry for `key`, if present.
    pub fn remove(&self, key: &K) {
        let mut policy = self.inner.policy.lock();
        if self.inner.store.remove(key).is_some() {
            policy.segments.remove(key);
        }
    }

    /// Removes all entries.  Sketch counters, predictor state, and statistics
    /// are retained.
    pub fn clear(&self) {
        let mut policy = self.inner.policy.lock();
        self.inner.store.clear();
        policy.segments.clear();
        log::debug!("cache cleared");
    }

    // -----------------------------------------------------------------------
    // Introspection
    // -----------------------------------------------------------------------

    /// Number of resident entries.
    pub fn size(&self) -> usize {
        self.inner.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.store.is_empty()
    }

    /// Returns `true` if `key` is resident, without recording an access.
    pub fn contains(&self, key: &K) -> bool {
        self.inner.store.contains(key)
    }

    /// A point-in-time snapshot of the operational statistics.
    pub fn stats(&self) -> CacheStats {
        self.inner.stats.snapshot()
    }

    // -----------------------------------------------------------------------
    // Admission / eviction
    // -----------------------------------------------------------------------

    /// Installs a new entry at the window's MRU end.
    ///
    /// If a concurrent insert of the same key slipped in between the
    /// existence check and the lock, the displaced entry's node is unlinked
    /// first so the key never occupies two segment slots.
    fn install(&self, policy: &mut PolicyState<K, V>, entry: Arc<CacheEntry<K, V>>) {
        let key = entry.key().clone();
        if self.inner.store.insert(key.clone(), Arc::clone(&entry)).is_some() {
            policy.segments.remove(&key);
        }
        policy.segments.push_back(Segment::Window, entry);
    }

    /// Cascades window overflow into the main area.
    ///
    /// Each overflowing window-LRU entry becomes a candidate:
    ///
    /// - main below capacity → the candidate joins probation unchallenged,
    ///   and probation overflow spills its LRU end into protected so the
    ///   probation budget holds after every insert, not only once main is
    ///   full;
    /// - main full → the candidate duels probation's LRU victim through the
    ///   admission policy.  Admit evicts the victim; reject discards the
    ///   candidate.  Either way at most one main-segment entry dies per
    ///   overflowing insert.
    fn drain_window(&self, policy: &mut PolicyState<K, V>, now: u64) {
        let window_cap = self.inner.config.window_size;
        let main_cap = self
            .inner
            .config
            .maximum_size
            .saturating_sub(self.inner.config.window_size);

        while policy.segments.len(Segment::Window) > window_cap {
            let Some(candidate) = policy.segments.pop_front(Segment::Window) else {
                break;
            };

            let main_len = policy.segments.len(Segment::Probation)
                + policy.segments.len(Segment::Protected);
            if main_len < main_cap {
                // Main has room — no duel needed.  Spill probation overflow
                // toward protected to keep the probation budget intact.
                policy.segments.push_back(Segment::Probation, candidate);
                policy.segments.rebalance();
                continue;
            }

            let victim = policy.segments.peek_front(Segment::Probation);
            let admit = policy.admission.should_admit(
                &self.inner.sketch,
                &candidate,
                victim.as_deref(),
                now,
            );

            if admit {
                if policy.segments.len(Segment::Probation) >= policy.segments.probation_cap() {
                    if let Some(victim) = policy.segments.pop_front(Segment::Probation) {
                        self.inner.store.remove(victim.key());
                        self.inner.stats.record_eviction();
                    }
                }
                policy.segments.push_back(Segment::Probation, candidate);
                self.inner
                    .stats
                    .record_admission(policy.admission.confidence() > 0.5);
            } else {
                self.inner.store.remove(candidate.key());
                self.inner.stats.record_rejection();
                self.inner.stats.record_eviction();
            }
        }

        // Capacity backstop for degenerate layouts (probation budget of zero
        // with protected saturated admits past an empty victim pool).
        while self.inner.store.len() > self.inner.config.maximum_size {
            let evicted = policy
                .segments
                .pop_front(Segment::Probation)
                .or_else(|| policy.segments.pop_front(Segment::Window));
            let Some(evicted) = evicted else { break };
            self.inner.store.remove(evicted.key());
            self.inner.stats.record_eviction();
        }
    }

    #[cfg(test)]
    pub(crate) fn segment_lens(&self) -> (usize, usize, usize) {
        let policy = self.inner.policy.lock();
        (
            policy.segments.len(Segment::Window),
            policy.segments.len(Segment::Probation),
            policy.segments.len(Segment::Protected),
        )
    }
}

#[cfg(test)]
mod tests {
    use crate::CacheBuilder;

    fn make(max: usize) -> crate::Cache<u64, u64> {
        CacheBuilder::new().maximum_size(max).build().unwrap()
    }

    #[test]
    fn segment_accounting_matches_store() {
        let cache = make(50);
        for i in 0..200u64 {
            cache.put(i, i);
            if i % 3 == 0 {
                cache.get(&(i / 2));
            }
        }
        let (window, probation, protected) = cache.segment_lens();
        assert_eq!(
            window + probation + protected,
            cache.size(),
            "segment slots must mirror the lookup table"
        );
        assert!(cache.size() <= 50);
    }

    #[test]
    fn window_stays_within_its_budget() {
        let cache: crate::Cache<u64, u64> = CacheBuilder::new()
            .maximum_size(100)
            .window_size(5)
            .build()
            .unwrap();
        for i in 0..300u64 {
            cache.put(i, i);
            let (window, _, _) = cache.segment_lens();
            assert!(window <= 5, "window grew to {} after put {}", window, i);
        }
    }

    #[test]
    fn probation_stays_within_its_budget() {
        // maximum 10, window 1 → main 9, probation 1, protected 8.
        let cache: crate::Cache<u64, u64> = CacheBuilder::new()
            .maximum_size(10)
            .enable_ai(false)
            .build()
            .unwrap();
        for i in 0..20u64 {
            cache.put(i, i);
            let (_, probation, _) = cache.segment_lens();
            assert!(
                probation <= 1,
                "probation grew to {} after put {}",
                probation,
                i
            );
        }
        // A one-shot fill still populates the whole cache.
        assert_eq!(cache.size(), 10);
    }

    #[test]
    fn protected_stays_within_its_budget() {
        // maximum 20, window 2 → main 18, probation 3, protected 15.
        let cache: crate::Cache<u64, u64> = CacheBuilder::new()
            .maximum_size(20)
            .window_size(2)
            .build()
            .unwrap();
        for i in 0..20u64 {
            cache.put(i, i);
        }
        // Hammer everything so probation entries promote into protected.
        for _ in 0..5 {
            for i in 0..20u64 {
                cache.get(&i);
            }
        }
        let (_, _, protected) = cache.segment_lens();
        assert!(
            protected <= 15,
            "protected grew to {} past its budget of 15",
            protected
        );
    }

    #[test]
    fn remove_drops_segment_slot() {
        let cache = make(10);
        cache.put(1, 1);
        cache.remove(&1);
        let (window, probation, protected) = cache.segment_lens();
        assert_eq!(window + probation + protected, 0);
        assert_eq!(cache.size(), 0);
    }

    #[test]
    fn reinsert_after_remove_works() {
        let cache = make(10);
        cache.put(1, 1);
        cache.remove(&1);
        cache.put(1, 2);
        assert_eq!(cache.get(&1).as_deref(), Some(&2));
    }
}
