use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

// ---------------------------------------------------------------------------
// AccessPattern
// ---------------------------------------------------------------------------

/// Heuristic classification of an entry's access behavior.
///
/// Patterns are advisory: the admission policy multiplies predicted scores by
/// a per-pattern factor, but remains correct if classification never moves
/// past `Unknown`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccessPattern {
    /// High access rate with regular intervals.
    HotSpot,
    /// Moderate rate, irregular (bursty) intervals.
    Temporal,
    /// Young entry touched once or twice — likely a one-shot scan.
    SequentialScan,
    /// Steady moderate rate.
    WorkingSet,
    /// No recognisable structure.
    Random,
    /// Not yet classified.
    Unknown,
}

impl AccessPattern {
    pub(crate) fn as_u8(self) -> u8 {
        match self {
            AccessPattern::HotSpot => 0,
            AccessPattern::Temporal => 1,
            AccessPattern::SequentialScan => 2,
            AccessPattern::WorkingSet => 3,
            AccessPattern::Random => 4,
            AccessPattern::Unknown => 5,
        }
    }

    pub(crate) fn from_u8(tag: u8) -> Self {
        match tag {
            0 => AccessPattern::HotSpot,
            1 => AccessPattern::Temporal,
            2 => AccessPattern::SequentialScan,
            3 => AccessPattern::WorkingSet,
            4 => AccessPattern::Random,
            _ => AccessPattern::Unknown,
        }
    }
}

// ---------------------------------------------------------------------------
// CacheEntry
// ---------------------------------------------------------------------------

/// One resident key with its access metadata.
///
/// Entries are shared between the lookup table and exactly one segment queue
/// via `Arc`, so every mutable field has interior mutability:
///
/// - counters and timestamps are relaxed atomics, updated on the read fast
///   path without the eviction lock.  Feature extraction runs under the lock
///   but tolerates stale reads of these fields;
/// - the value cell and the timestamp ring sit behind tiny per-entry locks
///   that are never held across another lock acquisition.
pub(crate) struct CacheEntry<K, V> {
    key: K,
    /// `build_hasher.hash_one(key)`, computed once so the sketch never
    /// rehashes during admission.
    key_hash: u64,
    value: RwLock<Arc<V>>,
    /// Size surrogate recorded by the probe at insert/replace time.
    value_size: AtomicU64,

    access_count: AtomicU64,
    creation_time: u64,
    last_access_time: AtomicU64,
    write_time: AtomicU64,
    /// Ring of the most recent access timestamps, oldest first.
    access_times: Mutex<VecDeque<u64>>,
    history_size: usize,

    /// Last predictor output for this entry, f64 bit pattern.
    predicted_value: AtomicU64,
    pattern: AtomicU8,
}

impl<K, V> CacheEntry<K, V> {
    /// Creates an entry and records its creation as the first access.
    pub(crate) fn new(
        key: K,
        key_hash: u64,
        value: V,
        value_size: u64,
        history_size: usize,
        now: u64,
    ) -> Self {
        let entry = CacheEntry {
            key,
            key_hash,
            value: RwLock::new(Arc::new(value)),
            value_size: AtomicU64::new(value_size),
            access_count: AtomicU64::new(0),
            creation_time: now,
            last_access_time: AtomicU64::new(now),
            write_time: AtomicU64::new(now),
            access_times: Mutex::new(VecDeque::with_capacity(history_size)),
            history_size,
            predicted_value: AtomicU64::new(0f64.to_bits()),
            pattern: AtomicU8::new(AccessPattern::Unknown.as_u8()),
        };
        entry.record_access(now);
        entry
    }

    /// Bumps the access counter and appends `now` to the timestamp ring,
    /// dropping the oldest sample once the ring is full.
    pub(crate) fn record_access(&self, now: u64) {
        self.access_count.fetch_add(1, Ordering::Relaxed);
        self.last_access_time.store(now, Ordering::Relaxed);

        let mut times = self.access_times.lock();
        times.push_back(now);
        while times.len() > self.history_size {
            times.pop_front();
        }
    }

    /// Replaces the value; counts as a write and an access, so the access
    /// counter and the timestamp ring advance together with
    /// `last_access_time`.
    pub(crate) fn set_value(&self, value: V, value_size: u64, now: u64) {
        *self.value.write() = Arc::new(value);
        self.value_size.store(value_size, Ordering::Relaxed);
        self.write_time.store(now, Ordering::Relaxed);
        self.record_access(now);
    }

    pub(crate) fn key(&self) -> &K {
        &self.key
    }

    #[inline]
    pub(crate) fn key_hash(&self) -> u64 {
        self.key_hash
    }

    pub(crate) fn value(&self) -> Arc<V> {
        Arc::clone(&self.value.read())
    }

    pub(crate) fn value_size(&self) -> u64 {
        self.value_size.load(Ordering::Relaxed)
    }

    pub(crate) fn access_count(&self) -> u64 {
        self.access_count.load(Ordering::Relaxed)
    }

    pub(crate) fn creation_time(&self) -> u64 {
        self.creation_time
    }

    pub(crate) fn last_access_time(&self) -> u64 {
        self.last_access_time.load(Ordering::Relaxed)
    }

    #[allow(dead_code)]
    pub(crate) fn write_time(&self) -> u64 {
        self.write_time.load(Ordering::Relaxed)
    }

    pub(crate) fn set_predicted_value(&self, value: f64) {
        self.predicted_value.store(value.to_bits(), Ordering::Relaxed);
    }

    #[allow(dead_code)]
    pub(crate) fn predicted_value(&self) -> f64 {
        f64::from_bits(self.predicted_value.load(Ordering::Relaxed))
    }

    pub(crate) fn set_pattern(&self, pattern: AccessPattern) {
        self.pattern.store(pattern.as_u8(), Ordering::Relaxed);
    }

    #[allow(dead_code)]
    pub(crate) fn pattern(&self) -> AccessPattern {
        AccessPattern::from_u8(self.pattern.load(Ordering::Relaxed))
    }

    /// Accesses per second since creation.  Age is floored at one second so
    /// brand-new entries don't report infinite rates.
    pub(crate) fn access_rate(&self, now: u64) -> f64 {
        let age_secs = (now.saturating_sub(self.creation_time) / 1_000).max(1);
        self.access_count() as f64 / age_secs as f64
    }

    /// Population variance of consecutive access-interval deltas, in ms².
    ///
    /// Zero with fewer than two recorded timestamps.
    pub(crate) fn access_variance(&self) -> f64 {
        let times = self.access_times.lock();
        if times.len() < 2 {
            return 0.0;
        }

        let intervals: Vec<f64> = times
            .iter()
            .zip(times.iter().skip(1))
            .map(|(a, b)| (b - a) as f64)
            .collect();

        let mean = intervals.iter().sum::<f64>() / intervals.len() as f64;
        intervals
            .iter()
            .map(|x| (x - mean) * (x - mean))
            .sum::<f64>()
            / intervals.len() as f64
    }
}
