use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Atomic counters updated on every cache operation.
///
/// Each counter is individually consistent (relaxed atomics); a snapshot does
/// not guarantee cross-counter atomicity.
pub struct StatsCounter {
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
    admissions: AtomicU64,
    rejections: AtomicU64,
    total_accesses: AtomicU64,
    ai_admissions: AtomicU64,
    frequency_admissions: AtomicU64,
}

impl StatsCounter {
    pub fn new() -> Self {
        StatsCounter {
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
            admissions: AtomicU64::new(0),
            rejections: AtomicU64::new(0),
            total_accesses: AtomicU64::new(0),
            ai_admissions: AtomicU64::new(0),
            frequency_admissions: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
        self.total_accesses.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
        self.total_accesses.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_eviction(&self) {
        self.evictions.fetch_add(1, Ordering::Relaxed);
    }

    /// Records an admitted window candidate.  `ai_decision` marks whether the
    /// predictor was confident enough to have driven the decision.
    #[inline]
    pub fn record_admission(&self, ai_decision: bool) {
        self.admissions.fetch_add(1, Ordering::Relaxed);
        if ai_decision {
            self.ai_admissions.fetch_add(1, Ordering::Relaxed);
        } else {
            self.frequency_admissions.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[inline]
    pub fn record_rejection(&self) {
        self.rejections.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns a point-in-time snapshot of the statistics.
    pub fn snapshot(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        let hit_rate = if total == 0 {
            0.0_f64
        } else {
            hits as f64 / total as f64
        };

        let admissions = self.admissions.load(Ordering::Relaxed);
        let rejections = self.rejections.load(Ordering::Relaxed);
        let decided = admissions + rejections;
        let admission_rate = if decided == 0 {
            0.0_f64
        } else {
            admissions as f64 / decided as f64
        };

        let ai_admissions = self.ai_admissions.load(Ordering::Relaxed);
        let ai_influence_rate = if admissions == 0 {
            0.0_f64
        } else {
            ai_admissions as f64 / admissions as f64
        };

        CacheStats {
            hits,
            misses,
            evictions: self.evictions.load(Ordering::Relaxed),
            admissions,
            rejections,
            total_accesses: self.total_accesses.load(Ordering::Relaxed),
            ai_admissions,
            frequency_admissions: self.frequency_admissions.load(Ordering::Relaxed),
            hit_rate,
            admission_rate,
            ai_influence_rate,
        }
    }
}

impl Default for StatsCounter {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// CacheStats
// ---------------------------------------------------------------------------

/// A point-in-time snapshot of cache statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheStats {
    /// Number of cache hits (key found).
    pub hits: u64,
    /// Number of cache misses (key not found).
    pub misses: u64,
    /// Entries removed under capacity pressure (rejected candidates and
    /// displaced probation victims).
    pub evictions: u64,
    /// Window candidates admitted into the main segments.
    pub admissions: u64,
    /// Window candidates discarded by the admission filter.
    pub rejections: u64,
    /// `hits + misses`, maintained as its own counter.
    pub total_accesses: u64,
    /// Admissions made while the predictor was confident.
    pub ai_admissions: u64,
    /// Admissions that fell back to the frequency comparison.
    pub frequency_admissions: u64,
    /// `hits / (hits + misses)`, or `0.0` before any request.
    pub hit_rate: f64,
    /// `admissions / (admissions + rejections)`, or `0.0` before any decision.
    pub admission_rate: f64,
    /// `ai_admissions / admissions`, or `0.0` before any admission.
    pub ai_influence_rate: f64,
}

impl CacheStats {
    pub fn request_count(&self) -> u64 {
        self.hits + self.misses
    }

    pub fn miss_rate(&self) -> f64 {
        1.0 - self.hit_rate
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "hits={} misses={} hit_rate={:.2}% evictions={} admissions={} \
             rejections={} admission_rate={:.2}% ai_influence={:.2}%",
            self.hits,
            self.misses,
            self.hit_rate * 100.0,
            self.evictions,
            self.admissions,
            self.rejections,
            self.admission_rate * 100.0,
            self.ai_influence_rate * 100.0,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_counters_have_zero_rates() {
        let stats = StatsCounter::new().snapshot();
        assert_eq!(stats.hit_rate, 0.0);
        assert_eq!(stats.admission_rate, 0.0);
        assert_eq!(stats.ai_influence_rate, 0.0);
        assert_eq!(stats.request_count(), 0);
    }

    #[test]
    fn hits_and_misses_feed_total_accesses() {
        let counter = StatsCounter::new();
        counter.record_hit();
        counter.record_hit();
        counter.record_miss();
        let stats = counter.snapshot();
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.total_accesses, 3);
        assert!((stats.hit_rate - 2.0 / 3.0).abs() < 1e-9);
        assert!((stats.miss_rate() - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn admissions_split_by_decision_source() {
        let counter = StatsCounter::new();
        counter.record_admission(true);
        counter.record_admission(false);
        counter.record_admission(false);
        counter.record_rejection();
        let stats = counter.snapshot();
        assert_eq!(stats.admissions, 3);
        assert_eq!(stats.ai_admissions, 1);
        assert_eq!(stats.frequency_admissions, 2);
        assert!((stats.admission_rate - 0.75).abs() < 1e-9);
        assert!((stats.ai_influence_rate - 1.0 / 3.0).abs() < 1e-9);
    }
}
