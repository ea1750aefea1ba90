use crate::ai::sigmoid;
use crate::entry::CacheEntry;
use crate::time::hour_of_day;

/// Dimensionality of the per-entry feature vector.
pub(crate) const FEATURE_COUNT: usize = 7;

/// Maps a cache entry to a normalized feature vector for the predictor.
///
/// Raw features, in order:
///
/// | i | Raw value | Normalization |
/// |---|---|---|
/// | 0 | `ln(1 + access_count)` | `σ(raw / 10)` |
/// | 1 | seconds since last access | `σ(raw / 3600)` |
/// | 2 | seconds since creation | `σ(raw / 86400)` |
/// | 3 | accesses per second of age | `σ(raw)` |
/// | 4 | `ln(1 + access-interval variance)` | `σ(raw / 1000)` |
/// | 5 | `sin(2π · hour_of_day / 24)` | `(raw + 1) / 2` |
/// | 6 | `ln(1 + size surrogate)` | `σ(raw / 10)` |
///
/// Every normalized component lands in `[0, 1]`.  The extractor reads only
/// atomic entry fields plus the timestamp ring, so a stale in-flight counter
/// update skews a feature slightly at worst.
pub(crate) struct FeatureExtractor;

impl FeatureExtractor {
    /// Raw (un-normalized) feature vector at time `now` (epoch ms).
    pub(crate) fn extract<K, V>(entry: &CacheEntry<K, V>, now: u64) -> [f64; FEATURE_COUNT] {
        let mut raw = [0.0; FEATURE_COUNT];

        raw[0] = (entry.access_count() as f64).ln_1p();
        raw[1] = now.saturating_sub(entry.last_access_time()) as f64 / 1_000.0;
        raw[2] = now.saturating_sub(entry.creation_time()) as f64 / 1_000.0;
        raw[3] = entry.access_rate(now);
        raw[4] = entry.access_variance().ln_1p();
        raw[5] = (2.0 * std::f64::consts::PI * hour_of_day(now) as f64 / 24.0).sin();
        raw[6] = (entry.value_size() as f64).ln_1p();

        raw
    }

    /// Per-component squash into `[0, 1]`, scaled by each feature's expected
    /// range.
    pub(crate) fn normalize(raw: &[f64; FEATURE_COUNT]) -> [f64; FEATURE_COUNT] {
        [
            sigmoid(raw[0] / 10.0),
            sigmoid(raw[1] / 3_600.0),
            sigmoid(raw[2] / 86_400.0),
            sigmoid(raw[3]),
            sigmoid(raw[4] / 1_000.0),
            (raw[5] + 1.0) / 2.0,
            sigmoid(raw[6] / 10.0),
        ]
    }

    /// Extraction and normalization in one step.
    pub(crate) fn features<K, V>(entry: &CacheEntry<K, V>, now: u64) -> [f64; FEATURE_COUNT] {
        Self::normalize(&Self::extract(entry, now))
    }
}
