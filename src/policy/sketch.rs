use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};

use rand::Rng;

/// 4-bit approximate frequency counter using Count-Min Sketch.
///
/// The table is `depth` rows of `width` saturating counters in `[0, 15]`,
/// one random 64-bit seed per row.  `estimate` returns the **minimum** of the
/// `depth` selected counters (the Count-Min estimator); `increment` adds one
/// to each selected counter unless it is already saturated.
///
/// Counters are individual atomics so `increment` can run from the read fast
/// path without the eviction lock.  `reset` (aging) halves every counter; it
/// is called under the eviction lock, and increments racing a reset merely
/// perturb an already-approximate structure.
///
/// **Aging / decay**: the cache halves the sketch once the number of recorded
/// increments reaches ten times its capacity, checked opportunistically on
/// `put`.  Halving preserves the relative ordering of frequencies while old
/// history decays — the mechanism described for W-TinyLFU (Einziger et al.,
/// 2017).
pub(crate) struct FrequencySketch {
    /// `depth * width` counters, row-major.
    table: Vec<AtomicU8>,
    seeds: Vec<u64>,
    width: usize,
    depth: usize,
    /// Total increments since the last reset.
    size: AtomicU64,
}

/// 4-bit saturation ceiling.
const MAX_COUNT: u8 = 15;

impl FrequencySketch {
    /// Creates a sketch sized for approximately `capacity` distinct items:
    /// `width = 4 × capacity`, `depth = 4`.
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self::new(capacity.max(1) * 4, 4)
    }

    pub(crate) fn new(width: usize, depth: usize) -> Self {
        let width = width.max(1);
        let mut rng = rand::thread_rng();
        let seeds = (0..depth).map(|_| rng.gen::<u64>()).collect();
        let mut table = Vec::with_capacity(width * depth);
        table.resize_with(width * depth, || AtomicU8::new(0));
        FrequencySketch {
            table,
            seeds,
            width,
            depth,
            size: AtomicU64::new(0),
        }
    }

    /// Increments the `depth` counters for `key_hash`, saturating at 15.
    pub(crate) fn increment(&self, key_hash: u64) {
        self.size.fetch_add(1, Ordering::Relaxed);
        for row in 0..self.depth {
            let cell = &self.table[row * self.width + self.index(key_hash, row)];
            // CAS loop: stop at the 4-bit ceiling instead of wrapping.
            let mut current = cell.load(Ordering::Relaxed);
            while current < MAX_COUNT {
                match cell.compare_exchange_weak(
                    current,
                    current + 1,
                    Ordering::Relaxed,
                    Ordering::Relaxed,
                ) {
                    Ok(_) => break,
                    Err(observed) => current = observed,
                }
            }
        }
    }

    /// Estimated frequency of `key_hash`, in `[0, 15]`.
    pub(crate) fn estimate(&self, key_hash: u64) -> u8 {
        let mut min = MAX_COUNT;
        for row in 0..self.depth {
            let count =
                self.table[row * self.width + self.index(key_hash, row)].load(Ordering::Relaxed);
            min = min.min(count);
        }
        min
    }

    /// Halves every counter and the increment total.
    ///
    /// Relative frequency ordering survives the shift; absolute history decays.
    pub(crate) fn reset(&self) {
        for cell in &self.table {
            let current = cell.load(Ordering::Relaxed);
            cell.store(current >> 1, Ordering::Relaxed);
        }
        let current = self.size.load(Ordering::Relaxed);
        self.size.store(current / 2, Ordering::Relaxed);
        log::debug!("frequency sketch aged: size halved to {}", current / 2);
    }

    /// True once the increment total has reached `threshold`.
    pub(crate) fn should_reset(&self, threshold: u64) -> bool {
        self.size.load(Ordering::Relaxed) >= threshold
    }

    #[cfg(test)]
    pub(crate) fn size(&self) -> u64 {
        self.size.load(Ordering::Relaxed)
    }

    /// Column for `key_hash` in `row`.
    ///
    /// The key hash is xor-combined with the row seed and pushed through two
    /// multiply-xor-shift rounds (the 64-bit finaliser constants), then
    /// reduced modulo `width`.  Different seeds give `depth` nearly
    /// independent hash functions from one key hash.
    #[inline]
    fn index(&self, key_hash: u64, row: usize) -> usize {
        let mut h = key_hash ^ self.seeds[row];
        h ^= h >> 33;
        h = h.wrapping_mul(0xff51_afd7_ed55_8ccd);
        h ^= h >> 33;
        h = h.wrapping_mul(0xc4ce_b9fe_1a85_ec53);
        h ^= h >> 33;
        (h % self.width as u64) as usize
    }
}
