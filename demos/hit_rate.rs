//! Hit-rate comparison: Cortado with the learned admission layer on vs off,
//! and Moka as an external W-TinyLFU baseline.
//!
//! Uses a Zipf(s=1.0) access trace — the standard academic benchmark for
//! cache admission policies.  The same trace is replayed against each cache
//! so the comparison is perfectly fair.
//!
//! Run with:
//!     cargo run --example hit_rate --release

use cortado::CacheBuilder;
use moka::sync::Cache as MokaCache;
use std::time::{Duration, Instant};

/// Cache capacity (number of unique entries each cache may hold).
const CAP: usize = 10_000;
/// Key universe size.  CAP is 10 % of POOL → moderately hard workload.
const POOL: usize = 100_000;
/// Number of accesses in the trace.
const TRACE: usize = 500_000;

// ---------------------------------------------------------------------------
// Zipf(s=1.0) sampler.
//
// Inverse-CDF derivation:
//   P(X ≤ k) ≈ ln(k) / ln(N)   for large N
//   ⟹  k = N^u  where u ~ Uniform[0,1]
//
// This gives P(X = k) ∝ 1/k, the classic rank-frequency law.  A tiny
// xorshift generator keeps the trace reproducible across runs.
// ---------------------------------------------------------------------------

struct Xorshift64(u64);

impl Xorshift64 {
    fn next(&mut self) -> u64 {
        self.0 ^= self.0 << 13;
        self.0 ^= self.0 >> 7;
        self.0 ^= self.0 << 17;
        self.0
    }

    /// Returns a uniform float in (0, 1].
    fn uniform(&mut self) -> f64 {
        let bits = self.next() >> 11;
        (bits + 1) as f64 / (1u64 << 53) as f64
    }

    /// Zipf(s=1) sample in [0, pool).
    fn zipf(&mut self, pool: usize) -> usize {
        let u = self.uniform();
        let k = (pool as f64).powf(u) as usize;
        k.saturating_sub(1).min(pool - 1)
    }
}

fn generate_trace(seed: u64, pool: usize, len: usize) -> Vec<usize> {
    let mut rng = Xorshift64(seed);
    (0..len).map(|_| rng.zipf(pool)).collect()
}

// ---------------------------------------------------------------------------
// Per-cache runners
// ---------------------------------------------------------------------------

fn run_cortado(trace: &[usize], enable_ai: bool) -> (usize, Duration) {
    let cache: cortado::Cache<usize, usize> = CacheBuilder::new()
        .maximum_size(CAP)
        .enable_ai(enable_ai)
        .build()
        .unwrap();
    let start = Instant::now();
    let mut hits = 0usize;
    for &key in trace {
        if cache.get(&key).is_some() {
            hits += 1;
        } else {
            cache.put(key, key);
        }
    }
    (hits, start.elapsed())
}

fn run_moka(trace: &[usize]) -> (usize, Duration) {
    let cache: MokaCache<usize, usize> = MokaCache::new(CAP as u64);
    let start = Instant::now();
    let mut hits = 0usize;
    for &key in trace {
        if cache.get(&key).is_some() {
            hits += 1;
        } else {
            cache.insert(key, key);
        }
    }
    (hits, start.elapsed())
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() {
    println!("Cortado — hit-rate comparison");
    println!();
    println!("  Distribution : Zipf(s = 1.0)");
    println!("  Key universe : {POOL:>10} unique keys");
    println!(
        "  Capacity     : {CAP:>10} entries  ({:.0}% of universe)",
        CAP as f64 / POOL as f64 * 100.0
    );
    println!("  Trace length : {TRACE:>10} accesses");
    println!();
    println!("Generating trace…");
    let trace = generate_trace(0x5EED_CAFE_2024_0001, POOL, TRACE);

    println!("Running (cold-start, no warm-up phase)…");
    println!();
    println!("{:<16} {:>10} {:>10} {:>12}", "Cache", "Hits", "Hit Rate", "Time (ms)");
    println!("{}", "─".repeat(52));

    let print_row = |name: &str, hits: usize, elapsed: Duration| {
        println!(
            "{:<16} {:>10} {:>9.2}% {:>12.1}",
            name,
            hits,
            hits as f64 / TRACE as f64 * 100.0,
            elapsed.as_millis(),
        );
    };

    let (hits, elapsed) = run_cortado(&trace, true);
    print_row("cortado (ai)", hits, elapsed);

    let (hits, elapsed) = run_cortado(&trace, false);
    print_row("cortado (freq)", hits, elapsed);

    let (hits, elapsed) = run_moka(&trace);
    print_row("moka", hits, elapsed);

    println!();
    println!("Notes:");
    println!("  • Hit rate is measured in 'online' mode: the cache starts cold,");
    println!("    misses trigger a put, and hits are counted from the start.");
    println!("  • cortado (freq) is pure W-TinyLFU; cortado (ai) blends the");
    println!("    learned per-entry score once the predictor is confident.");
}
