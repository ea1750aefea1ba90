//! Size probe — assigns a deterministic size surrogate to each cached entry.
//!
//! The admission predictor uses entry size as one of its input features
//! (larger payloads tend to be worth less per byte of cache).  The probe is
//! consulted once per insert or value replacement and the result is cached on
//! the entry, so it must be deterministic for a given `(key, value)` but the
//! absolute scale is unimportant.
//!
//! # Example
//! ```
//! use cortado::CacheBuilder;
//!
//! let cache: cortado::Cache<String, Vec<u8>> = CacheBuilder::new()
//!     .maximum_size(1_000)
//!     .size_probe(|_k: &String, v: &Vec<u8>| v.len() as u64)
//!     .build()
//!     .unwrap();
//! ```

/// Computes the size surrogate for a cache entry.
pub trait SizeProbe<K, V>: Send + Sync + 'static {
    fn size_of(&self, key: &K, value: &V) -> u64;
}

// ---------------------------------------------------------------------------
// Built-in implementations
// ---------------------------------------------------------------------------

/// Default probe: the static size of `V`.
///
/// Constant per type, so the size feature carries no signal under this probe —
/// install an [`FnSizeProbe`] when payload sizes actually vary.
pub struct TypeSizeProbe;

impl<K, V> SizeProbe<K, V> for TypeSizeProbe {
    #[inline]
    fn size_of(&self, _key: &K, _value: &V) -> u64 {
        std::mem::size_of::<V>() as u64
    }
}

/// A probe backed by a closure.
///
/// Created via [`CacheBuilder::size_probe`](crate::CacheBuilder::size_probe).
pub struct FnSizeProbe<F>(pub F);

impl<K, V, F> SizeProbe<K, V> for FnSizeProbe<F>
where
    F: Fn(&K, &V) -> u64 + Send + Sync + 'static,
{
    #[inline]
    fn size_of(&self, key: &K, value: &V) -> u64 {
        (self.0)(key, value)
    }
}
