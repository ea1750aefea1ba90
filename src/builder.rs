use std::hash::Hash;

use crate::cache::Cache;
use crate::config::CacheConfig;
use crate::error::ConfigError;
use crate::probe::{FnSizeProbe, SizeProbe, TypeSizeProbe};

/// Builder for configuring and constructing a [`Cache`].
///
/// Every parameter has a documented default; [`build`] validates the final
/// bundle and fails with a [`ConfigError`] rather than clamping silently.
///
/// # Example
/// ```
/// use cortado::CacheBuilder;
///
/// let cache: cortado::Cache<String, String> = CacheBuilder::new()
///     .maximum_size(50_000)
///     .ai_weight(0.5)
///     .build()
///     .unwrap();
/// ```
///
/// [`build`]: CacheBuilder::build
pub struct CacheBuilder<K, V> {
    config: CacheConfig,
    probe: Box<dyn SizeProbe<K, V>>,
}

impl<K: 'static, V: 'static> CacheBuilder<K, V> {
    pub fn new() -> Self {
        CacheBuilder {
            config: CacheConfig::default(),
            probe: Box::new(TypeSizeProbe),
        }
    }

    /// Maximum number of resident entries (default: 10 000).
    ///
    /// Also re-derives `window_size = max(1, maximum_size / 100)`; call
    /// [`window_size`](CacheBuilder::window_size) afterwards to override.
    pub fn maximum_size(mut self, maximum_size: usize) -> Self {
        self.config.maximum_size = maximum_size;
        self.config.window_size = (maximum_size / 100).max(1);
        self
    }

    /// Size of the admission window (default: 1 % of `maximum_size`).
    pub fn window_size(mut self, window_size: usize) -> Self {
        self.config.window_size = window_size;
        self
    }

    /// Number of access timestamps kept per entry (default: 10).
    pub fn feature_history_size(mut self, feature_history_size: usize) -> Self {
        self.config.feature_history_size = feature_history_size;
        self
    }

    /// Toggles the learned admission path (default: enabled).
    pub fn enable_ai(mut self, enable_ai: bool) -> Self {
        self.config.enable_ai = enable_ai;
        self
    }

    /// Share of the admission score taken from the predictor, in `[0, 1]`
    /// (default: 0.7).
    pub fn ai_weight(mut self, ai_weight: f64) -> Self {
        self.config.ai_weight = ai_weight;
        self
    }

    /// Bound on buffered training examples (default: 1 000).
    pub fn max_training_examples(mut self, max_training_examples: usize) -> Self {
        self.config.max_training_examples = max_training_examples;
        self
    }

    /// Gradient-descent step size in `(0, 1]` (default: 0.01).
    pub fn learning_rate(mut self, learning_rate: f64) -> Self {
        self.config.learning_rate = learning_rate;
        self
    }

    /// Number of store shards; must be a power of two (default: 64).
    pub fn num_shards(mut self, num_shards: usize) -> Self {
        self.config.num_shards = num_shards;
        self
    }

    /// Installs a size probe closure for the predictor's size feature.
    ///
    /// # Example
    /// ```
    /// use cortado::CacheBuilder;
    ///
    /// let cache: cortado::Cache<String, Vec<u8>> = CacheBuilder::new()
    ///     .size_probe(|_k: &String, v: &Vec<u8>| v.len() as u64)
    ///     .build()
    ///     .unwrap();
    /// ```
    pub fn size_probe<F>(mut self, f: F) -> Self
    where
        F: Fn(&K, &V) -> u64 + Send + Sync + 'static,
    {
        self.probe = Box::new(FnSizeProbe(f));
        self
    }

    /// Installs a size probe via the [`SizeProbe`] trait.
    pub fn size_probe_impl<P: SizeProbe<K, V>>(mut self, probe: P) -> Self {
        self.probe = Box::new(probe);
        self
    }
}

impl<K: 'static, V: 'static> Default for CacheBuilder<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> CacheBuilder<K, V>
where
    K: Hash + Eq + Clone + Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    /// Validates the parameter bundle and constructs the cache.
    pub fn build(self) -> Result<Cache<K, V>, ConfigError> {
        self.config.validate()?;
        Ok(Cache::new(self.config, self.probe))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_build() {
        let cache: Result<Cache<u64, u64>, _> = CacheBuilder::new().build();
        assert!(cache.is_ok());
    }

    #[test]
    fn maximum_size_rederives_window() {
        let builder: CacheBuilder<u64, u64> = CacheBuilder::new().maximum_size(5_000);
        assert_eq!(builder.config.window_size, 50);

        // Tiny caches floor the window at one slot.
        let builder: CacheBuilder<u64, u64> = CacheBuilder::new().maximum_size(3);
        assert_eq!(builder.config.window_size, 1);
    }

    #[test]
    fn explicit_window_survives_if_set_after_maximum() {
        let builder: CacheBuilder<u64, u64> =
            CacheBuilder::new().maximum_size(1_000).window_size(25);
        assert_eq!(builder.config.window_size, 25);
    }

    #[test]
    fn invalid_parameters_fail_build() {
        let result: Result<Cache<u64, u64>, _> =
            CacheBuilder::new().ai_weight(1.5).build();
        assert_eq!(result.err(), Some(ConfigError::InvalidAiWeight));

        let result: Result<Cache<u64, u64>, _> =
            CacheBuilder::new().maximum_size(0).build();
        assert_eq!(result.err(), Some(ConfigError::InvalidMaximumSize));

        let result: Result<Cache<u64, u64>, _> =
            CacheBuilder::new().learning_rate(0.0).build();
        assert_eq!(result.err(), Some(ConfigError::InvalidLearningRate));
    }
}
