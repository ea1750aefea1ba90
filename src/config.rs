use crate::error::ConfigError;

/// Validated parameter bundle for a [`Cache`](crate::Cache).
///
/// Produced by [`CacheBuilder`](crate::CacheBuilder); the fields are public so
/// a config can also be assembled directly and checked with [`validate`].
///
/// [`validate`]: CacheConfig::validate
#[derive(Debug, Clone, PartialEq)]
pub struct CacheConfig {
    /// Maximum number of resident entries.
    pub maximum_size: usize,
    /// Target size of the admission window.  The window absorbs every new
    /// entry; the main segments are carved out of `maximum_size - window_size`.
    pub window_size: usize,
    /// Number of recent access timestamps kept per entry for feature
    /// extraction.
    pub feature_history_size: usize,
    /// Whether the learned admission path is active.  When `false` the policy
    /// always uses the pure frequency comparison.
    pub enable_ai: bool,
    /// Blend factor in `[0, 1]`: share of the admission score taken from the
    /// predictor (the remainder comes from the frequency sketch).
    pub ai_weight: f64,
    /// Upper bound on buffered training examples.
    pub max_training_examples: usize,
    /// Gradient-descent step size in `(0, 1]`.
    pub learning_rate: f64,
    /// Number of independent store shards.  Must be a power of two.
    pub num_shards: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            maximum_size: 10_000,
            window_size: 100,
            feature_history_size: 10,
            enable_ai: true,
            ai_weight: 0.7,
            max_training_examples: 1_000,
            learning_rate: 0.01,
            num_shards: 64,
        }
    }
}

impl CacheConfig {
    /// Checks every parameter against its documented range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.maximum_size == 0 {
            return Err(ConfigError::InvalidMaximumSize);
        }
        if self.window_size == 0 {
            return Err(ConfigError::InvalidWindowSize);
        }
        if self.feature_history_size == 0 {
            return Err(ConfigError::InvalidFeatureHistorySize);
        }
        if !(0.0..=1.0).contains(&self.ai_weight) || self.ai_weight.is_nan() {
            return Err(ConfigError::InvalidAiWeight);
        }
        if self.max_training_examples == 0 {
            return Err(ConfigError::InvalidMaxTrainingExamples);
        }
        if !(self.learning_rate > 0.0 && self.learning_rate <= 1.0) {
            return Err(ConfigError::InvalidLearningRate);
        }
        if !self.num_shards.is_power_of_two() {
            return Err(ConfigError::InvalidNumShards);
        }
        Ok(())
    }

    /// Probationary segment budget: 20 % of main (`maximum_size - window_size`).
    ///
    /// Saturating so that a window larger than the whole cache degenerates to
    /// an empty main area instead of wrapping.
    pub(crate) fn probation_size(&self) -> usize {
        let main = self.maximum_size.saturating_sub(self.window_size);
        (main as f64 * 0.2) as usize
    }

    /// Protected segment budget: the rest of main after probation.
    pub(crate) fn protected_size(&self) -> usize {
        self.maximum_size
            .saturating_sub(self.window_size)
            .saturating_sub(self.probation_size())
    }
}
