use thiserror::Error;

/// Rejected configuration parameter.
///
/// Returned by [`CacheBuilder::build`](crate::CacheBuilder::build) when a
/// parameter is out of range.  Construction either succeeds with a fully
/// validated [`CacheConfig`](crate::CacheConfig) or fails here; there are no
/// partially-applied defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("maximum_size must be greater than zero")]
    InvalidMaximumSize,

    #[error("window_size must be greater than zero")]
    InvalidWindowSize,

    #[error("feature_history_size must be greater than zero")]
    InvalidFeatureHistorySize,

    #[error("ai_weight must be within [0.0, 1.0]")]
    InvalidAiWeight,

    #[error("max_training_examples must be greater than zero")]
    InvalidMaxTrainingExamples,

    #[error("learning_rate must be within (0.0, 1.0]")]
    InvalidLearningRate,

    #[error("num_shards must be a power of two")]
    InvalidNumShards,
}
