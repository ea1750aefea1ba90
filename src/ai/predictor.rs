use std::collections::VecDeque;

use rand::Rng;

use crate::ai::features::{FeatureExtractor, FEATURE_COUNT};
use crate::ai::sigmoid;
use crate::entry::{AccessPattern, CacheEntry};

/// One buffered observation: the entry's features at access time and whether
/// the access was a hit.
struct TrainingExample {
    features: [f64; FEATURE_COUNT],
    label: f64,
}

/// Online linear model scoring an entry's future value in `[0, 1]`.
///
/// `score = σ(⟨w, x⟩)` over the normalized feature vector.  Weights start as
/// small uniform noise and are refined by single-epoch gradient descent over a
/// bounded FIFO of recent observations.  Training runs inline under the
/// eviction lock, so the buffer and weight vector need no synchronisation of
/// their own.
pub(crate) struct LinearPredictor {
    weights: [f64; FEATURE_COUNT],
    examples: VecDeque<TrainingExample>,
    max_examples: usize,
    learning_rate: f64,
    training_count: u64,
    /// `max(0, 1 − mse)` of the last training epoch.
    confidence: f64,
}

impl LinearPredictor {
    pub(crate) fn new(max_examples: usize, learning_rate: f64) -> Self {
        let mut rng = rand::thread_rng();
        let mut weights = [0.0; FEATURE_COUNT];
        for w in &mut weights {
            *w = rng.gen_range(-0.05..0.05);
        }
        LinearPredictor {
            weights,
            examples: VecDeque::new(),
            max_examples,
            learning_rate,
            training_count: 0,
            confidence: 0.0,
        }
    }

    /// Scores `entry` without touching any model state.
    pub(crate) fn predict_future_value<K, V>(&self, entry: &CacheEntry<K, V>, now: u64) -> f64 {
        let features = FeatureExtractor::features(entry, now);
        sigmoid(self.dot(&features))
    }

    /// Buffers one observation and trains once enough have accumulated.
    ///
    /// The label is 1 for a hit, 0 otherwise.  The oldest observations are
    /// dropped when the buffer outgrows its bound.
    pub(crate) fn record_access<K, V>(&mut self, entry: &CacheEntry<K, V>, hit: bool, now: u64) {
        let features = FeatureExtractor::features(entry, now);
        self.examples.push_back(TrainingExample {
            features,
            label: if hit { 1.0 } else { 0.0 },
        });
        while self.examples.len() > self.max_examples {
            self.examples.pop_front();
        }

        let train_threshold = (self.max_examples / 10).min(100);
        if self.examples.len() >= train_threshold {
            self.train();
        }
    }

    /// One epoch of gradient descent over the buffered observations.
    pub(crate) fn train(&mut self) {
        if self.examples.is_empty() {
            return;
        }

        let mut total_error = 0.0;
        for example in &self.examples {
            let prediction = sigmoid(
                self.weights
                    .iter()
                    .zip(example.features.iter())
                    .map(|(w, x)| w * x)
                    .sum(),
            );
            let error = example.label - prediction;
            total_error += error * error;

            // Sigmoid-derivative-weighted error.
            let gradient = error * prediction * (1.0 - prediction);
            for (w, x) in self.weights.iter_mut().zip(example.features.iter()) {
                *w += self.learning_rate * gradient * x;
            }
        }

        let mse = total_error / self.examples.len() as f64;
        self.confidence = (1.0 - mse).max(0.0);
        self.training_count += 1;
        log::trace!(
            "predictor epoch {}: mse={:.4} confidence={:.3}",
            self.training_count,
            mse,
            self.confidence
        );
    }

    /// Model confidence damped by training experience.
    ///
    /// A freshly built model reports ~0 regardless of its last-epoch error,
    /// so cold starts fall back to the frequency sketch.
    pub(crate) fn confidence(&self) -> f64 {
        let experience = (self.training_count as f64 / 100.0).min(1.0);
        self.confidence.min(experience)
    }

    #[cfg(test)]
    pub(crate) fn training_count(&self) -> u64 {
        self.training_count
    }

    /// Heuristic access-pattern classification; first matching rule wins.
    pub(crate) fn classify_pattern<K, V>(
        &self,
        entry: &CacheEntry<K, V>,
        now: u64,
    ) -> AccessPattern {
        let access_rate = entry.access_rate(now);
        let variance = entry.access_variance();

        // Hot spot: high access rate, regular intervals.
        if access_rate > 1.0 && variance < 1_000.0 {
            return AccessPattern::HotSpot;
        }

        // Temporal: moderate rate, irregular (bursty) intervals.
        if access_rate > 0.1 && variance > 10_000.0 {
            return AccessPattern::Temporal;
        }

        // Sequential scan: barely touched and less than a minute old.
        let age = now.saturating_sub(entry.creation_time());
        if entry.access_count() <= 2 && age < 60_000 {
            return AccessPattern::SequentialScan;
        }

        // Working set: steady moderate rate.
        if access_rate > 0.01 && access_rate < 1.0 {
            return AccessPattern::WorkingSet;
        }

        AccessPattern::Random
    }

    #[inline]
    fn dot(&self, features: &[f64; FEATURE_COUNT]) -> f64 {
        self.weights
            .iter()
            .zip(features.iter())
            .map(|(w, x)| w * x)
            .sum()
    }
}
