use crate::ai::predictor::LinearPredictor;
use crate::entry::{AccessPattern, CacheEntry};
use crate::policy::sketch::FrequencySketch;

/// Decides whether a window candidate displaces the probation victim.
///
/// Two regimes:
///
/// - **frequency fallback** — AI disabled, or the predictor has not earned
///   confidence ≥ 0.3 yet: strict Count-Min comparison, exactly classic
///   TinyLFU (a tie keeps the incumbent);
/// - **blended** — predicted future value, adjusted by a per-pattern
///   multiplier, is mixed with the normalized sketch frequency at
///   `ai_weight : 1 − ai_weight`.  Ties still keep the incumbent.
pub(crate) struct AdmissionPolicy {
    predictor: LinearPredictor,
    ai_weight: f64,
    frequency_weight: f64,
    enable_ai: bool,
}

/// Effective-confidence floor below which the blended path is not trusted.
const MIN_AI_CONFIDENCE: f64 = 0.3;

impl AdmissionPolicy {
    pub(crate) fn new(predictor: LinearPredictor, ai_weight: f64, enable_ai: bool) -> Self {
        AdmissionPolicy {
            predictor,
            ai_weight,
            frequency_weight: 1.0 - ai_weight,
            enable_ai,
        }
    }

    /// True if `candidate` should enter the main area at `victim`'s expense.
    ///
    /// As a side effect the blended path stores the fresh prediction and
    /// pattern on both entries.
    pub(crate) fn should_admit<K, V>(
        &self,
        sketch: &FrequencySketch,
        candidate: &CacheEntry<K, V>,
        victim: Option<&CacheEntry<K, V>>,
        now: u64,
    ) -> bool {
        let Some(victim) = victim else {
            return true;
        };

        let candidate_freq = sketch.estimate(candidate.key_hash());
        let victim_freq = sketch.estimate(victim.key_hash());

        if !self.enable_ai || self.predictor.confidence() < MIN_AI_CONFIDENCE {
            return candidate_freq > victim_freq;
        }

        let candidate_value = self.predictor.predict_future_value(candidate, now);
        let victim_value = self.predictor.predict_future_value(victim, now);

        let candidate_pattern = self.predictor.classify_pattern(candidate, now);
        let victim_pattern = self.predictor.classify_pattern(victim, now);
        candidate.set_pattern(candidate_pattern);
        victim.set_pattern(victim_pattern);

        let candidate_value = apply_pattern_adjustment(candidate_value, candidate_pattern);
        let victim_value = apply_pattern_adjustment(victim_value, victim_pattern);

        candidate.set_predicted_value(candidate_value);
        victim.set_predicted_value(victim_value);

        let candidate_score =
            self.ai_weight * candidate_value + self.frequency_weight * normalize(candidate_freq);
        let victim_score =
            self.ai_weight * victim_value + self.frequency_weight * normalize(victim_freq);

        log::trace!(
            "admission: candidate {:.3} ({:?}) vs victim {:.3} ({:?})",
            candidate_score,
            candidate_pattern,
            victim_score,
            victim_pattern
        );

        candidate_score > victim_score
    }

    /// Feeds an access observation to the predictor when the AI path is on.
    pub(crate) fn record_access<K, V>(&mut self, entry: &CacheEntry<K, V>, hit: bool, now: u64) {
        if self.enable_ai {
            self.predictor.record_access(entry, hit, now);
        }
    }

    /// The predictor's effective confidence.
    pub(crate) fn confidence(&self) -> f64 {
        self.predictor.confidence()
    }
}

/// Per-pattern multiplier on a predicted value, clamped back into `[0, 1]`.
///
/// Scans are penalised so they cannot pollute the main area; proven-valuable
/// patterns get a mild boost.
fn apply_pattern_adjustment(value: f64, pattern: AccessPattern) -> f64 {
    match pattern {
        AccessPattern::SequentialScan => value * 0.5,
        AccessPattern::HotSpot => (value * 1.3).min(1.0),
        AccessPattern::Temporal => (value * 1.1).min(1.0),
        AccessPattern::WorkingSet => (value * 1.2).min(1.0),
        AccessPattern::Random | AccessPattern::Unknown => value,
    }
}

/// Sketch estimate mapped onto `[0, 1]`.
#[inline]
fn normalize(freq: u8) -> f64 {
    (freq as f64 / 15.0).min(1.0)
}
