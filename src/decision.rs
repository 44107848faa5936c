//! Threshold decisioning on top of raw model output.
//!
//! The model estimates the probability of default (class 1). Decisions are
//! taken on the complementary "favorable" score, `1 - probability`, and a
//! score equal to the threshold is accepted.

use crate::config::DEFAULT_THRESHOLD;
use crate::models::InferenceResult;
use serde::{Deserialize, Serialize};

/// Credit decision derived from one inference result
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    /// Credit granted
    pub accepted: bool,
    /// Probability of a favorable outcome, `1 - p(class 1)`
    pub score: f64,
}

impl Decision {
    /// Human-readable outcome
    pub fn verdict(&self) -> &'static str {
        if self.accepted {
            "Credit granted"
        } else {
            "Credit refused"
        }
    }
}

/// Apply `threshold` to a model result.
pub fn decide(result: &InferenceResult, threshold: f64) -> Decision {
    let score = 1.0 - result.probability;
    Decision {
        accepted: score >= threshold,
        score,
    }
}

/// Decision engine holding the process-wide threshold
#[derive(Debug, Clone, Copy)]
pub struct DecisionEngine {
    threshold: f64,
}

impl DecisionEngine {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn decide(&self, result: &InferenceResult) -> Decision {
        decide(result, self.threshold)
    }
}

impl Default for DecisionEngine {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD)
    }
}
