//! Fusion engine
//!
//! Combines the three domain scores into the final stress score with fixed
//! weights and classifies the result into a stress level. Everything here is a
//! pure function of its inputs.

use serde::{Deserialize, Serialize};

use crate::types::StressLevel;

/// Weight of the emotion domain
pub const EMOTION_WEIGHT: f64 = 0.40;
/// Weight of the cognitive domain
pub const COGNITIVE_WEIGHT: f64 = 0.35;
/// Weight of the health domain
pub const HEALTH_WEIGHT: f64 = 0.25;

// Same weights in percent; fusion is computed on integer hundredths
const WEIGHTS_PERCENT: [i64; 3] = [40, 35, 25];

/// Upper bound of every domain score and of the final score
pub const MAX_SCORE: f64 = 3.0;

/// Lower bounds of the Mild, Moderate and Severe levels
pub const MILD_THRESHOLD: f64 = 1.0;
pub const MODERATE_THRESHOLD: f64 = 2.0;
pub const SEVERE_THRESHOLD: f64 = 2.5;

/// Round to 2 decimal places
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Final score and its category
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FusionOutcome {
    pub final_score: f64,
    pub stress_level: StressLevel,
}

/// Weighted fusion of the three domain scores.
///
/// Inputs are clamped to [0, 3] and taken at 2-decimal precision. The weighted
/// sum is computed in integer hundredths and rounded half-up, so that e.g.
/// `0.4*2.0 + 0.35*1.5 + 0.25*1.0 = 1.575` gives 1.58 rather than whatever
/// the binary representation of 1.575 rounds to.
pub fn fuse(emotion_score: f64, cognitive_score: f64, health_score: f64) -> FusionOutcome {
    let hundredths = [emotion_score, cognitive_score, health_score]
        .map(|score| (score.clamp(0.0, MAX_SCORE) * 100.0).round() as i64);

    // Ten-thousandths, non-negative
    let weighted: i64 = hundredths
        .iter()
        .zip(WEIGHTS_PERCENT)
        .map(|(score, weight)| score * weight)
        .sum();

    let final_score = ((weighted + 50) / 100) as f64 / 100.0;

    FusionOutcome {
        final_score,
        stress_level: classify(final_score),
    }
}

/// Partition the final score into stress levels (upper bounds exclusive)
pub fn classify(final_score: f64) -> StressLevel {
    if final_score < MILD_THRESHOLD {
        StressLevel::Normal
    } else if final_score < MODERATE_THRESHOLD {
        StressLevel::Mild
    } else if final_score < SEVERE_THRESHOLD {
        StressLevel::Moderate
    } else {
        StressLevel::Severe
    }
}
