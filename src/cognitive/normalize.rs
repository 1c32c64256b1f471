//! Sub-score normalization
//!
//! Reduces the raw performance of each cognitive test to one of four discrete
//! severity levels. Every threshold resolves to the worse bucket: a value that
//! sits exactly on a boundary is scored as the higher (less good) level.

use crate::error::AssessmentError;
use crate::types::{SubScore, TrialMetrics, TrialResult};

use super::attention::ATTENTION_TRIALS;
use super::one_back::ONE_BACK_RESPONSES;
use super::reaction::REACTION_ATTEMPTS;

/// Reaction time: lower mean latency is better.
///
/// `<200ms` = 0, `<400ms` = 1, `<600ms` = 2, otherwise 3
pub fn score_reaction_time(mean_ms: u32) -> SubScore {
    if mean_ms < 200 {
        SubScore::Excellent
    } else if mean_ms < 400 {
        SubScore::Good
    } else if mean_ms < 600 {
        SubScore::Fair
    } else {
        SubScore::Poor
    }
}

/// Memory match: the worst bucket whose time or move limit is hit wins.
pub fn score_memory_match(elapsed_seconds: u32, moves: u32) -> SubScore {
    if elapsed_seconds > 60 || moves >= 20 {
        SubScore::Poor
    } else if elapsed_seconds > 45 || moves >= 16 {
        SubScore::Fair
    } else if elapsed_seconds > 30 || moves >= 12 {
        SubScore::Good
    } else {
        SubScore::Excellent
    }
}

/// 1-back: accuracy in whole percent.
pub fn score_one_back(accuracy_percent: u32) -> SubScore {
    if accuracy_percent < 50 {
        SubScore::Poor
    } else if accuracy_percent < 70 {
        SubScore::Fair
    } else if accuracy_percent < 90 {
        SubScore::Good
    } else {
        SubScore::Excellent
    }
}

/// Selective attention: accuracy and mean latency, least-good bucket first.
pub fn score_attention_switch(accuracy_percent: u32, mean_latency_ms: u32) -> SubScore {
    if accuracy_percent < 55 || mean_latency_ms >= 1200 {
        SubScore::Poor
    } else if accuracy_percent < 70 || mean_latency_ms >= 1000 {
        SubScore::Fair
    } else if accuracy_percent < 85 || mean_latency_ms >= 800 {
        SubScore::Good
    } else {
        SubScore::Excellent
    }
}

/// `correct / total` as a whole percent, rounded half up
pub(crate) fn accuracy_percent(correct: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    ((f64::from(correct) / f64::from(total)) * 100.0).round() as u32
}

/// Floored integer mean
pub(crate) fn floored_mean(values: &[u32]) -> u32 {
    if values.is_empty() {
        return 0;
    }
    let sum: u64 = values.iter().map(|&v| u64::from(v)).sum();
    (sum / values.len() as u64) as u32
}

impl TrialResult {
    /// Score a reaction-time test from its valid attempt latencies
    pub fn reaction_time(reactions_ms: &[u32]) -> Result<Self, AssessmentError> {
        if reactions_ms.len() != REACTION_ATTEMPTS {
            return Err(AssessmentError::InvalidTrial(format!(
                "reaction time needs {} attempts, got {}",
                REACTION_ATTEMPTS,
                reactions_ms.len()
            )));
        }

        let mean_ms = floored_mean(reactions_ms);
        Ok(Self::new(
            TrialMetrics::ReactionTime {
                reactions_ms: reactions_ms.to_vec(),
                mean_ms,
            },
            score_reaction_time(mean_ms),
        ))
    }

    /// Score a completed memory-match game
    pub fn memory_match(moves: u32, elapsed_seconds: u32) -> Result<Self, AssessmentError> {
        if moves < super::memory::PAIR_COUNT as u32 {
            return Err(AssessmentError::InvalidTrial(format!(
                "memory match cannot finish in {moves} moves"
            )));
        }

        Ok(Self::new(
            TrialMetrics::MemoryMatch {
                moves,
                elapsed_seconds,
            },
            score_memory_match(elapsed_seconds, moves),
        ))
    }

    /// Score a 1-back run from its number of correct answers
    pub fn one_back(correct: u32) -> Result<Self, AssessmentError> {
        let total = ONE_BACK_RESPONSES as u32;
        if correct > total {
            return Err(AssessmentError::InvalidTrial(format!(
                "1-back has {total} scored positions, got {correct} correct"
            )));
        }

        let accuracy = accuracy_percent(correct, total);
        Ok(Self::new(
            TrialMetrics::OneBack {
                correct,
                total,
                accuracy_percent: accuracy,
            },
            score_one_back(accuracy),
        ))
    }

    /// Score a selective-attention run from its correct count and per-trial latencies
    pub fn attention_switch(correct: u32, latencies_ms: &[u32]) -> Result<Self, AssessmentError> {
        if latencies_ms.len() != ATTENTION_TRIALS {
            return Err(AssessmentError::InvalidTrial(format!(
                "attention switch needs {} latencies, got {}",
                ATTENTION_TRIALS,
                latencies_ms.len()
            )));
        }
        let total = ATTENTION_TRIALS as u32;
        if correct > total {
            return Err(AssessmentError::InvalidTrial(format!(
                "attention switch has {total} trials, got {correct} correct"
            )));
        }

        let accuracy = accuracy_percent(correct, total);
        let mean_latency_ms = floored_mean(latencies_ms);
        Ok(Self::new(
            TrialMetrics::AttentionSwitch {
                correct,
                total,
                accuracy_percent: accuracy,
                mean_latency_ms,
            },
            score_attention_switch(accuracy, mean_latency_ms),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TrialKind;

    #[test]
    fn test_reaction_time_thresholds() {
        assert_eq!(score_reaction_time(0), SubScore::Excellent);
        assert_eq!(score_reaction_time(199), SubScore::Excellent);
        assert_eq!(score_reaction_time(200), SubScore::Good);
        assert_eq!(score_reaction_time(399), SubScore::Good);
        assert_eq!(score_reaction_time(400), SubScore::Fair);
        assert_eq!(score_reaction_time(600), SubScore::Poor);
        assert_eq!(score_reaction_time(5000), SubScore::Poor);
    }

    #[test]
    fn test_reaction_time_from_attempts() {
        let result = TrialResult::reaction_time(&[150, 180, 210, 190, 170]).unwrap();

        assert_eq!(result.kind(), TrialKind::ReactionTime);
        assert_eq!(result.normalized_score(), SubScore::Excellent);
        match result.metrics() {
            TrialMetrics::ReactionTime { mean_ms, .. } => assert_eq!(*mean_ms, 180),
            other => panic!("unexpected metrics {other:?}"),
        }
    }

    #[test]
    fn test_reaction_time_mean_is_floored() {
        // 1001 / 5 = 200.2 -> 200
        let result = TrialResult::reaction_time(&[200, 200, 200, 200, 201]).unwrap();
        match result.metrics() {
            TrialMetrics::ReactionTime { mean_ms, .. } => assert_eq!(*mean_ms, 200),
            other => panic!("unexpected metrics {other:?}"),
        }
        assert_eq!(result.normalized_score(), SubScore::Good);
    }

    #[test]
    fn test_reaction_time_requires_five_attempts() {
        assert!(TrialResult::reaction_time(&[150, 180]).is_err());
        assert!(TrialResult::reaction_time(&[150; 6]).is_err());
    }

    #[test]
    fn test_memory_match_thresholds() {
        assert_eq!(score_memory_match(20, 8), SubScore::Excellent);
        assert_eq!(score_memory_match(30, 11), SubScore::Excellent);
        assert_eq!(score_memory_match(31, 8), SubScore::Good);
        assert_eq!(score_memory_match(20, 12), SubScore::Good);
        assert_eq!(score_memory_match(46, 8), SubScore::Fair);
        assert_eq!(score_memory_match(20, 16), SubScore::Fair);
        assert_eq!(score_memory_match(61, 8), SubScore::Poor);
        assert_eq!(score_memory_match(20, 20), SubScore::Poor);
    }

    #[test]
    fn test_memory_match_elapsed_dominates_moves() {
        // Moves alone would give 1; time pushes it to 2
        assert_eq!(score_memory_match(50, 14), SubScore::Fair);
    }

    #[test]
    fn test_memory_match_rejects_impossible_move_count() {
        assert!(TrialResult::memory_match(7, 10).is_err());
        assert!(TrialResult::memory_match(8, 10).is_ok());
    }

    #[test]
    fn test_one_back_thresholds() {
        assert_eq!(score_one_back(49), SubScore::Poor);
        assert_eq!(score_one_back(50), SubScore::Fair);
        assert_eq!(score_one_back(69), SubScore::Fair);
        assert_eq!(score_one_back(70), SubScore::Good);
        assert_eq!(score_one_back(89), SubScore::Good);
        assert_eq!(score_one_back(90), SubScore::Excellent);
        assert_eq!(score_one_back(100), SubScore::Excellent);
    }

    #[test]
    fn test_one_back_accuracy_rounding() {
        // 17 / 19 = 89.47% -> 89
        let result = TrialResult::one_back(17).unwrap();
        match result.metrics() {
            TrialMetrics::OneBack {
                accuracy_percent, ..
            } => assert_eq!(*accuracy_percent, 89),
            other => panic!("unexpected metrics {other:?}"),
        }
        assert_eq!(result.normalized_score(), SubScore::Good);

        // 18 / 19 = 94.7% -> 95
        assert_eq!(
            TrialResult::one_back(18).unwrap().normalized_score(),
            SubScore::Excellent
        );
        assert!(TrialResult::one_back(20).is_err());
    }

    #[test]
    fn test_attention_switch_thresholds() {
        assert_eq!(score_attention_switch(100, 500), SubScore::Excellent);
        assert_eq!(score_attention_switch(85, 799), SubScore::Excellent);
        assert_eq!(score_attention_switch(84, 500), SubScore::Good);
        assert_eq!(score_attention_switch(100, 800), SubScore::Good);
        assert_eq!(score_attention_switch(69, 500), SubScore::Fair);
        assert_eq!(score_attention_switch(100, 1000), SubScore::Fair);
        assert_eq!(score_attention_switch(54, 500), SubScore::Poor);
        assert_eq!(score_attention_switch(100, 1200), SubScore::Poor);
    }

    #[test]
    fn test_attention_switch_from_raw() {
        // 13 / 15 = 86.7% -> 87, mean latency 750
        let result = TrialResult::attention_switch(13, &[750; 15]).unwrap();
        assert_eq!(result.normalized_score(), SubScore::Excellent);

        // 12 / 15 = 80% -> bucket 1
        let result = TrialResult::attention_switch(12, &[750; 15]).unwrap();
        assert_eq!(result.normalized_score(), SubScore::Good);

        assert!(TrialResult::attention_switch(12, &[750; 14]).is_err());
        assert!(TrialResult::attention_switch(16, &[750; 15]).is_err());
    }

    #[test]
    fn test_accuracy_percent_half_rounds_up() {
        assert_eq!(accuracy_percent(1, 8), 13); // 12.5
        assert_eq!(accuracy_percent(0, 19), 0);
        assert_eq!(accuracy_percent(19, 19), 100);
        assert_eq!(accuracy_percent(3, 0), 0);
    }
}
