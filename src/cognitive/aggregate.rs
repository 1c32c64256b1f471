//! Cognitive aggregation
//!
//! Combines the four sub-test results into the cognitive domain score: the
//! unweighted mean of the sub-scores, rounded to 2 decimals.

use tracing::info;

use crate::error::AssessmentError;
use crate::fusion::round2;
use crate::types::{CognitiveResult, TrialKind, TrialResult};

/// Build the cognitive result from exactly one result per test kind.
///
/// Results may arrive in any order; they are stored in battery order.
pub fn aggregate(trials: Vec<TrialResult>) -> Result<CognitiveResult, AssessmentError> {
    let mut ordered: Vec<TrialResult> = Vec::with_capacity(TrialKind::ALL.len());

    for kind in TrialKind::ALL {
        let mut matching = trials.iter().filter(|t| t.kind() == kind);
        let trial = matching.next().ok_or_else(|| {
            AssessmentError::IncompleteCognitive(format!("missing {kind} result"))
        })?;
        if matching.next().is_some() {
            return Err(AssessmentError::IncompleteCognitive(format!(
                "duplicate {kind} result"
            )));
        }
        ordered.push(trial.clone());
    }

    let sum: f64 = ordered.iter().map(|t| t.normalized_score().as_f64()).sum();
    let cognitive_score = round2(sum / ordered.len() as f64);
    info!(cognitive_score, "cognitive battery aggregated");

    Ok(CognitiveResult {
        tests: ordered,
        cognitive_score,
    })
}
