//! Pipeline orchestration
//!
//! One-shot entry points over JSON. A session bundle holds everything a
//! finished session collected (the raw classifier response, the raw cognitive
//! metrics and the health form); it is replayed through the session
//! orchestrator and encoded as a report envelope.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::emotion::{parse_classifier_value, EmotionClassifier};
use crate::error::{AssessmentError, ClassifierError};
use crate::fusion::{fuse, FusionOutcome};
use crate::health::HealthForm;
use crate::report::ReportEncoder;
use crate::session::{AssessmentSession, SessionEvent, SessionPhase};
use crate::types::{AssessmentReport, EmotionResult, HealthResult, PersonalDetails, TrialResult};

/// Memory-match raw metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryMetrics {
    pub moves: u32,
    pub elapsed_seconds: u32,
}

/// 1-back raw metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OneBackMetrics {
    pub correct: u32,
}

/// Selective-attention raw metrics
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttentionMetrics {
    pub correct: u32,
    pub latencies_ms: Vec<u32>,
}

/// Raw metrics of the four sub-tests
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CognitiveMetrics {
    pub reaction_ms: Vec<u32>,
    pub memory: MemoryMetrics,
    pub one_back: OneBackMetrics,
    pub attention: AttentionMetrics,
}

impl CognitiveMetrics {
    /// Score each sub-test, in battery order
    pub fn into_trials(self) -> Result<Vec<TrialResult>, AssessmentError> {
        Ok(vec![
            TrialResult::reaction_time(&self.reaction_ms)?,
            TrialResult::memory_match(self.memory.moves, self.memory.elapsed_seconds)?,
            TrialResult::one_back(self.one_back.correct)?,
            TrialResult::attention_switch(self.attention.correct, &self.attention.latencies_ms)?,
        ])
    }
}

/// Everything one session collected
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionBundle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub personal: Option<PersonalDetails>,
    /// Raw classifier response body; `null` if no frame was classified
    pub emotion_response: Option<serde_json::Value>,
    pub cognitive: CognitiveMetrics,
    pub health: HealthForm,
}

/// Classifier that replays a recorded response
struct RecordedClassifier<'a>(&'a serde_json::Value);

impl EmotionClassifier for RecordedClassifier<'_> {
    fn classify(&self, _image: &[u8]) -> Result<EmotionResult, ClassifierError> {
        parse_classifier_value(self.0.clone())
    }
}

/// Complete the emotion phase from a recorded classifier response.
///
/// `None` means no frame was classified and the fallback score applies. An
/// error response leaves the session in the emotion phase.
pub fn record_emotion_response(
    session: &mut AssessmentSession,
    response: Option<&serde_json::Value>,
) -> Result<SessionPhase, AssessmentError> {
    match response {
        Some(response) => session.capture_emotion(&RecordedClassifier(response), &[]),
        None => session.apply(SessionEvent::EmotionCompleted(None)),
    }
}

/// Drive a bundle through a fresh session.
///
/// A classifier error in the bundle stops the session in the emotion phase
/// and is returned as is.
pub fn assess_bundle(bundle: SessionBundle) -> Result<AssessmentReport, AssessmentError> {
    let mut session = match bundle.personal {
        Some(details) => AssessmentSession::with_personal(details)?,
        None => AssessmentSession::new(),
    };
    debug!(session = %session.id(), "replaying session bundle");

    record_emotion_response(&mut session, bundle.emotion_response.as_ref())?;
    session.complete_cognitive(bundle.cognitive.into_trials()?)?;
    session.submit_health(&bundle.health)?;

    session.into_report().ok_or_else(|| {
        AssessmentError::EncodingError("session completed without a report".to_string())
    })
}

/// Assess a JSON session bundle and return the report envelope as JSON.
///
/// # Example
/// ```ignore
/// let report_json = assess_bundle_json(&bundle_json)?;
/// ```
pub fn assess_bundle_json(bundle_json: &str) -> Result<String, AssessmentError> {
    let bundle: SessionBundle = serde_json::from_str(bundle_json)?;
    let report = assess_bundle(bundle)?;
    ReportEncoder::new().encode_to_json(&report)
}

/// Validate and score a JSON health form, returning the health result as JSON
pub fn health_score_json(form_json: &str) -> Result<String, AssessmentError> {
    let form: HealthForm = serde_json::from_str(form_json)?;
    let result: HealthResult = form.submit()?;
    Ok(serde_json::to_string(&result)?)
}

/// Fuse three domain scores, returning the outcome as JSON
pub fn fuse_json(
    emotion_score: f64,
    cognitive_score: f64,
    health_score: f64,
) -> Result<String, AssessmentError> {
    let outcome: FusionOutcome = fuse(emotion_score, cognitive_score, health_score);
    Ok(serde_json::to_string(&outcome)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;
    use pretty_assertions::assert_eq;

    fn sample_bundle_json() -> &'static str {
        r#"{
            "personal": {
                "first_name": "Sam",
                "last_name": "Rivera",
                "email": "sam@example.com",
                "date_of_birth": "1988-04-02",
                "gender": "non-binary",
                "location": "Lisbon"
            },
            "emotion_response": {
                "dominant_emotion": "sad",
                "confidence": 58.4,
                "emotions": {"sad": 58.4, "neutral": 30.2, "angry": 11.4}
            },
            "cognitive": {
                "reaction_ms": [450, 470, 430, 460, 440],
                "memory": {"moves": 14, "elapsed_seconds": 40},
                "one_back": {"correct": 15},
                "attention": {"correct": 14, "latencies_ms": [1050, 1050, 1050, 1050, 1050, 1050, 1050, 1050, 1050, 1050, 1050, 1050, 1050, 1050, 1050]}
            },
            "health": {
                "systolic": 150,
                "diastolic": 95,
                "heart_rate": 72,
                "blood_sugar": 110,
                "age": 45,
                "sex": "other"
            }
        }"#
    }

    fn sample_bundle() -> SessionBundle {
        serde_json::from_str(sample_bundle_json()).unwrap()
    }

    #[test]
    fn test_assess_bundle_json() {
        let json = assess_bundle_json(sample_bundle_json()).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed["producer"]["name"], crate::PRODUCER_NAME);
        let report = &parsed["report"];
        assert_eq!(report["emotion_score"], 2.0);
        assert_eq!(report["cognitive_score"], 1.5);
        assert_eq!(report["health_score"], 1.0);
        assert_eq!(report["final_score"], 1.58);
        assert_eq!(report["stress_level"], "Mild");
        assert_eq!(report["personal_details"]["location"], "Lisbon");
        assert_eq!(report["cognitive"]["tests"].as_array().unwrap().len(), 4);
    }

    #[test]
    fn test_classifier_error_stops_in_emotion_phase() {
        let mut bundle = sample_bundle();
        bundle.emotion_response = Some(serde_json::json!({"error": "No face detected"}));

        let err = assess_bundle(bundle).unwrap_err();
        assert!(matches!(
            err,
            AssessmentError::Classifier(ClassifierError::Service(ref msg))
                if msg == "No face detected"
        ));
    }

    #[test]
    fn test_missing_emotion_response_uses_fallback() {
        let mut bundle = sample_bundle();
        bundle.emotion_response = None;

        let report = assess_bundle(bundle).unwrap();
        assert_eq!(report.emotion_score, 1.5);
        // 0.6 + 0.525 + 0.25 = 1.375
        assert_eq!(report.final_score, 1.38);
    }

    #[test]
    fn test_invalid_health_form_is_rejected() {
        let mut bundle = sample_bundle();
        bundle.health.heart_rate = None;

        assert!(matches!(
            assess_bundle(bundle),
            Err(AssessmentError::Validation(ValidationError::MissingField("heart_rate")))
        ));
    }

    #[test]
    fn test_bad_cognitive_arity_is_rejected() {
        let mut bundle = sample_bundle();
        bundle.cognitive.reaction_ms.pop();
        assert!(matches!(
            assess_bundle(bundle),
            Err(AssessmentError::InvalidTrial(_))
        ));
    }

    #[test]
    fn test_incomplete_personal_details_are_rejected() {
        let mut bundle = sample_bundle();
        if let Some(details) = bundle.personal.as_mut() {
            details.last_name.clear();
        }
        assert!(matches!(
            assess_bundle(bundle),
            Err(AssessmentError::Validation(ValidationError::MissingField("last_name")))
        ));
    }

    #[test]
    fn test_recorded_classifier_completes_emotion_phase() {
        let response = serde_json::json!({"dominant_emotion": "happy", "confidence": 99.0});
        let mut session = AssessmentSession::new();
        let phase = session
            .capture_emotion(&RecordedClassifier(&response), &[])
            .unwrap();
        assert_eq!(phase, SessionPhase::Cognitive);
        assert_eq!(session.emotion().unwrap().dominant_emotion, "happy");
    }

    #[test]
    fn test_error_response_is_retriable() {
        let mut session = AssessmentSession::new();
        let failure = serde_json::json!({"error": "Analysis timed out"});
        assert!(record_emotion_response(&mut session, Some(&failure)).is_err());
        assert_eq!(session.phase(), SessionPhase::Emotion);

        assert_eq!(
            record_emotion_response(&mut session, None).unwrap(),
            SessionPhase::Cognitive
        );
    }

    #[test]
    fn test_health_score_json() {
        let json = health_score_json(
            r#"{"systolic":150,"diastolic":95,"heart_rate":72,"blood_sugar":110,"age":45}"#,
        )
        .unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["health_score"], 1.0);
        assert_eq!(parsed["sex"], "male");
    }

    #[test]
    fn test_fuse_json() {
        let json = fuse_json(2.0, 1.5, 1.0).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["final_score"], 1.58);
        assert_eq!(parsed["stress_level"], "Mild");
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            assess_bundle_json("not json"),
            Err(AssessmentError::JsonError(_))
        ));
    }
}
