//! Emotion score mapping and the facial-classifier boundary
//!
//! The classifier itself is an external service. This module maps its dominant
//! label to a stress weight, parses its wire format, and defines the trait a
//! host implements to call it.

use chrono::Utc;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::ClassifierError;
use crate::fusion::MAX_SCORE;
use crate::types::{Emotion, EmotionResult};

/// Client-side deadline for one classification request
pub const CLASSIFY_TIMEOUT: Duration = Duration::from_secs(60);

/// Score used when no usable label is available
pub const FALLBACK_EMOTION_SCORE: f64 = 1.5;

/// Stress weight of a dominant emotion
pub fn emotion_weight(emotion: Emotion) -> f64 {
    match emotion {
        Emotion::Angry | Emotion::Fearful => 3.0,
        Emotion::Disgusted => 2.5,
        Emotion::Sad => 2.0,
        Emotion::Surprised => 1.0,
        Emotion::Neutral => 0.5,
        Emotion::Happy => 0.0,
        Emotion::Unrecognized => FALLBACK_EMOTION_SCORE,
    }
}

/// Emotion domain score. A missing result scores like an unrecognized label.
///
/// Confidence and the probability map are not used.
pub fn emotion_score(result: Option<&EmotionResult>) -> f64 {
    let weight = result.map_or(FALLBACK_EMOTION_SCORE, |r| emotion_weight(r.emotion()));
    weight.min(MAX_SCORE)
}

/// A facial-emotion classification backend.
///
/// Implementations submit a single frame and must give up after
/// [`CLASSIFY_TIMEOUT`], reporting [`ClassifierError::Timeout`].
pub trait EmotionClassifier {
    fn classify(&self, image: &[u8]) -> Result<EmotionResult, ClassifierError>;
}

/// Classifier response body
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ClassifierResponse {
    Failure {
        error: String,
    },
    Success {
        dominant_emotion: String,
        confidence: f64,
        #[serde(default)]
        emotions: BTreeMap<String, f64>,
    },
}

impl ClassifierResponse {
    /// Convert into a result stamped with the current time
    pub fn into_result(self) -> Result<EmotionResult, ClassifierError> {
        match self {
            ClassifierResponse::Failure { error } => Err(ClassifierError::Service(error)),
            ClassifierResponse::Success {
                dominant_emotion,
                confidence,
                emotions,
            } => {
                if dominant_emotion.trim().is_empty() {
                    return Err(ClassifierError::MalformedResponse(
                        "empty dominant_emotion".to_string(),
                    ));
                }
                if !(0.0..=100.0).contains(&confidence) {
                    return Err(ClassifierError::MalformedResponse(format!(
                        "confidence {confidence} outside 0-100"
                    )));
                }
                Ok(EmotionResult {
                    dominant_emotion,
                    confidence,
                    emotions,
                    captured_at: Utc::now(),
                })
            }
        }
    }
}

/// Parse a classifier response value; every failure is retriable
pub fn parse_classifier_value(value: serde_json::Value) -> Result<EmotionResult, ClassifierError> {
    let response: ClassifierResponse = serde_json::from_value(value)
        .map_err(|e| ClassifierError::MalformedResponse(e.to_string()))?;
    let result = response.into_result();
    match &result {
        Ok(r) => debug!(
            label = %r.dominant_emotion,
            confidence = r.confidence,
            "emotion classified"
        ),
        Err(e) => warn!(error = %e, "emotion classification unusable"),
    }
    result
}

/// Parse a raw classifier response body
pub fn parse_classifier_response(body: &str) -> Result<EmotionResult, ClassifierError> {
    let value: serde_json::Value = serde_json::from_str(body)
        .map_err(|e| ClassifierError::MalformedResponse(e.to_string()))?;
    parse_classifier_value(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn result(label: &str) -> EmotionResult {
        EmotionResult {
            dominant_emotion: label.to_string(),
            confidence: 87.5,
            emotions: BTreeMap::new(),
            captured_at: Utc::now(),
        }
    }

    #[test]
    fn test_label_weights() {
        assert_eq!(emotion_score(Some(&result("angry"))), 3.0);
        assert_eq!(emotion_score(Some(&result("fearful"))), 3.0);
        assert_eq!(emotion_score(Some(&result("disgusted"))), 2.5);
        assert_eq!(emotion_score(Some(&result("sad"))), 2.0);
        assert_eq!(emotion_score(Some(&result("surprised"))), 1.0);
        assert_eq!(emotion_score(Some(&result("neutral"))), 0.5);
        assert_eq!(emotion_score(Some(&result("happy"))), 0.0);
    }

    #[test]
    fn test_missing_or_unknown_label_falls_back() {
        assert_eq!(emotion_score(None), 1.5);
        assert_eq!(emotion_score(Some(&result("contempt"))), 1.5);
        assert_eq!(emotion_score(Some(&result("fear"))), 1.5);
        assert_eq!(emotion_score(Some(&result(""))), 1.5);
    }

    #[test]
    fn test_labels_are_case_insensitive() {
        assert_eq!(emotion_score(Some(&result("Angry"))), 3.0);
        assert_eq!(emotion_score(Some(&result(" HAPPY "))), 0.0);
    }

    #[test]
    fn test_all_weights_within_bounds() {
        for emotion in [
            Emotion::Angry,
            Emotion::Fearful,
            Emotion::Disgusted,
            Emotion::Sad,
            Emotion::Surprised,
            Emotion::Neutral,
            Emotion::Happy,
            Emotion::Unrecognized,
        ] {
            let weight = emotion_weight(emotion);
            assert!((0.0..=MAX_SCORE).contains(&weight), "{emotion:?}");
        }
    }

    #[test]
    fn test_parse_success_body() {
        let body = r#"{
            "dominant_emotion": "sad",
            "confidence": 64.2,
            "emotions": {"sad": 64.2, "neutral": 20.1, "happy": 15.7}
        }"#;
        let parsed = parse_classifier_response(body).unwrap();
        assert_eq!(parsed.emotion(), Emotion::Sad);
        assert_eq!(parsed.confidence, 64.2);
        assert_eq!(parsed.emotions.len(), 3);
    }

    #[test]
    fn test_parse_error_body() {
        let body = r#"{"error": "Analysis timed out"}"#;
        assert_eq!(
            parse_classifier_response(body).unwrap_err(),
            ClassifierError::Service("Analysis timed out".to_string())
        );
    }

    #[test]
    fn test_parse_unexpected_shape() {
        assert!(matches!(
            parse_classifier_response(r#"{"label": "sad"}"#),
            Err(ClassifierError::MalformedResponse(_))
        ));
        assert!(matches!(
            parse_classifier_response("not json"),
            Err(ClassifierError::MalformedResponse(_))
        ));
        assert!(matches!(
            parse_classifier_response(r#"{"dominant_emotion": "sad", "confidence": 140}"#),
            Err(ClassifierError::MalformedResponse(_))
        ));
    }
}
