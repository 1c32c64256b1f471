//! Error types for Stress Gauge

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while collecting or scoring an assessment
#[derive(Debug, Error)]
pub enum AssessmentError {
    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Emotion classification failed: {0}")]
    Classifier(#[from] ClassifierError),

    #[error("Assistant request failed: {0}")]
    Assistant(#[from] AssistantError),

    #[error("Incomplete cognitive battery: {0}")]
    IncompleteCognitive(String),

    #[error("Invalid trial data: {0}")]
    InvalidTrial(String),

    #[error("Event {event} is not accepted in phase {phase}")]
    InvalidTransition { phase: String, event: String },

    #[error("Encoding error: {0}")]
    EncodingError(String),
}

/// Rejections produced by form validation. Nothing is scored when one of
/// these is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("{field} should be between {min}-{max}, got {value}")]
    OutOfRange {
        field: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },
}

/// Failures of the external facial-emotion classifier.
///
/// Every variant leaves the emotion phase retriable.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClassifierError {
    #[error("classifier reported an error: {0}")]
    Service(String),

    #[error("classification timed out after {0:?}")]
    Timeout(Duration),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("unexpected classifier response: {0}")]
    MalformedResponse(String),
}

/// Failures of the conversational assistant backend
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AssistantError {
    #[error("assistant reported an error: {0}")]
    Service(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("unexpected assistant response: {0}")]
    MalformedResponse(String),

    #[error("message is empty")]
    EmptyMessage,
}
