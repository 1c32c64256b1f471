//! Core types for the Stress Gauge engine
//!
//! This module defines the data structures that flow between the collection
//! phases and the scoring stages: cognitive trial results, health inputs,
//! emotion classifications and the final assessment report.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

use crate::recommend::Recommendation;

/// Identifier of a cognitive sub-test, in battery order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrialKind {
    ReactionTime,
    MemoryMatch,
    OneBack,
    AttentionSwitch,
}

impl TrialKind {
    /// All kinds in the fixed order the battery runs them
    pub const ALL: [TrialKind; 4] = [
        TrialKind::ReactionTime,
        TrialKind::MemoryMatch,
        TrialKind::OneBack,
        TrialKind::AttentionSwitch,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TrialKind::ReactionTime => "reaction_time",
            TrialKind::MemoryMatch => "memory_match",
            TrialKind::OneBack => "one_back",
            TrialKind::AttentionSwitch => "attention_switch",
        }
    }

    /// Human-readable test name
    pub fn display_name(&self) -> &'static str {
        match self {
            TrialKind::ReactionTime => "Reaction Time",
            TrialKind::MemoryMatch => "Memory Match",
            TrialKind::OneBack => "1-Back",
            TrialKind::AttentionSwitch => "Attention Switch",
        }
    }
}

impl fmt::Display for TrialKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized sub-score of a cognitive test.
///
/// Exactly four discrete levels; 0 is the best performance, 3 the worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(into = "u8")]
pub enum SubScore {
    Excellent = 0,
    Good = 1,
    Fair = 2,
    Poor = 3,
}

impl SubScore {
    pub fn value(self) -> u8 {
        self as u8
    }

    pub fn as_f64(self) -> f64 {
        f64::from(self.value())
    }
}

impl From<SubScore> for u8 {
    fn from(score: SubScore) -> Self {
        score.value()
    }
}

/// Raw performance metrics, specific to each sub-test
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "test", rename_all = "snake_case")]
pub enum TrialMetrics {
    ReactionTime {
        /// Latency of each valid attempt (ms)
        reactions_ms: Vec<u32>,
        /// Floored mean latency (ms)
        mean_ms: u32,
    },
    MemoryMatch {
        /// Number of pair reveals
        moves: u32,
        /// Whole seconds from game start to the last match
        elapsed_seconds: u32,
    },
    OneBack {
        correct: u32,
        total: u32,
        accuracy_percent: u32,
    },
    AttentionSwitch {
        correct: u32,
        total: u32,
        accuracy_percent: u32,
        /// Floored mean response latency (ms)
        mean_latency_ms: u32,
    },
}

impl TrialMetrics {
    pub fn kind(&self) -> TrialKind {
        match self {
            TrialMetrics::ReactionTime { .. } => TrialKind::ReactionTime,
            TrialMetrics::MemoryMatch { .. } => TrialKind::MemoryMatch,
            TrialMetrics::OneBack { .. } => TrialKind::OneBack,
            TrialMetrics::AttentionSwitch { .. } => TrialKind::AttentionSwitch,
        }
    }
}

/// One completed cognitive sub-test. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrialResult {
    #[serde(flatten)]
    metrics: TrialMetrics,
    normalized_score: SubScore,
}

impl TrialResult {
    pub(crate) fn new(metrics: TrialMetrics, normalized_score: SubScore) -> Self {
        Self {
            metrics,
            normalized_score,
        }
    }

    pub fn kind(&self) -> TrialKind {
        self.metrics.kind()
    }

    pub fn metrics(&self) -> &TrialMetrics {
        &self.metrics
    }

    pub fn normalized_score(&self) -> SubScore {
        self.normalized_score
    }
}

/// The four trial results of a battery plus their aggregate
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CognitiveResult {
    pub(crate) tests: Vec<TrialResult>,
    pub(crate) cognitive_score: f64,
}

impl CognitiveResult {
    /// Trial results in battery order
    pub fn tests(&self) -> &[TrialResult] {
        &self.tests
    }

    /// Mean of the four sub-scores, rounded to 2 decimals (0-3)
    pub fn cognitive_score(&self) -> f64 {
        self.cognitive_score
    }
}

/// Self-reported sex
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    #[default]
    Male,
    Female,
    Other,
}

/// Validated physiological inputs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthInput {
    /// Systolic blood pressure (mmHg)
    pub systolic: u16,
    /// Diastolic blood pressure (mmHg)
    pub diastolic: u16,
    /// Heart rate (bpm)
    pub heart_rate: u16,
    /// Blood sugar (mg/dL)
    pub blood_sugar: u16,
    /// Age (years)
    pub age: u16,
    #[serde(default)]
    pub sex: Sex,
}

/// Health inputs plus their derived score.
///
/// Only built by validating a form, so the inputs are always within range and
/// the score always matches them:
///
/// ```compile_fail
/// use stress_gauge::types::{HealthInput, HealthResult, Sex};
///
/// let forged = HealthResult {
///     input: HealthInput {
///         systolic: 999,
///         diastolic: 80,
///         heart_rate: 0,
///         blood_sugar: 100,
///         age: 40,
///         sex: Sex::Male,
///     },
///     health_score: 42.0,
///     submitted_at: chrono::Utc::now(),
/// };
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthResult {
    #[serde(flatten)]
    pub(crate) input: HealthInput,
    pub(crate) health_score: f64,
    pub(crate) submitted_at: DateTime<Utc>,
}

impl HealthResult {
    pub fn input(&self) -> &HealthInput {
        &self.input
    }

    /// Additive risk score (0-3, 2 decimals)
    pub fn health_score(&self) -> f64 {
        self.health_score
    }

    pub fn submitted_at(&self) -> DateTime<Utc> {
        self.submitted_at
    }
}

/// Dominant emotion vocabulary of the facial classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Angry,
    Fearful,
    Disgusted,
    Sad,
    Surprised,
    Neutral,
    Happy,
    Unrecognized,
}

impl Emotion {
    /// Map a classifier label onto the vocabulary
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "angry" => Emotion::Angry,
            "fearful" => Emotion::Fearful,
            "disgusted" => Emotion::Disgusted,
            "sad" => Emotion::Sad,
            "surprised" => Emotion::Surprised,
            "neutral" => Emotion::Neutral,
            "happy" => Emotion::Happy,
            _ => Emotion::Unrecognized,
        }
    }
}

/// Output of the external facial-emotion classifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionResult {
    /// Dominant emotion label as reported
    pub dominant_emotion: String,
    /// Confidence of the dominant label (percent, 0-100)
    pub confidence: f64,
    /// Per-emotion probabilities (percent)
    #[serde(default)]
    pub emotions: BTreeMap<String, f64>,
    pub captured_at: DateTime<Utc>,
}

impl EmotionResult {
    pub fn emotion(&self) -> Emotion {
        Emotion::from_label(&self.dominant_emotion)
    }
}

/// Ordered stress categories derived from the final score
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum StressLevel {
    Normal,
    Mild,
    Moderate,
    Severe,
}

impl StressLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            StressLevel::Normal => "Normal",
            StressLevel::Mild => "Mild",
            StressLevel::Moderate => "Moderate",
            StressLevel::Severe => "Severe",
        }
    }
}

impl fmt::Display for StressLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity metadata collected before the session. Never used in scoring.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersonalDetails {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub date_of_birth: String,
    pub gender: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medical_issues: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medical_history: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

/// Terminal entity of a session. Never mutated after assembly.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssessmentReport {
    pub session_id: Uuid,
    pub generated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub personal_details: Option<PersonalDetails>,
    pub emotion_score: f64,
    pub cognitive_score: f64,
    pub health_score: f64,
    pub final_score: f64,
    pub stress_level: StressLevel,
    /// Classifier output, carried for display only
    pub emotion: Option<EmotionResult>,
    pub cognitive: CognitiveResult,
    pub health: HealthResult,
    pub recommendations: Vec<Recommendation>,
    pub summary: String,
}
