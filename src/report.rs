//! Report assembly and encoding
//!
//! This module builds the terminal [`AssessmentReport`] from the three domain
//! results and wraps it into a JSON envelope carrying producer metadata.

use chrono::Utc;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::emotion::emotion_score;
use crate::error::AssessmentError;
use crate::fusion::fuse;
use crate::recommend::{recommendations, summary};
use crate::types::{AssessmentReport, CognitiveResult, EmotionResult, HealthResult, PersonalDetails};
use crate::{GAUGE_VERSION, PRODUCER_NAME};

/// Current report envelope version
pub const REPORT_VERSION: &str = "1.0.0";

impl AssessmentReport {
    /// Score and fuse the collected domain results
    pub fn assemble(
        session_id: Uuid,
        personal_details: Option<PersonalDetails>,
        emotion: Option<EmotionResult>,
        cognitive: CognitiveResult,
        health: HealthResult,
    ) -> Self {
        let emotion_score = emotion_score(emotion.as_ref());
        let cognitive_score = cognitive.cognitive_score();
        let health_score = health.health_score;
        let outcome = fuse(emotion_score, cognitive_score, health_score);

        info!(
            session = %session_id,
            emotion_score,
            cognitive_score,
            health_score,
            final_score = outcome.final_score,
            stress_level = %outcome.stress_level,
            "report assembled"
        );

        Self {
            session_id,
            generated_at: Utc::now(),
            personal_details,
            emotion_score,
            cognitive_score,
            health_score,
            final_score: outcome.final_score,
            stress_level: outcome.stress_level,
            emotion,
            cognitive,
            health,
            recommendations: recommendations(outcome.final_score, outcome.stress_level),
            summary: summary(outcome.stress_level).to_string(),
        }
    }
}

/// Producer metadata
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportProducer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

/// Report as emitted to hosts
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportEnvelope {
    pub report_version: String,
    pub producer: ReportProducer,
    pub computed_at_utc: String,
    pub report: AssessmentReport,
}

/// Encoder for report envelopes
pub struct ReportEncoder {
    instance_id: String,
}

impl Default for ReportEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportEncoder {
    /// Create a new encoder with a unique instance ID
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create an encoder with a specific instance ID
    pub fn with_instance_id(instance_id: String) -> Self {
        Self { instance_id }
    }

    pub fn encode(&self, report: &AssessmentReport) -> ReportEnvelope {
        ReportEnvelope {
            report_version: REPORT_VERSION.to_string(),
            producer: ReportProducer {
                name: PRODUCER_NAME.to_string(),
                version: GAUGE_VERSION.to_string(),
                instance_id: self.instance_id.clone(),
            },
            computed_at_utc: Utc::now().to_rfc3339(),
            report: report.clone(),
        }
    }

    /// Encode to a pretty-printed JSON string
    pub fn encode_to_json(&self, report: &AssessmentReport) -> Result<String, AssessmentError> {
        let envelope = self.encode(report);
        serde_json::to_string_pretty(&envelope).map_err(AssessmentError::JsonError)
    }
}
