//! Session orchestration
//!
//! A session collects the three domain results in a fixed order:
//!
//! ```text
//! Emotion -> Cognitive -> Health -> Complete
//! ```
//!
//! [`advance`] is the pure transition function; [`AssessmentSession`] holds the
//! collected results and assembles the report on the final transition. A
//! rejected event leaves the session exactly as it was.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{info, warn};
use uuid::Uuid;

use crate::cognitive::aggregate;
use crate::emotion::EmotionClassifier;
use crate::error::{AssessmentError, ValidationError};
use crate::health::HealthForm;
use crate::types::{
    AssessmentReport, CognitiveResult, EmotionResult, HealthResult, PersonalDetails, TrialResult,
};

/// Collection phase of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Emotion,
    Cognitive,
    Health,
    Complete,
}

impl SessionPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionPhase::Emotion => "emotion",
            SessionPhase::Cognitive => "cognitive",
            SessionPhase::Health => "health",
            SessionPhase::Complete => "complete",
        }
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Completion of a phase, carrying that phase's result
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// `None` when no classification was obtained; scored with the fallback
    EmotionCompleted(Option<EmotionResult>),
    CognitiveCompleted(CognitiveResult),
    HealthSubmitted(HealthResult),
}

impl SessionEvent {
    pub fn name(&self) -> &'static str {
        match self {
            SessionEvent::EmotionCompleted(_) => "emotion_completed",
            SessionEvent::CognitiveCompleted(_) => "cognitive_completed",
            SessionEvent::HealthSubmitted(_) => "health_submitted",
        }
    }

    /// Phase in which this event is accepted
    fn accepted_in(&self) -> SessionPhase {
        match self {
            SessionEvent::EmotionCompleted(_) => SessionPhase::Emotion,
            SessionEvent::CognitiveCompleted(_) => SessionPhase::Cognitive,
            SessionEvent::HealthSubmitted(_) => SessionPhase::Health,
        }
    }
}

/// Pure transition function: no skipping, no re-entry
pub fn advance(phase: SessionPhase, event: &SessionEvent) -> Result<SessionPhase, AssessmentError> {
    if event.accepted_in() != phase {
        return Err(invalid_transition(phase, event.name()));
    }
    Ok(match phase {
        SessionPhase::Emotion => SessionPhase::Cognitive,
        SessionPhase::Cognitive => SessionPhase::Health,
        SessionPhase::Health | SessionPhase::Complete => SessionPhase::Complete,
    })
}

fn invalid_transition(phase: SessionPhase, event: &str) -> AssessmentError {
    AssessmentError::InvalidTransition {
        phase: phase.to_string(),
        event: event.to_string(),
    }
}

impl PersonalDetails {
    /// Required: first name, last name, email, date of birth, gender.
    /// Whitespace-only values count as missing.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let required = [
            ("first_name", &self.first_name),
            ("last_name", &self.last_name),
            ("email", &self.email),
            ("date_of_birth", &self.date_of_birth),
            ("gender", &self.gender),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(ValidationError::MissingField(field));
            }
        }
        Ok(())
    }
}

/// One user's assessment run, memory-only
#[derive(Debug, Clone)]
pub struct AssessmentSession {
    id: Uuid,
    started_at: DateTime<Utc>,
    personal: Option<PersonalDetails>,
    phase: SessionPhase,
    emotion: Option<EmotionResult>,
    cognitive: Option<CognitiveResult>,
    health: Option<HealthResult>,
    report: Option<AssessmentReport>,
}

impl Default for AssessmentSession {
    fn default() -> Self {
        Self::new()
    }
}

impl AssessmentSession {
    /// Anonymous session
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            personal: None,
            phase: SessionPhase::Emotion,
            emotion: None,
            cognitive: None,
            health: None,
            report: None,
        }
    }

    /// Session carrying validated identity metadata
    pub fn with_personal(details: PersonalDetails) -> Result<Self, ValidationError> {
        details.validate()?;
        Ok(Self {
            personal: Some(details),
            ..Self::new()
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn personal(&self) -> Option<&PersonalDetails> {
        self.personal.as_ref()
    }

    pub fn emotion(&self) -> Option<&EmotionResult> {
        self.emotion.as_ref()
    }

    pub fn cognitive(&self) -> Option<&CognitiveResult> {
        self.cognitive.as_ref()
    }

    pub fn health(&self) -> Option<&HealthResult> {
        self.health.as_ref()
    }

    /// The report, once the session is complete
    pub fn report(&self) -> Option<&AssessmentReport> {
        self.report.as_ref()
    }

    pub fn into_report(self) -> Option<AssessmentReport> {
        self.report
    }

    /// Apply a phase completion. The final transition assembles the report.
    pub fn apply(&mut self, event: SessionEvent) -> Result<SessionPhase, AssessmentError> {
        let next = advance(self.phase, &event).map_err(|e| {
            warn!(session = %self.id, phase = %self.phase, event = event.name(), "event rejected");
            e
        })?;

        match event {
            SessionEvent::EmotionCompleted(result) => self.emotion = result,
            SessionEvent::CognitiveCompleted(result) => self.cognitive = Some(result),
            SessionEvent::HealthSubmitted(result) => {
                let cognitive = self.cognitive.clone().ok_or_else(|| {
                    AssessmentError::IncompleteCognitive("no cognitive result recorded".to_string())
                })?;
                let report = AssessmentReport::assemble(
                    self.id,
                    self.personal.clone(),
                    self.emotion.clone(),
                    cognitive,
                    result.clone(),
                );
                self.health = Some(result);
                self.report = Some(report);
            }
        }

        info!(session = %self.id, from = %self.phase, to = %next, "session advanced");
        self.phase = next;
        Ok(next)
    }

    /// Run the classifier on one frame and complete the emotion phase.
    ///
    /// A classifier failure is returned and nothing is committed; the session
    /// stays in the emotion phase so the capture can be retried.
    pub fn capture_emotion<C: EmotionClassifier + ?Sized>(
        &mut self,
        classifier: &C,
        image: &[u8],
    ) -> Result<SessionPhase, AssessmentError> {
        self.expect_phase(SessionPhase::Emotion, "emotion_completed")?;
        let result = classifier.classify(image).map_err(|e| {
            warn!(session = %self.id, error = %e, "emotion capture failed, phase stays retriable");
            e
        })?;
        self.apply(SessionEvent::EmotionCompleted(Some(result)))
    }

    /// Aggregate the four sub-test results and complete the cognitive phase
    pub fn complete_cognitive(
        &mut self,
        trials: Vec<TrialResult>,
    ) -> Result<SessionPhase, AssessmentError> {
        self.expect_phase(SessionPhase::Cognitive, "cognitive_completed")?;
        let result = aggregate(trials)?;
        self.apply(SessionEvent::CognitiveCompleted(result))
    }

    /// Validate and score the health form, completing the session.
    ///
    /// An invalid form is rejected as a whole and the session stays in the
    /// health phase.
    pub fn submit_health(&mut self, form: &HealthForm) -> Result<SessionPhase, AssessmentError> {
        self.expect_phase(SessionPhase::Health, "health_submitted")?;
        let result = form.submit()?;
        self.apply(SessionEvent::HealthSubmitted(result))
    }

    fn expect_phase(&self, phase: SessionPhase, event: &str) -> Result<(), AssessmentError> {
        if self.phase == phase {
            Ok(())
        } else {
            warn!(session = %self.id, phase = %self.phase, event, "event rejected");
            Err(invalid_transition(self.phase, event))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClassifierError;
    use crate::types::{Sex, StressLevel};
    use chrono::Utc;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;

    struct FixedClassifier(Result<EmotionResult, ClassifierError>);

    impl EmotionClassifier for FixedClassifier {
        fn classify(&self, _image: &[u8]) -> Result<EmotionResult, ClassifierError> {
            self.0.clone()
        }
    }

    fn sad() -> EmotionResult {
        EmotionResult {
            dominant_emotion: "sad".to_string(),
            confidence: 71.0,
            emotions: BTreeMap::new(),
            captured_at: Utc::now(),
        }
    }

    fn battery() -> Vec<TrialResult> {
        vec![
            TrialResult::reaction_time(&[450, 470, 430, 460, 440]).unwrap(), // 2
            TrialResult::memory_match(14, 40).unwrap(),                      // 1
            TrialResult::one_back(15).unwrap(),                              // 1
            TrialResult::attention_switch(14, &[1050; 15]).unwrap(),         // 2
        ]
    }

    fn health_form() -> HealthForm {
        HealthForm {
            systolic: Some(150),
            diastolic: Some(95),
            heart_rate: Some(72),
            blood_sugar: Some(110),
            age: Some(45),
            sex: Sex::Other,
        }
    }

    fn details() -> PersonalDetails {
        PersonalDetails {
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            date_of_birth: "1990-12-10".to_string(),
            gender: "female".to_string(),
            ..PersonalDetails::default()
        }
    }

    #[test]
    fn test_advance_is_linear() {
        let emotion = SessionEvent::EmotionCompleted(None);
        assert_eq!(advance(SessionPhase::Emotion, &emotion).unwrap(), SessionPhase::Cognitive);
        assert!(advance(SessionPhase::Cognitive, &emotion).is_err());
        assert!(advance(SessionPhase::Complete, &emotion).is_err());
    }

    #[test]
    fn test_full_session_assembles_report() {
        let mut session = AssessmentSession::with_personal(details()).unwrap();
        let classifier = FixedClassifier(Ok(sad()));

        assert_eq!(
            session.capture_emotion(&classifier, b"frame").unwrap(),
            SessionPhase::Cognitive
        );
        assert_eq!(session.complete_cognitive(battery()).unwrap(), SessionPhase::Health);
        assert!(session.report().is_none());
        assert_eq!(session.submit_health(&health_form()).unwrap(), SessionPhase::Complete);

        let report = session.report().unwrap();
        assert_eq!(report.session_id, session.id());
        assert_eq!(report.emotion_score, 2.0);
        assert_eq!(report.cognitive_score, 1.5);
        assert_eq!(report.health_score, 1.0);
        assert_eq!(report.final_score, 1.58);
        assert_eq!(report.stress_level, StressLevel::Mild);
        assert_eq!(report.personal_details.as_ref().unwrap().first_name, "Ada");
    }

    #[test]
    fn test_classifier_failure_keeps_emotion_phase() {
        let mut session = AssessmentSession::new();
        let failing =
            FixedClassifier(Err(ClassifierError::Timeout(crate::emotion::CLASSIFY_TIMEOUT)));

        let err = session.capture_emotion(&failing, b"frame").unwrap_err();
        assert!(matches!(err, AssessmentError::Classifier(ClassifierError::Timeout(_))));
        assert_eq!(session.phase(), SessionPhase::Emotion);
        assert!(session.emotion().is_none());

        // Retry succeeds
        let ok = FixedClassifier(Ok(sad()));
        assert_eq!(session.capture_emotion(&ok, b"frame").unwrap(), SessionPhase::Cognitive);
    }

    #[test]
    fn test_skipped_emotion_scores_fallback() {
        let mut session = AssessmentSession::new();
        session.apply(SessionEvent::EmotionCompleted(None)).unwrap();
        session.complete_cognitive(battery()).unwrap();
        session.submit_health(&health_form()).unwrap();

        let report = session.into_report().unwrap();
        assert_eq!(report.emotion_score, 1.5);
        assert!(report.emotion.is_none());
    }

    #[test]
    fn test_invalid_health_form_commits_nothing() {
        let mut session = AssessmentSession::new();
        session.apply(SessionEvent::EmotionCompleted(Some(sad()))).unwrap();
        session.complete_cognitive(battery()).unwrap();

        let mut form = health_form();
        form.age = Some(12);
        let err = session.submit_health(&form).unwrap_err();
        assert!(matches!(err, AssessmentError::Validation(ValidationError::OutOfRange { .. })));
        assert_eq!(session.phase(), SessionPhase::Health);
        assert!(session.health().is_none());
        assert!(session.report().is_none());
        assert!(session.cognitive().is_some());
    }

    #[test]
    fn test_health_event_only_carries_scored_inputs() {
        let mut session = AssessmentSession::new();
        session.apply(SessionEvent::EmotionCompleted(None)).unwrap();
        session.complete_cognitive(battery()).unwrap();

        let mut input = health_form().validate().unwrap();
        input.systolic = 999;
        input.heart_rate = 0;
        assert!(crate::health::score(input).is_err());

        let scored = health_form().submit().unwrap();
        session.apply(SessionEvent::HealthSubmitted(scored)).unwrap();

        let report = session.report().unwrap();
        assert_eq!(report.health.input().systolic, 150);
        assert_eq!(report.health.health_score(), report.health_score);
        assert!((0.0..=3.0).contains(&report.health_score));
    }

    #[test]
    fn test_out_of_order_events_are_rejected() {
        let mut session = AssessmentSession::new();
        let err = session.submit_health(&health_form()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Event health_submitted is not accepted in phase emotion"
        );

        assert!(session.complete_cognitive(battery()).is_err());
        assert_eq!(session.phase(), SessionPhase::Emotion);
    }

    #[test]
    fn test_completed_session_cannot_be_reentered() {
        let mut session = AssessmentSession::new();
        session.apply(SessionEvent::EmotionCompleted(None)).unwrap();
        session.complete_cognitive(battery()).unwrap();
        session.submit_health(&health_form()).unwrap();
        let first = session.report().cloned();

        assert!(session.apply(SessionEvent::EmotionCompleted(Some(sad()))).is_err());
        assert!(session.submit_health(&health_form()).is_err());
        assert_eq!(session.report().cloned(), first);
    }

    #[test]
    fn test_incomplete_battery_keeps_cognitive_phase() {
        let mut session = AssessmentSession::new();
        session.apply(SessionEvent::EmotionCompleted(None)).unwrap();
        let mut trials = battery();
        trials.remove(1);
        assert!(session.complete_cognitive(trials).is_err());
        assert_eq!(session.phase(), SessionPhase::Cognitive);
    }

    #[test]
    fn test_personal_details_require_fields() {
        let mut d = details();
        d.email = "   ".to_string();
        assert_eq!(
            AssessmentSession::with_personal(d).unwrap_err(),
            ValidationError::MissingField("email")
        );
        assert!(details().validate().is_ok());
    }
}
