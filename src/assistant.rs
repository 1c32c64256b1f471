//! Conversational assistant contract
//!
//! The assistant is an external language-model service that discusses a
//! finished report. This module owns the transcript, the read-only report
//! snapshot sent along with every request, and the reply wire format. No
//! scoring happens here.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::AssistantError;
use crate::types::{AssessmentReport, PersonalDetails, StressLevel};

/// Author of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// Identity metadata as the assistant service names it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextDetails {
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

impl From<&PersonalDetails> for ContextDetails {
    fn from(details: &PersonalDetails) -> Self {
        Self {
            first_name: details.first_name.clone(),
            last_name: details.last_name.clone(),
            email: details.email.clone(),
            phone: details.phone.clone(),
            date_of_birth: details.date_of_birth.clone(),
            gender: details.gender.clone(),
            medical_issues: details.medical_issues.clone(),
            medical_history: details.medical_history.clone(),
            location: details.location.clone(),
        }
    }
}

/// Read-only snapshot of a report, in the assistant service's field naming
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportContext {
    pub personal_details: Option<ContextDetails>,
    pub emotion_score: f64,
    pub cognitive_score: f64,
    pub health_score: f64,
    pub final_score: f64,
    pub stress_level: StressLevel,
    /// Report date, `YYYY-MM-DD`
    pub date: String,
}

impl From<&AssessmentReport> for ReportContext {
    fn from(report: &AssessmentReport) -> Self {
        Self {
            personal_details: report.personal_details.as_ref().map(ContextDetails::from),
            emotion_score: report.emotion_score,
            cognitive_score: report.cognitive_score,
            health_score: report.health_score,
            final_score: report.final_score,
            stress_level: report.stress_level,
            date: report.generated_at.date_naive().to_string(),
        }
    }
}

/// Request body sent to the assistant service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    #[serde(rename = "reportContext")]
    pub report_context: ReportContext,
}

#[derive(Debug, Deserialize)]
struct ReplyDelta {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ReplyChoice {
    delta: ReplyDelta,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ReplyBody {
    Failure { error: String },
    Choices { choices: Vec<ReplyChoice> },
}

/// Extract the reply text from an assistant response body
pub fn parse_chat_reply(body: &str) -> Result<String, AssistantError> {
    let parsed: ReplyBody =
        serde_json::from_str(body).map_err(|e| AssistantError::MalformedResponse(e.to_string()))?;

    match parsed {
        ReplyBody::Failure { error } => Err(AssistantError::Service(error)),
        ReplyBody::Choices { choices } => choices
            .into_iter()
            .next()
            .and_then(|c| c.delta.content)
            .filter(|content| !content.is_empty())
            .ok_or_else(|| AssistantError::MalformedResponse("no reply content".to_string())),
    }
}

/// A conversational backend
pub trait WellnessAssistant {
    /// Produce one assistant reply for the conversation so far
    fn reply(&self, request: &ChatRequest) -> Result<String, AssistantError>;
}

/// Opening message of every conversation
pub fn greeting(stress_level: StressLevel, final_score: f64) -> String {
    format!(
        "Hello! I'm your AI wellness counselor. I've reviewed your complete stress assessment \
         report. Your overall stress level is {stress_level} with a score of \
         {final_score:.2}/3.00. I'm here to discuss your results, answer questions, and provide \
         personalized wellness recommendations. How can I help you today?"
    )
}

/// Conversation about one report
#[derive(Debug, Clone)]
pub struct ChatTranscript {
    context: ReportContext,
    messages: Vec<ChatMessage>,
}

impl ChatTranscript {
    /// Open a conversation with the greeting
    pub fn new(context: ReportContext) -> Self {
        let opening = greeting(context.stress_level, context.final_score);
        Self {
            context,
            messages: vec![ChatMessage::assistant(opening)],
        }
    }

    pub fn for_report(report: &AssessmentReport) -> Self {
        Self::new(ReportContext::from(report))
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn context(&self) -> &ReportContext {
        &self.context
    }

    /// Send a user message and record the reply.
    ///
    /// On failure the transcript is unchanged, including the user message, so
    /// the same text can be sent again.
    pub fn send<A: WellnessAssistant + ?Sized>(
        &mut self,
        assistant: &A,
        text: &str,
    ) -> Result<&ChatMessage, AssistantError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(AssistantError::EmptyMessage);
        }

        let mut messages = self.messages.clone();
        messages.push(ChatMessage::user(text));
        let request = ChatRequest {
            messages,
            report_context: self.context.clone(),
        };

        let reply = assistant.reply(&request).map_err(|e| {
            warn!(error = %e, "assistant reply failed");
            e
        })?;
        debug!(turns = request.messages.len(), "assistant replied");

        self.messages = request.messages;
        self.messages.push(ChatMessage::assistant(reply));
        Ok(&self.messages[self.messages.len() - 1])
    }
}
