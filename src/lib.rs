//! Stress Gauge - Deterministic scoring engine for multi-signal stress self-assessment
//!
//! Gauge turns three independent signal sources into a single bounded stress
//! verdict: a facial-emotion classification, a battery of four timed cognitive
//! mini-games, and self-reported physiological metrics. Each source is reduced
//! to a domain score on a common 0-3 scale, and the three are fused with fixed
//! weights:
//!
//! emotion mapping / cognitive battery → aggregation / health validation →
//! weighted fusion → stress level, recommendations and report encoding.
//!
//! ## Modules
//!
//! - **Cognitive battery**: timed protocol state machines and sub-score normalizers
//! - **Session**: the linear Emotion → Cognitive → Health → Complete orchestrator
//! - **Boundaries**: classifier and assistant contracts, JSON pipeline, C ABI

pub mod assistant;
pub mod cognitive;
pub mod emotion;
pub mod error;
pub mod fusion;
pub mod health;
pub mod pipeline;
pub mod random;
pub mod recommend;
pub mod report;
pub mod session;
pub mod types;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use error::{AssessmentError, AssistantError, ClassifierError, ValidationError};
pub use fusion::{classify, fuse, FusionOutcome};
pub use pipeline::{assess_bundle, assess_bundle_json, SessionBundle};
pub use report::ReportEncoder;
pub use session::{advance, AssessmentSession, SessionEvent, SessionPhase};
pub use types::{
    AssessmentReport, CognitiveResult, EmotionResult, HealthInput, HealthResult, StressLevel,
    SubScore, TrialKind, TrialResult,
};

/// Gauge version embedded in all report envelopes
pub const GAUGE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for report envelopes
pub const PRODUCER_NAME: &str = "stress-gauge";
