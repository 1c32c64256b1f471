//! Cognitive battery
//!
//! Four timed sub-tests, each a small state machine driven by timestamped UI
//! events, that reduce raw performance to a discrete sub-score. The aggregator
//! averages the four sub-scores into the cognitive domain score.
//!
//! Battery order: reaction time → memory match → 1-back → attention switch

pub mod aggregate;
pub mod attention;
pub mod memory;
pub mod normalize;
pub mod one_back;
pub mod reaction;

pub use aggregate::aggregate;
pub use attention::{AttentionOutcome, AttentionSwitchTest, AttentionTask, Color, Stimulus};
pub use memory::{MemoryMatchTest, RevealOutcome};
pub use normalize::{
    score_attention_switch, score_memory_match, score_one_back, score_reaction_time,
};
pub use one_back::{OneBackAnswer, OneBackOutcome, OneBackTest};
pub use reaction::{ReactionOutcome, ReactionTimeTest};

/// Lifecycle of a sub-test.
///
/// Scoring runs synchronously on the transition into `Done`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrialPhase {
    /// Not started, or between attempts
    Idle,
    /// Stimulus pending or on display; responses are not accepted yet
    Presenting,
    /// Waiting for the player's response
    AwaitingResponse,
    /// Result emitted; further events are ignored
    Done,
}
