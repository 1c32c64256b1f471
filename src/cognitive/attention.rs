//! Selective-attention (Stroop-style) protocol
//!
//! Each trial shows a color word printed in an independently chosen ink color
//! together with an instruction: answer with the ink color, or with the
//! word's meaning. Fifteen trials; correctness and response latency are
//! recorded per trial.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::random::RandomSource;
use crate::types::{TrialMetrics, TrialResult};

use super::normalize::{accuracy_percent, floored_mean, score_attention_switch};
use super::TrialPhase;

/// Trials per run
pub const ATTENTION_TRIALS: usize = 15;

/// Pause between an answer and the next instruction (ms)
pub const INTER_TRIAL_GAP_MS: u64 = 500;

/// Four-color vocabulary shared by words, inks and answers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Red,
    Blue,
    Green,
    Yellow,
}

impl Color {
    pub const ALL: [Color; 4] = [Color::Red, Color::Blue, Color::Green, Color::Yellow];

    fn random<R: RandomSource>(rng: &mut R) -> Self {
        Self::ALL[rng.below(Self::ALL.len() as u32) as usize]
    }
}

/// Which property of the stimulus the answer must name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttentionTask {
    InkColor,
    WordMeaning,
}

/// One trial's stimulus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stimulus {
    pub word: Color,
    pub ink: Color,
    pub task: AttentionTask,
}

impl Stimulus {
    pub fn random<R: RandomSource>(rng: &mut R) -> Self {
        let word = Color::random(rng);
        let ink = Color::random(rng);
        let task = if rng.chance(0.5) {
            AttentionTask::InkColor
        } else {
            AttentionTask::WordMeaning
        };
        Self { word, ink, task }
    }

    /// The answer the active instruction asks for
    pub fn expected(&self) -> Color {
        match self.task {
            AttentionTask::InkColor => self.ink,
            AttentionTask::WordMeaning => self.word,
        }
    }
}

/// Result of an answer event
#[derive(Debug, Clone, PartialEq)]
pub enum AttentionOutcome {
    /// No instruction on screen
    Ignored,
    Recorded { correct: bool, latency_ms: u32 },
    /// The last trial was answered
    Completed(TrialResult),
}

/// Selective-attention test state machine
#[derive(Debug)]
pub struct AttentionSwitchTest<R> {
    rng: R,
    stimulus: Option<Stimulus>,
    shown_at_ms: u64,
    answered: usize,
    correct: u32,
    latencies: [u32; ATTENTION_TRIALS],
    phase: TrialPhase,
    result: Option<TrialResult>,
}

impl<R: RandomSource> AttentionSwitchTest<R> {
    pub fn new(rng: R) -> Self {
        Self {
            rng,
            stimulus: None,
            shown_at_ms: 0,
            answered: 0,
            correct: 0,
            latencies: [0; ATTENTION_TRIALS],
            phase: TrialPhase::Idle,
            result: None,
        }
    }

    pub fn phase(&self) -> TrialPhase {
        self.phase
    }

    /// Stimulus currently on screen
    pub fn current_stimulus(&self) -> Option<&Stimulus> {
        match self.phase {
            TrialPhase::AwaitingResponse => self.stimulus.as_ref(),
            _ => None,
        }
    }

    /// `(correct, answered)` so far
    pub fn progress(&self) -> (u32, u32) {
        (self.correct, self.answered as u32)
    }

    pub fn result(&self) -> Option<&TrialResult> {
        self.result.as_ref()
    }

    /// Show the first instruction. Returns `false` if already started.
    pub fn start(&mut self, now_ms: u64) -> bool {
        if self.phase != TrialPhase::Idle {
            return false;
        }
        self.present(now_ms);
        self.phase = TrialPhase::AwaitingResponse;
        true
    }

    /// Advance the clock; shows the next instruction once the gap has passed
    pub fn tick(&mut self, now_ms: u64) -> TrialPhase {
        if self.phase == TrialPhase::Presenting && now_ms >= self.shown_at_ms {
            self.phase = TrialPhase::AwaitingResponse;
        }
        self.phase
    }

    /// Answer the current trial with one of the four color names
    pub fn answer(&mut self, color: Color, now_ms: u64) -> AttentionOutcome {
        if self.tick(now_ms) != TrialPhase::AwaitingResponse {
            return AttentionOutcome::Ignored;
        }
        let stimulus = match self.stimulus {
            Some(stimulus) => stimulus,
            None => return AttentionOutcome::Ignored,
        };
        if now_ms < self.shown_at_ms {
            return AttentionOutcome::Ignored;
        }

        let latency_ms = u32::try_from(now_ms - self.shown_at_ms).unwrap_or(u32::MAX);
        let correct = color == stimulus.expected();
        self.latencies[self.answered] = latency_ms;
        self.answered += 1;
        if correct {
            self.correct += 1;
        }
        debug!(trial = self.answered, correct, latency_ms, "attention answer");

        if self.answered < ATTENTION_TRIALS {
            self.present(now_ms + INTER_TRIAL_GAP_MS);
            self.phase = TrialPhase::Presenting;
            return AttentionOutcome::Recorded {
                correct,
                latency_ms,
            };
        }

        let total = ATTENTION_TRIALS as u32;
        let accuracy = accuracy_percent(self.correct, total);
        let mean_latency_ms = floored_mean(&self.latencies);
        let result = TrialResult::new(
            TrialMetrics::AttentionSwitch {
                correct: self.correct,
                total,
                accuracy_percent: accuracy,
                mean_latency_ms,
            },
            score_attention_switch(accuracy, mean_latency_ms),
        );
        info!(
            correct = self.correct,
            accuracy,
            mean_latency_ms,
            score = result.normalized_score().value(),
            "attention switch scored"
        );

        self.stimulus = None;
        self.phase = TrialPhase::Done;
        self.result = Some(result.clone());
        AttentionOutcome::Completed(result)
    }

    fn present(&mut self, shown_at_ms: u64) {
        self.stimulus = Some(Stimulus::random(&mut self.rng));
        self.shown_at_ms = shown_at_ms;
    }
}
