//! Sequential-recall (1-back) protocol
//!
//! Twenty letters are shown one every two seconds. From the second letter on,
//! the player answers whether the current letter matches the previous one.
//! Each position accepts one answer before the next letter appears; an
//! unanswered position counts as incorrect.

use tracing::{debug, info};

use crate::random::RandomSource;
use crate::types::{TrialMetrics, TrialResult};

use super::normalize::{accuracy_percent, score_one_back};
use super::TrialPhase;

/// Letters presented per run
pub const ONE_BACK_LENGTH: usize = 20;

/// Positions that take an answer (all but the first)
pub const ONE_BACK_RESPONSES: usize = ONE_BACK_LENGTH - 1;

/// Time each letter stays on screen (ms)
pub const PRESENTATION_MS: u64 = 2000;

/// Probability that a position repeats the previous letter
pub const REPEAT_PROBABILITY: f64 = 0.3;

/// Stimulus alphabet
pub const ALPHABET: [char; 8] = ['A', 'B', 'C', 'D', 'E', 'F', 'G', 'H'];

/// Player's judgement of the current position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OneBackAnswer {
    Match,
    Different,
}

/// Result of an answer event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OneBackOutcome {
    /// Not answerable (first letter, already answered, not running)
    Ignored,
    Recorded { correct: bool },
}

/// Generate a sequence with roughly 30% adjacent repeats.
///
/// A non-repeating position draws uniformly from the alphabet minus the
/// previous letter, so adjacency only occurs through the repeat branch.
pub fn generate_sequence<R: RandomSource>(rng: &mut R) -> [char; ONE_BACK_LENGTH] {
    let mut sequence = [ALPHABET[0]; ONE_BACK_LENGTH];
    sequence[0] = ALPHABET[rng.below(ALPHABET.len() as u32) as usize];

    for i in 1..ONE_BACK_LENGTH {
        let previous = sequence[i - 1];
        sequence[i] = if rng.chance(REPEAT_PROBABILITY) {
            previous
        } else {
            let pick = rng.below(ALPHABET.len() as u32 - 1) as usize;
            ALPHABET
                .iter()
                .copied()
                .filter(|&c| c != previous)
                .nth(pick)
                .unwrap_or(previous)
        };
    }
    sequence
}

/// 1-back test state machine
#[derive(Debug, Clone)]
pub struct OneBackTest {
    sequence: [char; ONE_BACK_LENGTH],
    answers: [Option<bool>; ONE_BACK_LENGTH],
    position: usize,
    started_at_ms: Option<u64>,
    phase: TrialPhase,
    result: Option<TrialResult>,
}

impl OneBackTest {
    pub fn new<R: RandomSource>(rng: &mut R) -> Self {
        Self::with_sequence(generate_sequence(rng))
    }

    pub fn with_sequence(sequence: [char; ONE_BACK_LENGTH]) -> Self {
        Self {
            sequence,
            answers: [None; ONE_BACK_LENGTH],
            position: 0,
            started_at_ms: None,
            phase: TrialPhase::Idle,
            result: None,
        }
    }

    pub fn phase(&self) -> TrialPhase {
        self.phase
    }

    pub fn sequence(&self) -> &[char; ONE_BACK_LENGTH] {
        &self.sequence
    }

    /// Letter on screen, while running
    pub fn current_symbol(&self) -> Option<char> {
        match self.phase {
            TrialPhase::Presenting | TrialPhase::AwaitingResponse => {
                Some(self.sequence[self.position])
            }
            _ => None,
        }
    }

    /// `(correct, answered)` so far
    pub fn progress(&self) -> (u32, u32) {
        let answered = self.answers.iter().flatten().count() as u32;
        (self.correct_count(), answered)
    }

    pub fn result(&self) -> Option<&TrialResult> {
        self.result.as_ref()
    }

    /// Show the first letter. Returns `false` if already started.
    pub fn start(&mut self, now_ms: u64) -> bool {
        if self.phase != TrialPhase::Idle {
            return false;
        }
        self.started_at_ms = Some(now_ms);
        self.position = 0;
        self.phase = TrialPhase::Presenting;
        true
    }

    /// Advance the clock: moves to the letter due at `now_ms`, and scores the
    /// run once the last letter's window has closed.
    pub fn tick(&mut self, now_ms: u64) -> TrialPhase {
        let started_at = match self.started_at_ms {
            Some(at) if !matches!(self.phase, TrialPhase::Done) => at,
            _ => return self.phase,
        };

        let due = (now_ms.saturating_sub(started_at) / PRESENTATION_MS) as usize;
        if due >= ONE_BACK_LENGTH {
            self.finish();
        } else if due != self.position {
            self.position = due;
            self.phase = if due == 0 {
                TrialPhase::Presenting
            } else {
                TrialPhase::AwaitingResponse
            };
        }
        self.phase
    }

    /// Answer for the letter currently shown.
    ///
    /// Each letter's window is half-open: an answer stamped exactly at the next
    /// presentation belongs to the new letter.
    pub fn respond(&mut self, answer: OneBackAnswer, now_ms: u64) -> OneBackOutcome {
        if self.tick(now_ms) != TrialPhase::AwaitingResponse {
            return OneBackOutcome::Ignored;
        }
        if self.answers[self.position].is_some() {
            return OneBackOutcome::Ignored;
        }

        let is_repeat = self.sequence[self.position] == self.sequence[self.position - 1];
        let correct = (answer == OneBackAnswer::Match) == is_repeat;
        self.answers[self.position] = Some(correct);
        debug!(position = self.position, correct, "1-back answer");
        OneBackOutcome::Recorded { correct }
    }

    fn correct_count(&self) -> u32 {
        self.answers.iter().filter(|a| **a == Some(true)).count() as u32
    }

    fn finish(&mut self) {
        let correct = self.correct_count();
        let total = ONE_BACK_RESPONSES as u32;
        let accuracy = accuracy_percent(correct, total);
        let result = TrialResult::new(
            TrialMetrics::OneBack {
                correct,
                total,
                accuracy_percent: accuracy,
            },
            score_one_back(accuracy),
        );
        info!(correct, accuracy, score = result.normalized_score().value(), "1-back scored");

        self.phase = TrialPhase::Done;
        self.result = Some(result);
    }
}
