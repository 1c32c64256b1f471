//! Memory-match protocol
//!
//! Eight symbols, each duplicated, shuffled face-down onto 16 positions. A move
//! reveals two positions: equal symbols stay matched, anything else is hidden
//! again after a short delay. The game ends when every pair is matched.

use tracing::{debug, info};

use crate::random::RandomSource;
use crate::types::{TrialMetrics, TrialResult};

use super::normalize::score_memory_match;
use super::TrialPhase;

/// Distinct symbols on the board
pub const PAIR_COUNT: usize = 8;

/// Positions on the board
pub const CARD_COUNT: usize = PAIR_COUNT * 2;

/// How long a mismatched pair stays face-up (ms)
pub const MISMATCH_HIDE_DELAY_MS: u64 = 1000;

/// Result of revealing a position
#[derive(Debug, Clone, PartialEq)]
pub enum RevealOutcome {
    /// Not playable right now (not started, already face-up, pair still showing)
    Ignored,
    /// First card of a move is face-up
    Revealed,
    /// The move found a pair
    Matched { pairs_found: usize },
    /// The move revealed two different symbols
    Mismatched,
    /// The last pair was found
    Completed(TrialResult),
}

#[derive(Debug, Clone, Copy)]
struct PendingHide {
    first: usize,
    second: usize,
    hide_at_ms: u64,
}

/// Memory-match game state machine
#[derive(Debug, Clone)]
pub struct MemoryMatchTest {
    cards: [u8; CARD_COUNT],
    matched: [bool; CARD_COUNT],
    face_up: Option<usize>,
    pending: Option<PendingHide>,
    moves: u32,
    pairs_found: usize,
    started_at_ms: Option<u64>,
    phase: TrialPhase,
    result: Option<TrialResult>,
}

impl MemoryMatchTest {
    /// Deal a freshly shuffled board
    pub fn new<R: RandomSource>(rng: &mut R) -> Self {
        let mut cards = [0u8; CARD_COUNT];
        for (i, card) in cards.iter_mut().enumerate() {
            *card = (i % PAIR_COUNT) as u8;
        }
        rng.shuffle(&mut cards);
        Self::with_layout(cards)
    }

    fn with_layout(cards: [u8; CARD_COUNT]) -> Self {
        Self {
            cards,
            matched: [false; CARD_COUNT],
            face_up: None,
            pending: None,
            moves: 0,
            pairs_found: 0,
            started_at_ms: None,
            phase: TrialPhase::Idle,
            result: None,
        }
    }

    pub fn phase(&self) -> TrialPhase {
        self.phase
    }

    pub fn moves(&self) -> u32 {
        self.moves
    }

    pub fn pairs_found(&self) -> usize {
        self.pairs_found
    }

    /// Symbol id (0-7) at a position
    pub fn symbol_at(&self, index: usize) -> Option<u8> {
        self.cards.get(index).copied()
    }

    /// Whether a position is currently shown to the player
    pub fn is_face_up(&self, index: usize) -> bool {
        if index >= CARD_COUNT {
            return false;
        }
        self.matched[index]
            || self.face_up == Some(index)
            || self
                .pending
                .is_some_and(|p| p.first == index || p.second == index)
    }

    pub fn result(&self) -> Option<&TrialResult> {
        self.result.as_ref()
    }

    /// Start the clock. Returns `false` if the game was already started.
    pub fn start(&mut self, now_ms: u64) -> bool {
        if self.phase != TrialPhase::Idle {
            return false;
        }
        self.started_at_ms = Some(now_ms);
        self.phase = TrialPhase::AwaitingResponse;
        true
    }

    /// Advance the clock; hides a mismatched pair once its delay has elapsed
    pub fn tick(&mut self, now_ms: u64) -> TrialPhase {
        if let Some(pending) = self.pending {
            if now_ms >= pending.hide_at_ms {
                self.pending = None;
                self.phase = TrialPhase::AwaitingResponse;
            }
        }
        self.phase
    }

    /// Reveal the card at `index`
    pub fn reveal(&mut self, index: usize, now_ms: u64) -> RevealOutcome {
        let started_at = match self.started_at_ms {
            Some(at) if self.phase != TrialPhase::Done => at,
            _ => return RevealOutcome::Ignored,
        };

        if self.tick(now_ms) == TrialPhase::Presenting {
            return RevealOutcome::Ignored;
        }
        if index >= CARD_COUNT || self.matched[index] || self.face_up == Some(index) {
            return RevealOutcome::Ignored;
        }

        let first = match self.face_up.take() {
            None => {
                self.face_up = Some(index);
                return RevealOutcome::Revealed;
            }
            Some(first) => first,
        };

        self.moves += 1;

        if self.cards[first] != self.cards[index] {
            debug!(move_no = self.moves, first, second = index, "mismatch");
            self.pending = Some(PendingHide {
                first,
                second: index,
                hide_at_ms: now_ms + MISMATCH_HIDE_DELAY_MS,
            });
            self.phase = TrialPhase::Presenting;
            return RevealOutcome::Mismatched;
        }

        self.matched[first] = true;
        self.matched[index] = true;
        self.pairs_found += 1;
        debug!(move_no = self.moves, pairs_found = self.pairs_found, "pair matched");

        if self.pairs_found < PAIR_COUNT {
            return RevealOutcome::Matched {
                pairs_found: self.pairs_found,
            };
        }

        let elapsed_seconds =
            u32::try_from(now_ms.saturating_sub(started_at) / 1000).unwrap_or(u32::MAX);
        let result = TrialResult::new(
            TrialMetrics::MemoryMatch {
                moves: self.moves,
                elapsed_seconds,
            },
            score_memory_match(elapsed_seconds, self.moves),
        );
        info!(
            moves = self.moves,
            elapsed_seconds,
            score = result.normalized_score().value(),
            "memory match scored"
        );

        self.phase = TrialPhase::Done;
        self.result = Some(result.clone());
        RevealOutcome::Completed(result)
    }
}
