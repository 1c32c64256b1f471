//! Reaction-time protocol
//!
//! Five valid attempts. Each attempt waits a random delay before signalling
//! "go", then measures the latency of the response. Responding before the
//! signal is a false start: the attempt is discarded without penalty and the
//! test returns to idle.

use tracing::{debug, info};

use crate::random::RandomSource;
use crate::types::{TrialMetrics, TrialResult};

use super::normalize::{floored_mean, score_reaction_time};
use super::TrialPhase;

/// Valid attempts required to complete the test
pub const REACTION_ATTEMPTS: usize = 5;

/// Lower bound of the pre-signal delay (inclusive, ms)
pub const MIN_SIGNAL_DELAY_MS: u32 = 2000;

/// Upper bound of the pre-signal delay (exclusive, ms)
pub const MAX_SIGNAL_DELAY_MS: u32 = 5000;

/// Result of a response event
#[derive(Debug, Clone, PartialEq)]
pub enum ReactionOutcome {
    /// No attempt was running
    Ignored,
    /// Response arrived before the signal; the attempt does not count
    FalseStart,
    /// A valid attempt was recorded
    Recorded { reaction_ms: u32, attempt: usize },
    /// The fifth valid attempt completed the test
    Completed(TrialResult),
}

/// Reaction-time test state machine
#[derive(Debug)]
pub struct ReactionTimeTest<R> {
    rng: R,
    phase: TrialPhase,
    signal_at_ms: Option<u64>,
    reactions: [u32; REACTION_ATTEMPTS],
    recorded: usize,
    result: Option<TrialResult>,
}

impl<R: RandomSource> ReactionTimeTest<R> {
    pub fn new(rng: R) -> Self {
        Self {
            rng,
            phase: TrialPhase::Idle,
            signal_at_ms: None,
            reactions: [0; REACTION_ATTEMPTS],
            recorded: 0,
            result: None,
        }
    }

    pub fn phase(&self) -> TrialPhase {
        self.phase
    }

    /// Valid attempts recorded so far
    pub fn reactions(&self) -> &[u32] {
        &self.reactions[..self.recorded]
    }

    pub fn result(&self) -> Option<&TrialResult> {
        self.result.as_ref()
    }

    /// Begin an attempt. Returns the drawn delay, or `None` if an attempt is
    /// already running or the test is done.
    pub fn start_attempt(&mut self, now_ms: u64) -> Option<u32> {
        if self.phase != TrialPhase::Idle {
            return None;
        }

        let delay = self.rng.between(MIN_SIGNAL_DELAY_MS, MAX_SIGNAL_DELAY_MS);
        self.signal_at_ms = Some(now_ms + u64::from(delay));
        self.phase = TrialPhase::Presenting;
        debug!(attempt = self.recorded + 1, delay_ms = delay, "reaction attempt armed");
        Some(delay)
    }

    /// Advance the clock; shows the signal once the delay has elapsed
    pub fn tick(&mut self, now_ms: u64) -> TrialPhase {
        if self.phase == TrialPhase::Presenting && self.signal_due(now_ms) {
            self.phase = TrialPhase::AwaitingResponse;
        }
        self.phase
    }

    /// Register the user's response
    pub fn respond(&mut self, now_ms: u64) -> ReactionOutcome {
        let signal_at = match (self.phase, self.signal_at_ms) {
            (TrialPhase::Presenting | TrialPhase::AwaitingResponse, Some(at)) => at,
            _ => return ReactionOutcome::Ignored,
        };

        if now_ms < signal_at {
            debug!(early_by_ms = signal_at - now_ms, "false start");
            self.phase = TrialPhase::Idle;
            self.signal_at_ms = None;
            return ReactionOutcome::FalseStart;
        }

        let reaction_ms = u32::try_from(now_ms - signal_at).unwrap_or(u32::MAX);
        self.reactions[self.recorded] = reaction_ms;
        self.recorded += 1;
        self.signal_at_ms = None;

        if self.recorded < REACTION_ATTEMPTS {
            self.phase = TrialPhase::Idle;
            return ReactionOutcome::Recorded {
                reaction_ms,
                attempt: self.recorded,
            };
        }

        let mean_ms = floored_mean(&self.reactions);
        let result = TrialResult::new(
            TrialMetrics::ReactionTime {
                reactions_ms: self.reactions.to_vec(),
                mean_ms,
            },
            score_reaction_time(mean_ms),
        );
        info!(mean_ms, score = result.normalized_score().value(), "reaction time scored");

        self.phase = TrialPhase::Done;
        self.result = Some(result.clone());
        ReactionOutcome::Completed(result)
    }

    fn signal_due(&self, now_ms: u64) -> bool {
        self.signal_at_ms.is_some_and(|at| now_ms >= at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::{RngSource, ScriptedSource};
    use crate::types::SubScore;

    /// Run one attempt that responds `latency` ms after the signal
    fn attempt<R: RandomSource>(
        test: &mut ReactionTimeTest<R>,
        now: &mut u64,
        latency: u64,
    ) -> ReactionOutcome {
        let delay = test.start_attempt(*now).expect("test should be idle");
        *now += u64::from(delay);
        assert_eq!(test.tick(*now), TrialPhase::AwaitingResponse);
        *now += latency;
        let outcome = test.respond(*now);
        *now += 1000;
        outcome
    }

    #[test]
    fn test_five_attempts_complete_the_test() {
        let mut test = ReactionTimeTest::new(RngSource::seeded(1));
        let mut now = 0;

        for (i, latency) in [150, 180, 210, 190].into_iter().enumerate() {
            let outcome = attempt(&mut test, &mut now, latency);
            assert_eq!(
                outcome,
                ReactionOutcome::Recorded {
                    reaction_ms: latency as u32,
                    attempt: i + 1
                }
            );
        }

        match attempt(&mut test, &mut now, 170) {
            ReactionOutcome::Completed(result) => {
                assert_eq!(result.normalized_score(), SubScore::Excellent);
                assert_eq!(
                    result.metrics(),
                    &TrialMetrics::ReactionTime {
                        reactions_ms: vec![150, 180, 210, 190, 170],
                        mean_ms: 180,
                    }
                );
            }
            other => panic!("expected completion, got {other:?}"),
        }
        assert_eq!(test.phase(), TrialPhase::Done);
        assert!(test.result().is_some());
    }

    #[test]
    fn test_delay_is_drawn_from_window() {
        let mut test = ReactionTimeTest::new(ScriptedSource::new(&[0, 2999], &[]));
        assert_eq!(test.start_attempt(0), Some(2000));
        test.respond(0); // false start back to idle
        assert_eq!(test.start_attempt(0), Some(4999));
    }

    #[test]
    fn test_false_start_does_not_count() {
        let mut test = ReactionTimeTest::new(ScriptedSource::new(&[1000, 0], &[]));

        test.start_attempt(0);
        assert_eq!(test.phase(), TrialPhase::Presenting);
        assert_eq!(test.respond(2500), ReactionOutcome::FalseStart);
        assert_eq!(test.phase(), TrialPhase::Idle);
        assert!(test.reactions().is_empty());

        // Next attempt is still attempt #1
        let delay = test.start_attempt(5000).unwrap();
        assert_eq!(delay, 2000);
        assert_eq!(
            test.respond(7300),
            ReactionOutcome::Recorded {
                reaction_ms: 300,
                attempt: 1
            }
        );
    }

    #[test]
    fn test_response_after_signal_without_tick_is_valid() {
        let mut test = ReactionTimeTest::new(ScriptedSource::new(&[0], &[]));
        test.start_attempt(100);
        assert_eq!(
            test.respond(2350),
            ReactionOutcome::Recorded {
                reaction_ms: 250,
                attempt: 1
            }
        );
    }

    #[test]
    fn test_response_when_idle_is_ignored() {
        let mut test = ReactionTimeTest::new(RngSource::seeded(3));
        assert_eq!(test.respond(10), ReactionOutcome::Ignored);
        assert_eq!(test.tick(10), TrialPhase::Idle);
    }

    #[test]
    fn test_cannot_start_twice() {
        let mut test = ReactionTimeTest::new(RngSource::seeded(3));
        assert!(test.start_attempt(0).is_some());
        assert!(test.start_attempt(10).is_none());
    }

    #[test]
    fn test_done_ignores_further_events() {
        let mut test = ReactionTimeTest::new(RngSource::seeded(9));
        let mut now = 0;
        for _ in 0..REACTION_ATTEMPTS {
            attempt(&mut test, &mut now, 650);
        }
        assert_eq!(test.result().unwrap().normalized_score(), SubScore::Poor);
        assert!(test.start_attempt(now).is_none());
        assert_eq!(test.respond(now), ReactionOutcome::Ignored);
    }
}
