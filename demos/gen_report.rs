//! Generate a report envelope from a simulated session
//!
//! Plays the four cognitive sub-tests with a seeded simulated player, then
//! runs the full session and prints the encoded report.
//!
//! Usage: cargo run --example gen_report -- [seed]

use stress_gauge::cognitive::attention::INTER_TRIAL_GAP_MS;
use stress_gauge::cognitive::one_back::{ONE_BACK_LENGTH, PRESENTATION_MS};
use stress_gauge::cognitive::{
    AttentionOutcome, AttentionSwitchTest, Color, MemoryMatchTest, OneBackAnswer, OneBackTest,
    ReactionOutcome, ReactionTimeTest, RevealOutcome,
};
use stress_gauge::health::HealthForm;
use stress_gauge::pipeline::record_emotion_response;
use stress_gauge::random::{RandomSource, RngSource};
use stress_gauge::types::Sex;
use stress_gauge::{AssessmentError, AssessmentSession, ReportEncoder, TrialResult};

fn reaction_time(seed: u64, player: &mut impl RandomSource) -> Option<TrialResult> {
    let mut test = ReactionTimeTest::new(RngSource::seeded(seed));
    let mut now = 0u64;
    loop {
        let delay = test.start_attempt(now)?;
        now += u64::from(delay + player.between(220, 420));
        test.tick(now);
        match test.respond(now) {
            ReactionOutcome::Completed(result) => return Some(result),
            ReactionOutcome::Ignored => return None,
            _ => now += 1000,
        }
    }
}

fn memory_match(seed: u64) -> Option<TrialResult> {
    let mut test = MemoryMatchTest::new(&mut RngSource::seeded(seed));
    let mut now = 0u64;
    test.start(now);

    // One early miss, then play from perfect recall
    now += 900;
    test.reveal(0, now);
    let miss = (1..16).find(|&i| test.symbol_at(i) != test.symbol_at(0))?;
    now += 900;
    test.reveal(miss, now);
    now += 1200;

    for symbol in 0..8u8 {
        let mut positions = (0..16).filter(|&i| test.symbol_at(i) == Some(symbol));
        let (first, second) = (positions.next()?, positions.next()?);
        now += 800;
        test.reveal(first, now);
        now += 800;
        if let RevealOutcome::Completed(result) = test.reveal(second, now) {
            return Some(result);
        }
    }
    None
}

fn one_back(seed: u64, player: &mut impl RandomSource) -> Option<TrialResult> {
    let mut test = OneBackTest::new(&mut RngSource::seeded(seed));
    let sequence = *test.sequence();
    test.start(0);

    for position in 1..ONE_BACK_LENGTH {
        let is_repeat = sequence[position] == sequence[position - 1];
        // Misses roughly one letter in seven
        let answer = if is_repeat != player.chance(0.15) {
            OneBackAnswer::Match
        } else {
            OneBackAnswer::Different
        };
        let now = position as u64 * PRESENTATION_MS + u64::from(player.between(400, 1500));
        test.respond(answer, now);
    }

    test.tick(ONE_BACK_LENGTH as u64 * PRESENTATION_MS);
    test.result().cloned()
}

fn attention_switch(seed: u64, player: &mut impl RandomSource) -> Option<TrialResult> {
    let mut test = AttentionSwitchTest::new(RngSource::seeded(seed));
    let mut now = 0u64;
    test.start(now);

    loop {
        let expected = match test.current_stimulus() {
            Some(stimulus) => stimulus.expected(),
            None => {
                now += INTER_TRIAL_GAP_MS;
                test.tick(now);
                continue;
            }
        };
        let answer = if player.chance(0.9) {
            expected
        } else {
            Color::ALL[player.below(4) as usize]
        };
        now += u64::from(player.between(700, 1400));
        if let AttentionOutcome::Completed(result) = test.answer(answer, now) {
            return Some(result);
        }
    }
}

fn run(seed: u64) -> Result<String, AssessmentError> {
    let mut player = RngSource::seeded(seed.wrapping_add(100));
    let trials = [
        reaction_time(seed, &mut player),
        memory_match(seed.wrapping_add(1)),
        one_back(seed.wrapping_add(2), &mut player),
        attention_switch(seed.wrapping_add(3), &mut player),
    ]
    .into_iter()
    .collect::<Option<Vec<_>>>()
    .ok_or_else(|| AssessmentError::IncompleteCognitive("simulated player stalled".to_string()))?;

    let response = serde_json::json!({
        "dominant_emotion": "neutral",
        "confidence": 71.3,
        "emotions": { "neutral": 71.3, "sad": 18.2, "happy": 10.5 }
    });

    let mut session = AssessmentSession::new();
    record_emotion_response(&mut session, Some(&response))?;
    session.complete_cognitive(trials)?;
    session.submit_health(&HealthForm {
        systolic: Some(128),
        diastolic: Some(84),
        heart_rate: Some(78),
        blood_sugar: Some(96),
        age: Some(38),
        sex: Sex::Female,
    })?;

    let report = session
        .into_report()
        .ok_or_else(|| AssessmentError::EncodingError("no report produced".to_string()))?;
    ReportEncoder::with_instance_id(format!("demo-{seed}")).encode_to_json(&report)
}

fn main() {
    let seed = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(7);

    match run(seed) {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("Error: {e}"),
    }
}
