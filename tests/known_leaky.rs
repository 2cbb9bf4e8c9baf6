//! Tests that must recover secrets from known timing leaks.

use std::time::Duration;

use timing_recovery::helpers::EarlyExitOracle;
use timing_recovery::{Aggregation, Alphabet, Polarity, Schedule, TimingAttack};

/// Early-exit comparison with a large per-character cost.
#[test]
fn recovers_early_exit_password() {
    let oracle =
        EarlyExitOracle::new("secret123".chars(), Duration::from_millis(2)).with_validation();

    let report = TimingAttack::new(Alphabet::lowercase_alphanumeric())
        .secret_length(9)
        .repetitions(1)
        .schedule(Schedule::Sequential)
        .preflight(false)
        .run(&oracle)
        .unwrap();

    assert_eq!(
        report.secret_string().as_deref(),
        Some("secret123"),
        "Should recover the password, got state {:?}",
        report.state.label()
    );
    assert_eq!(report.trace.len(), 9);
    for (i, round) in report.trace.iter().enumerate() {
        assert_eq!(round.position, i);
        assert_eq!(round.candidates.len(), 36);
    }
    assert!(report.confidence().unwrap() >= report.config.min_margin);
    assert!(report.metadata.probes >= 9 * 36);
}

/// The full-size scenario: 20 ms per matching character, one probe per candidate.
#[test]
#[ignore = "slow: about 26 s of oracle sleeps"]
fn recovers_password_with_20ms_leak() {
    let oracle = EarlyExitOracle::new("secret123".chars(), Duration::from_millis(20));

    let report = TimingAttack::new(Alphabet::lowercase_alphanumeric())
        .secret_length(9)
        .repetitions(1)
        .schedule(Schedule::Sequential)
        .preflight(false)
        .run(&oracle)
        .unwrap();

    assert_eq!(report.secret_string().as_deref(), Some("secret123"));
    assert_eq!(report.trace.len(), 9);
    assert_eq!(report.metadata.collection_rounds, 9);
}

/// A shorter configured length yields the matching prefix and nothing more.
#[test]
fn recovers_prefix_of_configured_length() {
    let oracle = EarlyExitOracle::new("secret123".chars(), Duration::from_millis(2));

    let report = TimingAttack::new(Alphabet::lowercase_alphanumeric())
        .secret_length(5)
        .repetitions(1)
        .schedule(Schedule::Sequential)
        .preflight(false)
        .run(&oracle)
        .unwrap();

    assert_eq!(report.state.prefix(), &['s', 'e', 'c', 'r', 'e']);
    assert!(report.is_complete());
    assert_eq!(report.trace.len(), 5);
}

/// Interleaved schedule with median aggregation and a mismatch penalty.
#[test]
fn recovers_bytes_with_interleaving() {
    let oracle = EarlyExitOracle::new([0x13u8, 0x37], Duration::from_millis(1))
        .mismatch_delay(Duration::from_micros(100));

    let report = TimingAttack::new(Alphabet::new(0u8..64).unwrap())
        .secret_length(2)
        .repetitions(3)
        .aggregation(Aggregation::Median)
        .seed(0xC0FFEE)
        .run(&oracle)
        .unwrap();

    assert_eq!(report.secret(), Some(&[0x13u8, 0x37][..]));
    assert!(report.metadata.preflight.is_some());
}

/// Matching candidates return faster than mismatching ones.
#[test]
fn recovers_with_faster_polarity() {
    let secret = ['c', 'a'];
    let oracle = |candidate: &[char]| {
        let matched = candidate
            .iter()
            .zip(&secret)
            .take_while(|(a, b)| a == b)
            .count();
        std::thread::sleep(Duration::from_millis(12 - 4 * matched as u64));
    };

    let report = TimingAttack::new(Alphabet::from_chars("abc").unwrap())
        .secret_length(2)
        .repetitions(2)
        .polarity(Polarity::FasterMatches)
        .preflight(false)
        .run(&oracle)
        .unwrap();

    assert_eq!(report.secret_string().as_deref(), Some("ca"));
}
