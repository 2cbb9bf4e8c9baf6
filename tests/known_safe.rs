//! Tests that must not recover anything from non-leaking oracles.

use std::time::Duration;

use timing_recovery::helpers::{ConstantTimeOracle, EarlyExitOracle, Jittered};
use timing_recovery::{Aggregation, Alphabet, StallReason, State, TimingAttack};

/// Constant-time comparison: the run stalls at the first position.
#[test]
fn constant_time_comparison_stalls() {
    let oracle = ConstantTimeOracle::new("abc".chars(), Duration::from_millis(1));

    let report = TimingAttack::new(Alphabet::from_chars("abcdef").unwrap())
        .secret_length(3)
        .repetitions(5)
        .aggregation(Aggregation::Median)
        .max_stall_retries(1)
        .preflight(false)
        .run(&oracle)
        .unwrap();

    assert!(!report.is_complete(), "Should not recover from constant-time code");
    assert!(report.secret().is_none());
    match &report.state {
        State::Stalled {
            reason: StallReason::Ambiguous { attempts, .. },
            ..
        } => assert_eq!(*attempts, 2),
        other => panic!("expected a stall, got {:?}", other),
    }
    assert!(report.metadata.ambiguous_rounds >= 2);
}

/// With an unknown length, no signal at all never counts as an empty secret.
#[test]
fn constant_time_unknown_length_stalls() {
    let oracle = ConstantTimeOracle::new("ab".chars(), Duration::from_micros(500));

    let report = TimingAttack::new(Alphabet::from_chars("abcdefgh").unwrap())
        .unknown_length(8)
        .repetitions(5)
        .aggregation(Aggregation::Median)
        .max_stall_retries(0)
        .preflight(false)
        .run(&oracle)
        .unwrap();

    assert!(report.state.is_stalled());
}

/// Jitter far above the leak with a strict margin: declines instead of guessing.
#[test]
fn jitter_dominated_leak_stalls() {
    let oracle = Jittered::new(
        EarlyExitOracle::new("secret".chars(), Duration::from_micros(50)),
        Duration::from_millis(2),
    );

    let report = TimingAttack::new(Alphabet::lowercase_alphanumeric())
        .secret_length(6)
        .repetitions(1)
        .min_margin(50.0)
        .max_stall_retries(0)
        .preflight(false)
        .run(&oracle)
        .unwrap();

    assert_eq!(
        report.state.prefix().len(),
        0,
        "no position should pass a margin of 50 under heavy jitter"
    );
    assert!(report.state.is_stalled());
    assert!(report.trace.is_empty());
}
