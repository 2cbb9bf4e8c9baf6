//! Terminal output formatting with colors and box drawing.

use colored::Colorize;

use crate::analysis::Selection;
use crate::result::{AttackReport, FailureReason, RoundRecord, StallReason, State};
use crate::types::Symbol;

const BAR_WIDTH: usize = 40;

/// Format an [`AttackReport`] for human-readable terminal output.
pub fn format_report<S: Symbol>(report: &AttackReport<S>) -> String {
    let mut output = String::new();
    let sep = "\u{2500}".repeat(62);

    output.push_str("timing-recovery\n");
    output.push_str(&sep);
    output.push_str("\n\n");

    output.push_str(&format!(
        "  Probes: {} in {} rounds ({:.2} s)\n",
        report.metadata.probes, report.metadata.collection_rounds, report.metadata.runtime_secs
    ));
    output.push_str(&format!(
        "  Timer resolution: {:.1} ns\n",
        report.metadata.timer_resolution_ns
    ));
    if report.metadata.timed_out_probes > 0 {
        output.push_str(&format!(
            "  {}\n",
            format!(
                "\u{26A0} {} probes timed out ({} abandoned)",
                report.metadata.timed_out_probes, report.metadata.abandoned_probes
            )
            .yellow()
        ));
    }
    output.push('\n');

    output.push_str(&format!("  {}\n\n", format_state(&report.state)));

    if !report.trace.is_empty() {
        output.push_str("    Pos  Symbol       Margin  Reps  Tries\n");
        for round in report.trace.iter() {
            let symbol = round
                .winner()
                .map(|s| format!("{:?}", s))
                .unwrap_or_default();
            output.push_str(&format!(
                "    {:>3}  {:<10} {:>8}  {:>4}  {:>5}\n",
                round.position,
                symbol,
                format_margin(round.margin(), report.config.min_margin),
                round.repetitions,
                round.attempt + 1,
            ));
        }
        output.push('\n');
    }

    if let Some(weakest) = report.confidence() {
        output.push_str(&format!("    Weakest margin: {:.1}\n", weakest));
    }
    if report.metadata.ambiguous_rounds > 0 {
        output.push_str(&format!(
            "    Ambiguous rounds: {}\n",
            report.metadata.ambiguous_rounds
        ));
    }

    if let Some(preflight) = &report.metadata.preflight {
        for description in preflight.descriptions() {
            output.push_str(&format!("    {} {}\n", "\u{26A0}".yellow(), description));
        }
    }

    output.push('\n');
    output.push_str(&sep);
    output.push('\n');
    output.push_str("Note: Margins are in units of measurement noise; larger is safer.\n");

    output
}

/// Render one round's candidate latencies as a horizontal bar chart.
///
/// Bars are scaled between the fastest and slowest candidate; the accepted
/// symbol is highlighted.
pub fn format_round_distribution<S: Symbol>(round: &RoundRecord<S>) -> String {
    let mut output = String::new();
    output.push_str(&format!(
        "Position {} (attempt {}, {} reps, margin {:.1})\n",
        round.position,
        round.attempt + 1,
        round.repetitions,
        round.margin()
    ));

    let (lo, hi) = round
        .candidates
        .iter()
        .map(|c| c.statistic.center)
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), x| (lo.min(x), hi.max(x)));
    let range = hi - lo;

    let highlighted = match round.selection {
        Selection::Winner { symbol, .. } => Some(symbol),
        Selection::Ambiguous { best, .. } => best,
    };

    for candidate in &round.candidates {
        let fraction = if range > 0.0 {
            (candidate.statistic.center - lo) / range
        } else {
            0.0
        };
        let len = 1 + (fraction * (BAR_WIDTH - 1) as f64).round() as usize;
        let bar = "\u{2588}".repeat(len);
        let label = format!("{:>8?}", candidate.symbol);
        let line = format!(
            "  {} \u{2502}{:<width$} {}\n",
            label,
            bar,
            format_latency(candidate.statistic.center),
            width = BAR_WIDTH
        );
        if Some(candidate.symbol) == highlighted {
            match round.selection {
                Selection::Winner { .. } => output.push_str(&line.green().bold().to_string()),
                Selection::Ambiguous { .. } => output.push_str(&line.yellow().to_string()),
            }
        } else {
            output.push_str(&line);
        }
    }

    output
}

fn format_state<S: Symbol>(state: &State<S>) -> String {
    let prefix = format!("{:?}", state.prefix());
    match state {
        State::Complete { .. } => format!("{} {}", "\u{2713} Recovered".green().bold(), prefix),
        State::InProgress { .. } => format!("{} {}", "\u{2026} In progress".cyan(), prefix),
        State::Stalled {
            reason: StallReason::Ambiguous { position, margin, attempts, repetitions },
            ..
        } => format!(
            "{} at position {} after {} attempts (margin {:.2} at {} reps)\n    Prefix: {}",
            "\u{26A0} Stalled".yellow().bold(),
            position,
            attempts,
            margin,
            repetitions,
            prefix
        ),
        State::Failed { reason, .. } => {
            let why = match reason {
                FailureReason::Cancelled => "cancelled",
                FailureReason::ValidationMismatch => "oracle rejected the reconstruction",
            };
            format!("{} ({})\n    Prefix: {}", "\u{2717} Failed".red().bold(), why, prefix)
        }
    }
}

fn format_margin(margin: f64, min_margin: f64) -> String {
    let text = if margin >= 1e6 {
        format!("{:.1e}", margin)
    } else {
        format!("{:.1}", margin)
    };
    if margin >= 2.0 * min_margin {
        text.green().to_string()
    } else {
        text.yellow().to_string()
    }
}

fn format_latency(secs: f64) -> String {
    if secs >= 1.0 {
        format!("{:.3} s", secs)
    } else if secs >= 1e-3 {
        format!("{:.3} ms", secs * 1e3)
    } else if secs >= 1e-6 {
        format!("{:.3} \u{00B5}s", secs * 1e6)
    } else {
        format!("{:.0} ns", secs * 1e9)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::result::{CandidateRecord, Metadata, Trace};
    use crate::statistics::CandidateStatistic;

    fn stat(center: f64) -> CandidateStatistic {
        CandidateStatistic {
            count: 1,
            timed_out: 0,
            center,
            spread: None,
            standard_error: None,
            min: center,
            max: center,
        }
    }

    fn round(selection: Selection<char>) -> RoundRecord<char> {
        RoundRecord {
            position: 2,
            attempt: 0,
            repetitions: 5,
            candidates: vec![
                CandidateRecord { symbol: 'a', statistic: stat(0.040) },
                CandidateRecord { symbol: 'b', statistic: stat(0.060) },
                CandidateRecord { symbol: 'c', statistic: stat(0.041) },
            ],
            selection,
        }
    }

    fn make_report(state: State<char>) -> AttackReport<char> {
        let mut trace = Trace::new();
        trace.push(round(Selection::Winner { symbol: 'b', margin: 25.0 }));
        AttackReport {
            state,
            trace,
            ambiguous: Vec::new(),
            metadata: Metadata {
                timer_resolution_ns: 25.0,
                probes: 15,
                timed_out_probes: 0,
                abandoned_probes: 0,
                collection_rounds: 1,
                ambiguous_rounds: 0,
                runtime_secs: 0.7,
                preflight: None,
            },
            config: Config::default(),
        }
    }

    #[test]
    fn test_format_complete_report() {
        let output = format_report(&make_report(State::Complete { prefix: vec!['b'] }));
        assert!(output.contains("timing-recovery"));
        assert!(output.contains("Recovered"));
        assert!(output.contains("Weakest margin: 25.0"));
        assert!(output.contains("'b'"));
    }

    #[test]
    fn test_format_stalled_report() {
        let state = State::Stalled {
            prefix: vec!['b'],
            reason: StallReason::Ambiguous {
                position: 1,
                margin: 0.8,
                attempts: 3,
                repetitions: 20,
            },
        };
        let output = format_report(&make_report(state));
        assert!(output.contains("Stalled"));
        assert!(output.contains("position 1 after 3 attempts"));
    }

    #[test]
    fn test_format_failed_report() {
        let state = State::Failed {
            prefix: vec!['b'],
            reason: FailureReason::ValidationMismatch,
        };
        let output = format_report(&make_report(state));
        assert!(output.contains("Failed"));
        assert!(output.contains("rejected"));
    }

    #[test]
    fn test_round_distribution_scales_bars() {
        colored::control::set_override(false);
        let output = format_round_distribution(&round(Selection::Winner { symbol: 'b', margin: 25.0 }));
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].contains("Position 2"));

        let bar_len = |line: &str| line.chars().filter(|&c| c == '\u{2588}').count();
        assert_eq!(bar_len(lines[1]), 1);
        assert_eq!(bar_len(lines[2]), BAR_WIDTH);
        assert!(bar_len(lines[3]) > 1 && bar_len(lines[3]) < BAR_WIDTH);
        assert!(lines[2].contains("60.000 ms"));
    }

    #[test]
    fn test_format_latency_units() {
        assert_eq!(format_latency(2.5), "2.500 s");
        assert_eq!(format_latency(0.0205), "20.500 ms");
        assert_eq!(format_latency(3e-6), "3.000 \u{00B5}s");
        assert_eq!(format_latency(4e-8), "40 ns");
    }
}
