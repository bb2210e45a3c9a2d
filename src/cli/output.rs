//! Output formatting utilities for CLI.

use std::fmt::Write;

use serde::Serialize;
use tankland::behavior::Rejected;
use tankland::{AdmissionReport, MatchOutcome, Snapshot, TankStatus};

/// JSON-serializable match result.
#[derive(Debug, Serialize)]
pub(super) struct MatchSummary {
    /// Placement seed.
    pub(super) seed: u64,
    /// Board side length.
    pub(super) board_size: u16,
    /// How the match ended.
    pub(super) outcome: MatchOutcome,
    /// Whether the match was cut short by the timeout.
    pub(super) timed_out: bool,
    /// Tanks that started.
    pub(super) admitted: Vec<String>,
    /// Roster entries turned away.
    pub(super) rejected: Vec<JsonRejection>,
    /// Tanks alive when the match ended.
    pub(super) survivors: Vec<TankStatus>,
    /// Number of event log entries.
    pub(super) events: usize,
}

/// JSON-serializable roster rejection.
#[derive(Debug, Serialize)]
pub(super) struct JsonRejection {
    /// Tank name.
    name: String,
    /// Requested behavior kind.
    kind: String,
    /// Why it was turned away.
    reason: String,
}

impl JsonRejection {
    fn from_rejected(rejected: &Rejected) -> Self {
        Self {
            name: rejected.entry.name.clone(),
            kind: rejected.entry.kind.clone(),
            reason: rejected.reason.to_string(),
        }
    }
}

impl MatchSummary {
    /// Build from the admission report and the final board.
    pub(super) fn new(
        seed: u64,
        report: &AdmissionReport,
        outcome: MatchOutcome,
        timed_out: bool,
        last: &Snapshot,
        events: usize,
    ) -> Self {
        Self {
            seed,
            board_size: last.size,
            outcome,
            timed_out,
            admitted: report.admitted.iter().map(|e| e.name.clone()).collect(),
            rejected: report.rejected.iter().map(JsonRejection::from_rejected).collect(),
            survivors: last.tanks.clone(),
            events,
        }
    }
}

/// Format a match result as human-readable text.
pub(super) fn format_text(summary: &MatchSummary) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "Match Result (seed: {})", summary.seed);
    match &summary.outcome {
        MatchOutcome::Winner(name) => {
            let _ = writeln!(output, "  Winner: {name}");
        }
        MatchOutcome::Destroyed => output.push_str("  Winner: none, every tank was destroyed\n"),
        MatchOutcome::Running if summary.timed_out => output.push_str("  Winner: none, timed out\n"),
        MatchOutcome::Running => output.push_str("  Winner: undecided\n"),
    }
    let _ = writeln!(output, "  Tanks: {}", summary.admitted.join(", "));
    let _ = writeln!(output, "  Events logged: {}\n", summary.events);

    for rejected in &summary.rejected {
        let _ = writeln!(
            output,
            "  Rejected {}={}: {}",
            rejected.name, rejected.kind, rejected.reason
        );
    }

    for tank in &summary.survivors {
        let _ = writeln!(
            output,
            "  {} survived with {} HP and {} energy at {}",
            tank.name, tank.health, tank.energy, tank.location
        );
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use tankland::error::AdmissionError;
    use tankland::{Location, RosterEntry};

    fn report() -> AdmissionReport {
        AdmissionReport {
            admitted: vec![
                RosterEntry {
                    name: "alpha".to_owned(),
                    kind: "sniper".to_owned(),
                },
                RosterEntry {
                    name: "beta".to_owned(),
                    kind: "miner".to_owned(),
                },
            ],
            rejected: vec![Rejected {
                entry: RosterEntry {
                    name: "gamma".to_owned(),
                    kind: "cheater".to_owned(),
                },
                reason: AdmissionError::UnknownKind("cheater".to_owned()),
            }],
        }
    }

    fn last_board() -> Snapshot {
        Snapshot {
            size: 10,
            cells: Vec::new(),
            tanks: vec![TankStatus {
                name: "alpha".to_owned(),
                health: 40,
                energy: 12,
                shield: 0.0,
                location: Location::new(3, 4),
            }],
        }
    }

    #[test]
    fn test_format_text_names_winner() {
        let summary = MatchSummary::new(
            7,
            &report(),
            MatchOutcome::Winner("alpha".to_owned()),
            false,
            &last_board(),
            12,
        );
        let text = format_text(&summary);

        assert!(text.contains("seed: 7"));
        assert!(text.contains("Winner: alpha"));
        assert!(text.contains("Tanks: alpha, beta"));
        assert!(text.contains("Rejected gamma=cheater"));
        assert!(text.contains("alpha survived with 40 HP"));
    }

    #[test]
    fn test_json_shape() {
        let summary = MatchSummary::new(1, &report(), MatchOutcome::Destroyed, false, &Snapshot::default(), 3);
        let json = serde_json::to_value(&summary).unwrap();

        assert_eq!(json["outcome"], "destroyed");
        assert_eq!(json["rejected"][0]["name"], "gamma");
        assert_eq!(json["events"], 3);
    }
}
