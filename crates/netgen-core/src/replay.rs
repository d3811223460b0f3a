//! Replay an instruction sequence through the classifier and the updaters.
//!
//! Used to audit files the generator (or anything else) produced: which
//! outcomes they exercise, and whether the mirrored state stays consistent.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::catalog::Outcome;
use crate::classify::classify;
use crate::coverage::{CoverageReport, CoverageTracker};
use crate::instruction::{Instruction, ParseError, parse};
use crate::invariants::{self, InvariantViolation};
use crate::model::Network;
use crate::update;

/// Per-command outcome tally.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CommandTally {
    pub normal: usize,
    pub failed: usize,
}

/// An instruction the classifier could not place in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnmodeledStep {
    /// Zero-based instruction index.
    pub index: usize,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplayReport {
    pub instructions: usize,
    pub lines: usize,
    /// Keyed by alias.
    pub per_command: BTreeMap<&'static str, CommandTally>,
    pub coverage: CoverageReport,
    pub unmodeled: Vec<UnmodeledStep>,
    /// Violations found in the final state.
    pub violations: Vec<InvariantViolation>,
}

impl ReplayReport {
    /// Whether every step was classified and the final state is consistent.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.unmodeled.is_empty() && self.violations.is_empty()
    }
}

/// Replay `instructions` from an empty network.
///
/// Instructions that fail are not applied. Unmodeled instructions are listed
/// and skipped.
#[must_use]
pub fn replay(instructions: &[Instruction]) -> ReplayReport {
    let mut net = Network::new();
    let mut coverage = CoverageTracker::new();
    let mut per_command: BTreeMap<&'static str, CommandTally> = BTreeMap::new();
    let mut unmodeled = Vec::new();

    for (index, instruction) in instructions.iter().enumerate() {
        let command = instruction.kind();
        match classify(&net, instruction) {
            Ok(Outcome::Normal) => {
                update::apply(&mut net, instruction);
                coverage.record_success(command);
                per_command.entry(command.alias()).or_default().normal += 1;
            }
            Ok(Outcome::Failure(key)) => {
                coverage.record_failure(key);
                per_command.entry(command.alias()).or_default().failed += 1;
            }
            Err(err) => unmodeled.push(UnmodeledStep {
                index,
                reason: err.to_string(),
            }),
        }
    }

    ReplayReport {
        instructions: instructions.len(),
        lines: instructions.iter().map(Instruction::line_count).sum(),
        per_command,
        coverage: coverage.report(),
        unmodeled,
        violations: invariants::check_all(&net).violations,
    }
}

/// Parse protocol text and replay it.
///
/// # Errors
///
/// Returns [`ParseError`] if `text` is not valid protocol.
pub fn replay_text(text: &str) -> Result<ReplayReport, ParseError> {
    Ok(replay(&parse(text)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
ln 2
1 2
a b
20 30
4
ap 1 dup 3
qv 1 2
mr 1 2 -4
qv 1 2
qm 7
";

    #[test]
    fn tallies_outcomes_per_command() {
        let report = replay_text(SAMPLE).expect("parse");
        assert_eq!(report.instructions, 6);
        assert_eq!(report.lines, 10);
        assert_eq!(report.per_command.get("ln"), Some(&CommandTally { normal: 1, failed: 0 }));
        assert_eq!(report.per_command.get("ap"), Some(&CommandTally { normal: 0, failed: 1 }));
        assert_eq!(report.per_command.get("qv"), Some(&CommandTally { normal: 1, failed: 1 }));
        assert_eq!(report.per_command.get("qm"), Some(&CommandTally { normal: 0, failed: 1 }));
        assert!(report.is_clean());
        assert!(
            report
                .coverage
                .missing_failures
                .iter()
                .all(|k| k != "qv:relation-not-found")
        );
    }

    #[test]
    fn unmodeled_steps_are_listed_and_skipped() {
        let report = replay_text("ap 1 a 1\nam 5 3 0 1 9\n").expect("parse");
        assert_eq!(report.unmodeled.len(), 1);
        assert_eq!(report.unmodeled[0].index, 1);
        assert!(!report.is_clean());
    }

    #[test]
    fn large_red_envelope_replays_without_overflow() {
        let text = "ln 2\n1 2\na b\n1 1\n1\narem 1 1000000000 0 1 2\nsm 1\n";
        let report = replay_text(text).expect("parse");
        assert_eq!(report.per_command.get("sm"), Some(&CommandTally { normal: 1, failed: 0 }));
        assert!(report.is_clean(), "{:?}", report.violations);
    }

    #[test]
    fn empty_input_replays_to_nothing() {
        let report = replay(&[]);
        assert_eq!(report.instructions, 0);
        assert!(report.per_command.is_empty());
        assert!(report.is_clean());
    }
}
