//! Monotone record of which outcomes a run has exercised.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::catalog::{CATALOG, FailureKey};
use crate::command::CommandKind;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoverageTracker {
    succeeded: BTreeSet<CommandKind>,
    failed: BTreeSet<FailureKey>,
}

impl CoverageTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a command whose normal outcome was applied to the model.
    /// Returns `true` the first time a kind is seen.
    pub fn record_success(&mut self, command: CommandKind) -> bool {
        self.succeeded.insert(command)
    }

    /// Record a catalogued failure a generator produced.
    pub fn record_failure(&mut self, key: FailureKey) -> bool {
        self.failed.insert(key)
    }

    #[must_use]
    pub fn has_succeeded(&self, command: CommandKind) -> bool {
        self.succeeded.contains(&command)
    }

    #[must_use]
    pub fn has_failed(&self, key: FailureKey) -> bool {
        self.failed.contains(&key)
    }

    /// Kinds that have not yet succeeded, in wire order.
    #[must_use]
    pub fn missing_successes(&self) -> Vec<CommandKind> {
        CommandKind::ALL
            .into_iter()
            .filter(|k| !self.succeeded.contains(k))
            .collect()
    }

    /// Catalogued failures not yet produced, in catalog order.
    #[must_use]
    pub fn missing_failures(&self) -> Vec<FailureKey> {
        CATALOG
            .iter()
            .copied()
            .filter(|k| !self.failed.contains(k))
            .collect()
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.succeeded.len() == CommandKind::ALL.len()
            && CATALOG.iter().all(|k| self.failed.contains(k))
    }

    #[must_use]
    pub fn report(&self) -> CoverageReport {
        let missing_successes: Vec<&'static str> = self
            .missing_successes()
            .into_iter()
            .map(CommandKind::alias)
            .collect();
        let missing_failures: Vec<String> = self
            .missing_failures()
            .into_iter()
            .map(|k| k.to_string())
            .collect();
        CoverageReport {
            successes_covered: CommandKind::ALL.len() - missing_successes.len(),
            successes_total: CommandKind::ALL.len(),
            failures_covered: CATALOG.len() - missing_failures.len(),
            failures_total: CATALOG.len(),
            missing_successes,
            missing_failures,
        }
    }
}

/// Serializable summary of a [`CoverageTracker`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoverageReport {
    pub successes_covered: usize,
    pub successes_total: usize,
    pub failures_covered: usize,
    pub failures_total: usize,
    pub missing_successes: Vec<&'static str>,
    pub missing_failures: Vec<String>,
}

impl CoverageReport {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.missing_successes.is_empty() && self.missing_failures.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::FailureKind;

    #[test]
    fn fresh_tracker_misses_everything() {
        let tracker = CoverageTracker::new();
        let report = tracker.report();
        assert_eq!(report.successes_covered, 0);
        assert_eq!(report.successes_total, 34);
        assert_eq!(report.failures_total, 73);
        assert_eq!(report.missing_successes.first(), Some(&"ln"));
        assert_eq!(report.missing_failures.first().map(String::as_str), Some("ap:duplicate-person"));
        assert!(!tracker.is_complete());
    }

    #[test]
    fn recording_is_monotone_and_idempotent() {
        let mut tracker = CoverageTracker::new();
        assert!(tracker.record_success(CommandKind::AddPerson));
        assert!(!tracker.record_success(CommandKind::AddPerson));
        let key = FailureKey::new(CommandKind::AddPerson, FailureKind::DuplicatePerson);
        assert!(tracker.record_failure(key));
        assert!(tracker.has_failed(key));
        assert_eq!(tracker.missing_failures().len(), 72);
    }

    #[test]
    fn everything_recorded_is_complete() {
        let mut tracker = CoverageTracker::new();
        for kind in CommandKind::ALL {
            tracker.record_success(kind);
        }
        for key in CATALOG {
            tracker.record_failure(*key);
        }
        assert!(tracker.is_complete());
        assert!(tracker.report().is_complete());
    }
}
