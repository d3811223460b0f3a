//! Instruction selection: which command to try next, and which outcome to
//! aim it at.
//!
//! Each step either takes a coverage detour towards an uncovered outcome or
//! draws a command from phase-scaled weights, pruned to what the current
//! state can support.

use crate::catalog::{FailureKey, failures_of};
use crate::command::{Category, CommandKind};
use crate::config::Tuning;
use crate::coverage::CoverageTracker;
use crate::generate::Request;
use crate::model::Network;
use crate::rng::DeterministicRng;

// ── Phase ────────────────────────────────────────────────────────────────────

/// Stage of a run, derived from how many instructions have been emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    InitialLoad,
    BuildNetwork,
    RandomMix,
    StressComplex,
}

impl Phase {
    /// Phase for `emitted` instructions out of `target`.
    #[must_use]
    pub fn at(emitted: usize, target: usize, tuning: &Tuning) -> Self {
        if emitted == 0 {
            return Self::InitialLoad;
        }
        let target = target.max(1);
        let build_end = target * usize::from(tuning.build_phase_end_percent) / 100;
        let mix_end = target * usize::from(tuning.mix_phase_end_percent) / 100;
        if emitted < build_end {
            Self::BuildNetwork
        } else if emitted < mix_end {
            Self::RandomMix
        } else {
            Self::StressComplex
        }
    }

    /// Multiplier applied to a command's base weight.
    #[must_use]
    pub const fn factor(self, category: Category) -> u32 {
        match (self, category) {
            (Self::InitialLoad | Self::BuildNetwork, Category::Build) => 4,
            (Self::InitialLoad | Self::BuildNetwork, Category::Mutate) => 2,
            (Self::InitialLoad | Self::BuildNetwork, Category::Message | Category::Query) => 1,
            (Self::RandomMix, _) => 2,
            (Self::StressComplex, Category::Build) => 1,
            (Self::StressComplex, Category::Mutate | Category::Query) => 3,
            (Self::StressComplex, Category::Message) => 4,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InitialLoad => "initial-load",
            Self::BuildNetwork => "build-network",
            Self::RandomMix => "random-mix",
            Self::StressComplex => "stress-complex",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Choice ───────────────────────────────────────────────────────────────────

/// Why a command was picked. Only used for logging and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reason {
    MissingSuccess,
    MissingFailure,
    Weighted,
    Fallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Choice {
    pub command: CommandKind,
    pub request: Request,
    pub reason: Reason,
}

impl Choice {
    const fn new(command: CommandKind, request: Request, reason: Reason) -> Self {
        Self {
            command,
            request,
            reason,
        }
    }
}

/// Pick the next command and the outcome to aim for.
///
/// Never fails: when nothing else is possible the answer is a normal
/// `ap`, which is always generatable.
pub fn select(
    net: &Network,
    coverage: &CoverageTracker,
    phase: Phase,
    tuning: &Tuning,
    rng: &mut DeterministicRng,
) -> Choice {
    if rng.hit_rate_percent(tuning.coverage_attempt_percent) {
        if let Some(choice) = coverage_detour(net, coverage, tuning, rng) {
            return choice;
        }
    }
    weighted(net, phase, tuning, rng)
        .unwrap_or_else(|| Choice::new(CommandKind::AddPerson, Request::Normal, Reason::Fallback))
}

fn coverage_detour(
    net: &Network,
    coverage: &CoverageTracker,
    tuning: &Tuning,
    rng: &mut DeterministicRng,
) -> Option<Choice> {
    let feasibility = net.feasibility();
    let successes: Vec<CommandKind> = coverage
        .missing_successes()
        .into_iter()
        .filter(|k| *k != CommandKind::LoadNetwork && k.is_feasible(&feasibility))
        .collect();
    let failures: Vec<FailureKey> = coverage.missing_failures();

    let prefer_success = !successes.is_empty()
        && (failures.is_empty() || rng.hit_rate_percent(tuning.prioritize_success_percent));
    if prefer_success {
        let command = rng.pick(&successes)?;
        return Some(Choice::new(command, Request::Normal, Reason::MissingSuccess));
    }
    let key = rng.pick(&failures)?;
    Some(Choice::new(key.command, Request::from(key), Reason::MissingFailure))
}

fn weighted(
    net: &Network,
    phase: Phase,
    tuning: &Tuning,
    rng: &mut DeterministicRng,
) -> Option<Choice> {
    let feasibility = net.feasibility();
    let candidates: Vec<CommandKind> = CommandKind::incremental()
        .filter(|k| k.is_feasible(&feasibility))
        .collect();
    let weights: Vec<u32> = candidates
        .iter()
        .map(|k| k.base_weight() * phase.factor(k.category()))
        .collect();
    let command = candidates.get(rng.weighted_index(&weights)?).copied()?;

    let request = if rng.hit_rate_percent(tuning.error_attempt_percent) {
        let keys: Vec<FailureKey> = failures_of(command).collect();
        rng.pick(&keys).map_or(Request::Normal, Request::from)
    } else {
        Request::Normal
    };
    Some(Choice::new(command, request, Reason::Weighted))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Person;

    fn tuning() -> Tuning {
        Tuning::default()
    }

    #[test]
    fn phase_boundaries() {
        let t = tuning();
        assert_eq!(Phase::at(0, 100, &t), Phase::InitialLoad);
        assert_eq!(Phase::at(1, 100, &t), Phase::BuildNetwork);
        assert_eq!(Phase::at(29, 100, &t), Phase::BuildNetwork);
        assert_eq!(Phase::at(30, 100, &t), Phase::RandomMix);
        assert_eq!(Phase::at(74, 100, &t), Phase::RandomMix);
        assert_eq!(Phase::at(75, 100, &t), Phase::StressComplex);
        assert_eq!(Phase::at(500, 100, &t), Phase::StressComplex);
    }

    #[test]
    fn empty_network_only_picks_feasible_commands() {
        let net = Network::new();
        let coverage = CoverageTracker::new();
        let mut t = tuning();
        t.coverage_attempt_percent = 0;
        let mut rng = DeterministicRng::new(5);
        for _ in 0..50 {
            let choice = select(&net, &coverage, Phase::BuildNetwork, &t, &mut rng);
            assert!(choice.command.is_feasible(&net.feasibility()));
        }
    }

    #[test]
    fn weighted_picks_respect_feasibility() {
        let mut net = Network::new();
        net.insert_person(Person::new(1, "a", 20));
        let coverage = CoverageTracker::new();
        let mut t = tuning();
        t.coverage_attempt_percent = 0;
        let mut rng = DeterministicRng::new(8);
        for _ in 0..500 {
            let choice = select(&net, &coverage, Phase::RandomMix, &t, &mut rng);
            assert_eq!(choice.reason, Reason::Weighted);
            assert_ne!(choice.command, CommandKind::SendMessage);
            assert_ne!(choice.command, CommandKind::AddRelation);
            assert_ne!(choice.command, CommandKind::LoadNetwork);
        }
    }

    #[test]
    fn error_requests_are_catalogued() {
        let mut net = Network::new();
        for id in 1..=3 {
            net.insert_person(Person::new(id, "p", 20));
        }
        net.link(1, 2, 3);
        let coverage = CoverageTracker::new();
        let mut t = tuning();
        t.coverage_attempt_percent = 0;
        t.error_attempt_percent = 100;
        let mut rng = DeterministicRng::new(13);
        for _ in 0..300 {
            let choice = select(&net, &coverage, Phase::StressComplex, &t, &mut rng);
            if let Request::Failure(kind) = choice.request {
                assert!(FailureKey::new(choice.command, kind).is_catalogued());
            } else {
                assert_eq!(failures_of(choice.command).count(), 0);
            }
        }
    }

    #[test]
    fn coverage_detour_targets_uncovered_outcomes() {
        let mut net = Network::new();
        net.insert_person(Person::new(1, "a", 20));
        let mut coverage = CoverageTracker::new();
        for kind in CommandKind::ALL {
            coverage.record_success(kind);
        }
        let mut t = tuning();
        t.coverage_attempt_percent = 100;
        let mut rng = DeterministicRng::new(2);
        for _ in 0..100 {
            let choice = select(&net, &coverage, Phase::RandomMix, &t, &mut rng);
            assert_eq!(choice.reason, Reason::MissingFailure);
            let Request::Failure(kind) = choice.request else {
                panic!("expected failure request");
            };
            assert!(!coverage.has_failed(FailureKey::new(choice.command, kind)));
        }
    }

    #[test]
    fn complete_coverage_never_detours() {
        let net = Network::new();
        let mut coverage = CoverageTracker::new();
        for kind in CommandKind::ALL {
            coverage.record_success(kind);
        }
        for key in crate::catalog::CATALOG {
            coverage.record_failure(*key);
        }
        let mut t = tuning();
        t.coverage_attempt_percent = 100;
        let mut rng = DeterministicRng::new(2);
        let choice = select(&net, &coverage, Phase::RandomMix, &t, &mut rng);
        assert_ne!(choice.reason, Reason::MissingFailure);
        assert_ne!(choice.reason, Reason::MissingSuccess);
    }
}
