//! The generation driver: `Bootstrap → MainLoop → GuaranteeSweep → Done`.
//!
//! A [`Generator`] owns everything one run touches: the mirrored network,
//! the coverage tracker, the seeded RNG and the emitted instructions. Nothing
//! is shared between runs.

use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::catalog::{CATALOG_VERSION, FailureKey, Outcome};
use crate::command::CommandKind;
use crate::config::{ConfigError, GeneratorConfig, Mode};
use crate::coverage::{CoverageReport, CoverageTracker};
use crate::generate::{self, Generated, Request, bulk_load};
use crate::instruction::{Instruction, LoadBlock, render};
use crate::invariants;
use crate::model::Network;
use crate::rng::DeterministicRng;
use crate::select::{Phase, select};
use crate::update;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Failure to persist a generated file.
#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

// ---------------------------------------------------------------------------
// Driver state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DriverState {
    Bootstrap,
    MainLoop,
    GuaranteeSweep,
    Done,
}

/// Why the main loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StopReason {
    TargetReached,
    AttemptCeiling,
    Stalled,
    LineCeiling,
}

impl StopReason {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TargetReached => "target-reached",
            Self::AttemptCeiling => "attempt-ceiling",
            Self::Stalled => "stalled",
            Self::LineCeiling => "line-ceiling",
        }
    }

    /// Whether the loop ended before reaching its target.
    #[must_use]
    pub const fn is_early(self) -> bool {
        !matches!(self, Self::TargetReached)
    }
}

/// Result of one generate-and-commit attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Attempt {
    Emitted,
    Miss,
    LineCeiling,
}

/// Summary of a finished run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationReport {
    pub catalog_version: &'static str,
    pub mode: Mode,
    pub seed: u64,
    pub target: usize,
    pub instructions: usize,
    pub lines: usize,
    pub attempts: usize,
    pub stop_reason: StopReason,
    pub sweep_added: usize,
    pub failures_emitted: usize,
    pub invariant_violations: usize,
    pub coverage: CoverageReport,
}

/// A finished run: the instruction sequence and how it was produced.
#[derive(Debug, Clone)]
pub struct Generation {
    pub instructions: Vec<Instruction>,
    /// Predicted outcome of each instruction, index for index.
    pub outcomes: Vec<Outcome>,
    pub report: GenerationReport,
    /// The mirrored state after the last instruction.
    pub network: Network,
}

impl Generation {
    /// Protocol text of the whole run.
    #[must_use]
    pub fn render(&self) -> String {
        render(&self.instructions)
    }

    /// Write the protocol text to `path` via a sibling temporary file, so a
    /// failed write never leaves a partial file behind.
    ///
    /// # Errors
    ///
    /// Returns [`WriteError::Io`] if the temporary file cannot be written or
    /// renamed into place.
    pub fn write_to(&self, path: &Path) -> Result<(), WriteError> {
        write_atomic(path, self.render().as_bytes())
    }
}

/// Write `contents` to a sibling of `path`, then rename over `path`.
///
/// # Errors
///
/// Returns [`WriteError::Io`] on any filesystem failure. The temporary file
/// is removed whichever step fails.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), WriteError> {
    let tmp = temp_sibling(path);
    fs::write(&tmp, contents).map_err(|source| {
        let _ = fs::remove_file(&tmp);
        WriteError::Io {
            path: tmp.clone(),
            source,
        }
    })?;
    fs::rename(&tmp, path).map_err(|source| {
        let _ = fs::remove_file(&tmp);
        WriteError::Io {
            path: path.to_path_buf(),
            source,
        }
    })
}

fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(std::ffi::OsStr::to_os_string)
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

// ---------------------------------------------------------------------------
// Generator
// ---------------------------------------------------------------------------

/// One generation run.
#[derive(Debug)]
pub struct Generator {
    config: GeneratorConfig,
    rng: DeterministicRng,
    net: Network,
    coverage: CoverageTracker,
    instructions: Vec<Instruction>,
    outcomes: Vec<Outcome>,
    lines: usize,
    attempts: usize,
    failures_emitted: usize,
    invariant_violations: usize,
    state: DriverState,
}

impl Generator {
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the configuration does not validate.
    pub fn new(config: GeneratorConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            rng: DeterministicRng::new(config.seed),
            config,
            net: Network::new(),
            coverage: CoverageTracker::new(),
            instructions: Vec::new(),
            outcomes: Vec::new(),
            lines: 0,
            attempts: 0,
            failures_emitted: 0,
            invariant_violations: 0,
            state: DriverState::Bootstrap,
        })
    }

    /// Drive the run to completion.
    #[must_use]
    pub fn run(mut self) -> Generation {
        self.bootstrap();
        self.transition(DriverState::MainLoop);
        let stop_reason = self.main_loop();
        self.transition(DriverState::GuaranteeSweep);
        let sweep_added = self.guarantee_sweep();
        self.transition(DriverState::Done);

        let coverage = self.coverage.report();
        if !coverage.is_complete() {
            warn!(
                missing_successes = ?coverage.missing_successes,
                missing_failures = ?coverage.missing_failures,
                "run finished with coverage gaps"
            );
        }
        info!(
            instructions = self.instructions.len(),
            lines = self.lines,
            successes = coverage.successes_covered,
            failures = coverage.failures_covered,
            "generation complete"
        );

        let report = GenerationReport {
            catalog_version: CATALOG_VERSION,
            mode: self.config.mode,
            seed: self.config.seed,
            target: self.config.effective_target(),
            instructions: self.instructions.len(),
            lines: self.lines,
            attempts: self.attempts,
            stop_reason,
            sweep_added,
            failures_emitted: self.failures_emitted,
            invariant_violations: self.invariant_violations,
            coverage,
        };
        Generation {
            instructions: self.instructions,
            outcomes: self.outcomes,
            report,
            network: self.net,
        }
    }

    fn transition(&mut self, next: DriverState) {
        debug!(from = ?self.state, to = ?next, emitted = self.instructions.len(), "driver state");
        self.state = next;
    }

    // ── Bootstrap ────────────────────────────────────────────────────────────

    fn bootstrap(&mut self) {
        let max_persons = self.config.mode.max_load_persons();
        let target = self.config.effective_target();
        let block = bulk_load::generate(&mut self.net, &mut self.rng, max_persons, target)
            .filter(|b| b.line_count() <= self.config.mode.max_lines())
            .unwrap_or_else(|| {
                warn!("bulk load unavailable, using minimal network");
                let block = LoadBlock::minimal();
                bulk_load::install(&mut self.net, &block);
                block
            });
        debug!(persons = block.len(), lines = block.line_count(), "bootstrap load");
        self.coverage = CoverageTracker::new();
        self.lines = block.line_count();
        self.instructions.push(Instruction::LoadNetwork(block));
        self.outcomes.push(Outcome::Normal);
        self.coverage.record_success(CommandKind::LoadNetwork);
        self.check_invariants();
    }

    // ── Main loop ────────────────────────────────────────────────────────────

    fn main_loop(&mut self) -> StopReason {
        let target = self.config.effective_target();
        let max_attempts = self.config.max_attempts();
        let stall_limit = self.config.stall_limit();
        let mut misses = 0usize;
        let mut phase = Phase::InitialLoad;

        let reason = loop {
            if self.instructions.len() >= target {
                break StopReason::TargetReached;
            }
            if self.attempts >= max_attempts {
                break StopReason::AttemptCeiling;
            }
            if misses >= stall_limit {
                break StopReason::Stalled;
            }

            let current = Phase::at(self.instructions.len(), target, &self.config.tuning);
            if current != phase {
                debug!(from = %phase, to = %current, at = self.instructions.len(), "phase change");
                phase = current;
            }

            let choice = select(
                &self.net,
                &self.coverage,
                phase,
                &self.config.tuning,
                &mut self.rng,
            );
            self.attempts += 1;
            match self.attempt(choice.command, choice.request) {
                Attempt::Emitted => misses = 0,
                Attempt::Miss => misses += 1,
                Attempt::LineCeiling => break StopReason::LineCeiling,
            }
        };

        match reason {
            StopReason::TargetReached => {
                debug!(attempts = self.attempts, "main loop reached target");
            }
            StopReason::LineCeiling => {
                info!(lines = self.lines, "main loop stopped at the line ceiling");
            }
            StopReason::AttemptCeiling | StopReason::Stalled => warn!(
                reason = ?reason,
                emitted = self.instructions.len(),
                target,
                attempts = self.attempts,
                "main loop terminated early"
            ),
        }
        reason
    }

    // ── Guarantee sweep ──────────────────────────────────────────────────────

    /// Two rotating passes: missing successes, then missing failure keys.
    /// Returns how many instructions the sweep added.
    fn guarantee_sweep(&mut self) -> usize {
        let allowance = self.config.sweep_allowance();
        let tuning = &self.config.tuning;
        let success_multiplier = tuning.sweep_success_multiplier;
        let failure_multiplier = tuning.sweep_failure_multiplier;

        let successes = self
            .coverage
            .missing_successes()
            .into_iter()
            .map(SweepItem::Success);
        let mut added = self.sweep_pass(successes, success_multiplier, allowance);

        let failures = self
            .coverage
            .missing_failures()
            .into_iter()
            .map(SweepItem::Failure);
        added += self.sweep_pass(failures, failure_multiplier, allowance.saturating_sub(added));

        debug!(added, "guarantee sweep finished");
        added
    }

    /// Retry every item until it is covered or its own budget runs out.
    /// Items that miss go to the back of the queue.
    fn sweep_pass(
        &mut self,
        items: impl Iterator<Item = SweepItem>,
        budget_per_item: usize,
        allowance: usize,
    ) -> usize {
        let mut queue: VecDeque<(SweepItem, usize)> =
            items.map(|item| (item, budget_per_item)).collect();
        let mut exhausted = Vec::new();
        let mut added = 0usize;
        while added < allowance {
            let Some((item, budget)) = queue.pop_front() else {
                break;
            };
            self.attempts += 1;
            match self.sweep_attempt(item) {
                Attempt::Emitted => added += 1,
                Attempt::Miss => {}
                Attempt::LineCeiling => {
                    queue.push_front((item, budget));
                    break;
                }
            }
            if item.is_covered(&self.coverage) {
                continue;
            }
            if budget > 1 {
                queue.push_back((item, budget - 1));
            } else {
                exhausted.push(item);
            }
        }
        let uncovered: Vec<String> = exhausted
            .into_iter()
            .chain(queue.into_iter().map(|(item, _)| item))
            .filter(|item| !item.is_covered(&self.coverage))
            .map(|item| item.to_string())
            .collect();
        if !uncovered.is_empty() {
            warn!(?uncovered, "guarantee sweep stopped with items uncovered");
        }
        added
    }

    /// Aim at `item`; when a failure key misses, spend the turn on a setup
    /// step towards it instead.
    fn sweep_attempt(&mut self, item: SweepItem) -> Attempt {
        let (command, request) = item.target();
        let attempt = self.attempt(command, request);
        let SweepItem::Failure(key) = item else {
            return attempt;
        };
        if attempt != Attempt::Miss {
            return attempt;
        }
        match generate::setup_step(key, &self.net, &mut self.rng) {
            Some(step) => {
                debug!(%key, step = %step.instruction, "sweep setup step");
                self.commit(step)
            }
            None => Attempt::Miss,
        }
    }

    // ── Single attempt ───────────────────────────────────────────────────────

    /// Generate one instruction and commit it.
    fn attempt(&mut self, command: CommandKind, request: Request) -> Attempt {
        match generate::generate(command, request, &self.net, &mut self.rng) {
            Some(generated) => self.commit(generated),
            None => Attempt::Miss,
        }
    }

    /// Apply, record and emit one generated instruction.
    ///
    /// A produced failure counts towards coverage even when the line ceiling
    /// then keeps it out of the output.
    fn commit(&mut self, generated: Generated) -> Attempt {
        let command = generated.instruction.kind();
        if let Outcome::Failure(key) = generated.outcome {
            self.coverage.record_failure(key);
        }

        let lines = generated.instruction.line_count();
        if self.lines + lines > self.config.mode.max_lines() {
            return Attempt::LineCeiling;
        }
        self.lines += lines;

        match generated.outcome {
            Outcome::Normal => {
                update::apply(&mut self.net, &generated.instruction);
                self.coverage.record_success(command);
                self.check_invariants();
            }
            Outcome::Failure(_) => self.failures_emitted += 1,
        }
        self.instructions.push(generated.instruction);
        self.outcomes.push(generated.outcome);
        Attempt::Emitted
    }

    fn check_invariants(&mut self) {
        if !self.config.check_invariants {
            return;
        }
        let result = invariants::check_all(&self.net);
        if !result.passed {
            self.invariant_violations += result.violations.len();
            for violation in &result.violations {
                warn!(at = self.instructions.len(), %violation, "invariant violated");
            }
        }
    }
}

/// Convenience wrapper: validate, run, return.
///
/// # Errors
///
/// Returns [`ConfigError::Invalid`] if the configuration does not validate.
pub fn generate_run(config: GeneratorConfig) -> Result<Generation, ConfigError> {
    Ok(Generator::new(config)?.run())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SweepItem {
    Success(CommandKind),
    Failure(FailureKey),
}

impl SweepItem {
    const fn target(self) -> (CommandKind, Request) {
        match self {
            Self::Success(command) => (command, Request::Normal),
            Self::Failure(key) => (key.command, Request::Failure(key.kind)),
        }
    }

    fn is_covered(self, coverage: &CoverageTracker) -> bool {
        match self {
            Self::Success(command) => coverage.has_succeeded(command),
            Self::Failure(key) => coverage.has_failed(key),
        }
    }
}

impl std::fmt::Display for SweepItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Success(command) => write!(f, "{}:ok", command.alias()),
            Self::Failure(key) => write!(f, "{key}"),
        }
    }
}
