//! `netgen generate`: produce one instruction file.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use netgen_core::{GenerationReport, GeneratorConfig, Mode, generate_run};
use tracing::{debug, info};

use crate::output::{OutputMode, coverage_fields, emit, field, heading};

/// Output sizing, as accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    /// Up to 10000 lines; bulk loads of up to 300 persons.
    #[value(alias = "P", alias = "p")]
    Public,
    /// Up to 3000 lines; bulk loads of up to 100 persons.
    #[value(alias = "M", alias = "m")]
    Mutual,
}

impl From<ModeArg> for Mode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Public => Self::Public,
            ModeArg::Mutual => Self::Mutual,
        }
    }
}

/// Arguments for `netgen generate`.
#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Output sizing mode [default: public].
    #[arg(short, long, value_enum)]
    pub mode: Option<ModeArg>,

    /// Target instruction count; a bulk load counts once [default: 1000].
    #[arg(short = 'n', long)]
    pub count: Option<usize>,

    /// File to write.
    #[arg(short, long)]
    pub output: PathBuf,

    /// RNG seed; defaults to the config file's seed, else the clock.
    #[arg(long)]
    pub seed: Option<u64>,

    /// TOML file with run settings and tuning knobs.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Check state invariants after every applied instruction.
    #[arg(long)]
    pub check_invariants: bool,
}

/// Merge file settings with flags. Flags win.
pub fn resolve_config(
    mode: Option<ModeArg>,
    count: Option<usize>,
    seed: Option<u64>,
    config_path: Option<&Path>,
    check_invariants: bool,
) -> Result<GeneratorConfig> {
    let mut config = match config_path {
        Some(path) => GeneratorConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => GeneratorConfig {
            seed: clock_seed(),
            ..GeneratorConfig::default()
        },
    };
    if let Some(mode) = mode {
        config.mode = mode.into();
    }
    if let Some(count) = count {
        config.target = count;
    }
    if let Some(seed) = seed {
        config.seed = seed;
    }
    config.check_invariants |= check_invariants;
    config.validate().context("invalid generator settings")?;
    Ok(config)
}

fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| (d.as_secs() << 30) ^ u64::from(d.subsec_nanos()))
}

/// Execute `netgen generate`.
pub fn run_generate(args: &GenerateArgs, output: OutputMode) -> Result<()> {
    let config = resolve_config(
        args.mode,
        args.count,
        args.seed,
        args.config.as_deref(),
        args.check_invariants,
    )?;
    debug!(mode = %config.mode, target = config.target, seed = config.seed, "resolved config");

    let generation = generate_run(config).context("failed to start generation")?;
    generation
        .write_to(&args.output)
        .with_context(|| format!("failed to write {}", args.output.display()))?;
    info!(path = %args.output.display(), lines = generation.report.lines, "wrote instruction file");

    emit(
        output,
        &generation.report,
        |report, w| render_text(report, &args.output, w),
        |report, w| render_pretty(report, &args.output, w),
    )
}

fn render_text(
    report: &GenerationReport,
    path: &Path,
    w: &mut dyn Write,
) -> io::Result<()> {
    writeln!(
        w,
        "generate path={} mode={} seed={} target={}",
        path.display(),
        report.mode,
        report.seed,
        report.target
    )?;
    writeln!(
        w,
        "output instructions={} lines={} failures={} attempts={} sweep_added={}",
        report.instructions, report.lines, report.failures_emitted, report.attempts, report.sweep_added
    )?;
    writeln!(
        w,
        "coverage successes={}/{} failures={}/{} stop={} complete={}",
        report.coverage.successes_covered,
        report.coverage.successes_total,
        report.coverage.failures_covered,
        report.coverage.failures_total,
        report.stop_reason.as_str(),
        report.coverage.is_complete()
    )?;
    for command in &report.coverage.missing_successes {
        writeln!(w, "missing_success command={command}")?;
    }
    for key in &report.coverage.missing_failures {
        writeln!(w, "missing_failure key={key}")?;
    }
    if report.invariant_violations > 0 {
        writeln!(w, "invariants violations={}", report.invariant_violations)?;
    }
    Ok(())
}

fn render_pretty(
    report: &GenerationReport,
    path: &Path,
    w: &mut dyn Write,
) -> io::Result<()> {
    heading(w, "Generation")?;
    field(w, "File", path.display().to_string())?;
    field(w, "Mode", report.mode.as_str())?;
    field(w, "Seed", report.seed.to_string())?;
    field(w, "Catalog", report.catalog_version)?;
    field(
        w,
        "Instructions",
        format!("{} of {} requested", report.instructions, report.target),
    )?;
    field(w, "Lines", report.lines.to_string())?;
    field(w, "Failures", report.failures_emitted.to_string())?;
    field(
        w,
        "Attempts",
        format!("{} ({} added by sweep)", report.attempts, report.sweep_added),
    )?;
    if report.stop_reason.is_early() {
        field(w, "Stopped", report.stop_reason.as_str())?;
    }
    writeln!(w)?;

    heading(w, "Coverage")?;
    coverage_fields(w, &report.coverage)?;
    if report.invariant_violations > 0 {
        field(w, "Invariants", format!("{} violations", report.invariant_violations))?;
    }
    Ok(())
}
