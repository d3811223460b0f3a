//! `netgen batch`: one numbered file per seed.

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use netgen_core::campaign::{CampaignConfig, CampaignReport, run_campaign};

use crate::cmd::generate::{ModeArg, resolve_config};
use crate::output::{OutputMode, emit, field, fraction, heading};

/// Arguments for `netgen batch`.
#[derive(Args, Debug)]
pub struct BatchArgs {
    /// Number of files to generate.
    #[arg(long, default_value = "1")]
    pub cases: u64,

    /// Seed of the first file; file `i` uses `seed_start + i - 1`.
    #[arg(long, default_value = "0")]
    pub seed_start: u64,

    /// Directory receiving `test_data_<i>.txt`. Created if missing.
    #[arg(long)]
    pub out_dir: PathBuf,

    /// Output sizing mode [default: public].
    #[arg(short, long, value_enum)]
    pub mode: Option<ModeArg>,

    /// Target instruction count per file [default: 1000].
    #[arg(short = 'n', long)]
    pub count: Option<usize>,

    /// TOML file with run settings and tuning knobs.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Check state invariants after every applied instruction.
    #[arg(long)]
    pub check_invariants: bool,
}

fn campaign_config(args: &BatchArgs) -> Result<CampaignConfig> {
    let end = args
        .seed_start
        .checked_add(args.cases)
        .context("seed range overflows u64")?;
    let base = resolve_config(
        args.mode,
        args.count,
        Some(args.seed_start),
        args.config.as_deref(),
        args.check_invariants,
    )?;
    Ok(CampaignConfig {
        seed_range: args.seed_start..end,
        mode: base.mode,
        target: base.target,
        check_invariants: base.check_invariants,
        tuning: base.tuning,
    })
}

/// Execute `netgen batch`.
pub fn run_batch(args: &BatchArgs, output: OutputMode) -> Result<()> {
    let config = campaign_config(args)?;
    let report = run_campaign(&config, &args.out_dir)
        .with_context(|| format!("batch into {} failed", args.out_dir.display()))?;

    emit(
        output,
        &report,
        |report, w| render_text(report, &config, w),
        |report, w| render_pretty(report, &config, args, w),
    )
}

fn render_text(
    report: &CampaignReport,
    config: &CampaignConfig,
    w: &mut dyn Write,
) -> io::Result<()> {
    writeln!(
        w,
        "batch cases={} mode={} target={} complete={}",
        report.cases.len(),
        config.mode,
        config.target,
        report.complete_cases
    )?;
    for case in &report.cases {
        writeln!(
            w,
            "case index={} seed={} path={} instructions={} lines={} stop={} missing_successes={} missing_failures={}",
            case.index,
            case.seed,
            case.path.display(),
            case.instructions,
            case.lines,
            case.stop_reason.as_str(),
            case.missing_successes,
            case.missing_failures
        )?;
    }
    if let Some(seed) = report.first_incomplete {
        writeln!(w, "hint first_incomplete_seed={seed}")?;
    }
    Ok(())
}

fn render_pretty(
    report: &CampaignReport,
    config: &CampaignConfig,
    args: &BatchArgs,
    w: &mut dyn Write,
) -> io::Result<()> {
    heading(w, "Batch")?;
    field(w, "Directory", args.out_dir.display().to_string())?;
    field(w, "Mode", config.mode.as_str())?;
    field(w, "Target", config.target.to_string())?;
    field(
        w,
        "Seeds",
        format!("{}..{}", config.seed_range.start, config.seed_range.end),
    )?;
    field(
        w,
        "Complete",
        fraction(report.complete_cases, report.cases.len()),
    )?;
    if report.all_complete() {
        field(w, "Status", "every file covers every outcome")?;
    }
    writeln!(w)?;

    heading(w, "Files")?;
    for case in &report.cases {
        let gaps = if case.is_complete() {
            String::from("complete")
        } else {
            format!(
                "{} ok / {} err missing",
                case.missing_successes, case.missing_failures
            )
        };
        writeln!(
            w,
            "{:<18} seed {:<8} {:>6} lines  {}",
            netgen_core::campaign::case_file_name(case.index),
            case.seed,
            case.lines,
            gaps
        )?;
    }
    if let Some(seed) = report.first_incomplete {
        writeln!(w)?;
        field(
            w,
            "Regenerate",
            format!(
                "netgen generate --mode {} --count {} --seed {seed} --output <path>",
                config.mode, config.target
            ),
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use netgen_core::Mode;

    fn args(cases: u64, seed_start: u64) -> BatchArgs {
        BatchArgs {
            cases,
            seed_start,
            out_dir: PathBuf::from("unused"),
            mode: Some(ModeArg::Mutual),
            count: Some(30),
            config: None,
            check_invariants: false,
        }
    }

    #[test]
    fn seed_range_spans_the_requested_cases() {
        let config = campaign_config(&args(4, 10)).expect("config");
        assert_eq!(config.seed_range, 10..14);
        assert_eq!(config.mode, Mode::Mutual);
        assert_eq!(config.target, 30);
    }

    #[test]
    fn overflowing_seed_range_is_rejected() {
        assert!(campaign_config(&args(2, u64::MAX)).is_err());
    }

    #[test]
    fn zero_cases_fail_validation() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut a = args(0, 0);
        a.out_dir = dir.path().to_path_buf();
        assert!(run_batch(&a, OutputMode::Text).is_err());
    }
}
