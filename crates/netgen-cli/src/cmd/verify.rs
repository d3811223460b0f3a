//! `netgen verify`: audit an instruction file by replaying it.

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Args;
use netgen_core::{ReplayReport, replay_text};

use crate::output::{OutputMode, coverage_fields, emit, field, heading};

/// Arguments for `netgen verify`.
#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Instruction file to replay.
    pub path: PathBuf,

    /// Exit non-zero on coverage gaps, unmodeled steps or invariant violations.
    #[arg(long)]
    pub strict: bool,
}

/// Execute `netgen verify`.
pub fn run_verify(args: &VerifyArgs, output: OutputMode) -> Result<()> {
    let text = fs::read_to_string(&args.path)
        .with_context(|| format!("failed to read {}", args.path.display()))?;
    let report =
        replay_text(&text).with_context(|| format!("failed to parse {}", args.path.display()))?;

    emit(output, &report, render_text, render_pretty)?;

    if args.strict {
        if !report.is_clean() {
            bail!(
                "{} unmodeled steps, {} invariant violations",
                report.unmodeled.len(),
                report.violations.len()
            );
        }
        if !report.coverage.is_complete() {
            bail!(
                "coverage gaps: {} successes and {} failures missing",
                report.coverage.missing_successes.len(),
                report.coverage.missing_failures.len()
            );
        }
    }
    Ok(())
}

fn render_text(report: &ReplayReport, w: &mut dyn Write) -> io::Result<()> {
    writeln!(
        w,
        "verify instructions={} lines={} clean={}",
        report.instructions,
        report.lines,
        report.is_clean()
    )?;
    for (alias, tally) in &report.per_command {
        writeln!(
            w,
            "command alias={alias} normal={} failed={}",
            tally.normal, tally.failed
        )?;
    }
    writeln!(
        w,
        "coverage successes={}/{} failures={}/{}",
        report.coverage.successes_covered,
        report.coverage.successes_total,
        report.coverage.failures_covered,
        report.coverage.failures_total
    )?;
    for command in &report.coverage.missing_successes {
        writeln!(w, "missing_success command={command}")?;
    }
    for key in &report.coverage.missing_failures {
        writeln!(w, "missing_failure key={key}")?;
    }
    for step in &report.unmodeled {
        writeln!(w, "unmodeled index={} reason={}", step.index, step.reason)?;
    }
    for violation in &report.violations {
        writeln!(w, "violation {violation}")?;
    }
    Ok(())
}

fn render_pretty(report: &ReplayReport, w: &mut dyn Write) -> io::Result<()> {
    heading(w, "Replay")?;
    field(w, "Instructions", report.instructions.to_string())?;
    field(w, "Lines", report.lines.to_string())?;
    field(
        w,
        "Status",
        if report.is_clean() {
            "consistent"
        } else {
            "problems found"
        },
    )?;
    writeln!(w)?;

    heading(w, "Outcomes")?;
    writeln!(w, "{:<8} {:>8} {:>8}", "command", "normal", "failed")?;
    for (alias, tally) in &report.per_command {
        writeln!(w, "{alias:<8} {:>8} {:>8}", tally.normal, tally.failed)?;
    }
    writeln!(w)?;

    heading(w, "Coverage")?;
    coverage_fields(w, &report.coverage)?;

    if !report.unmodeled.is_empty() || !report.violations.is_empty() {
        writeln!(w)?;
        heading(w, "Problems")?;
        for step in report.unmodeled.iter().take(10) {
            writeln!(w, "step {:<6} {}", step.index, step.reason)?;
        }
        if report.unmodeled.len() > 10 {
            writeln!(w, "... and {} more unmodeled steps", report.unmodeled.len() - 10)?;
        }
        for violation in &report.violations {
            writeln!(w, "  - {violation}")?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "ln 2\n1 2\na b\n20 30\n4\nqv 1 2\nqv 1 9\n";

    fn write_sample(dir: &tempfile::TempDir, text: &str) -> PathBuf {
        let path = dir.path().join("data.txt");
        fs::write(&path, text).expect("write sample");
        path
    }

    #[test]
    fn text_output_lists_per_command_tallies() {
        let report = replay_text(SAMPLE).expect("parse");
        let mut buf = Vec::new();
        render_text(&report, &mut buf).expect("render");
        let text = String::from_utf8(buf).expect("utf8");
        assert!(text.contains("verify instructions=3 lines=7 clean=true"));
        assert!(text.contains("command alias=qv normal=1 failed=1"));
    }

    #[test]
    fn lenient_verify_tolerates_gaps() {
        let dir = tempfile::tempdir().expect("tempdir");
        let args = VerifyArgs {
            path: write_sample(&dir, SAMPLE),
            strict: false,
        };
        assert!(run_verify(&args, OutputMode::Text).is_ok());
    }

    #[test]
    fn strict_verify_fails_on_gaps() {
        let dir = tempfile::tempdir().expect("tempdir");
        let args = VerifyArgs {
            path: write_sample(&dir, SAMPLE),
            strict: true,
        };
        let err = run_verify(&args, OutputMode::Text).expect_err("gaps");
        assert!(err.to_string().contains("coverage gaps"));
    }

    #[test]
    fn malformed_file_reports_its_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let args = VerifyArgs {
            path: write_sample(&dir, "zz 1 2\n"),
            strict: false,
        };
        let err = run_verify(&args, OutputMode::Text).expect_err("parse error");
        assert!(err.to_string().contains("data.txt"));
    }
}
