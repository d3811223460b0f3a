//! Report rendering shared by every `netgen` subcommand.
//!
//! Each report is a serializable value from `netgen-core`; a command picks
//! the text and pretty renderers, and JSON comes straight from serde.
//!
//! The mode comes from, in order: `--format` (or the hidden `--json`), the
//! `NETGEN_FORMAT` environment variable, then pretty on a terminal and text
//! in a pipe.

use clap::ValueEnum;
use netgen_core::CoverageReport;
use serde::Serialize;
use std::io::{self, IsTerminal, Write};

/// How a report reaches stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputMode {
    /// Sections and aligned fields for reading at a terminal.
    Pretty,
    /// One `key=value` record per line, for scripts and pipes.
    Text,
    /// The report itself, serialized as JSON.
    Json,
}

impl OutputMode {
    #[must_use]
    pub const fn is_json(self) -> bool {
        matches!(self, Self::Json)
    }

    /// Mode for this process: flags first, then `NETGEN_FORMAT`, then the
    /// terminal check.
    pub fn detect(format: Option<Self>, json: bool) -> Self {
        let env = std::env::var("NETGEN_FORMAT").ok();
        Self::choose(format, json, env.as_deref(), io::stdout().is_terminal())
    }

    /// Unrecognized `env` values are ignored.
    fn choose(format: Option<Self>, json: bool, env: Option<&str>, is_tty: bool) -> Self {
        format
            .or_else(|| json.then_some(Self::Json))
            .or_else(|| env.and_then(|value| Self::from_str(value, true).ok()))
            .unwrap_or(if is_tty { Self::Pretty } else { Self::Text })
    }
}

/// Write `report` to stdout in `mode`.
///
/// # Errors
///
/// Returns an error if serialization or writing to stdout fails.
pub fn emit<T: Serialize>(
    mode: OutputMode,
    report: &T,
    text: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
    pretty: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
) -> anyhow::Result<()> {
    let mut out = io::stdout().lock();
    match mode {
        OutputMode::Json => {
            serde_json::to_writer_pretty(&mut out, report)?;
            writeln!(out)?;
        }
        OutputMode::Text => text(report, &mut out)?,
        OutputMode::Pretty => pretty(report, &mut out)?,
    }
    Ok(())
}

/// A section title, underlined to its own width.
pub fn heading(w: &mut dyn Write, title: &str) -> io::Result<()> {
    writeln!(w, "{title}\n{}", "-".repeat(title.len()))
}

/// One aligned `Key: value` line.
pub fn field(w: &mut dyn Write, key: &str, value: impl AsRef<str>) -> io::Result<()> {
    writeln!(w, "{:<14} {}", format!("{key}:"), value.as_ref())
}

/// `covered/total (pct%)`, rounded down.
#[must_use]
pub fn fraction(covered: usize, total: usize) -> String {
    match (covered * 100).checked_div(total) {
        Some(pct) => format!("{covered}/{total} ({pct}%)"),
        None => format!("{covered}/{total}"),
    }
}

/// The coverage section common to `generate` and `verify`.
pub fn coverage_fields(w: &mut dyn Write, coverage: &CoverageReport) -> io::Result<()> {
    field(
        w,
        "Successes",
        fraction(coverage.successes_covered, coverage.successes_total),
    )?;
    field(
        w,
        "Failures",
        fraction(coverage.failures_covered, coverage.failures_total),
    )?;
    if coverage.is_complete() {
        return field(w, "Status", "every outcome produced");
    }
    field(w, "Missing ok", elide(&coverage.missing_successes, 8))?;
    field(w, "Missing err", elide(&coverage.missing_failures, 8))
}

/// Join a list for one-line display, eliding past `limit` entries.
#[must_use]
pub fn elide<S: AsRef<str>>(items: &[S], limit: usize) -> String {
    if items.is_empty() {
        return "none".to_owned();
    }
    let shown: Vec<&str> = items.iter().take(limit).map(AsRef::as_ref).collect();
    let mut joined = shown.join(", ");
    if items.len() > limit {
        joined.push_str(&format!(" (+{} more)", items.len() - limit));
    }
    joined
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_flag_wins() {
        assert_eq!(
            OutputMode::choose(Some(OutputMode::Text), true, Some("json"), true),
            OutputMode::Text
        );
    }

    #[test]
    fn json_flag_beats_env() {
        assert_eq!(
            OutputMode::choose(None, true, Some("pretty"), true),
            OutputMode::Json
        );
    }

    #[test]
    fn env_is_case_insensitive_and_unknown_values_fall_through() {
        assert_eq!(
            OutputMode::choose(None, false, Some("JSON"), true),
            OutputMode::Json
        );
        assert_eq!(
            OutputMode::choose(None, false, Some("yaml"), false),
            OutputMode::Text
        );
    }

    #[test]
    fn terminal_default_is_pretty() {
        assert_eq!(OutputMode::choose(None, false, None, true), OutputMode::Pretty);
        assert_eq!(OutputMode::choose(None, false, None, false), OutputMode::Text);
    }

    #[test]
    fn elide_truncates_long_lists() {
        assert_eq!(elide::<&str>(&[], 3), "none");
        assert_eq!(elide(&["a", "b"], 3), "a, b");
        assert_eq!(elide(&["a", "b", "c", "d"], 2), "a, b (+2 more)");
    }

    #[test]
    fn fraction_rounds_down_and_tolerates_empty_totals() {
        assert_eq!(fraction(55, 73), "55/73 (75%)");
        assert_eq!(fraction(0, 0), "0/0");
    }

    #[test]
    fn heading_underline_matches_title() {
        let mut buf = Vec::new();
        heading(&mut buf, "Coverage").expect("write");
        assert_eq!(String::from_utf8(buf).expect("utf8"), "Coverage\n--------\n");
    }

    #[test]
    fn coverage_fields_list_gaps() {
        let coverage = CoverageReport {
            successes_covered: 33,
            successes_total: 34,
            failures_covered: 72,
            failures_total: 73,
            missing_successes: vec!["dce"],
            missing_failures: vec!["sm:tag-missing".to_owned()],
        };
        let mut buf = Vec::new();
        coverage_fields(&mut buf, &coverage).expect("write");
        let text = String::from_utf8(buf).expect("utf8");
        assert!(text.contains("Successes:     33/34 (97%)"));
        assert!(text.contains("Missing err:   sm:tag-missing"));
        assert!(!text.contains("every outcome produced"));
    }
}
