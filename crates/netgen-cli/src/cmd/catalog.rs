//! `netgen catalog`: print the failure catalog.

use anyhow::{Result, anyhow};
use clap::Args;
use netgen_core::{CATALOG, CATALOG_VERSION, CommandKind};
use serde::Serialize;

use crate::output::{OutputMode, emit, field, heading};

/// Arguments for `netgen catalog`.
#[derive(Args, Debug)]
pub struct CatalogArgs {
    /// Only show failures of this command alias (e.g. `att`).
    #[arg(long)]
    pub command: Option<String>,
}

#[derive(Debug, Serialize)]
struct CatalogOutput {
    version: &'static str,
    total: usize,
    entries: Vec<CatalogEntry>,
}

#[derive(Debug, Serialize)]
struct CatalogEntry {
    index: usize,
    command: &'static str,
    failure: &'static str,
    exception: &'static str,
}

fn build(filter: Option<CommandKind>) -> CatalogOutput {
    let entries = CATALOG
        .iter()
        .enumerate()
        .filter(|(_, key)| filter.is_none_or(|command| key.command == command))
        .map(|(index, key)| CatalogEntry {
            index,
            command: key.command.alias(),
            failure: key.kind.slug(),
            exception: key.exception(),
        })
        .collect();
    CatalogOutput {
        version: CATALOG_VERSION,
        total: CATALOG.len(),
        entries,
    }
}

/// Execute `netgen catalog`.
pub fn run_catalog(args: &CatalogArgs, output: OutputMode) -> Result<()> {
    let filter = args
        .command
        .as_deref()
        .map(|alias| {
            CommandKind::from_alias(alias).ok_or_else(|| anyhow!("unknown command alias '{alias}'"))
        })
        .transpose()?;
    let out = build(filter);

    emit(
        output,
        &out,
        |out, w| {
            writeln!(w, "catalog version={} total={}", out.version, out.total)?;
            for entry in &out.entries {
                writeln!(
                    w,
                    "key index={} command={} failure={} exception={}",
                    entry.index, entry.command, entry.failure, entry.exception
                )?;
            }
            Ok(())
        },
        |out, w| {
            heading(w, "Failure Catalog")?;
            field(w, "Version", out.version)?;
            field(
                w,
                "Keys",
                format!("{} shown of {}", out.entries.len(), out.total),
            )?;
            writeln!(w)?;
            for entry in &out.entries {
                writeln!(
                    w,
                    "{:>3}  {:<5} {:<24} {}",
                    entry.index, entry.command, entry.failure, entry.exception
                )?;
            }
            Ok(())
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unfiltered_catalog_lists_every_key() {
        let out = build(None);
        assert_eq!(out.entries.len(), 73);
        assert_eq!(out.total, 73);
        assert_eq!(out.version, CATALOG_VERSION);
    }

    #[test]
    fn filter_keeps_one_command() {
        let out = build(CommandKind::from_alias("att"));
        assert!(!out.entries.is_empty());
        assert!(out.entries.iter().all(|e| e.command == "att"));
    }

    #[test]
    fn unknown_alias_is_an_error() {
        let args = CatalogArgs {
            command: Some("nope".into()),
        };
        assert!(run_catalog(&args, OutputMode::Text).is_err());
    }
}
