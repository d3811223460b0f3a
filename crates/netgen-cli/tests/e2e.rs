//! End-to-end tests for the `netgen` binary.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn netgen_cmd(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("netgen"));
    cmd.current_dir(dir);
    cmd.env("NETGEN_LOG", "error");
    cmd.env_remove("NETGEN_FORMAT");
    cmd
}

fn json_stdout(cmd: &mut Command) -> Value {
    let output = cmd.output().expect("netgen should not crash");
    assert!(
        output.status.success(),
        "netgen failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("valid JSON")
}

#[test]
fn generate_writes_a_file_and_reports_json() {
    let dir = TempDir::new().expect("tempdir");
    let report = json_stdout(netgen_cmd(dir.path()).args([
        "generate", "--mode", "mutual", "--count", "400", "--output", "data.txt", "--seed",
        "11", "--json",
    ]));

    let text = fs::read_to_string(dir.path().join("data.txt")).expect("output file");
    assert!(text.starts_with("ln "));
    assert_eq!(report["mode"], "mutual");
    assert_eq!(report["seed"], 11);
    assert_eq!(
        report["lines"].as_u64(),
        Some(text.lines().count() as u64)
    );
    assert!(report["lines"].as_u64().unwrap_or(u64::MAX) <= 3_000);
}

#[test]
fn same_seed_writes_identical_files() {
    let dir = TempDir::new().expect("tempdir");
    for name in ["a.txt", "b.txt"] {
        netgen_cmd(dir.path())
            .args(["generate", "-m", "P", "-n", "300", "-o", name, "--seed", "5"])
            .assert()
            .success();
    }
    let a = fs::read(dir.path().join("a.txt")).expect("a");
    let b = fs::read(dir.path().join("b.txt")).expect("b");
    assert_eq!(a, b);
}

#[test]
fn count_of_one_writes_only_the_bulk_load() {
    let dir = TempDir::new().expect("tempdir");
    netgen_cmd(dir.path())
        .args(["generate", "-n", "1", "-o", "one.txt", "--seed", "1", "--format", "text"])
        .assert()
        .success()
        .stdout(predicate::str::contains("instructions=1"));
    let text = fs::read_to_string(dir.path().join("one.txt")).expect("output file");
    assert_eq!(text.lines().next(), Some("ln 1"));
    assert_eq!(text.lines().count(), 4);
}

#[test]
fn generated_file_verifies_clean() {
    let dir = TempDir::new().expect("tempdir");
    netgen_cmd(dir.path())
        .args(["generate", "-m", "M", "-n", "800", "-o", "data.txt", "--seed", "21"])
        .assert()
        .success();

    let report = json_stdout(netgen_cmd(dir.path()).args(["verify", "data.txt", "--json"]));
    assert_eq!(report["unmodeled"].as_array().map(Vec::len), Some(0));
    assert_eq!(report["violations"].as_array().map(Vec::len), Some(0));
    assert_eq!(report["per_command"]["ln"]["normal"], 1);
}

#[test]
fn batch_writes_numbered_files() {
    let dir = TempDir::new().expect("tempdir");
    let report = json_stdout(netgen_cmd(dir.path()).args([
        "batch",
        "--cases",
        "3",
        "--seed-start",
        "40",
        "--out-dir",
        "out",
        "--mode",
        "mutual",
        "--count",
        "100",
        "--json",
    ]));

    let cases = report["cases"].as_array().expect("cases");
    assert_eq!(cases.len(), 3);
    for i in 1..=3 {
        assert!(dir.path().join(format!("out/test_data_{i}.txt")).is_file());
    }
    assert_eq!(cases[0]["seed"], 40);
    assert_eq!(cases[2]["index"], 3);
}

#[test]
fn config_file_drives_generation() {
    let dir = TempDir::new().expect("tempdir");
    fs::write(
        dir.path().join("netgen.toml"),
        "mode = \"mutual\"\ntarget = 200\nseed = 77\n\n[tuning]\nerror_attempt_percent = 60\n",
    )
    .expect("config");

    let report = json_stdout(netgen_cmd(dir.path()).args([
        "generate",
        "--config",
        "netgen.toml",
        "-o",
        "data.txt",
        "--json",
    ]));
    assert_eq!(report["mode"], "mutual");
    assert_eq!(report["seed"], 77);
    assert_eq!(report["target"], 200);
}

#[test]
fn invalid_config_fails_with_context() {
    let dir = TempDir::new().expect("tempdir");
    fs::write(
        dir.path().join("bad.toml"),
        "[tuning]\nerror_attempt_percent = 150\n",
    )
    .expect("config");

    netgen_cmd(dir.path())
        .args(["generate", "--config", "bad.toml", "-o", "data.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("bad.toml"));
    assert!(!dir.path().join("data.txt").exists());
}

#[test]
fn unwritable_output_fails() {
    let dir = TempDir::new().expect("tempdir");
    netgen_cmd(dir.path())
        .args(["generate", "-n", "10", "-o", "missing/dir/data.txt", "--seed", "2"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to write"));
}

#[test]
fn verify_rejects_malformed_input() {
    let dir = TempDir::new().expect("tempdir");
    fs::write(dir.path().join("bad.txt"), "ap 1 x\n").expect("input");
    netgen_cmd(dir.path())
        .args(["verify", "bad.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("bad.txt"));
}

#[test]
fn catalog_lists_73_keys() {
    let report = json_stdout(netgen_cmd(Path::new(".")).args(["catalog", "--json"]));
    assert_eq!(report["total"], 73);
    assert_eq!(report["entries"].as_array().map(Vec::len), Some(73));
}

#[test]
fn completions_mention_subcommands() {
    netgen_cmd(Path::new("."))
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("generate"));
}
