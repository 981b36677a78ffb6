//! CLI smoke tests for buildcfg.
//!
//! These tests verify that every command runs without panicking and returns
//! the expected exit code.

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::TempDir;

fn buildcfg_cmd() -> Command {
  let mut cmd = cargo_bin_cmd!("buildcfg");
  for var in ["SDCLANG_CONFIG", "SDCLANG_PATH", "RUST_LOG"] {
    cmd.env_remove(var);
  }
  cmd
}

// =============================================================================
// Help & Version
// =============================================================================

#[test]
fn help_flag_works() {
  buildcfg_cmd()
    .arg("--help")
    .assert()
    .success()
    .stdout(predicate::str::contains("Usage"));
}

#[test]
fn version_flag_works() {
  buildcfg_cmd()
    .arg("--version")
    .assert()
    .success()
    .stdout(predicate::str::contains("buildcfg"));
}

#[test]
fn subcommand_help_works() {
  for cmd in &["configure", "targets", "env-check", "info"] {
    buildcfg_cmd()
      .arg(cmd)
      .arg("--help")
      .assert()
      .success()
      .stdout(predicate::str::contains("Usage"));
  }
}

#[test]
fn configure_help_lists_mode_flags() {
  buildcfg_cmd()
    .args(["configure", "--help"])
    .assert()
    .success()
    .stdout(predicate::str::contains("--bp2build_marker"))
    .stdout(predicate::str::contains("--bazel-mode-dev"))
    .stdout(predicate::str::contains("--used-env"));
}

#[test]
fn unknown_subcommand_fails() {
  buildcfg_cmd().arg("frobnicate").assert().failure();
}

// =============================================================================
// Commands
// =============================================================================

#[test]
fn info_shows_host() {
  buildcfg_cmd()
    .arg("info")
    .assert()
    .success()
    .stdout(predicate::str::contains("Host"));
}

#[test]
fn info_json_is_valid() {
  let output = buildcfg_cmd().args(["info", "--json"]).output().unwrap();
  assert!(output.status.success());
  let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  assert!(value["os"].is_string());
  assert!(value["arch"].is_string());
}

#[test]
fn configure_succeeds_in_empty_out_dir() {
  let temp = TempDir::new().unwrap();
  let out = temp.path().join("out");

  buildcfg_cmd()
    .arg("configure")
    .arg("--out-dir")
    .arg(&out)
    .arg("--src-dir")
    .arg(temp.path().join("src"))
    .assert()
    .success()
    .stdout(predicate::str::contains("analysis_no_bazel"));

  assert!(out.join("soong").join("soong.variables").is_file());
}

#[test]
fn env_check_of_missing_file_reports_stale() {
  let temp = TempDir::new().unwrap();

  buildcfg_cmd()
    .arg("env-check")
    .arg(temp.path().join("missing.json"))
    .assert()
    .success()
    .stderr(predicate::str::contains("Environment changed"));
}
