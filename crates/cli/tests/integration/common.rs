//! Shared test helpers for CLI integration tests.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use tempfile::TempDir;

/// Variables the binary reads that must not leak in from the test runner.
const SCRUBBED_ENV: &[&str] = &[
  "RUST_LOG",
  "CC_WRAPPER",
  "LLVM_PREBUILTS_BASE",
  "LLVM_PREBUILTS_VERSION",
  "LLVM_RELEASE_VERSION",
  "SDCLANG",
  "SDCLANG_CONFIG",
  "SDCLANG_PATH",
  "SDCLANG_PATH_2",
  "BAZEL_HOME",
  "BAZEL_PATH",
  "BAZEL_OUTPUT_BASE",
  "BAZEL_WORKSPACE",
  "BAZEL_METRICS_DIR",
  "BAZEL_DEPS_FILE",
];

/// Isolated out/source directory pair.
pub struct TestEnv {
  pub temp: TempDir,
}

impl TestEnv {
  pub fn new() -> Self {
    Self {
      temp: TempDir::new().unwrap(),
    }
  }

  pub fn out_dir(&self) -> PathBuf {
    self.temp.path().join("out")
  }

  pub fn soong_out_dir(&self) -> PathBuf {
    self.out_dir().join("soong")
  }

  pub fn src_dir(&self) -> PathBuf {
    self.temp.path().join("src")
  }

  pub fn path(&self, relative: &str) -> PathBuf {
    self.temp.path().join(relative)
  }

  /// Write `soong.variables` before the first run.
  pub fn write_variables(&self, json: &str) {
    let dir = self.soong_out_dir();
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("soong.variables"), json).unwrap();
  }

  pub fn read(&self, path: &Path) -> String {
    std::fs::read_to_string(path).unwrap_or_else(|e| panic!("Failed to read {}: {}", path.display(), e))
  }

  /// A scrubbed command for `subcommand` with the directory flags filled in.
  pub fn cmd(&self, subcommand: &str) -> Command {
    let mut cmd = cargo_bin_cmd!("buildcfg");
    for var in SCRUBBED_ENV {
      cmd.env_remove(var);
    }
    cmd.arg(subcommand);
    if subcommand != "env-check" && subcommand != "info" {
      cmd
        .arg("--out-dir")
        .arg(self.out_dir())
        .arg("--src-dir")
        .arg(self.src_dir());
    }
    cmd
  }
}
