use predicates::prelude::*;

use super::common::TestEnv;

#[test]
fn configure_writes_variables_and_export() {
  let env = TestEnv::new();

  env.cmd("configure").assert().success();

  let stored = env.read(&env.soong_out_dir().join("soong.variables"));
  let value: serde_json::Value = serde_json::from_str(&stored).unwrap();
  assert!(value.is_object());
  assert!(stored.ends_with("}\n"));

  let export = env.soong_out_dir().join("soong_injection").join("product_config");
  let bzl = env.read(&export.join("product_variables.bzl"));
  assert!(bzl.contains("_product_vars = "));
  assert!(export.join("product_variable_constants.bzl").is_file());
  assert!(export.join("BUILD").is_file());
}

#[test]
fn configure_json_reports_summary() {
  let env = TestEnv::new();
  env.write_variables(
    r#"{
      "DeviceName": "generic_x86_64",
      "DeviceArch": "x86_64",
      "DeviceSecondaryArch": "x86",
      "HostArch": "x86_64"
    }"#,
  );

  let output = env.cmd("configure").arg("--json").output().unwrap();
  assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

  let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(value["device_name"], "generic_x86_64");
  assert_eq!(value["build_mode"], "analysis_no_bazel");
  assert_eq!(value["bazel"], "disabled");
  assert_eq!(value["android64"], true);
  assert_eq!(value["host_musl"], false);
  assert_eq!(value["multilib_conflicts"], serde_json::json!([]));
  assert!(value["sdclang"].is_null());
}

#[test]
fn conflicting_mode_flags_fail() {
  let env = TestEnv::new();

  env
    .cmd("configure")
    .args(["--bazel-mode", "--bazel-mode-staging"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("illegal argument: --bazel-mode-staging"));
}

#[test]
fn bazel_mode_without_environment_fails() {
  let env = TestEnv::new();

  env
    .cmd("configure")
    .arg("--bazel-mode-dev")
    .assert()
    .failure()
    .stderr(predicate::str::contains("missing required env vars to use bazel"));
}

#[test]
fn source_inside_out_dir_fails_before_writing() {
  let env = TestEnv::new();
  let mut cmd = env.cmd("configure");
  cmd.arg("--soong-out-dir").arg(env.src_dir().parent().unwrap());

  cmd.assert().failure().stderr(predicate::str::contains("must not contain source directory"));
  assert!(!env.path("soong.variables").exists());
}

#[test]
fn malformed_variables_name_the_file() {
  let env = TestEnv::new();
  env.write_variables("{ not json");

  env
    .cmd("configure")
    .assert()
    .failure()
    .stderr(predicate::str::contains("soong.variables"));
}

#[test]
fn coverage_conflict_is_reported() {
  let env = TestEnv::new();
  env.write_variables(
    r#"{
      "HostArch": "x86_64",
      "GcovCoverage": true,
      "ClangCoverage": true
    }"#,
  );

  env.cmd("configure").assert().failure();
}

#[test]
fn duplicate_snapshot_dirs_fail_unless_warned() {
  let env = TestEnv::new();
  env.write_variables(
    r#"{
      "HostArch": "x86_64",
      "VendorSnapshotDirsExcluded": ["vendor/a", "vendor/b/../a"]
    }"#,
  );

  env
    .cmd("configure")
    .assert()
    .failure()
    .stderr(predicate::str::contains("duplicate entry vendor/b/../a"));

  env.cmd("configure").arg("--warn-duplicate-dirs").assert().success();
}
