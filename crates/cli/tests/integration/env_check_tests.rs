use predicates::prelude::*;

use super::common::TestEnv;

#[test]
fn used_env_file_round_trips_through_env_check() {
  let env = TestEnv::new();
  let used_env = env.path("soong.environment.used");

  env
    .cmd("configure")
    .arg("--used-env")
    .arg(&used_env)
    .env("CC_WRAPPER", "ccache")
    .assert()
    .success();

  let recorded: serde_json::Value = serde_json::from_str(&env.read(&used_env)).unwrap();
  let entries = recorded.as_array().unwrap();
  assert!(
    entries
      .iter()
      .any(|e| e["Key"] == "CC_WRAPPER" && e["Value"] == "ccache")
  );

  env
    .cmd("env-check")
    .arg(&used_env)
    .env("CC_WRAPPER", "ccache")
    .assert()
    .success()
    .stdout(predicate::str::contains("Environment unchanged"));

  env
    .cmd("env-check")
    .arg(&used_env)
    .env("CC_WRAPPER", "distcc")
    .assert()
    .success()
    .stderr(predicate::str::contains("Environment changed"));
}

#[test]
fn ignore_env_records_variables_as_unset() {
  let env = TestEnv::new();
  let used_env = env.path("soong.environment.used");

  env
    .cmd("configure")
    .arg("--ignore-env")
    .arg("--used-env")
    .arg(&used_env)
    .env("CC_WRAPPER", "ccache")
    .assert()
    .success();

  let recorded: serde_json::Value = serde_json::from_str(&env.read(&used_env)).unwrap();
  let entries = recorded.as_array().unwrap();
  assert!(entries.iter().any(|e| e["Key"] == "CC_WRAPPER" && e["Value"] == ""));

  env
    .cmd("env-check")
    .arg(&used_env)
    .env("CC_WRAPPER", "ccache")
    .assert()
    .success()
    .stderr(predicate::str::contains("Environment changed"));
}

#[test]
fn env_check_json_reports_staleness() {
  let env = TestEnv::new();
  let missing = env.path("missing.json");

  let output = env.cmd("env-check").arg(&missing).arg("--json").output().unwrap();
  assert!(output.status.success());

  let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(value["stale"], true);
}

#[test]
fn malformed_env_file_fails() {
  let env = TestEnv::new();
  let file = env.path("env.json");
  std::fs::write(&file, "not json").unwrap();

  env
    .cmd("env-check")
    .arg(&file)
    .assert()
    .failure()
    .stderr(predicate::str::contains("Failed to check environment file"));
}
