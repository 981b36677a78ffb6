use predicates::prelude::*;

use super::common::TestEnv;

#[test]
fn default_device_targets_are_listed() {
  let env = TestEnv::new();

  env
    .cmd("targets")
    .assert()
    .success()
    .stdout(predicate::str::contains("android"))
    .stdout(predicate::str::contains("android_arm64"));
}

#[test]
fn multilib_conflict_is_flagged() {
  let env = TestEnv::new();
  env.write_variables(
    r#"{
      "HostArch": "x86_64",
      "DeviceArch": "arm64",
      "DeviceSecondaryArch": "x86_64"
    }"#,
  );

  let output = env.cmd("targets").arg("--json").output().unwrap();
  assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

  let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(value["multilib_conflicts"], serde_json::json!(["x86_64"]));
  let android = value["targets"]["android"].as_array().unwrap();
  assert_eq!(android.len(), 2);
  assert_eq!(android[0]["multilib"], "lib64");
}

#[test]
fn ndk_abis_replace_device_targets() {
  let env = TestEnv::new();
  env.write_variables(
    r#"{
      "HostArch": "x86_64",
      "DeviceArch": "x86_64",
      "Ndk_abis": true
    }"#,
  );

  let output = env.cmd("targets").arg("--json").output().unwrap();
  assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

  let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  let android = value["targets"]["android"].as_array().unwrap();
  assert_eq!(android.len(), 5);
  assert_eq!(value["android_first_device_target"], "android_arm64_armv8-a-branchprot");
}
