use std::fs;

use buildcfg_lib::platform::{ArchType, OsType};
use buildcfg_lib::variables::export::export_dir;
use buildcfg_lib::{BuildMode, CmdArgs, Config, ConfigError, ConfigOptions};
use tempfile::TempDir;

use super::common::{env, options, write_variables};

#[test]
fn first_run_persists_defaults_and_exports() {
  let temp = TempDir::new().unwrap();
  let soong_out = temp.path().join("soong");
  let args = CmdArgs::new(temp.path(), &soong_out);

  let config = Config::with_options(args, env(&[]), options()).unwrap();

  let stored = fs::read_to_string(soong_out.join("soong.variables")).unwrap();
  assert!(stored.starts_with("{\n    \""));
  assert!(stored.ends_with("}\n"));

  let export = export_dir(&soong_out);
  for name in ["product_variables.bzl", "product_variable_constants.bzl", "BUILD"] {
    assert!(export.join(name).is_file(), "missing {name}");
  }

  assert_eq!(config.build_mode(), BuildMode::AnalysisNoBazel);
  assert_eq!(config.prebuilt_os(), "linux-x86");
}

#[test]
fn second_run_sees_the_same_variables() {
  let temp = TempDir::new().unwrap();
  let soong_out = temp.path().join("soong");

  let first = Config::with_options(CmdArgs::new(temp.path(), &soong_out), env(&[]), options()).unwrap();
  let before = fs::read(soong_out.join("soong.variables")).unwrap();

  let second = Config::with_options(CmdArgs::new(temp.path(), &soong_out), env(&[]), options()).unwrap();
  let after = fs::read(soong_out.join("soong.variables")).unwrap();

  assert_eq!(before, after);
  assert_eq!(first.product_variables(), second.product_variables());
  assert_eq!(first.targets(), second.targets());
}

#[test]
fn custom_device_targets_flow_into_config() {
  let temp = TempDir::new().unwrap();
  let soong_out = temp.path().join("soong");
  write_variables(
    &soong_out,
    r#"{
      "DeviceName": "oriole",
      "DeviceArch": "x86_64",
      "DeviceArchVariant": "",
      "DeviceSecondaryArch": "x86",
      "HostArch": "x86_64"
    }"#,
  );

  let config = Config::with_options(CmdArgs::new(temp.path(), &soong_out), env(&[]), options()).unwrap();

  assert_eq!(config.device_name(), "oriole");
  assert_eq!(config.device_primary_arch_type(), ArchType::X86_64);
  let arch_types: Vec<ArchType> = config
    .targets_for(OsType::Android)
    .iter()
    .map(|t| t.arch.arch_type)
    .collect();
  assert_eq!(arch_types, vec![ArchType::X86_64, ArchType::X86]);
}

#[test]
fn source_inside_build_dir_is_rejected() {
  let temp = TempDir::new().unwrap();
  let args = CmdArgs::new(temp.path(), temp.path());
  let opts = ConfigOptions {
    src_dir: temp.path().join("src"),
    ..options()
  };

  let err = Config::with_options(args, env(&[]), opts).unwrap_err();
  assert!(matches!(err, ConfigError::BuildDirContainsSource { .. }));
  assert!(!temp.path().join("soong.variables").exists());
}

#[test]
fn bazel_mode_needs_bazel_environment() {
  let temp = TempDir::new().unwrap();
  let soong_out = temp.path().join("soong");
  let args = CmdArgs {
    bazel_mode_dev: true,
    ..CmdArgs::new(temp.path(), &soong_out)
  };

  let err = Config::with_options(args, env(&[]), options()).unwrap_err();
  let message = err.to_string();
  assert!(message.contains("BAZEL_HOME"), "unexpected error: {message}");
}
