use buildcfg_lib::env::{EnvError, stale_env_file, write_env_file};
use buildcfg_lib::{CmdArgs, Config, ConfigOptions, ProcessEnv};
use serial_test::serial;
use tempfile::TempDir;

use super::common::{env, options};

#[test]
fn env_deps_round_trip_through_env_file() {
  let temp = TempDir::new().unwrap();
  let soong_out = temp.path().join("soong");
  let vars = env(&[("USE_RBE", "true"), ("RBE_WRAPPER", "/opt/rewrapper")]);
  let config = Config::with_options(CmdArgs::new(temp.path(), &soong_out), vars.clone(), options()).unwrap();

  assert_eq!(config.rbe_wrapper(), "/opt/rewrapper");
  assert!(config.is_env_true("USE_RBE"));
  assert_eq!(config.getenv("UNSET_VARIABLE"), "");

  let deps = config.env_deps();
  assert_eq!(deps.get("RBE_WRAPPER").map(String::as_str), Some("/opt/rewrapper"));
  assert_eq!(deps.get("UNSET_VARIABLE").map(String::as_str), Some(""));

  let env_file = soong_out.join("soong.environment.used");
  write_env_file(&env_file, &deps).unwrap();
  assert!(!stale_env_file(&env_file, &vars).unwrap());

  let changed = env(&[("USE_RBE", "false"), ("RBE_WRAPPER", "/opt/rewrapper")]);
  assert!(stale_env_file(&env_file, &changed).unwrap());
}

#[test]
fn env_file_in_missing_dir_is_a_write_error() {
  let temp = TempDir::new().unwrap();
  let soong_out = temp.path().join("soong");
  let config = Config::with_options(CmdArgs::new(temp.path(), &soong_out), env(&[]), options()).unwrap();
  config.getenv("OUT_DIR");

  let env_file = temp.path().join("missing").join("soong.environment.used");
  let err = write_env_file(&env_file, &config.env_deps()).unwrap_err();

  assert!(matches!(err, EnvError::Write { .. }), "unexpected error: {err}");
  assert!(!env_file.exists());
}

#[test]
fn ignored_env_records_reads_as_unset() {
  let temp = TempDir::new().unwrap();
  let soong_out = temp.path().join("soong");
  let opts = ConfigOptions {
    ignore_env: true,
    ..options()
  };
  let config = Config::with_options(
    CmdArgs::new(temp.path(), &soong_out),
    env(&[("USE_RBE", "true")]),
    opts,
  )
  .unwrap();

  assert!(!config.is_env_true("USE_RBE"));
  assert_eq!(config.env_deps().get("USE_RBE").map(String::as_str), Some(""));
}

#[test]
#[serial]
fn process_env_is_read_once() {
  let temp = TempDir::new().unwrap();
  let soong_out = temp.path().join("soong");

  temp_env::with_vars([("BUILDCFG_TEST_VALUE", Some("first"))], || {
    let config = Config::with_options(CmdArgs::new(temp.path(), &soong_out), ProcessEnv, options()).unwrap();
    assert_eq!(config.getenv("BUILDCFG_TEST_VALUE"), "first");

    temp_env::with_var("BUILDCFG_TEST_VALUE", Some("second"), || {
      assert_eq!(config.getenv("BUILDCFG_TEST_VALUE"), "first");
    });
  });
}
