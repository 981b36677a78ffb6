//! Implementation of the `buildcfg configure` command.
//!
//! Builds the full configuration from the invocation flags and the live
//! environment, which loads (or creates) `soong.variables` and refreshes the
//! Starlark export as a side effect.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use buildcfg_lib::bazel::BazelKind;
use buildcfg_lib::env::write_env_file;
use buildcfg_lib::toolchain::{ClangToolchain, SdClangConfig};
use buildcfg_lib::{BuildMode, CmdArgs, Config, ConfigOptions, DuplicatePolicy, ProcessEnv};

use crate::output::{OutputFormat, print_json, print_stat, print_success, print_warning, yes_no};

#[derive(Debug, Serialize)]
struct ConfigureSummary {
  product_variables: String,
  device_name: String,
  device_product: String,
  host: String,
  prebuilt_os: &'static str,
  host_musl: bool,
  build_mode: BuildMode,
  bazel: BazelKind,
  kati_enabled: bool,
  android64: bool,
  force_enabled_modules: Vec<String>,
  multilib_conflicts: Vec<String>,
  clang: ClangToolchain,
  clang_path: String,
  sdclang: Option<SdClangConfig>,
  snapshot_dirs: usize,
  used_env: Option<String>,
}

/// Flags specific to `configure`.
pub struct ConfigureOptions<'a> {
  pub src_dir: &'a Path,
  pub used_env: Option<&'a Path>,
  pub warn_duplicate_dirs: bool,
  pub ignore_env: bool,
}

pub fn cmd_configure(args: CmdArgs, opts: ConfigureOptions<'_>, format: OutputFormat) -> Result<()> {
  let used_env = opts.used_env;
  let options = ConfigOptions {
    src_dir: opts.src_dir.to_path_buf(),
    host: None,
    duplicate_policy: if opts.warn_duplicate_dirs {
      DuplicatePolicy::Warn
    } else {
      DuplicatePolicy::Error
    },
    ignore_env: opts.ignore_env,
  };
  let config = Config::with_options(args, ProcessEnv, options).context("Failed to configure build")?;

  let snapshot_dirs = [
    config.vendor_snapshot_dirs_excluded(),
    config.vendor_snapshot_dirs_included(),
    config.recovery_snapshot_dirs_excluded(),
    config.recovery_snapshot_dirs_included(),
  ]
  .into_iter()
  .map(|set| set.map(|s| s.len()))
  .sum::<Result<usize, _>>()
  .context("Invalid snapshot directory list")?;

  let clang = config.clang_toolchain();
  let clang_path = clang.path(config.prebuilt_os());
  let sdclang = config.sdclang().context("Failed to resolve SD-Clang settings")?;

  let summary = ConfigureSummary {
    product_variables: dunce::simplified(config.product_variables_path()).display().to_string(),
    device_name: config.device_name().to_string(),
    device_product: config.device_product().to_string(),
    host: config.host().to_string(),
    prebuilt_os: config.prebuilt_os(),
    host_musl: config.use_host_musl(),
    build_mode: config.build_mode(),
    bazel: config.bazel_context().kind(),
    kati_enabled: config.kati_enabled(),
    android64: config.android64(),
    force_enabled_modules: config.bazel_modules_force_enabled_by_flag().into_iter().collect(),
    multilib_conflicts: config
      .targets()
      .multilib_conflicts
      .iter()
      .map(|arch| arch.to_string())
      .collect(),
    clang,
    clang_path,
    sdclang,
    snapshot_dirs,
    used_env: used_env.map(|p| p.display().to_string()),
  };

  // Freezes the ledger, so every env read above is already recorded.
  if let Some(path) = used_env {
    write_env_file(path, &config.env_deps())
      .with_context(|| format!("Failed to write used environment: {}", path.display()))?;
  }

  if format.is_json() {
    return print_json(&summary);
  }

  print_success(&format!("Configured {}", summary.product_variables));
  print_stat("Device", &summary.device_name);
  print_stat("Product", &summary.device_product);
  print_stat("Host", &summary.host);
  if summary.host_musl {
    print_stat("Host libc", "musl");
  }
  print_stat("Build mode", summary.build_mode.as_str());
  print_stat("Bazel", &summary.bazel.to_string());
  print_stat("Kati", yes_no(summary.kati_enabled));
  print_stat("64-bit device", yes_no(summary.android64));
  print_stat("Clang", &summary.clang_path);
  if let Some(sdclang) = &summary.sdclang {
    print_stat("SD-Clang", if sdclang.enabled { sdclang.path.as_str() } else { "disabled" });
  }
  if !summary.force_enabled_modules.is_empty() {
    print_stat("Forced into Bazel", &summary.force_enabled_modules.join(", "));
  }
  for arch in &summary.multilib_conflicts {
    print_warning(&format!("{arch} shares a multilib class with an earlier device target"));
  }
  if let Some(path) = &summary.used_env {
    print_stat("Used environment", path);
  }

  Ok(())
}
