//! Implementation of the `buildcfg targets` command.

use std::path::Path;

use anyhow::{Context, Result};
use serde_json::json;

use buildcfg_lib::platform::OsType;
use buildcfg_lib::{CmdArgs, Config, ConfigOptions, ProcessEnv};

use crate::output::{OutputFormat, print_info, print_json, symbols};

pub fn cmd_targets(args: CmdArgs, src_dir: &Path, format: OutputFormat) -> Result<()> {
  let options = ConfigOptions {
    src_dir: src_dir.to_path_buf(),
    ..Default::default()
  };
  let config = Config::with_options(args, ProcessEnv, options).context("Failed to configure build")?;
  let resolved = config.targets();

  if format.is_json() {
    let by_os: serde_json::Map<String, serde_json::Value> = resolved
      .targets
      .iter()
      .map(|(os, targets)| {
        let items: Vec<_> = targets
          .iter()
          .map(|t| {
            json!({
              "name": t.name(),
              "arch": t.arch,
              "multilib": t.multilib().as_str(),
              "host_cross": t.host_cross,
            })
          })
          .collect();
        (os.as_str().to_string(), serde_json::Value::Array(items))
      })
      .collect();
    return print_json(&json!({
      "targets": by_os,
      "build_os_target": config.build_os_target().name(),
      "android_first_device_target": config.android_first_device_target().map(|t| t.name()),
      "multilib_conflicts": resolved.multilib_conflicts.iter().map(|a| a.as_str()).collect::<Vec<_>>(),
    }));
  }

  for (os, targets) in &resolved.targets {
    if *os == OsType::CommonOs {
      continue;
    }
    print_info(os.as_str());
    for target in targets {
      let conflict = *os == OsType::Android && resolved.has_multilib_conflict(target.arch.arch_type);
      println!(
        "  {} {} ({}){}",
        symbols::INFO,
        target.name(),
        target.multilib().as_str(),
        if conflict { " [multilib conflict]" } else { "" }
      );
    }
  }

  Ok(())
}
