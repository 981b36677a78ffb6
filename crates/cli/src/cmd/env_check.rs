//! Implementation of the `buildcfg env-check` command.
//!
//! Compares an environment file written by `configure --used-env` against
//! the current process environment.

use std::path::Path;

use anyhow::{Context, Result};
use serde_json::json;

use buildcfg_lib::ProcessEnv;
use buildcfg_lib::env::stale_env_file;

use crate::output::{OutputFormat, print_json, print_success, print_warning};

pub fn cmd_env_check(file: &Path, format: OutputFormat) -> Result<()> {
  let stale = stale_env_file(file, &ProcessEnv)
    .with_context(|| format!("Failed to check environment file: {}", file.display()))?;

  if format.is_json() {
    return print_json(&json!({ "path": file.display().to_string(), "stale": stale }));
  }

  if stale {
    print_warning(&format!("Environment changed since {} was written", file.display()));
  } else {
    print_success("Environment unchanged");
  }

  Ok(())
}
