//! Handle to the external Bazel service used by mixed builds.
//!
//! Configuration only decides which kind of context a run gets and validates
//! its inputs; talking to Bazel happens elsewhere.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::env::EnvLedger;
use crate::mode::BuildMode;

/// Environment variables a subprocess context needs.
pub const REQUIRED_ENV: [&str; 6] = [
  "BAZEL_HOME",
  "BAZEL_PATH",
  "BAZEL_OUTPUT_BASE",
  "BAZEL_WORKSPACE",
  "BAZEL_METRICS_DIR",
  "BAZEL_DEPS_FILE",
];

/// Socket the Bazel proxy listens on, relative to the out dir.
pub const PROXY_SOCKET: &str = "bazelsocket.sock";

#[derive(Debug, Error)]
pub enum BazelError {
  #[error("missing required env vars to use bazel: {}", .missing.join(", "))]
  MissingEnv { missing: Vec<&'static str> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BazelKind {
  Disabled,
  Proxy,
  Subprocess,
}

impl fmt::Display for BazelKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      Self::Disabled => "disabled",
      Self::Proxy => "proxy",
      Self::Subprocess => "subprocess",
    };
    write!(f, "{name}")
  }
}

pub trait BazelContext: fmt::Debug + Send + Sync {
  /// Whether Bazel handles any module in this run.
  fn is_enabled(&self) -> bool;

  fn kind(&self) -> BazelKind;
}

#[derive(Debug, Default)]
pub struct DisabledBazelContext;

impl BazelContext for DisabledBazelContext {
  fn is_enabled(&self) -> bool {
    false
  }

  fn kind(&self) -> BazelKind {
    BazelKind::Disabled
  }
}

/// Requests go through a long-lived proxy over a unix socket.
#[derive(Debug)]
pub struct ProxyBazelContext {
  pub socket: PathBuf,
}

impl BazelContext for ProxyBazelContext {
  fn is_enabled(&self) -> bool {
    true
  }

  fn kind(&self) -> BazelKind {
    BazelKind::Proxy
  }
}

/// Locations needed to invoke Bazel directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BazelPaths {
  pub home: PathBuf,
  pub bazel: PathBuf,
  pub output_base: PathBuf,
  pub workspace: PathBuf,
  pub metrics_dir: PathBuf,
  pub deps_file: PathBuf,
}

#[derive(Debug)]
pub struct SubprocessBazelContext {
  pub paths: BazelPaths,
}

impl BazelContext for SubprocessBazelContext {
  fn is_enabled(&self) -> bool {
    true
  }

  fn kind(&self) -> BazelKind {
    BazelKind::Subprocess
  }
}

/// Builds the context for `mode`.
///
/// Environment variables are read through `env` so they become dependencies
/// of the configuration.
pub fn new_bazel_context(
  mode: BuildMode,
  use_proxy: bool,
  out_dir: &Path,
  env: &EnvLedger,
) -> Result<Box<dyn BazelContext>, BazelError> {
  if !mode.is_bazel_mode() {
    return Ok(Box::new(DisabledBazelContext));
  }

  if use_proxy {
    let socket = out_dir.join(PROXY_SOCKET);
    info!(socket = %socket.display(), "using bazel proxy");
    return Ok(Box::new(ProxyBazelContext { socket }));
  }

  let values: Vec<String> = REQUIRED_ENV.iter().map(|name| env.getenv(name)).collect();
  let missing: Vec<&'static str> = REQUIRED_ENV
    .iter()
    .zip(&values)
    .filter(|(_, value)| value.is_empty())
    .map(|(name, _)| *name)
    .collect();
  if !missing.is_empty() {
    return Err(BazelError::MissingEnv { missing });
  }

  let paths = BazelPaths {
    home: PathBuf::from(&values[0]),
    bazel: PathBuf::from(&values[1]),
    output_base: PathBuf::from(&values[2]),
    workspace: PathBuf::from(&values[3]),
    metrics_dir: PathBuf::from(&values[4]),
    deps_file: PathBuf::from(&values[5]),
  };
  info!(bazel = %paths.bazel.display(), "using bazel subprocess");
  Ok(Box::new(SubprocessBazelContext { paths }))
}
