//! Environment ledger.
//!
//! Every environment variable consulted while configuring is recorded together
//! with the value observed at the first read. The recorded set becomes a
//! dependency of the generated build: when any tracked variable changes, the
//! build reconfigures.
//!
//! Reads are single-shot per name. Once [`EnvLedger::env_deps`] hands the ledger
//! out, it is frozen and reading a name that was never seen is a bug in the
//! caller, since that input could no longer be tracked.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::util::write_atomic;

const TRUE_VALUES: [&str; 5] = ["1", "y", "yes", "on", "true"];
const FALSE_VALUES: [&str; 5] = ["0", "n", "no", "off", "false"];

/// Read access to a set of environment variables.
pub trait EnvSource: Send + Sync {
  /// Returns the value of `name`, or `None` if it is not set.
  fn get(&self, name: &str) -> Option<String>;
}

/// The live environment of the current process.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
  /// Values that are not valid UTF-8 are read lossily rather than dropped.
  fn get(&self, name: &str) -> Option<String> {
    std::env::var_os(name).map(|value| value.to_string_lossy().into_owned())
  }
}

/// An environment where nothing is set. Used when configuration must ignore
/// the caller's environment entirely.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyEnv;

impl EnvSource for EmptyEnv {
  fn get(&self, _name: &str) -> Option<String> {
    None
  }
}

impl EnvSource for BTreeMap<String, String> {
  fn get(&self, name: &str) -> Option<String> {
    BTreeMap::get(self, name).cloned()
  }
}

impl EnvSource for HashMap<String, String> {
  fn get(&self, name: &str) -> Option<String> {
    HashMap::get(self, name).cloned()
  }
}

#[derive(Debug, Error)]
pub enum EnvError {
  #[error("cannot access new environment variable {name} after env deps are frozen")]
  Frozen { name: String },

  #[error("failed to read env file {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to write env file {path}: {source}")]
  Write {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("env file {path} did not parse correctly: {source}")]
  Parse {
    path: PathBuf,
    #[source]
    source: serde_json::Error,
  },

  #[error("cannot marshal env deps: {0}")]
  Serialize(#[source] serde_json::Error),
}

/// Returns true for the canonical truthy encodings.
pub fn is_true(value: &str) -> bool {
  TRUE_VALUES.contains(&value)
}

/// Returns true for the canonical falsy encodings.
pub fn is_false(value: &str) -> bool {
  FALSE_VALUES.contains(&value)
}

#[derive(Debug, Default)]
struct LedgerState {
  deps: BTreeMap<String, String>,
  frozen: bool,
}

/// Records every environment variable read during configuration.
pub struct EnvLedger {
  source: Box<dyn EnvSource>,
  state: Mutex<LedgerState>,
}

impl std::fmt::Debug for EnvLedger {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
    f.debug_struct("EnvLedger")
      .field("deps", &state.deps)
      .field("frozen", &state.frozen)
      .finish()
  }
}

impl EnvLedger {
  pub fn new(source: impl EnvSource + 'static) -> Self {
    Self {
      source: Box::new(source),
      state: Mutex::new(LedgerState::default()),
    }
  }

  /// Returns the value of `name`, recording it on first access.
  ///
  /// An unset variable reads as the empty string.
  ///
  /// # Panics
  ///
  /// Panics if the ledger is frozen and `name` was never read before.
  pub fn getenv(&self, name: &str) -> String {
    match self.try_getenv(name) {
      Ok(value) => value,
      Err(e) => panic!("{e}"),
    }
  }

  /// Like [`getenv`](Self::getenv), but reports a read of an unseen name after
  /// freezing as an error instead of panicking.
  pub fn try_getenv(&self, name: &str) -> Result<String, EnvError> {
    let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(value) = state.deps.get(name) {
      return Ok(value.clone());
    }
    if state.frozen {
      return Err(EnvError::Frozen { name: name.to_string() });
    }
    let value = self.source.get(name).unwrap_or_default();
    debug!(name, value = %value, "recorded environment variable");
    state.deps.insert(name.to_string(), value.clone());
    Ok(value)
  }

  /// Returns the value of `name`, or `default` when it is empty.
  pub fn getenv_with_default(&self, name: &str, default: &str) -> String {
    let value = self.getenv(name);
    if value.is_empty() { default.to_string() } else { value }
  }

  pub fn is_env_true(&self, name: &str) -> bool {
    is_true(&self.getenv(name))
  }

  pub fn is_env_false(&self, name: &str) -> bool {
    is_false(&self.getenv(name))
  }

  /// Returns the variables read so far and freezes the ledger.
  ///
  /// Subsequent calls return the same mapping.
  pub fn env_deps(&self) -> BTreeMap<String, String> {
    let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
    state.frozen = true;
    state.deps.clone()
  }

  pub fn is_frozen(&self) -> bool {
    self.state.lock().unwrap_or_else(PoisonError::into_inner).frozen
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct EnvEntry {
  #[serde(rename = "Key")]
  key: String,
  #[serde(rename = "Value")]
  value: String,
}

/// Writes the ledger to `path` as a JSON list of key/value entries sorted by key.
pub fn write_env_file(path: &Path, deps: &BTreeMap<String, String>) -> Result<(), EnvError> {
  let entries: Vec<EnvEntry> = deps
    .iter()
    .map(|(key, value)| EnvEntry {
      key: key.clone(),
      value: value.clone(),
    })
    .collect();

  let content = serde_json::to_string_pretty(&entries).map_err(EnvError::Serialize)?;

  write_atomic(path, content.as_bytes()).map_err(|source| EnvError::Write {
    path: path.to_path_buf(),
    source,
  })
}

/// Reports whether any variable recorded in the env file at `path` now has a
/// different value in `source`. A missing file is always stale.
pub fn stale_env_file(path: &Path, source: &dyn EnvSource) -> Result<bool, EnvError> {
  let content = match fs::read_to_string(path) {
    Ok(content) => content,
    Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(true),
    Err(source) => {
      return Err(EnvError::Read {
        path: path.to_path_buf(),
        source,
      });
    }
  };

  let entries: Vec<EnvEntry> = serde_json::from_str(&content).map_err(|source| EnvError::Parse {
    path: path.to_path_buf(),
    source,
  })?;

  for entry in entries {
    let current = source.get(&entry.key).unwrap_or_default();
    if current != entry.value {
      debug!(name = %entry.key, old = %entry.value, new = %current, "environment changed");
      return Ok(true);
    }
  }

  Ok(false)
}
