//! Loading and persisting `soong.variables`.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use thiserror::Error;
use tracing::{debug, info};

use super::{ProductVariables, export, flag, string};
use crate::util::{parent_dir, write_atomic};

#[derive(Debug, Error)]
pub enum VariablesError {
  #[error("config file: could not open {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("config file: {path} did not parse correctly: {source}")]
  Parse {
    path: PathBuf,
    #[source]
    source: serde_json::Error,
  },

  #[error("cannot marshal config data for {path}: {source}")]
  Serialize {
    path: PathBuf,
    #[source]
    source: serde_json::Error,
  },

  #[error("default config file: {path} could not be written: {source}")]
  Write {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("could not create dir {path}: {source}")]
  CreateDir {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("could not write generated config file {path}: {source}")]
  Export {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("config file: {path}: GcovCoverage and ClangCoverage cannot both be set")]
  CoverageConflict { path: PathBuf },

  #[error("config file: {path}: Platform_sdk_final is set but Platform_sdk_version is missing")]
  MissingSdkVersion { path: PathBuf },
}

/// Loads product variables from `path`, creating the file with defaults when
/// it does not exist.
///
/// After decoding, cross-field constraints are validated, derived fields are
/// filled in, and the build-tool-agnostic export is written next to `path`
/// (see [`export::write_bazel_config`]).
pub fn load(path: &Path) -> Result<ProductVariables, VariablesError> {
  let vars = match fs::read_to_string(path) {
    Ok(content) => {
      debug!(path = %path.display(), "decoding product variables");
      let mut vars: ProductVariables = serde_json::from_str(&content).map_err(|source| VariablesError::Parse {
        path: path.to_path_buf(),
        source,
      })?;
      normalize(&mut vars, path)?;
      vars
    }
    Err(e) if e.kind() == io::ErrorKind::NotFound => {
      // The file must exist afterwards so the build does not loop trying to
      // regenerate it.
      info!(path = %path.display(), "product variables not found, writing defaults");
      let mut vars = ProductVariables::with_defaults();
      normalize(&mut vars, path)?;
      save_atomic(path, &vars)?;
      vars
    }
    Err(source) => {
      return Err(VariablesError::Read {
        path: path.to_path_buf(),
        source,
      });
    }
  };

  export::write_bazel_config(&vars, &parent_dir(path))?;

  Ok(vars)
}

/// Validates cross-field constraints and computes derived fields.
fn normalize(vars: &mut ProductVariables, path: &Path) -> Result<(), VariablesError> {
  let gcov = flag(vars.gcov_coverage);
  let clang = flag(vars.clang_coverage);
  if gcov && clang {
    return Err(VariablesError::CoverageConflict {
      path: path.to_path_buf(),
    });
  }
  vars.native_coverage = Some(gcov || clang);

  // A finalized SDK is identified by its number, a preview SDK by its codename.
  let version_or_codename = if flag(vars.platform_sdk_final) {
    match vars.platform_sdk_version {
      Some(version) => version.to_string(),
      None => {
        return Err(VariablesError::MissingSdkVersion {
          path: path.to_path_buf(),
        });
      }
    }
  } else {
    string(&vars.platform_sdk_codename).to_string()
  };
  vars.platform_sdk_version_or_codename = Some(version_or_codename);

  Ok(())
}

/// Serializes `vars` the way product config writes them: four-space
/// indentation and a trailing newline.
pub(crate) fn to_pretty_json(vars: &ProductVariables) -> Result<Vec<u8>, serde_json::Error> {
  let mut buf = Vec::new();
  let mut ser = serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
  vars.serialize(&mut ser)?;
  Ok(buf)
}

/// Writes `vars` to `path` atomically.
///
/// The data goes to a temporary file in the same directory which is then
/// renamed over `path`, so a concurrent reader (for example a docs build
/// running next to the main build) never observes a partial file.
pub fn save_atomic(path: &Path, vars: &ProductVariables) -> Result<(), VariablesError> {
  let mut data = to_pretty_json(vars).map_err(|source| VariablesError::Serialize {
    path: path.to_path_buf(),
    source,
  })?;
  data.push(b'\n');

  let dir = parent_dir(path);
  fs::create_dir_all(&dir).map_err(|source| VariablesError::CreateDir {
    path: dir.clone(),
    source,
  })?;

  write_atomic(path, &data).map_err(|source| VariablesError::Write {
    path: path.to_path_buf(),
    source,
  })?;

  info!(path = %path.display(), "wrote product variables");
  Ok(())
}
