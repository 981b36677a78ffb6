//! Environment-driven toolchain selection.
//!
//! The prebuilt Clang location can be overridden per checkout through
//! `LLVM_PREBUILTS_*`. Builds that also use Snapdragon LLVM (SD-Clang)
//! describe it in a JSON config file selected by `SDCLANG_CONFIG`.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::env::EnvLedger;

pub const CLANG_DEFAULT_BASE: &str = "prebuilts/clang/host";
pub const CLANG_DEFAULT_VERSION: &str = "clang-4691093";
pub const CLANG_DEFAULT_SHORT_VERSION: &str = "6.0.2";

#[derive(Debug, Error)]
pub enum ToolchainError {
  #[error("failed to read SD-Clang config {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("SD-Clang config {path} did not parse correctly: {source}")]
  Parse {
    path: PathBuf,
    #[source]
    source: serde_json::Error,
  },

  #[error("default block is required in the SD-Clang config file {path}")]
  MissingDefaultBlock { path: PathBuf },

  #[error("{field} is required in the default block of {path}")]
  MissingField { path: PathBuf, field: &'static str },

  #[error("{name} can not be empty")]
  EmptyPath { name: &'static str },

  #[error("failed to find sanitizer libraries under {path}")]
  SanitizerLibs { path: PathBuf },
}

/// Host Clang prebuilts, after environment overrides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClangToolchain {
  pub base: String,
  pub version: String,
  pub short_version: String,
  /// Compiler launcher prefix, including its trailing space, or empty.
  pub cc_wrapper: String,
}

impl ClangToolchain {
  pub fn from_env(env: &EnvLedger) -> Self {
    let wrapper = env.getenv("CC_WRAPPER");
    Self {
      base: env.getenv_with_default("LLVM_PREBUILTS_BASE", CLANG_DEFAULT_BASE),
      version: env.getenv_with_default("LLVM_PREBUILTS_VERSION", CLANG_DEFAULT_VERSION),
      short_version: env.getenv_with_default("LLVM_RELEASE_VERSION", CLANG_DEFAULT_SHORT_VERSION),
      cc_wrapper: if wrapper.is_empty() { wrapper } else { format!("{wrapper} ") },
    }
  }

  /// `<base>/<prebuilt os>/<version>`
  pub fn path(&self, prebuilt_os: &str) -> String {
    format!("{}/{}/{}", self.base, prebuilt_os, self.version)
  }

  pub fn bin(&self, prebuilt_os: &str) -> String {
    format!("{}/bin", self.path(prebuilt_os))
  }

  pub fn asan_lib_dir(&self) -> String {
    format!(
      "{}/linux-x86/{}/lib64/clang/{}/lib/linux",
      self.base, self.version, self.short_version
    )
  }
}

/// Parses a boolean the way build scripts spell them.
fn parse_bool(value: &str) -> Option<bool> {
  match value {
    "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
    "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
    _ => None,
  }
}

#[derive(Debug, Default, Deserialize)]
struct SdClangBlock {
  #[serde(rename = "SDCLANG")]
  enabled: Option<bool>,
  #[serde(rename = "SDCLANG_PATH")]
  path: Option<String>,
  #[serde(rename = "SDCLANG_PATH_2")]
  path_2: Option<String>,
  #[serde(rename = "SDCLANG_FLAGS")]
  flags: Option<String>,
  #[serde(rename = "SDCLANG_FLAGS_2")]
  flags_2: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct AeConfig {
  #[serde(rename = "SDCLANG_AE_FLAG", default)]
  ae_flag: String,
}

/// Resolved SD-Clang settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SdClangConfig {
  pub enabled: bool,
  pub path: String,
  pub path_2: String,
  pub flags: String,
  pub flags_2: String,
  /// Sanitizer runtime dir, present only when SD-Clang is enabled.
  pub asan_lib_dir: Option<PathBuf>,
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<Option<T>, ToolchainError> {
  let content = match fs::read_to_string(path) {
    Ok(content) => content,
    Err(e) if e.kind() == io::ErrorKind::NotFound => {
      debug!(path = %path.display(), "SD-Clang config file not found");
      return Ok(None);
    }
    Err(source) => {
      return Err(ToolchainError::Read {
        path: path.to_path_buf(),
        source,
      });
    }
  };
  serde_json::from_str(&content)
    .map(Some)
    .map_err(|source| ToolchainError::Parse {
      path: path.to_path_buf(),
      source,
    })
}

impl SdClangConfig {
  /// Resolves SD-Clang from its config files and environment overrides.
  ///
  /// Returns `None` when neither `SDCLANG_CONFIG` nor `SDCLANG_PATH` is set.
  pub fn load(env: &EnvLedger) -> Result<Option<Self>, ToolchainError> {
    let root = PathBuf::from(env.getenv("ANDROID_BUILD_TOP"));
    let config_name = env.getenv("SDCLANG_CONFIG");
    let env_path = env.getenv("SDCLANG_PATH");
    if config_name.is_empty() && env_path.is_empty() {
      return Ok(None);
    }

    let mut ae_flag = String::new();
    let ae_name = env.getenv("SDCLANG_AE_CONFIG");
    if !ae_name.is_empty()
      && let Some(ae) = read_json::<AeConfig>(&root.join(&ae_name))?
    {
      ae_flag = ae.ae_flag;
    }

    let mut sd = Self::default();
    if !config_name.is_empty() {
      let config_path = root.join(&config_name);
      if let Some(mut blocks) = read_json::<BTreeMap<String, SdClangBlock>>(&config_path)? {
        let default = blocks
          .remove("default")
          .ok_or_else(|| ToolchainError::MissingDefaultBlock {
            path: config_path.clone(),
          })?;
        sd.path = default.path.clone().ok_or_else(|| ToolchainError::MissingField {
          path: config_path.clone(),
          field: "SDCLANG_PATH",
        })?;
        sd.path_2 = default.path_2.clone().ok_or_else(|| ToolchainError::MissingField {
          path: config_path.clone(),
          field: "SDCLANG_PATH_2",
        })?;
        sd.apply(default);

        let product = env.getenv("TARGET_PRODUCT");
        if let Some(block) = blocks.remove(&product) {
          debug!(product = %product, "applying product SD-Clang block");
          sd.apply(block);
        }

        if parse_bool(&env.getenv("SDCLANG_SA_ENABLED")).unwrap_or(false) {
          let llvmsa = format!("{}/llvmsa", root.display());
          sd.flags = format!("{} --compile-and-analyze {llvmsa}", sd.flags);
          info!(flags = %sd.flags, "clang static analysis enabled");
        }
      }
    }

    if let Some(enabled) = parse_bool(&env.getenv("SDCLANG")) {
      sd.enabled = enabled;
    }

    let env_path_2 = env.getenv("SDCLANG_PATH_2");
    if !env_path.is_empty() {
      sd.path = env_path;
    }
    if !env_path_2.is_empty() {
      sd.path_2 = env_path_2;
    }
    if sd.path.is_empty() {
      return Err(ToolchainError::EmptyPath { name: "SDCLANG_PATH" });
    }
    if sd.path_2.is_empty() {
      return Err(ToolchainError::EmptyPath { name: "SDCLANG_PATH_2" });
    }

    let common = env.getenv("SDCLANG_COMMON_FLAGS");
    sd.flags = if common.is_empty() {
      format!("{ae_flag} {}", sd.flags)
    } else {
      common
    };
    let common_2 = env.getenv("SDCLANG_COMMON_FLAGS_2");
    sd.flags_2 = if common_2.is_empty() {
      format!("{ae_flag} {}", sd.flags_2)
    } else {
      common_2
    };

    if sd.enabled {
      let bin = Path::new(&sd.path);
      let bin = if bin.is_absolute() { bin.to_path_buf() } else { root.join(bin) };
      sd.asan_lib_dir = Some(find_asan_lib_dir(&bin)?);
    }

    Ok(Some(sd))
  }

  fn apply(&mut self, block: SdClangBlock) {
    if let Some(enabled) = block.enabled {
      self.enabled = enabled;
    }
    if let Some(path) = block.path {
      self.path = path;
    }
    if let Some(path_2) = block.path_2 {
      self.path_2 = path_2;
    }
    if let Some(flags) = block.flags {
      self.flags = flags;
    }
    if let Some(flags_2) = block.flags_2 {
      self.flags_2 = flags_2;
    }
  }
}

/// `<bin>/../lib/clang/<version>/lib/linux`, where exactly one version dir
/// must exist.
fn find_asan_lib_dir(bin: &Path) -> Result<PathBuf, ToolchainError> {
  let clang_lib = bin.join("../lib/clang");
  let entries: Vec<fs::DirEntry> = fs::read_dir(&clang_lib)
    .map_err(|source| ToolchainError::Read {
      path: clang_lib.clone(),
      source,
    })?
    .collect::<Result<_, _>>()
    .map_err(|source| ToolchainError::Read {
      path: clang_lib.clone(),
      source,
    })?;

  match entries.as_slice() {
    [only] if only.path().is_dir() => Ok(only.path().join("lib/linux")),
    _ => Err(ToolchainError::SanitizerLibs { path: clang_lib }),
  }
}
