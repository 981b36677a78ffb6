//! OS and architecture model shared by target resolution and the config facade.

pub mod arch;
pub mod os;

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use arch::{Arch, ArchType, Multilib};
pub use os::{OsClass, OsType};

#[derive(Debug, Error)]
pub enum PlatformError {
  #[error("unsupported build host OS: {0}")]
  UnsupportedOs(&'static str),

  #[error("unsupported build host architecture: {0}")]
  UnsupportedArch(&'static str),
}

/// A single compilation target: an OS paired with a configured architecture.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Target {
  pub os: OsType,
  pub arch: Arch,
  /// True for targets of a cross-compiled host (e.g. Windows tools built on Linux).
  #[serde(default)]
  pub host_cross: bool,
}

impl Target {
  pub fn new(os: OsType, arch: Arch, host_cross: bool) -> Self {
    Self { os, arch, host_cross }
  }

  /// The OS/arch independent target for `os`.
  pub fn common(os: OsType) -> Self {
    Self::new(os, Arch::new(ArchType::Common), false)
  }

  pub fn multilib(&self) -> Multilib {
    self.arch.arch_type.multilib()
  }

  /// Variant string such as `android_arm64_armv8-a`
  pub fn name(&self) -> String {
    format!("{}_{}", self.os, self.arch.variant_name())
  }
}

impl fmt::Display for Target {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.name())
  }
}

/// The OS and architecture of the machine running the build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HostPlatform {
  pub os: OsType,
  pub arch: ArchType,
}

impl HostPlatform {
  pub fn new(os: OsType, arch: ArchType) -> Self {
    Self { os, arch }
  }

  /// Detect the build host at runtime.
  ///
  /// `host_musl` selects the musl flavor of Linux when the host is Linux.
  pub fn detect(host_musl: bool) -> Result<Self, PlatformError> {
    let os = match std::env::consts::OS {
      "linux" if host_musl => OsType::LinuxMusl,
      "linux" => OsType::Linux,
      "macos" => OsType::Darwin,
      other => return Err(PlatformError::UnsupportedOs(other)),
    };
    let arch = ArchType::current().ok_or(PlatformError::UnsupportedArch(std::env::consts::ARCH))?;
    Ok(Self { os, arch })
  }

  /// Name of the host directory inside `prebuilts/`, e.g. `linux-x86`.
  pub fn prebuilt_os(&self) -> Option<&'static str> {
    match self.os {
      os if os.is_linux() => Some("linux-x86"),
      OsType::Darwin => Some("darwin-x86"),
      _ => None,
    }
  }

  /// Host flag for cp(1) that preserves symlinks.
  pub fn cp_preserve_symlinks_flags(&self) -> &'static str {
    match self.os {
      OsType::Darwin => "-R",
      os if os.is_linux() => "-d",
      _ => "",
    }
  }
}

impl fmt::Display for HostPlatform {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}-{}", self.os, self.arch)
  }
}
