use std::fmt;

use serde::{Deserialize, Serialize};

/// Broad class of an operating system target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OsClass {
  /// Runs on the device being built.
  Device,
  /// Runs on the machine doing the build (or a cross host).
  Host,
  /// Not tied to a real OS; holds OS-independent artifacts.
  Generic,
}

/// Operating systems modules can be compiled for.
///
/// `CommonOs` is synthetic: it collects artifacts that are shared by every
/// real OS target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum OsType {
  #[serde(rename = "android")]
  Android,
  #[serde(rename = "linux_glibc")]
  Linux,
  #[serde(rename = "linux_musl")]
  LinuxMusl,
  #[serde(rename = "linux_bionic")]
  LinuxBionic,
  #[serde(rename = "darwin")]
  Darwin,
  #[serde(rename = "windows")]
  Windows,
  #[serde(rename = "common_os")]
  CommonOs,
}

impl OsType {
  pub const ALL: [OsType; 7] = [
    Self::Android,
    Self::Linux,
    Self::LinuxMusl,
    Self::LinuxBionic,
    Self::Darwin,
    Self::Windows,
    Self::CommonOs,
  ];

  /// Returns the identifier used in variant names and product config
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Android => "android",
      Self::Linux => "linux_glibc",
      Self::LinuxMusl => "linux_musl",
      Self::LinuxBionic => "linux_bionic",
      Self::Darwin => "darwin",
      Self::Windows => "windows",
      Self::CommonOs => "common_os",
    }
  }

  /// Looks up an OS by its identifier
  pub fn from_name(name: &str) -> Option<Self> {
    Self::ALL.into_iter().find(|os| os.as_str() == name)
  }

  pub fn class(&self) -> OsClass {
    match self {
      Self::Android => OsClass::Device,
      Self::CommonOs => OsClass::Generic,
      _ => OsClass::Host,
    }
  }

  /// True for Linux flavors, regardless of libc
  pub fn is_linux(&self) -> bool {
    matches!(self, Self::Linux | Self::LinuxMusl | Self::LinuxBionic)
  }
}

impl fmt::Display for OsType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}
