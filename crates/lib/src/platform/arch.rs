use std::fmt;

use serde::{Deserialize, Serialize};

/// Word-size class of an architecture; also the install directory suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Multilib {
  Lib32,
  Lib64,
  Common,
}

impl Multilib {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Lib32 => "lib32",
      Self::Lib64 => "lib64",
      Self::Common => "common",
    }
  }
}

impl fmt::Display for Multilib {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

/// CPU architecture families targets can be compiled for
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArchType {
  Arm,
  Arm64,
  Riscv64,
  X86,
  X86_64,
  Common,
}

impl ArchType {
  pub const ALL: [ArchType; 6] = [
    Self::Arm,
    Self::Arm64,
    Self::Riscv64,
    Self::X86,
    Self::X86_64,
    Self::Common,
  ];

  /// Detect the CPU architecture of the running process
  pub fn current() -> Option<Self> {
    match std::env::consts::ARCH {
      "x86_64" => Some(Self::X86_64),
      "x86" => Some(Self::X86),
      "aarch64" => Some(Self::Arm64),
      "arm" => Some(Self::Arm),
      "riscv64" => Some(Self::Riscv64),
      _ => None,
    }
  }

  /// Returns the lowercase string identifier for this architecture
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Arm => "arm",
      Self::Arm64 => "arm64",
      Self::Riscv64 => "riscv64",
      Self::X86 => "x86",
      Self::X86_64 => "x86_64",
      Self::Common => "common",
    }
  }

  /// Looks up an architecture by the name used in product variables.
  ///
  /// `common` is not a real architecture and is never returned.
  pub fn from_name(name: &str) -> Option<Self> {
    Self::ALL
      .into_iter()
      .filter(|a| *a != Self::Common)
      .find(|a| a.as_str() == name)
  }

  pub fn multilib(&self) -> Multilib {
    match self {
      Self::Arm | Self::X86 => Multilib::Lib32,
      Self::Arm64 | Self::Riscv64 | Self::X86_64 => Multilib::Lib64,
      Self::Common => Multilib::Common,
    }
  }
}

impl fmt::Display for ArchType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

/// A concrete architecture configuration: family plus the variant, CPU and
/// ABIs it was configured with.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Arch {
  pub arch_type: ArchType,
  pub arch_variant: String,
  pub cpu_variant: String,
  pub abi: Vec<String>,
}

impl Arch {
  pub fn new(arch_type: ArchType) -> Self {
    Self {
      arch_type,
      arch_variant: String::new(),
      cpu_variant: String::new(),
      abi: Vec::new(),
    }
  }

  /// Variant suffix such as `arm64_armv8-a`, omitting empty parts
  pub fn variant_name(&self) -> String {
    let mut name = self.arch_type.as_str().to_string();
    for part in [&self.arch_variant, &self.cpu_variant] {
      if !part.is_empty() && part != "generic" {
        name.push('_');
        name.push_str(part);
      }
    }
    name
  }
}
