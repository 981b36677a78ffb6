//! Resolution of product variables into per-OS compilation targets.

use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;
use tracing::{debug, warn};

use crate::platform::{Arch, ArchType, HostPlatform, Multilib, OsType, Target};
use crate::variables::{ProductVariables, flag, list, string};

#[derive(Debug, Error)]
pub enum TargetError {
  #[error("no {field} set in product variables")]
  MissingArch { field: &'static str },

  #[error("unknown architecture {name:?} in {field}")]
  UnknownArch { field: &'static str, name: String },

  #[error("unknown OS {name:?} in {field}")]
  UnknownOs { field: &'static str, name: String },

  #[error("no {os} target configured for the build host")]
  MissingBuildOsTarget { os: OsType },
}

/// Ordered compilation targets for every configured OS.
pub type TargetMap = BTreeMap<OsType, Vec<Target>>;

/// One entry of an alternate device ABI set.
#[derive(Debug, Clone, Copy)]
pub struct ArchPreset {
  pub arch: ArchType,
  pub arch_variant: &'static str,
  pub cpu_variant: &'static str,
  pub abi: &'static [&'static str],
}

impl ArchPreset {
  fn to_target(self) -> Target {
    let arch = Arch {
      arch_type: self.arch,
      arch_variant: self.arch_variant.to_string(),
      cpu_variant: self.cpu_variant.to_string(),
      abi: self.abi.iter().map(|s| s.to_string()).collect(),
    };
    Target::new(OsType::Android, arch, false)
  }
}

/// Device targets used when building the NDK.
pub const NDK_ABIS: &[ArchPreset] = &[
  ArchPreset {
    arch: ArchType::Arm,
    arch_variant: "armv7-a",
    cpu_variant: "",
    abi: &["armeabi-v7a"],
  },
  ArchPreset {
    arch: ArchType::Arm64,
    arch_variant: "armv8-a-branchprot",
    cpu_variant: "",
    abi: &["arm64-v8a"],
  },
  ArchPreset {
    arch: ArchType::Riscv64,
    arch_variant: "",
    cpu_variant: "",
    abi: &["riscv64"],
  },
  ArchPreset {
    arch: ArchType::X86,
    arch_variant: "",
    cpu_variant: "",
    abi: &["x86"],
  },
  ArchPreset {
    arch: ArchType::X86_64,
    arch_variant: "",
    cpu_variant: "",
    abi: &["x86_64"],
  },
];

/// Device targets used when building mainline modules.
pub const AML_ABIS: &[ArchPreset] = &[
  ArchPreset {
    arch: ArchType::Arm,
    arch_variant: "armv7-a-neon",
    cpu_variant: "",
    abi: &["armeabi-v7a"],
  },
  ArchPreset {
    arch: ArchType::Arm64,
    arch_variant: "armv8-a",
    cpu_variant: "",
    abi: &["arm64-v8a"],
  },
  ArchPreset {
    arch: ArchType::X86,
    arch_variant: "",
    cpu_variant: "",
    abi: &["x86"],
  },
  ArchPreset {
    arch: ArchType::X86_64,
    arch_variant: "",
    cpu_variant: "",
    abi: &["x86_64"],
  },
];

fn decode_arch(field: &'static str, name: &str) -> Result<ArchType, TargetError> {
  ArchType::from_name(name).ok_or_else(|| TargetError::UnknownArch {
    field,
    name: name.to_string(),
  })
}

fn push_target(
  targets: &mut TargetMap,
  os: OsType,
  arch_type: ArchType,
  variant: &str,
  cpu: &str,
  abi: &[String],
  host_cross: bool,
) {
  let arch = Arch {
    arch_type,
    arch_variant: variant.to_string(),
    cpu_variant: cpu.to_string(),
    abi: abi.to_vec(),
  };
  targets.entry(os).or_default().push(Target::new(os, arch, host_cross));
}

/// Builds the target map described by the product variables.
///
/// Host targets come from `HostArch` (required) and `HostSecondaryArch`,
/// cross-host targets from the `CrossHost*` variables, and device targets from
/// `DeviceArch` and `DeviceSecondaryArch` with their variants and ABIs.
pub fn decode_target_product_variables(
  vars: &ProductVariables,
  host: &HostPlatform,
) -> Result<TargetMap, TargetError> {
  let mut targets = TargetMap::new();

  let host_arch = string(&vars.host_arch);
  if host_arch.is_empty() {
    return Err(TargetError::MissingArch { field: "HostArch" });
  }
  push_target(
    &mut targets,
    host.os,
    decode_arch("HostArch", host_arch)?,
    "",
    "",
    &[],
    false,
  );
  let host_secondary = string(&vars.host_secondary_arch);
  if !host_secondary.is_empty() {
    push_target(
      &mut targets,
      host.os,
      decode_arch("HostSecondaryArch", host_secondary)?,
      "",
      "",
      &[],
      false,
    );
  }

  let cross_host = string(&vars.cross_host);
  if !cross_host.is_empty() {
    let os = OsType::from_name(cross_host).ok_or_else(|| TargetError::UnknownOs {
      field: "CrossHost",
      name: cross_host.to_string(),
    })?;
    let cross_arch = string(&vars.cross_host_arch);
    if cross_arch.is_empty() {
      return Err(TargetError::MissingArch {
        field: "CrossHostArch",
      });
    }
    push_target(
      &mut targets,
      os,
      decode_arch("CrossHostArch", cross_arch)?,
      "",
      "",
      &[],
      true,
    );
    let cross_secondary = string(&vars.cross_host_secondary_arch);
    if !cross_secondary.is_empty() {
      push_target(
        &mut targets,
        os,
        decode_arch("CrossHostSecondaryArch", cross_secondary)?,
        "",
        "",
        &[],
        true,
      );
    }
  }

  let device_arch = string(&vars.device_arch);
  if !device_arch.is_empty() {
    push_target(
      &mut targets,
      OsType::Android,
      decode_arch("DeviceArch", device_arch)?,
      string(&vars.device_arch_variant),
      string(&vars.device_cpu_variant),
      list(&vars.device_abi),
      false,
    );
    let secondary = string(&vars.device_secondary_arch);
    if !secondary.is_empty() {
      push_target(
        &mut targets,
        OsType::Android,
        decode_arch("DeviceSecondaryArch", secondary)?,
        string(&vars.device_secondary_arch_variant),
        string(&vars.device_secondary_cpu_variant),
        list(&vars.device_secondary_abi),
        false,
      );
    }
  }

  Ok(targets)
}

/// The final target map plus the multilib diagnostics computed from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTargets {
  pub targets: TargetMap,
  /// Device architectures whose multilib class was already claimed by an
  /// earlier device target.
  pub multilib_conflicts: BTreeSet<ArchType>,
}

impl ResolvedTargets {
  pub fn has_multilib_conflict(&self, arch: ArchType) -> bool {
    self.multilib_conflicts.contains(&arch)
  }

  pub fn for_os(&self, os: OsType) -> &[Target] {
    self.targets.get(&os).map(Vec::as_slice).unwrap_or(&[])
  }
}

/// Decodes the targets, adds the `CommonOs` bucket, applies the NDK or AML
/// ABI set when requested, and records multilib conflicts.
pub fn resolve_targets(vars: &ProductVariables, host: &HostPlatform) -> Result<ResolvedTargets, TargetError> {
  let mut targets = decode_target_product_variables(vars, host)?;

  targets.insert(OsType::CommonOs, vec![Target::common(OsType::CommonOs)]);

  let preset = if flag(vars.ndk_abis) {
    Some(NDK_ABIS)
  } else if flag(vars.aml_abis) {
    Some(AML_ABIS)
  } else {
    None
  };
  if let Some(preset) = preset {
    debug!(count = preset.len(), "replacing device targets with ABI preset");
    targets.insert(OsType::Android, preset.iter().map(|p| p.to_target()).collect());
  }

  let mut claimed = BTreeSet::new();
  let mut multilib_conflicts = BTreeSet::new();
  for target in targets.get(&OsType::Android).into_iter().flatten() {
    let arch = target.arch.arch_type;
    if !claimed.insert(arch.multilib()) {
      warn!(arch = %arch, multilib = %arch.multilib(), "multiple device targets share a multilib class");
      multilib_conflicts.insert(arch);
    }
  }

  Ok(ResolvedTargets {
    targets,
    multilib_conflicts,
  })
}

/// One common-arch target per distinct OS in `targets`, in list order.
pub fn common_targets(targets: &[Target]) -> Vec<Target> {
  let mut seen = BTreeSet::new();
  targets
    .iter()
    .filter(|t| seen.insert(t.os))
    .map(|t| {
      let mut common = Target::common(t.os);
      common.host_cross = t.host_cross;
      common
    })
    .collect()
}

/// The first target of the first multilib class in `prefs` that any target
/// has.
pub fn first_target(targets: &[Target], prefs: &[Multilib]) -> Option<Target> {
  prefs
    .iter()
    .find_map(|pref| targets.iter().find(|t| t.multilib() == *pref))
    .cloned()
}
