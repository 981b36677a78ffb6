//! Product variables: the persisted, user/product-tunable build options.
//!
//! The variables live in `soong.variables`, a JSON document written by product
//! configuration. Every option is nullable; unknown keys are ignored so older
//! binaries can read files produced by newer product config.
//!
//! Loading happens once per invocation (see [`load`]); afterwards the record
//! is never mutated.

pub mod export;
mod store;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub use store::{VariablesError, load, save_atomic};

/// Vendor variable namespaces: namespace -> variable -> value.
pub type VendorVars = BTreeMap<String, BTreeMap<String, String>>;

/// All product variables understood by the configuration core.
///
/// JSON keys use the names established by product config, which mix
/// PascalCase and underscore spellings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductVariables {
  // Build identity
  #[serde(rename = "BuildId")]
  pub build_id: Option<String>,
  #[serde(rename = "BuildNumberFile")]
  pub build_number_file: Option<String>,

  // Platform versions
  #[serde(rename = "Platform_version_name")]
  pub platform_version_name: Option<String>,
  #[serde(rename = "Platform_sdk_version")]
  pub platform_sdk_version: Option<i64>,
  #[serde(rename = "Platform_sdk_codename")]
  pub platform_sdk_codename: Option<String>,
  #[serde(rename = "Platform_sdk_version_or_codename")]
  pub platform_sdk_version_or_codename: Option<String>,
  #[serde(rename = "Platform_sdk_final")]
  pub platform_sdk_final: Option<bool>,
  #[serde(rename = "Platform_sdk_extension_version")]
  pub platform_sdk_extension_version: Option<i64>,
  #[serde(rename = "Platform_base_sdk_extension_version")]
  pub platform_base_sdk_extension_version: Option<i64>,
  #[serde(rename = "Platform_version_active_codenames")]
  pub platform_version_active_codenames: Option<Vec<String>>,
  #[serde(rename = "Platform_version_all_preview_codenames")]
  pub platform_version_all_preview_codenames: Option<Vec<String>>,
  #[serde(rename = "Platform_security_patch")]
  pub platform_security_patch: Option<String>,
  #[serde(rename = "Platform_preview_sdk_version")]
  pub platform_preview_sdk_version: Option<String>,
  #[serde(rename = "Platform_min_supported_target_sdk_version")]
  pub platform_min_supported_target_sdk_version: Option<String>,
  #[serde(rename = "Platform_base_os")]
  pub platform_base_os: Option<String>,
  #[serde(rename = "Platform_version_last_stable")]
  pub platform_version_last_stable: Option<String>,
  #[serde(rename = "Platform_version_known_codenames")]
  pub platform_version_known_codenames: Option<String>,
  #[serde(rename = "Platform_vndk_version")]
  pub platform_vndk_version: Option<String>,
  #[serde(rename = "Platform_systemsdk_versions")]
  pub platform_systemsdk_versions: Option<Vec<String>>,

  // Device
  #[serde(rename = "DeviceName")]
  pub device_name: Option<String>,
  #[serde(rename = "DeviceProduct")]
  pub device_product: Option<String>,
  #[serde(rename = "DeviceArch")]
  pub device_arch: Option<String>,
  #[serde(rename = "DeviceArchVariant")]
  pub device_arch_variant: Option<String>,
  #[serde(rename = "DeviceCpuVariant")]
  pub device_cpu_variant: Option<String>,
  #[serde(rename = "DeviceAbi")]
  pub device_abi: Option<Vec<String>>,
  #[serde(rename = "DeviceSecondaryArch")]
  pub device_secondary_arch: Option<String>,
  #[serde(rename = "DeviceSecondaryArchVariant")]
  pub device_secondary_arch_variant: Option<String>,
  #[serde(rename = "DeviceSecondaryCpuVariant")]
  pub device_secondary_cpu_variant: Option<String>,
  #[serde(rename = "DeviceSecondaryAbi")]
  pub device_secondary_abi: Option<Vec<String>>,
  #[serde(rename = "DeviceVndkVersion")]
  pub device_vndk_version: Option<String>,
  #[serde(rename = "DeviceCurrentApiLevelForVendorModules")]
  pub device_current_api_level_for_vendor_modules: Option<String>,
  #[serde(rename = "DeviceSystemSdkVersions")]
  pub device_system_sdk_versions: Option<Vec<String>>,
  #[serde(rename = "DeviceMaxPageSizeSupported")]
  pub device_max_page_size_supported: Option<String>,
  #[serde(rename = "ShippingApiLevel")]
  pub shipping_api_level: Option<String>,

  // Host
  #[serde(rename = "HostArch")]
  pub host_arch: Option<String>,
  #[serde(rename = "HostSecondaryArch")]
  pub host_secondary_arch: Option<String>,
  #[serde(rename = "HostMusl")]
  pub host_musl: Option<bool>,
  #[serde(rename = "HostStaticBinaries")]
  pub host_static_binaries: Option<bool>,
  #[serde(rename = "CrossHost")]
  pub cross_host: Option<String>,
  #[serde(rename = "CrossHostArch")]
  pub cross_host_arch: Option<String>,
  #[serde(rename = "CrossHostSecondaryArch")]
  pub cross_host_secondary_arch: Option<String>,

  // Alternate ABI sets
  #[serde(rename = "Ndk_abis")]
  pub ndk_abis: Option<bool>,
  #[serde(rename = "Aml_abis")]
  pub aml_abis: Option<bool>,

  // Build policy
  #[serde(rename = "Allow_missing_dependencies")]
  pub allow_missing_dependencies: Option<bool>,
  #[serde(rename = "Unbundled_build")]
  pub unbundled_build: Option<bool>,
  #[serde(rename = "Unbundled_build_apps")]
  pub unbundled_build_apps: Option<Vec<String>>,
  #[serde(rename = "Unbundled_build_image")]
  pub unbundled_build_image: Option<bool>,
  #[serde(rename = "Always_use_prebuilt_sdks")]
  pub always_use_prebuilt_sdks: Option<bool>,
  #[serde(rename = "Debuggable")]
  pub debuggable: Option<bool>,
  #[serde(rename = "Eng")]
  pub eng: Option<bool>,
  #[serde(rename = "MinimizeJavaDebugInfo")]
  pub minimize_java_debug_info: Option<bool>,
  #[serde(rename = "Treble_linker_namespaces")]
  pub treble_linker_namespaces: Option<bool>,
  #[serde(rename = "Enforce_vintf_manifest")]
  pub enforce_vintf_manifest: Option<bool>,
  #[serde(rename = "Uml")]
  pub uml: Option<bool>,
  #[serde(rename = "Override_rs_driver")]
  pub override_rs_driver: Option<String>,

  // Memory allocator
  #[serde(rename = "Malloc_not_svelte")]
  pub malloc_not_svelte: Option<bool>,
  #[serde(rename = "Malloc_zero_contents")]
  pub malloc_zero_contents: Option<bool>,
  #[serde(rename = "Malloc_pattern_fill_contents")]
  pub malloc_pattern_fill_contents: Option<bool>,
  #[serde(rename = "Safestack")]
  pub safestack: Option<bool>,
  #[serde(rename = "Binder32bit")]
  pub binder32bit: Option<bool>,

  // Remote execution
  #[serde(rename = "UseGoma")]
  pub use_goma: Option<bool>,
  #[serde(rename = "UseRBE")]
  pub use_rbe: Option<bool>,
  #[serde(rename = "UseRBEJAVAC")]
  pub use_rbe_javac: Option<bool>,
  #[serde(rename = "UseRBER8")]
  pub use_rbe_r8: Option<bool>,
  #[serde(rename = "UseRBED8")]
  pub use_rbe_d8: Option<bool>,

  // Static analysis and sanitizers
  #[serde(rename = "ClangTidy")]
  pub clang_tidy: Option<bool>,
  #[serde(rename = "TidyChecks")]
  pub tidy_checks: Option<String>,
  #[serde(rename = "EnableCFI")]
  pub enable_cfi: Option<bool>,
  #[serde(rename = "DisableScudo")]
  pub disable_scudo: Option<bool>,
  #[serde(rename = "SanitizeHost")]
  pub sanitize_host: Option<Vec<String>>,
  #[serde(rename = "SanitizeDevice")]
  pub sanitize_device: Option<Vec<String>>,
  #[serde(rename = "SanitizeDeviceDiag")]
  pub sanitize_device_diag: Option<Vec<String>>,
  #[serde(rename = "SanitizeDeviceArch")]
  pub sanitize_device_arch: Option<Vec<String>>,
  #[serde(rename = "ArtUseReadBarrier")]
  pub art_use_read_barrier: Option<bool>,

  // Coverage
  #[serde(rename = "GcovCoverage")]
  pub gcov_coverage: Option<bool>,
  #[serde(rename = "ClangCoverage")]
  pub clang_coverage: Option<bool>,
  #[serde(rename = "ClangCoverageContinuousMode")]
  pub clang_coverage_continuous_mode: Option<bool>,
  #[serde(rename = "Native_coverage")]
  pub native_coverage: Option<bool>,
  #[serde(rename = "NativeCoveragePaths")]
  pub native_coverage_paths: Option<Vec<String>>,
  #[serde(rename = "NativeCoverageExcludePaths")]
  pub native_coverage_exclude_paths: Option<Vec<String>>,
  #[serde(rename = "JavaCoveragePaths")]
  pub java_coverage_paths: Option<Vec<String>>,
  #[serde(rename = "JavaCoverageExcludePaths")]
  pub java_coverage_exclude_paths: Option<Vec<String>>,

  // Resource overlays and namespaces
  #[serde(rename = "EnforceRROTargets")]
  pub enforce_rro_targets: Option<Vec<String>>,
  #[serde(rename = "EnforceRROExcludedOverlays")]
  pub enforce_rro_excluded_overlays: Option<Vec<String>>,
  #[serde(rename = "NamespacesToExport")]
  pub namespaces_to_export: Option<Vec<String>>,
  #[serde(rename = "SourceRootDirs")]
  pub source_root_dirs: Option<Vec<String>>,
  #[serde(rename = "IncludeTags")]
  pub include_tags: Option<Vec<String>>,

  // Partitions
  #[serde(rename = "VendorPath")]
  pub vendor_path: Option<String>,
  #[serde(rename = "OdmPath")]
  pub odm_path: Option<String>,
  #[serde(rename = "ProductPath")]
  pub product_path: Option<String>,
  #[serde(rename = "SystemExtPath")]
  pub system_ext_path: Option<String>,

  // Snapshots
  #[serde(rename = "VendorSnapshotDirsIncluded")]
  pub vendor_snapshot_dirs_included: Option<Vec<String>>,
  #[serde(rename = "VendorSnapshotDirsExcluded")]
  pub vendor_snapshot_dirs_excluded: Option<Vec<String>>,
  #[serde(rename = "RecoverySnapshotDirsIncluded")]
  pub recovery_snapshot_dirs_included: Option<Vec<String>>,
  #[serde(rename = "RecoverySnapshotDirsExcluded")]
  pub recovery_snapshot_dirs_excluded: Option<Vec<String>>,

  // Profiles
  #[serde(rename = "AfdoProfiles")]
  pub afdo_profiles: Option<Vec<String>>,
  #[serde(rename = "PgoAdditionalProfileDirs")]
  pub pgo_additional_profile_dirs: Option<Vec<String>>,

  // Override rules, each entry "<from>:<to>"
  #[serde(rename = "ManifestPackageNameOverrides")]
  pub manifest_package_name_overrides: Option<Vec<String>>,
  #[serde(rename = "CertificateOverrides")]
  pub certificate_overrides: Option<Vec<String>>,
  #[serde(rename = "PackageNameOverrides")]
  pub package_name_overrides: Option<Vec<String>>,

  #[serde(rename = "BuildBrokenDepfile")]
  pub build_broken_depfile: Option<bool>,
  #[serde(rename = "BuildBrokenInputDirModules")]
  pub build_broken_input_dir_modules: Option<Vec<String>>,

  #[serde(rename = "VendorVars")]
  pub vendor_vars: Option<VendorVars>,
}

impl ProductVariables {
  /// The variables used when no product config file exists yet.
  pub fn with_defaults() -> Self {
    let mut vars = Self {
      build_number_file: Some("build_number.txt".to_string()),

      platform_version_name: Some("S".to_string()),
      platform_base_sdk_extension_version: Some(30),
      platform_sdk_version: Some(30),
      platform_sdk_codename: Some("S".to_string()),
      platform_sdk_final: Some(false),
      platform_version_active_codenames: Some(vec!["S".to_string()]),
      platform_version_all_preview_codenames: Some(vec!["S".to_string()]),
      platform_vndk_version: Some("S".to_string()),

      host_arch: Some("x86_64".to_string()),
      host_secondary_arch: Some("x86".to_string()),
      host_static_binaries: Some(false),

      device_name: Some("generic_arm64".to_string()),
      device_product: Some("aosp_arm-eng".to_string()),
      device_arch: Some("arm64".to_string()),
      device_arch_variant: Some("armv8-a".to_string()),
      device_cpu_variant: Some("generic".to_string()),
      device_abi: Some(vec!["arm64-v8a".to_string()]),
      device_secondary_arch: Some("arm".to_string()),
      device_secondary_arch_variant: Some("armv8-a".to_string()),
      device_secondary_cpu_variant: Some("generic".to_string()),
      device_secondary_abi: Some(vec!["armeabi-v7a".to_string(), "armeabi".to_string()]),
      device_max_page_size_supported: Some("4096".to_string()),

      malloc_not_svelte: Some(true),
      malloc_zero_contents: Some(true),
      malloc_pattern_fill_contents: Some(false),
      safestack: Some(false),

      ..Self::default()
    };

    if cfg!(target_os = "linux") {
      vars.cross_host = Some("windows".to_string());
      vars.cross_host_arch = Some("x86".to_string());
      vars.cross_host_secondary_arch = Some("x86_64".to_string());
    }

    vars
  }
}

/// Value of an optional flag, `false` when unset.
pub(crate) fn flag(value: Option<bool>) -> bool {
  value.unwrap_or(false)
}

/// Value of an optional string, empty when unset.
pub(crate) fn string(value: &Option<String>) -> &str {
  value.as_deref().unwrap_or("")
}

/// Value of an optional list, empty when unset.
pub(crate) fn list(value: &Option<Vec<String>>) -> &[String] {
  value.as_deref().unwrap_or(&[])
}
