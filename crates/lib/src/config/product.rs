use std::collections::BTreeMap;

use super::{Config, ConfigError};
use crate::variables::{flag, list, string};

/// Variables of one vendor namespace.
#[derive(Debug, Clone, Copy)]
pub struct VendorConfig<'a> {
  vars: Option<&'a BTreeMap<String, String>>,
}

impl<'a> VendorConfig<'a> {
  pub fn string(&self, name: &str) -> &'a str {
    self.vars.and_then(|vars| vars.get(name)).map(String::as_str).unwrap_or("")
  }

  pub fn bool(&self, name: &str) -> bool {
    matches!(self.string(name), "1" | "true")
  }

  pub fn is_set(&self, name: &str) -> bool {
    self.vars.is_some_and(|vars| vars.contains_key(name))
  }
}

fn has_any_prefix(path: &str, prefixes: &[String]) -> bool {
  prefixes.iter().any(|prefix| path.starts_with(prefix.as_str()))
}

fn in_list(item: &str, items: &[String]) -> bool {
  items.iter().any(|i| i == item)
}

/// Matches `name` against a pattern with at most one `%` wildcard and
/// returns the text the wildcard matched.
fn match_pattern<'n>(pattern: &str, name: &'n str) -> Option<&'n str> {
  match pattern.split_once('%') {
    Some((prefix, suffix)) => {
      if name.len() >= prefix.len() + suffix.len() && name.starts_with(prefix) && name.ends_with(suffix) {
        Some(&name[prefix.len()..name.len() - suffix.len()])
      } else {
        None
      }
    }
    None => (pattern == name).then_some(""),
  }
}

/// Looks up `name` in `<pattern>:<replacement>` rules; the first matching
/// rule wins and `%` in the replacement becomes the matched stem.
fn find_override_value(
  rules: &[String],
  name: &str,
  variable: &'static str,
  expected: &'static str,
) -> Result<Option<String>, ConfigError> {
  for rule in rules {
    let mut parts = rule.split(':');
    let (Some(pattern), Some(replacement), None) = (parts.next(), parts.next(), parts.next()) else {
      return Err(ConfigError::InvalidOverride {
        rule: rule.clone(),
        variable,
        expected,
      });
    };
    if let Some(stem) = match_pattern(pattern, name) {
      let value = if pattern.contains('%') {
        replacement.replacen('%', stem, 1)
      } else {
        replacement.to_string()
      };
      return Ok(Some(value));
    }
  }
  Ok(None)
}

impl Config {
  // Build identity

  pub fn build_id(&self) -> &str {
    string(&self.vars.build_id)
  }

  pub fn build_number_file(&self) -> &str {
    string(&self.vars.build_number_file)
  }

  // Device

  /// Name of the device being built, e.g. `generic_arm64`.
  pub fn device_name(&self) -> &str {
    string(&self.vars.device_name)
  }

  /// Product name without the build variant, empty when unset.
  pub fn device_product(&self) -> &str {
    string(&self.vars.device_product)
  }

  pub fn has_device_product(&self) -> bool {
    !string(&self.vars.device_product).is_empty()
  }

  pub fn device_arch(&self) -> &str {
    string(&self.vars.device_arch)
  }

  pub fn device_arch_variant(&self) -> &str {
    string(&self.vars.device_arch_variant)
  }

  pub fn device_secondary_arch(&self) -> &str {
    string(&self.vars.device_secondary_arch)
  }

  pub fn device_secondary_arch_variant(&self) -> &str {
    string(&self.vars.device_secondary_arch_variant)
  }

  pub fn max_page_size_supported(&self) -> &str {
    string(&self.vars.device_max_page_size_supported)
  }

  pub fn binder_bitness(&self) -> &'static str {
    if flag(self.vars.binder32bit) { "32" } else { "64" }
  }

  pub fn vndk_version(&self) -> &str {
    string(&self.vars.device_vndk_version)
  }

  pub fn current_api_level_for_vendor_modules(&self) -> &str {
    self
      .vars
      .device_current_api_level_for_vendor_modules
      .as_deref()
      .unwrap_or("current")
  }

  pub fn system_sdk_versions(&self) -> &[String] {
    list(&self.vars.device_system_sdk_versions)
  }

  pub fn shipping_api_level(&self) -> Option<&str> {
    self.vars.shipping_api_level.as_deref()
  }

  // Partitions

  pub fn vendor_path(&self) -> &str {
    self.vars.vendor_path.as_deref().unwrap_or("vendor")
  }

  pub fn odm_path(&self) -> &str {
    self.vars.odm_path.as_deref().unwrap_or("odm")
  }

  pub fn product_path(&self) -> &str {
    self.vars.product_path.as_deref().unwrap_or("product")
  }

  pub fn system_ext_path(&self) -> &str {
    self.vars.system_ext_path.as_deref().unwrap_or("system_ext")
  }

  // Platform SDK

  pub fn platform_version_name(&self) -> &str {
    string(&self.vars.platform_version_name)
  }

  pub fn platform_sdk_version(&self) -> Option<i64> {
    self.vars.platform_sdk_version
  }

  pub fn platform_sdk_final(&self) -> bool {
    flag(self.vars.platform_sdk_final)
  }

  pub fn platform_sdk_codename(&self) -> &str {
    string(&self.vars.platform_sdk_codename)
  }

  pub fn platform_sdk_version_or_codename(&self) -> &str {
    string(&self.vars.platform_sdk_version_or_codename)
  }

  pub fn platform_sdk_extension_version(&self) -> i64 {
    self.vars.platform_sdk_extension_version.unwrap_or(0)
  }

  pub fn platform_base_sdk_extension_version(&self) -> i64 {
    self.vars.platform_base_sdk_extension_version.unwrap_or(0)
  }

  pub fn platform_security_patch(&self) -> &str {
    string(&self.vars.platform_security_patch)
  }

  pub fn platform_preview_sdk_version(&self) -> &str {
    string(&self.vars.platform_preview_sdk_version)
  }

  pub fn platform_min_supported_target_sdk_version(&self) -> &str {
    string(&self.vars.platform_min_supported_target_sdk_version)
  }

  pub fn platform_base_os(&self) -> &str {
    string(&self.vars.platform_base_os)
  }

  pub fn platform_version_last_stable(&self) -> &str {
    string(&self.vars.platform_version_last_stable)
  }

  pub fn platform_version_known_codenames(&self) -> &str {
    string(&self.vars.platform_version_known_codenames)
  }

  pub fn platform_version_active_codenames(&self) -> &[String] {
    list(&self.vars.platform_version_active_codenames)
  }

  pub fn platform_version_all_preview_codenames(&self) -> &[String] {
    list(&self.vars.platform_version_all_preview_codenames)
  }

  pub fn platform_vndk_version(&self) -> &str {
    string(&self.vars.platform_vndk_version)
  }

  pub fn platform_system_sdk_versions(&self) -> &[String] {
    list(&self.vars.platform_systemsdk_versions)
  }

  // Build policy

  /// True when a full platform source tree cannot be assumed.
  pub fn unbundled_build(&self) -> bool {
    flag(self.vars.unbundled_build)
  }

  pub fn unbundled_build_apps(&self) -> bool {
    !list(&self.vars.unbundled_build_apps).is_empty()
  }

  pub fn unbundled_build_image(&self) -> bool {
    flag(self.vars.unbundled_build_image)
  }

  pub fn always_use_prebuilt_sdks(&self) -> bool {
    flag(self.vars.always_use_prebuilt_sdks)
  }

  pub fn debuggable(&self) -> bool {
    flag(self.vars.debuggable)
  }

  pub fn eng(&self) -> bool {
    flag(self.vars.eng)
  }

  /// Eng builds always keep full Java debug info.
  pub fn minimize_java_debug_info(&self) -> bool {
    flag(self.vars.minimize_java_debug_info) && !self.eng()
  }

  pub fn host_static_binaries(&self) -> bool {
    flag(self.vars.host_static_binaries)
  }

  pub fn use_host_musl(&self) -> bool {
    flag(self.vars.host_musl)
  }

  pub fn exported_namespaces(&self) -> &[String] {
    list(&self.vars.namespaces_to_export)
  }

  pub fn source_root_dirs(&self) -> &[String] {
    list(&self.vars.source_root_dirs)
  }

  pub fn include_tags(&self) -> &[String] {
    list(&self.vars.include_tags)
  }

  pub fn build_broken_depfile(&self) -> bool {
    flag(self.vars.build_broken_depfile)
  }

  pub fn build_broken_input_dir(&self, module: &str) -> bool {
    in_list(module, list(&self.vars.build_broken_input_dir_modules))
  }

  // Sanitizers and static analysis

  pub fn sanitize_host(&self) -> &[String] {
    list(&self.vars.sanitize_host)
  }

  pub fn sanitize_device(&self) -> &[String] {
    list(&self.vars.sanitize_device)
  }

  pub fn sanitize_device_diag(&self) -> &[String] {
    list(&self.vars.sanitize_device_diag)
  }

  pub fn sanitize_device_arch(&self) -> &[String] {
    list(&self.vars.sanitize_device_arch)
  }

  /// CFI is on unless the product turns it off.
  pub fn enable_cfi(&self) -> bool {
    self.vars.enable_cfi.unwrap_or(true)
  }

  pub fn disable_scudo(&self) -> bool {
    flag(self.vars.disable_scudo)
  }

  pub fn clang_tidy(&self) -> bool {
    flag(self.vars.clang_tidy)
  }

  pub fn tidy_checks(&self) -> &str {
    string(&self.vars.tidy_checks)
  }

  pub fn art_use_read_barrier(&self) -> bool {
    flag(self.vars.art_use_read_barrier)
  }

  // Remote execution

  pub fn use_goma(&self) -> bool {
    flag(self.vars.use_goma)
  }

  pub fn use_rbe(&self) -> bool {
    flag(self.vars.use_rbe)
  }

  pub fn use_rbe_javac(&self) -> bool {
    flag(self.vars.use_rbe_javac)
  }

  pub fn use_rbe_r8(&self) -> bool {
    flag(self.vars.use_rbe_r8)
  }

  pub fn use_rbe_d8(&self) -> bool {
    flag(self.vars.use_rbe_d8)
  }

  pub fn use_remote_build(&self) -> bool {
    self.use_goma() || self.use_rbe()
  }

  // Coverage

  pub fn native_coverage_enabled(&self) -> bool {
    self.gcov_coverage_enabled() || self.clang_coverage_enabled()
  }

  pub fn clang_coverage_enabled(&self) -> bool {
    flag(self.vars.clang_coverage)
  }

  pub fn clang_coverage_continuous_mode(&self) -> bool {
    flag(self.vars.clang_coverage_continuous_mode)
  }

  pub fn gcov_coverage_enabled(&self) -> bool {
    flag(self.vars.gcov_coverage)
  }

  /// Java coverage is on for every path when `JavaCoveragePaths` is empty,
  /// otherwise for paths under one of its entries (`*` matches all), minus
  /// `JavaCoverageExcludePaths`.
  pub fn java_coverage_enabled_for_path(&self, path: &str) -> bool {
    let include = list(&self.vars.java_coverage_paths);
    let coverage = include.is_empty() || in_list("*", include) || has_any_prefix(path, include);
    coverage && !has_any_prefix(path, list(&self.vars.java_coverage_exclude_paths))
  }

  /// Native coverage is off unless the path is under `NativeCoveragePaths`
  /// (`*` matches all) and not under `NativeCoverageExcludePaths`.
  pub fn native_coverage_enabled_for_path(&self, path: &str) -> bool {
    let include = list(&self.vars.native_coverage_paths);
    let coverage = !include.is_empty() && (in_list("*", include) || has_any_prefix(path, include));
    if !coverage {
      return false;
    }
    let exclude = list(&self.vars.native_coverage_exclude_paths);
    if exclude.is_empty() {
      return true;
    }
    // Instrumenting protobuf breaks boot whenever exclusions are in play.
    !path.starts_with("external/protobuf") && !has_any_prefix(path, exclude)
  }

  // Resource overlays

  pub fn enforce_rro_for_module(&self, name: &str) -> bool {
    let targets = list(&self.vars.enforce_rro_targets);
    in_list("*", targets) || in_list(name, targets)
  }

  pub fn enforce_rro_excluded_overlay(&self, path: &str) -> bool {
    has_any_prefix(path, list(&self.vars.enforce_rro_excluded_overlays))
  }

  // Overrides and profiles

  pub fn override_manifest_package_name_for(&self, name: &str) -> Result<Option<String>, ConfigError> {
    find_override_value(
      list(&self.vars.manifest_package_name_overrides),
      name,
      "PRODUCT_MANIFEST_PACKAGE_NAME_OVERRIDES",
      "<module_name>:<manifest_name>",
    )
  }

  pub fn override_certificate_for(&self, name: &str) -> Result<Option<String>, ConfigError> {
    find_override_value(
      list(&self.vars.certificate_overrides),
      name,
      "PRODUCT_CERTIFICATE_OVERRIDES",
      "<module_name>:<certificate_module_name>",
    )
  }

  /// The package name `name` is renamed to, or `name` itself.
  pub fn override_package_name_for(&self, name: &str) -> Result<String, ConfigError> {
    let renamed = find_override_value(
      list(&self.vars.package_name_overrides),
      name,
      "PRODUCT_PACKAGE_NAME_OVERRIDES",
      "<module_name>:<package_name>",
    )?;
    Ok(renamed.unwrap_or_else(|| name.to_string()))
  }

  /// Profile path for module `name` from entries of the form
  /// `<module>:<profile module path>:<profile module name>`.
  pub fn afdo_profile(&self, name: &str) -> Result<Option<String>, ConfigError> {
    for entry in list(&self.vars.afdo_profiles) {
      let parts: Vec<&str> = entry.split(':').collect();
      let [module, path, target] = parts.as_slice() else {
        return Err(ConfigError::InvalidAfdoProfile { value: entry.clone() });
      };
      if *module == name {
        return Ok(Some(format!("{path}:{target}")));
      }
    }
    Ok(None)
  }

  pub fn pgo_additional_profile_dirs(&self) -> &[String] {
    list(&self.vars.pgo_additional_profile_dirs)
  }

  pub fn vendor_config(&self, namespace: &str) -> VendorConfig<'_> {
    VendorConfig {
      vars: self.vars.vendor_vars.as_ref().and_then(|ns| ns.get(namespace)),
    }
  }

  pub fn ndk_abis(&self) -> bool {
    flag(self.vars.ndk_abis)
  }

  pub fn aml_abis(&self) -> bool {
    flag(self.vars.aml_abis)
  }
}

#[cfg(test)]
mod tests {
  use super::super::tests::config_with;
  use super::*;
  use tempfile::TempDir;

  fn load(json: &str) -> (TempDir, Config) {
    let temp = TempDir::new().unwrap();
    let config = config_with(&temp, Some(json), &[]);
    (temp, config)
  }

  #[test]
  fn partition_paths_default() {
    let (_temp, config) = load(r#"{"HostArch": "x86_64", "OdmPath": "vendor/odm"}"#);
    assert_eq!(config.vendor_path(), "vendor");
    assert_eq!(config.odm_path(), "vendor/odm");
    assert_eq!(config.product_path(), "product");
    assert_eq!(config.system_ext_path(), "system_ext");
    assert_eq!(config.device_product(), "");
    assert!(!config.has_device_product());
  }

  #[test]
  fn host_musl_flag_is_exposed() {
    let (_temp, config) = load(r#"{"HostArch": "x86_64", "HostMusl": true}"#);
    assert!(config.use_host_musl());

    let (_temp, config) = load(r#"{"HostArch": "x86_64"}"#);
    assert!(!config.use_host_musl());
  }

  #[test]
  fn flag_defaults() {
    let (_temp, config) = load(
      r#"{"HostArch": "x86_64", "Binder32bit": true, "MinimizeJavaDebugInfo": true, "Eng": true, "UseRBE": true}"#,
    );
    assert_eq!(config.binder_bitness(), "32");
    assert!(config.enable_cfi());
    assert!(!config.minimize_java_debug_info());
    assert!(config.use_remote_build());
    assert!(!config.use_goma());
  }

  #[test]
  fn coverage_paths() {
    let (_temp, config) = load(
      r#"{"HostArch": "x86_64", "ClangCoverage": true,
          "NativeCoveragePaths": ["*"], "NativeCoverageExcludePaths": ["vendor/"],
          "JavaCoveragePaths": ["frameworks/"], "JavaCoverageExcludePaths": ["frameworks/base/test"]}"#,
    );

    assert!(config.native_coverage_enabled());
    assert!(config.clang_coverage_enabled());
    assert!(!config.gcov_coverage_enabled());
    assert_eq!(config.product_variables().native_coverage, Some(true));

    assert!(config.native_coverage_enabled_for_path("system/core"));
    assert!(!config.native_coverage_enabled_for_path("vendor/acme"));
    assert!(!config.native_coverage_enabled_for_path("external/protobuf/src"));

    assert!(config.java_coverage_enabled_for_path("frameworks/base/core"));
    assert!(!config.java_coverage_enabled_for_path("frameworks/base/tests"));
    assert!(!config.java_coverage_enabled_for_path("packages/apps"));
  }

  #[test]
  fn coverage_defaults_without_path_lists() {
    let (_temp, config) = load(r#"{"HostArch": "x86_64"}"#);
    assert!(config.java_coverage_enabled_for_path("anything"));
    assert!(!config.native_coverage_enabled_for_path("anything"));
  }

  #[test]
  fn enforce_rro() {
    let (_temp, config) = load(
      r#"{"HostArch": "x86_64", "EnforceRROTargets": ["Settings"], "EnforceRROExcludedOverlays": ["device/acme/"]}"#,
    );
    assert!(config.enforce_rro_for_module("Settings"));
    assert!(!config.enforce_rro_for_module("Launcher"));
    assert!(config.enforce_rro_excluded_overlay("device/acme/overlay"));

    let (_temp, config) = load(r#"{"HostArch": "x86_64", "EnforceRROTargets": ["*"]}"#);
    assert!(config.enforce_rro_for_module("Launcher"));
  }

  #[test]
  fn override_rules_with_wildcards() {
    let (_temp, config) = load(
      r#"{"HostArch": "x86_64",
          "PackageNameOverrides": ["com.android.%:com.acme.%", "Foo:com.acme.foo"],
          "CertificateOverrides": ["bad-rule"]}"#,
    );

    assert_eq!(
      config.override_package_name_for("com.android.phone").unwrap(),
      "com.acme.phone"
    );
    assert_eq!(config.override_package_name_for("Foo").unwrap(), "com.acme.foo");
    assert_eq!(config.override_package_name_for("Bar").unwrap(), "Bar");
    assert_eq!(config.override_manifest_package_name_for("Foo").unwrap(), None);

    let err = config.override_certificate_for("Foo").unwrap_err();
    assert!(err.to_string().contains("PRODUCT_CERTIFICATE_OVERRIDES"));
  }

  #[test]
  fn afdo_profiles() {
    let (_temp, config) = load(
      r#"{"HostArch": "x86_64", "AfdoProfiles": ["libfoo://toolchain/pgo-profiles:libfoo_afdo"]}"#,
    );
    assert_eq!(
      config.afdo_profile("libfoo").unwrap().as_deref(),
      Some("//toolchain/pgo-profiles:libfoo_afdo")
    );
    assert_eq!(config.afdo_profile("libbar").unwrap(), None);

    let (_temp, config) = load(r#"{"HostArch": "x86_64", "AfdoProfiles": ["libfoo"]}"#);
    assert!(matches!(
      config.afdo_profile("libfoo"),
      Err(ConfigError::InvalidAfdoProfile { .. })
    ));
  }

  #[test]
  fn vendor_config_namespaces() {
    let (_temp, config) = load(r#"{"HostArch": "x86_64", "VendorVars": {"acme": {"fast": "true", "level": "3"}}}"#);
    let acme = config.vendor_config("acme");
    assert!(acme.bool("fast"));
    assert_eq!(acme.string("level"), "3");
    assert!(!acme.is_set("missing"));
    assert_eq!(config.vendor_config("other").string("level"), "");
  }

  #[test]
  fn match_pattern_stems() {
    assert_eq!(match_pattern("com.%.app", "com.acme.app"), Some("acme"));
    assert_eq!(match_pattern("Foo", "Foo"), Some(""));
    assert_eq!(match_pattern("a%a", "a"), None);
    assert_eq!(match_pattern("Foo", "Food"), None);
  }
}
