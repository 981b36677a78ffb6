//! Build-tool-agnostic export of product variables as Starlark files.
//!
//! Consumers that do not read `soong.variables` directly load
//! `soong_injection/product_config/product_variables.bzl`, which embeds the
//! variables as JSON along with the names of the properties that may be
//! specialized per product variable.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::store::to_pretty_json;
use super::{ProductVariables, VariablesError};
use crate::consts::{GENERATED_BAZEL_FILE_WARNING, INJECTION_DIR, PRODUCT_CONFIG_DIR};

/// Whether a product-variable property may take a different value per
/// architecture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variance {
  ArchInvariant,
  ArchVariant,
}

/// Properties modules can specialize on, keyed by lowercase product variable
/// name.
pub const VARIABLE_PROPERTIES: &[(&str, Variance)] = &[
  ("platform_sdk_version", Variance::ArchVariant),
  ("platform_sdk_version_or_codename", Variance::ArchInvariant),
  ("platform_sdk_extension_version", Variance::ArchInvariant),
  ("platform_version_name", Variance::ArchInvariant),
  ("unbundled_build", Variance::ArchInvariant),
  ("always_use_prebuilt_sdks", Variance::ArchInvariant),
  ("malloc_not_svelte", Variance::ArchVariant),
  ("malloc_zero_contents", Variance::ArchVariant),
  ("malloc_pattern_fill_contents", Variance::ArchVariant),
  ("safestack", Variance::ArchVariant),
  ("binder32bit", Variance::ArchInvariant),
  ("debuggable", Variance::ArchInvariant),
  ("eng", Variance::ArchInvariant),
  ("treble_linker_namespaces", Variance::ArchInvariant),
  ("enforce_vintf_manifest", Variance::ArchInvariant),
  ("uml", Variance::ArchInvariant),
  ("native_coverage", Variance::ArchInvariant),
  ("override_rs_driver", Variance::ArchInvariant),
];

/// Every property name, in table order.
pub fn product_var_constraints() -> Vec<&'static str> {
  VARIABLE_PROPERTIES.iter().map(|(name, _)| *name).collect()
}

/// Names of arch-variant properties, in table order.
pub fn arch_variant_product_var_constraints() -> Vec<&'static str> {
  VARIABLE_PROPERTIES
    .iter()
    .filter(|(_, variance)| *variance == Variance::ArchVariant)
    .map(|(name, _)| *name)
    .collect()
}

/// Renders a Starlark list literal with one item per line.
pub fn starlark_string_list(items: &[&str]) -> String {
  if items.is_empty() {
    return "[]".to_string();
  }
  let mut out = String::from("[\n");
  for item in items {
    out.push_str("    \"");
    out.push_str(item);
    out.push_str("\",\n");
  }
  out.push(']');
  out
}

/// Writes `contents` to `path` unless the file already holds exactly that.
///
/// Returns whether the file was written. Leaving unchanged files alone keeps
/// their mtime stable for downstream change detection.
pub fn write_file_if_changed(path: &Path, contents: &[u8]) -> io::Result<bool> {
  match fs::read(path) {
    Ok(existing) if existing == contents => {
      debug!(path = %path.display(), "generated file unchanged");
      return Ok(false);
    }
    Ok(_) => {}
    Err(e) if e.kind() == io::ErrorKind::NotFound => {}
    Err(e) => return Err(e),
  }
  fs::write(path, contents)?;
  Ok(true)
}

/// Directory the export is written to for product variables stored in `dir`.
pub fn export_dir(dir: &Path) -> PathBuf {
  dir.join(INJECTION_DIR).join(PRODUCT_CONFIG_DIR)
}

fn render_product_variables_bzl(json: &str, constraints: &str, arch_constraints: &str) -> String {
  // The JSON sits inside a Starlark string literal.
  let escaped = json.replace('\\', "\\\\");
  [
    GENERATED_BAZEL_FILE_WARNING.to_string(),
    format!("_product_vars = json.decode(\"\"\"{escaped}\"\"\")"),
    format!("_product_var_constraints = {constraints}"),
    format!("_arch_variant_product_var_constraints = {arch_constraints}"),
    "\n".to_string(),
    "\nproduct_vars = _product_vars\n\
     product_var_constraints = _product_var_constraints\n\
     arch_variant_product_var_constraints = _arch_variant_product_var_constraints\n"
      .to_string(),
  ]
  .join("\n")
}

fn render_constants_bzl(constraints: &str, arch_constraints: &str) -> String {
  format!(
    "\nproduct_var_constraints = {constraints}\narch_variant_product_var_constraints = {arch_constraints}\n"
  )
}

/// Writes `product_variables.bzl`, `product_variable_constants.bzl` and
/// `BUILD` under `<dir>/soong_injection/product_config/`.
pub fn write_bazel_config(vars: &ProductVariables, dir: &Path) -> Result<(), VariablesError> {
  let out = export_dir(dir);
  fs::create_dir_all(&out).map_err(|source| VariablesError::CreateDir {
    path: out.clone(),
    source,
  })?;

  let constraints = starlark_string_list(&product_var_constraints());
  let arch_constraints = starlark_string_list(&arch_variant_product_var_constraints());

  let json = to_pretty_json(vars).map_err(|source| VariablesError::Serialize {
    path: out.clone(),
    source,
  })?;
  let json = String::from_utf8_lossy(&json);

  let files = [
    (
      "product_variables.bzl",
      render_product_variables_bzl(&json, &constraints, &arch_constraints),
    ),
    (
      "product_variable_constants.bzl",
      render_constants_bzl(&constraints, &arch_constraints),
    ),
    ("BUILD", GENERATED_BAZEL_FILE_WARNING.to_string()),
  ];

  let mut written = 0;
  for (name, contents) in files {
    let path = out.join(name);
    if write_file_if_changed(&path, contents.as_bytes()).map_err(|source| VariablesError::Export {
      path: path.clone(),
      source,
    })? {
      written += 1;
    }
  }

  info!(dir = %out.display(), written, "exported product config");
  Ok(())
}
