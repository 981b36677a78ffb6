use std::path::PathBuf;

/// Invocation arguments of a configuration run.
///
/// String-valued mode markers are "requested" when non-empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CmdArgs {
  pub out_dir: PathBuf,
  pub soong_out_dir: PathBuf,
  pub module_list_file: PathBuf,
  pub run_go_tests: bool,
  pub multitree_build: bool,

  pub symlink_forest_marker: String,
  pub bp2build_marker: String,
  pub bazel_queryview_dir: String,
  pub bazel_api_bp2build_dir: String,
  pub module_graph_file: String,
  pub doc_file: String,

  pub bazel_mode: bool,
  pub bazel_mode_dev: bool,
  pub bazel_mode_staging: bool,
  /// Comma separated module names.
  pub bazel_force_enabled_modules: String,

  pub use_bazel_proxy: bool,
  pub build_from_text_stub: bool,
}

impl CmdArgs {
  pub fn new(out_dir: impl Into<PathBuf>, soong_out_dir: impl Into<PathBuf>) -> Self {
    Self {
      out_dir: out_dir.into(),
      soong_out_dir: soong_out_dir.into(),
      ..Default::default()
    }
  }

  /// Modules named by `--bazel-force-enabled-modules`, empty entries dropped.
  pub fn force_enabled_modules(&self) -> impl Iterator<Item = &str> {
    self
      .bazel_force_enabled_modules
      .split(',')
      .map(str::trim)
      .filter(|m| !m.is_empty())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn force_enabled_modules_split_on_commas() {
    let args = CmdArgs {
      bazel_force_enabled_modules: "libfoo,,libbar, ".to_string(),
      ..Default::default()
    };
    assert_eq!(args.force_enabled_modules().collect::<Vec<_>>(), vec!["libfoo", "libbar"]);
    assert_eq!(CmdArgs::default().force_enabled_modules().count(), 0);
  }
}
