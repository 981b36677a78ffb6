//! Selection of the single build mode a run operates in.

use std::fmt;

use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::args::CmdArgs;

/// What the configuration run is going to produce.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildMode {
  /// Regular analysis with no Bazel involvement.
  #[default]
  AnalysisNoBazel,
  SymlinkForest,
  Bp2build,
  GenerateQueryView,
  ApiBp2build,
  GenerateModuleGraph,
  GenerateDocFile,
  /// Mixed builds with every allowlisted module handed to Bazel.
  BazelDevMode,
  /// Mixed builds with the staging allowlist.
  BazelStagingMode,
  /// Mixed builds with the production allowlist.
  BazelProdMode,
}

impl BuildMode {
  pub fn is_bazel_mode(&self) -> bool {
    matches!(self, Self::BazelDevMode | Self::BazelStagingMode | Self::BazelProdMode)
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::AnalysisNoBazel => "analysis_no_bazel",
      Self::SymlinkForest => "symlink_forest",
      Self::Bp2build => "bp2build",
      Self::GenerateQueryView => "generate_query_view",
      Self::ApiBp2build => "api_bp2build",
      Self::GenerateModuleGraph => "generate_module_graph",
      Self::GenerateDocFile => "generate_doc_file",
      Self::BazelDevMode => "bazel_dev_mode",
      Self::BazelStagingMode => "bazel_staging_mode",
      Self::BazelProdMode => "bazel_prod_mode",
    }
  }
}

impl fmt::Display for BuildMode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

#[derive(Debug, Error)]
pub enum ModeError {
  #[error("build mode is already set to {active}, illegal argument: {flag}")]
  Conflict { flag: &'static str, active: BuildMode },
}

/// Picks the build mode requested by `args`.
///
/// Requests are considered in a fixed order; the first one wins and any
/// further request is an error naming the offending flag.
pub fn select_mode(args: &CmdArgs) -> Result<BuildMode, ModeError> {
  let requests = [
    (
      !args.symlink_forest_marker.is_empty(),
      "--symlink_forest_marker",
      BuildMode::SymlinkForest,
    ),
    (!args.bp2build_marker.is_empty(), "--bp2build_marker", BuildMode::Bp2build),
    (
      !args.bazel_queryview_dir.is_empty(),
      "--bazel_queryview_dir",
      BuildMode::GenerateQueryView,
    ),
    (
      !args.bazel_api_bp2build_dir.is_empty(),
      "--bazel_api_bp2build_dir",
      BuildMode::ApiBp2build,
    ),
    (
      !args.module_graph_file.is_empty(),
      "--module_graph_file",
      BuildMode::GenerateModuleGraph,
    ),
    (!args.doc_file.is_empty(), "--soong_docs", BuildMode::GenerateDocFile),
    (args.bazel_mode_dev, "--bazel-mode-dev", BuildMode::BazelDevMode),
    (args.bazel_mode, "--bazel-mode", BuildMode::BazelProdMode),
    (args.bazel_mode_staging, "--bazel-mode-staging", BuildMode::BazelStagingMode),
  ];

  let mut mode = BuildMode::AnalysisNoBazel;
  for (requested, flag, requested_mode) in requests {
    if !requested {
      continue;
    }
    if mode != BuildMode::AnalysisNoBazel {
      return Err(ModeError::Conflict { flag, active: mode });
    }
    mode = requested_mode;
  }

  info!(mode = %mode, "selected build mode");
  Ok(mode)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn no_request_is_plain_analysis() {
    assert_eq!(select_mode(&CmdArgs::default()).unwrap(), BuildMode::AnalysisNoBazel);
  }

  #[test]
  fn single_request_selects_its_mode() {
    let args = CmdArgs {
      bp2build_marker: "out/bp2build_marker".to_string(),
      ..Default::default()
    };
    assert_eq!(select_mode(&args).unwrap(), BuildMode::Bp2build);

    let args = CmdArgs {
      bazel_mode: true,
      ..Default::default()
    };
    let mode = select_mode(&args).unwrap();
    assert_eq!(mode, BuildMode::BazelProdMode);
    assert!(mode.is_bazel_mode());
  }

  #[test]
  fn second_request_names_flag_and_active_mode() {
    let args = CmdArgs {
      doc_file: "out/docs.html".to_string(),
      bazel_mode_dev: true,
      ..Default::default()
    };
    let err = select_mode(&args).unwrap_err();
    let ModeError::Conflict { flag, active } = err;
    assert_eq!(flag, "--bazel-mode-dev");
    assert_eq!(active, BuildMode::GenerateDocFile);
  }

  #[test]
  fn bazel_flags_conflict_in_declared_order() {
    let args = CmdArgs {
      bazel_mode: true,
      bazel_mode_staging: true,
      ..Default::default()
    };
    let err = select_mode(&args).unwrap_err();
    assert!(err.to_string().contains("--bazel-mode-staging"));
    assert!(err.to_string().contains("bazel_prod_mode"));
  }

  #[test]
  fn only_mixed_build_modes_are_bazel_modes() {
    assert!(!BuildMode::Bp2build.is_bazel_mode());
    assert!(!BuildMode::AnalysisNoBazel.is_bazel_mode());
    assert!(BuildMode::BazelStagingMode.is_bazel_mode());
  }
}
