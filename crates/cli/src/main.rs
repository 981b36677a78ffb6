mod cmd;
mod output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use buildcfg_lib::CmdArgs;

use cmd::{ConfigureOptions, cmd_configure, cmd_env_check, cmd_info, cmd_targets};
use output::OutputFormat;

#[derive(Parser)]
#[command(name = "buildcfg")]
#[command(author, version, about = "Configuration core of the build orchestrator", long_about = None)]
struct Cli {
  /// Enable debug logging
  #[arg(short, long, global = true)]
  verbose: bool,

  /// Print machine readable JSON instead of text
  #[arg(long, global = true)]
  json: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Load product variables, resolve targets and select the build mode
  Configure {
    #[command(flatten)]
    build: BuildArgs,

    /// Write the environment variables read during configuration to this file
    #[arg(long)]
    used_env: Option<PathBuf>,

    /// Warn about duplicate snapshot directory entries instead of failing
    #[arg(long)]
    warn_duplicate_dirs: bool,

    /// Configure as if no environment variable were set
    #[arg(long)]
    ignore_env: bool,
  },

  /// Show the resolved compilation targets per OS
  Targets {
    #[command(flatten)]
    build: BuildArgs,
  },

  /// Check whether a recorded environment file still matches the environment
  EnvCheck {
    /// Environment file written by `configure --used-env`
    file: PathBuf,
  },

  /// Show the detected build host
  Info,
}

/// Flags shared by every command that builds a configuration.
#[derive(Args, Debug, Clone)]
struct BuildArgs {
  /// Root output directory
  #[arg(long, default_value = "out")]
  out_dir: PathBuf,

  /// Output directory of the configuration step (defaults to <out-dir>/soong)
  #[arg(long)]
  soong_out_dir: Option<PathBuf>,

  /// Root of the source tree
  #[arg(long, default_value = ".")]
  src_dir: PathBuf,

  #[arg(long)]
  module_list_file: Option<PathBuf>,

  /// Run Go tests of the build tooling
  #[arg(short = 't')]
  run_go_tests: bool,

  #[arg(long)]
  multitree_build: bool,

  #[arg(long = "symlink_forest_marker", default_value = "")]
  symlink_forest_marker: String,

  #[arg(long = "bp2build_marker", default_value = "")]
  bp2build_marker: String,

  #[arg(long = "bazel_queryview_dir", default_value = "")]
  bazel_queryview_dir: String,

  #[arg(long = "bazel_api_bp2build_dir", default_value = "")]
  bazel_api_bp2build_dir: String,

  #[arg(long = "module_graph_file", default_value = "")]
  module_graph_file: String,

  #[arg(long = "soong_docs", default_value = "")]
  doc_file: String,

  #[arg(long)]
  bazel_mode: bool,

  #[arg(long)]
  bazel_mode_dev: bool,

  #[arg(long)]
  bazel_mode_staging: bool,

  /// Comma separated modules to hand to Bazel regardless of allowlists
  #[arg(long, default_value = "")]
  bazel_force_enabled_modules: String,

  #[arg(long)]
  use_bazel_proxy: bool,

  #[arg(long)]
  build_from_text_stub: bool,
}

impl BuildArgs {
  fn to_cmd_args(&self) -> CmdArgs {
    let soong_out_dir = self
      .soong_out_dir
      .clone()
      .unwrap_or_else(|| self.out_dir.join("soong"));
    CmdArgs {
      out_dir: self.out_dir.clone(),
      soong_out_dir,
      module_list_file: self.module_list_file.clone().unwrap_or_default(),
      run_go_tests: self.run_go_tests,
      multitree_build: self.multitree_build,
      symlink_forest_marker: self.symlink_forest_marker.clone(),
      bp2build_marker: self.bp2build_marker.clone(),
      bazel_queryview_dir: self.bazel_queryview_dir.clone(),
      bazel_api_bp2build_dir: self.bazel_api_bp2build_dir.clone(),
      module_graph_file: self.module_graph_file.clone(),
      doc_file: self.doc_file.clone(),
      bazel_mode: self.bazel_mode,
      bazel_mode_dev: self.bazel_mode_dev,
      bazel_mode_staging: self.bazel_mode_staging,
      bazel_force_enabled_modules: self.bazel_force_enabled_modules.clone(),
      use_bazel_proxy: self.use_bazel_proxy,
      build_from_text_stub: self.build_from_text_stub,
    }
  }
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  let default_level = if cli.verbose { "debug" } else { "warn" };
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  let format = if cli.json { OutputFormat::Json } else { OutputFormat::Text };

  match cli.command {
    Commands::Configure {
      build,
      used_env,
      warn_duplicate_dirs,
      ignore_env,
    } => cmd_configure(
      build.to_cmd_args(),
      ConfigureOptions {
        src_dir: &build.src_dir,
        used_env: used_env.as_deref(),
        warn_duplicate_dirs,
        ignore_env,
      },
      format,
    ),
    Commands::Targets { build } => cmd_targets(build.to_cmd_args(), &build.src_dir, format),
    Commands::EnvCheck { file } => cmd_env_check(&file, format),
    Commands::Info => cmd_info(format),
  }
}
