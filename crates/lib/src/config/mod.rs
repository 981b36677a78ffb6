//! The process-wide build configuration.
//!
//! A [`Config`] is assembled once from invocation arguments, the environment
//! and `soong.variables`, then shared read-only by everything that generates
//! the build graph. The only state that changes after construction is
//! internally synchronized: the environment ledger, the memoization cache,
//! mixed-build bookkeeping, and a few late-bound flags.

mod dirs;
mod product;

use std::collections::BTreeSet;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::args::CmdArgs;
use crate::bazel::{BazelContext, BazelError, new_bazel_context};
use crate::consts::{DEFAULT_RBE_WRAPPER, KATI_ENABLED_MARKER, PRODUCT_VARIABLES_FILENAME, XREF_JAVA_SOURCE_MAX_DEFAULT};
use crate::env::{EmptyEnv, EnvError, EnvLedger, EnvSource};
use crate::mode::{BuildMode, ModeError, select_mode};
use crate::once::{OnceCache, OnceKey};
use crate::platform::{ArchType, HostPlatform, Multilib, OsType, PlatformError, Target};
use crate::targets::{ResolvedTargets, TargetError, common_targets, first_target, resolve_targets};
use crate::toolchain::{ClangToolchain, SdClangConfig, ToolchainError};
use crate::variables::{self, ProductVariables, VariablesError, flag, list, string};

pub use dirs::{DuplicateDirError, DuplicatePolicy, clean_dir, create_dirs_set, lexical_clean};
pub use product::VendorConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("build dir {build_dir} must not contain source directory {src_dir}")]
  BuildDirContainsSource { build_dir: PathBuf, src_dir: PathBuf },

  #[error("failed to resolve {path}: {source}")]
  ResolvePath {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("invalid override rule {rule:?} in {variable}, expected {expected}")]
  InvalidOverride {
    rule: String,
    variable: &'static str,
    expected: &'static str,
  },

  #[error(
    "AFDO_PROFILES has invalid value: {value}. The expected format is <module>:<fully-qualified-path-to-fdo_profile>"
  )]
  InvalidAfdoProfile { value: String },

  #[error(transparent)]
  Variables(#[from] VariablesError),

  #[error(transparent)]
  Targets(#[from] TargetError),

  #[error(transparent)]
  Mode(#[from] ModeError),

  #[error(transparent)]
  Bazel(#[from] BazelError),

  #[error(transparent)]
  Toolchain(#[from] ToolchainError),

  #[error(transparent)]
  Platform(#[from] PlatformError),

  #[error(transparent)]
  Env(#[from] EnvError),

  #[error(transparent)]
  DuplicateDir(#[from] DuplicateDirError),
}

/// Construction knobs that are not invocation flags.
#[derive(Debug, Clone)]
pub struct ConfigOptions {
  /// Root of the source tree. Relative paths resolve against the working dir.
  pub src_dir: PathBuf,
  /// Build host to assume instead of detecting the running one.
  pub host: Option<HostPlatform>,
  pub duplicate_policy: DuplicatePolicy,
  /// Configure as if no environment variable were set. Every read is still
  /// recorded in the ledger.
  pub ignore_env: bool,
}

impl Default for ConfigOptions {
  fn default() -> Self {
    Self {
      src_dir: PathBuf::from("."),
      host: None,
      duplicate_policy: DuplicatePolicy::default(),
      ignore_env: false,
    }
  }
}

#[derive(Debug, Default)]
struct MixedBuildLog {
  enabled: BTreeSet<String>,
  disabled: BTreeSet<String>,
}

const GLOBAL_MIXED_BUILDS_SUPPORT: OnceKey = OnceKey::new("globalMixedBuildsSupport");
const SDCLANG_CONFIG: OnceKey = OnceKey::new("sdclangConfig");

/// Immutable-after-setup build configuration.
#[derive(Debug)]
pub struct Config {
  args: CmdArgs,
  options: ConfigOptions,
  product_variables_path: PathBuf,
  vars: ProductVariables,
  kati_enabled: bool,

  host: HostPlatform,
  prebuilt_os: &'static str,
  targets: ResolvedTargets,
  build_os_target: Target,
  build_os_common_target: Target,
  android_common_target: Option<Target>,
  android_first_device_target: Option<Target>,

  build_mode: BuildMode,
  bazel: Box<dyn BazelContext>,

  env: EnvLedger,
  once: OnceCache,

  allow_missing_dependencies: AtomicBool,
  build_from_text_stub: AtomicBool,
  force_enabled_modules: Mutex<BTreeSet<String>>,
  mixed_builds: Mutex<MixedBuildLog>,
}

fn absolute(path: &Path) -> Result<PathBuf, ConfigError> {
  let abs = std::path::absolute(path).map_err(|source| ConfigError::ResolvePath {
    path: path.to_path_buf(),
    source,
  })?;
  Ok(lexical_clean(dunce::simplified(&abs)))
}

/// Fails when the source tree lives inside (or is) the build directory.
///
/// The check is lexical: symlinks are not resolved.
fn check_build_dir(soong_out_dir: &Path, src_dir: &Path) -> Result<(), ConfigError> {
  let build_dir = absolute(soong_out_dir)?;
  let src_dir = absolute(src_dir)?;
  if src_dir.starts_with(&build_dir) {
    return Err(ConfigError::BuildDirContainsSource { build_dir, src_dir });
  }
  Ok(())
}

impl Config {
  /// Builds a configuration with default [`ConfigOptions`].
  pub fn new(args: CmdArgs, env: impl EnvSource + 'static) -> Result<Self, ConfigError> {
    Self::with_options(args, env, ConfigOptions::default())
  }

  pub fn with_options(
    args: CmdArgs,
    env: impl EnvSource + 'static,
    options: ConfigOptions,
  ) -> Result<Self, ConfigError> {
    check_build_dir(&args.soong_out_dir, &options.src_dir)?;

    let product_variables_path = args.soong_out_dir.join(PRODUCT_VARIABLES_FILENAME);
    let vars = variables::load(&product_variables_path)?;

    let kati_enabled = args.soong_out_dir.join(KATI_ENABLED_MARKER).exists();
    debug!(kati_enabled, "checked kati marker");

    let host = match options.host {
      Some(host) => host,
      None => HostPlatform::detect(flag(vars.host_musl))?,
    };
    let prebuilt_os = host.prebuilt_os().ok_or(PlatformError::UnsupportedOs(host.os.as_str()))?;

    let targets = resolve_targets(&vars, &host)?;

    let host_targets = targets.for_os(host.os);
    let build_os_target = host_targets
      .first()
      .cloned()
      .ok_or(TargetError::MissingBuildOsTarget { os: host.os })?;
    let build_os_common_target = common_targets(host_targets)
      .into_iter()
      .next()
      .ok_or(TargetError::MissingBuildOsTarget { os: host.os })?;

    let android = targets.for_os(OsType::Android);
    let android_common_target = common_targets(android).into_iter().next();
    let android_first_device_target = first_target(android, &[Multilib::Lib64, Multilib::Lib32]);

    let build_mode = select_mode(&args)?;
    let force_enabled_modules = args.force_enabled_modules().map(str::to_string).collect();

    let env = if options.ignore_env {
      EnvLedger::new(EmptyEnv)
    } else {
      EnvLedger::new(env)
    };
    let bazel = new_bazel_context(build_mode, args.use_bazel_proxy, &args.out_dir, &env)?;

    info!(
      host = %host,
      mode = %build_mode,
      device = %string(&vars.device_name),
      "configuration ready"
    );

    Ok(Self {
      build_from_text_stub: AtomicBool::new(args.build_from_text_stub),
      args,
      options,
      product_variables_path,
      vars,
      kati_enabled,
      host,
      prebuilt_os,
      targets,
      build_os_target,
      build_os_common_target,
      android_common_target,
      android_first_device_target,
      build_mode,
      bazel,
      env,
      once: OnceCache::new(),
      allow_missing_dependencies: AtomicBool::new(false),
      force_enabled_modules: Mutex::new(force_enabled_modules),
      mixed_builds: Mutex::new(MixedBuildLog::default()),
    })
  }

  // Directories and invocation

  pub fn out_dir(&self) -> &Path {
    &self.args.out_dir
  }

  pub fn soong_out_dir(&self) -> &Path {
    &self.args.soong_out_dir
  }

  pub fn src_dir(&self) -> &Path {
    &self.options.src_dir
  }

  pub fn module_list_file(&self) -> &Path {
    &self.args.module_list_file
  }

  pub fn product_variables_path(&self) -> &Path {
    &self.product_variables_path
  }

  pub fn run_go_tests(&self) -> bool {
    self.args.run_go_tests
  }

  pub fn multitree_build(&self) -> bool {
    self.args.multitree_build
  }

  pub fn kati_enabled(&self) -> bool {
    self.kati_enabled
  }

  pub fn product_variables(&self) -> &ProductVariables {
    &self.vars
  }

  /// Directory containing build system host tools.
  pub fn host_tool_dir(&self) -> PathBuf {
    let base = if self.kati_enabled {
      &self.args.out_dir
    } else {
      &self.args.soong_out_dir
    };
    base.join("host").join(self.prebuilt_os).join("bin")
  }

  // Host and targets

  pub fn host(&self) -> HostPlatform {
    self.host
  }

  pub fn build_os(&self) -> OsType {
    self.host.os
  }

  pub fn build_arch(&self) -> ArchType {
    self.build_os_target.arch.arch_type
  }

  /// Name of the host OS used in prebuilts directories.
  pub fn prebuilt_os(&self) -> &'static str {
    self.prebuilt_os
  }

  pub fn cp_preserve_symlinks_flags(&self) -> &'static str {
    self.host.cp_preserve_symlinks_flags()
  }

  pub fn targets(&self) -> &ResolvedTargets {
    &self.targets
  }

  pub fn targets_for(&self, os: OsType) -> &[Target] {
    self.targets.for_os(os)
  }

  pub fn build_os_target(&self) -> &Target {
    &self.build_os_target
  }

  pub fn build_os_common_target(&self) -> &Target {
    &self.build_os_common_target
  }

  pub fn android_common_target(&self) -> Option<&Target> {
    self.android_common_target.as_ref()
  }

  pub fn android_first_device_target(&self) -> Option<&Target> {
    self.android_first_device_target.as_ref()
  }

  pub fn has_multilib_conflict(&self, arch: ArchType) -> bool {
    self.targets.has_multilib_conflict(arch)
  }

  /// Arch type of the first device target, or `Common` without device targets.
  pub fn device_primary_arch_type(&self) -> ArchType {
    self
      .targets_for(OsType::Android)
      .first()
      .map(|t| t.arch.arch_type)
      .unwrap_or(ArchType::Common)
  }

  pub fn android64(&self) -> bool {
    self
      .targets_for(OsType::Android)
      .iter()
      .any(|t| t.multilib() == Multilib::Lib64)
  }

  // Build mode and Bazel

  pub fn build_mode(&self) -> BuildMode {
    self.build_mode
  }

  pub fn bazel_context(&self) -> &dyn BazelContext {
    self.bazel.as_ref()
  }

  pub fn use_bazel_proxy(&self) -> bool {
    self.args.use_bazel_proxy
  }

  /// Whether part of the analysis is handed to Bazel.
  ///
  /// Requires a Bazel build mode and a product that mixed builds support.
  pub fn is_mixed_builds_enabled(&self) -> bool {
    let supported = self.once.once(GLOBAL_MIXED_BUILDS_SUPPORT, || {
      if string(&self.vars.device_arch) == ArchType::Riscv64.as_str() {
        return false;
      }
      if self.is_env_true("GLOBAL_THINLTO") {
        return false;
      }
      [
        &self.vars.sanitize_host,
        &self.vars.sanitize_device,
        &self.vars.sanitize_device_diag,
        &self.vars.sanitize_device_arch,
      ]
      .into_iter()
      .all(|sanitizers| list(sanitizers).is_empty())
    });
    supported && self.build_mode.is_bazel_mode()
  }

  /// Records whether a module was analyzed by Bazel, for build metrics.
  pub fn log_mixed_build(&self, module: &str, use_bazel: bool) {
    let mut log = self.mixed_builds.lock().unwrap_or_else(PoisonError::into_inner);
    if use_bazel {
      log.enabled.insert(module.to_string());
    } else {
      log.disabled.insert(module.to_string());
    }
  }

  pub fn mixed_build_enabled_modules(&self) -> BTreeSet<String> {
    self.mixed_builds.lock().unwrap_or_else(PoisonError::into_inner).enabled.clone()
  }

  pub fn mixed_build_disabled_modules(&self) -> BTreeSet<String> {
    self.mixed_builds.lock().unwrap_or_else(PoisonError::into_inner).disabled.clone()
  }

  pub fn bazel_modules_force_enabled_by_flag(&self) -> BTreeSet<String> {
    self
      .force_enabled_modules
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .clone()
  }

  pub fn add_force_enabled_modules<I, S>(&self, modules: I)
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    let mut set = self.force_enabled_modules.lock().unwrap_or_else(PoisonError::into_inner);
    set.extend(modules.into_iter().map(Into::into));
  }

  pub fn build_from_text_stub(&self) -> bool {
    self.build_from_text_stub.load(Ordering::SeqCst)
  }

  pub fn set_build_from_text_stub(&self, value: bool) {
    self.build_from_text_stub.store(value, Ordering::SeqCst);
  }

  /// Whether modules may depend on modules that do not exist.
  pub fn allow_missing_dependencies(&self) -> bool {
    self.allow_missing_dependencies.load(Ordering::SeqCst) || flag(self.vars.allow_missing_dependencies)
  }

  pub fn set_allow_missing_dependencies(&self) {
    self.allow_missing_dependencies.store(true, Ordering::SeqCst);
  }

  // Environment

  pub fn env(&self) -> &EnvLedger {
    &self.env
  }

  pub fn getenv(&self, name: &str) -> String {
    self.env.getenv(name)
  }

  pub fn getenv_with_default(&self, name: &str, default: &str) -> String {
    self.env.getenv_with_default(name, default)
  }

  pub fn is_env_true(&self, name: &str) -> bool {
    self.env.is_env_true(name)
  }

  pub fn is_env_false(&self, name: &str) -> bool {
    self.env.is_env_false(name)
  }

  /// Environment variables this configuration depends on. Freezes the ledger.
  pub fn env_deps(&self) -> std::collections::BTreeMap<String, String> {
    self.env.env_deps()
  }

  pub fn rbe_wrapper(&self) -> String {
    self.getenv_with_default("RBE_WRAPPER", DEFAULT_RBE_WRAPPER)
  }

  pub fn run_error_prone(&self) -> bool {
    self.is_env_true("RUN_ERROR_PRONE")
  }

  /// Kythe cross-reference corpus name.
  pub fn xref_corpus_name(&self) -> String {
    self.getenv("XREF_CORPUS")
  }

  /// Compilation unit encoding for Kythe: `json` (default), `proto` or `all`.
  pub fn xref_cu_encoding(&self) -> String {
    self.getenv_with_default("KYTHE_KZIP_ENCODING", "json")
  }

  /// Maximum number of Java sources in one compilation unit.
  pub fn xref_cu_java_source_max(&self) -> String {
    let value = self.getenv("KYTHE_JAVA_SOURCE_BATCH_SIZE");
    if value.is_empty() {
      return XREF_JAVA_SOURCE_MAX_DEFAULT.to_string();
    }
    if parse_uint(&value).is_none() {
      warn!(
        value = %value,
        default = XREF_JAVA_SOURCE_MAX_DEFAULT,
        "bad KYTHE_JAVA_SOURCE_BATCH_SIZE value, using default"
      );
      return XREF_JAVA_SOURCE_MAX_DEFAULT.to_string();
    }
    value
  }

  pub fn emit_xref_rules(&self) -> bool {
    !self.xref_corpus_name().is_empty()
  }

  // Toolchain

  pub fn clang_toolchain(&self) -> ClangToolchain {
    ClangToolchain::from_env(&self.env)
  }

  /// SD-Clang settings, if the build uses SD-Clang.
  ///
  /// Successful resolutions are memoized; errors are returned every time.
  pub fn sdclang(&self) -> Result<Option<SdClangConfig>, ConfigError> {
    if let Some(cached) = self.once.peek::<Option<SdClangConfig>>(SDCLANG_CONFIG) {
      return Ok(cached);
    }
    let resolved = SdClangConfig::load(&self.env)?;
    Ok(self.once.once(SDCLANG_CONFIG, || resolved))
  }

  // Snapshot directory sets

  fn dirs_set_once(
    &self,
    key: OnceKey,
    previous: &BTreeSet<String>,
    dirs: &Option<Vec<String>>,
  ) -> Result<Arc<BTreeSet<String>>, ConfigError> {
    let set = self.once.once(key, || {
      create_dirs_set(key.as_str(), previous, list(dirs), self.options.duplicate_policy).map(Arc::new)
    })?;
    Ok(set)
  }

  pub fn vendor_snapshot_dirs_excluded(&self) -> Result<Arc<BTreeSet<String>>, ConfigError> {
    self.dirs_set_once(
      OnceKey::new("VendorSnapshotDirsExcludedMap"),
      &BTreeSet::new(),
      &self.vars.vendor_snapshot_dirs_excluded,
    )
  }

  /// Included vendor snapshot dirs; an entry also listed as excluded is a
  /// duplicate.
  pub fn vendor_snapshot_dirs_included(&self) -> Result<Arc<BTreeSet<String>>, ConfigError> {
    let excluded = self.vendor_snapshot_dirs_excluded()?;
    self.dirs_set_once(
      OnceKey::new("VendorSnapshotDirsIncludedMap"),
      &excluded,
      &self.vars.vendor_snapshot_dirs_included,
    )
  }

  pub fn recovery_snapshot_dirs_excluded(&self) -> Result<Arc<BTreeSet<String>>, ConfigError> {
    self.dirs_set_once(
      OnceKey::new("RecoverySnapshotDirsExcludedMap"),
      &BTreeSet::new(),
      &self.vars.recovery_snapshot_dirs_excluded,
    )
  }

  pub fn recovery_snapshot_dirs_included(&self) -> Result<Arc<BTreeSet<String>>, ConfigError> {
    let excluded = self.recovery_snapshot_dirs_excluded()?;
    self.dirs_set_once(
      OnceKey::new("RecoverySnapshotDirsIncludedMap"),
      &excluded,
      &self.vars.recovery_snapshot_dirs_included,
    )
  }
}

/// Parses an unsigned integer literal: `0x`, `0o` and `0b` prefixes, a bare
/// leading `0` for octal, and single underscores between digits or right
/// after a prefix.
fn parse_uint(value: &str) -> Option<u64> {
  let prefix = value.get(..2).map(str::to_ascii_lowercase);
  let (digits, radix, prefixed) = match prefix.as_deref() {
    Some("0x") => (&value[2..], 16, true),
    Some("0o") => (&value[2..], 8, true),
    Some("0b") => (&value[2..], 2, true),
    _ if value.len() > 1 && value.starts_with('0') => (&value[1..], 8, true),
    _ => (value, 10, false),
  };
  let digits = if prefixed {
    digits.strip_prefix('_').unwrap_or(digits)
  } else {
    digits
  };
  if digits.is_empty() || digits.starts_with(['_', '+']) || digits.ends_with('_') || digits.contains("__") {
    return None;
  }
  u64::from_str_radix(&digits.replace('_', ""), radix).ok()
}
