//! buildcfg-lib: configuration core of the build orchestrator
//!
//! This crate turns invocation arguments, the environment and the persisted
//! product variables into one immutable [`Config`]:
//! - `env`: tracked, single-read environment access
//! - `variables`: `soong.variables` load/persist and its Starlark export
//! - `targets`: per-OS compilation targets and multilib diagnostics
//! - `mode`: the single build mode of a run
//! - `config`: the facade everything else reads from

pub mod args;
pub mod bazel;
pub mod config;
pub mod consts;
pub mod env;
pub mod mode;
pub mod once;
pub mod platform;
pub mod targets;
pub mod toolchain;
pub mod variables;

mod util;

pub use args::CmdArgs;
pub use config::{Config, ConfigError, ConfigOptions, DuplicatePolicy};
pub use env::{EnvLedger, EnvSource, ProcessEnv};
pub use mode::BuildMode;
pub use variables::ProductVariables;
