//! Lexical path handling and validated directory sets.

use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};

use thiserror::Error;
use tracing::warn;

/// What to do when a directory list names the same directory twice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DuplicatePolicy {
  /// Reject the configuration.
  #[default]
  Error,
  /// Log the duplicate and keep the first occurrence.
  Warn,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{key}: duplicate entry {dir}")]
pub struct DuplicateDirError {
  pub key: &'static str,
  pub dir: String,
}

/// Cleans `path` without touching the filesystem.
///
/// Repeated separators and `.` components are dropped and `..` removes the
/// preceding normal component. A `..` directly under the root is dropped;
/// leading `..` of a relative path is kept. An empty result is `.`.
pub fn lexical_clean(path: &Path) -> PathBuf {
  let mut out: Vec<Component<'_>> = Vec::new();
  for component in path.components() {
    match component {
      Component::CurDir => {}
      Component::ParentDir => match out.last() {
        Some(Component::Normal(_)) => {
          out.pop();
        }
        Some(Component::RootDir | Component::Prefix(_)) => {}
        _ => out.push(component),
      },
      other => out.push(other),
    }
  }
  if out.is_empty() {
    return PathBuf::from(".");
  }
  out.iter().collect()
}

/// Cleans a directory entry from product config into its canonical spelling.
pub fn clean_dir(dir: &str) -> String {
  lexical_clean(Path::new(dir)).to_string_lossy().into_owned()
}

/// Builds the set of cleaned `dirs`.
///
/// An entry that cleans to a member of `previous` or to an earlier entry is a
/// duplicate, handled according to `policy`.
pub fn create_dirs_set(
  key: &'static str,
  previous: &BTreeSet<String>,
  dirs: &[String],
  policy: DuplicatePolicy,
) -> Result<BTreeSet<String>, DuplicateDirError> {
  let mut set = BTreeSet::new();
  for dir in dirs {
    let clean = clean_dir(dir);
    if previous.contains(&clean) || set.contains(&clean) {
      match policy {
        DuplicatePolicy::Error => {
          return Err(DuplicateDirError { key, dir: dir.clone() });
        }
        DuplicatePolicy::Warn => {
          warn!(key, dir = %dir, "ignoring duplicate directory entry");
          continue;
        }
      }
    }
    set.insert(clean);
  }
  Ok(set)
}
