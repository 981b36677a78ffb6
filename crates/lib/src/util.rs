//! Small filesystem helpers shared by the persisted config files.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

/// Directory holding `path`, or `.` for a bare file name.
pub(crate) fn parent_dir(path: &Path) -> PathBuf {
  match path.parent() {
    Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
    _ => PathBuf::from("."),
  }
}

/// Replaces `path` with `data` through a temporary file in the same
/// directory, so readers never observe a partial file.
pub(crate) fn write_atomic(path: &Path, data: &[u8]) -> io::Result<()> {
  let mut file = NamedTempFile::new_in(parent_dir(path))?;
  file.write_all(data)?;
  file.flush()?;
  file.persist(path).map_err(|e| e.error)?;
  Ok(())
}
