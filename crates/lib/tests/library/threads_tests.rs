use std::sync::{Arc, Barrier};
use std::thread;

use buildcfg_lib::{CmdArgs, Config};
use tempfile::TempDir;

use super::common::{env, options, write_variables};

const THREADS: usize = 8;

#[test]
fn config_is_shared_across_threads() {
  let temp = TempDir::new().unwrap();
  let soong_out = temp.path().join("soong");
  let config = Arc::new(Config::with_options(CmdArgs::new(temp.path(), &soong_out), env(&[]), options()).unwrap());

  let handles: Vec<_> = (0..THREADS)
    .map(|i| {
      let config = Arc::clone(&config);
      thread::spawn(move || {
        config.log_mixed_build(&format!("lib{i}"), i % 2 == 0);
        config.is_mixed_builds_enabled()
      })
    })
    .collect();

  for handle in handles {
    assert!(!handle.join().unwrap());
  }
  assert_eq!(config.mixed_build_enabled_modules().len(), THREADS / 2);
  assert_eq!(config.mixed_build_disabled_modules().len(), THREADS / 2);
}

#[test]
fn concurrent_first_reads_share_one_snapshot_set() {
  let temp = TempDir::new().unwrap();
  let soong_out = temp.path().join("soong");
  write_variables(
    &soong_out,
    r#"{
      "VendorSnapshotDirsExcluded": ["vendor/a", "vendor/b"],
      "VendorSnapshotDirsIncluded": ["vendor/c"]
    }"#,
  );
  let config = Arc::new(Config::with_options(CmdArgs::new(temp.path(), &soong_out), env(&[]), options()).unwrap());
  let barrier = Arc::new(Barrier::new(THREADS));

  let handles: Vec<_> = (0..THREADS)
    .map(|_| {
      let config = Arc::clone(&config);
      let barrier = Arc::clone(&barrier);
      thread::spawn(move || {
        barrier.wait();
        let excluded = config.vendor_snapshot_dirs_excluded().unwrap();
        let included = config.vendor_snapshot_dirs_included().unwrap();
        (excluded, included)
      })
    })
    .collect();

  let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
  let (first_excluded, first_included) = &results[0];
  assert_eq!(first_excluded.len(), 2);
  assert!(first_included.contains("vendor/c"));
  for (excluded, included) in &results[1..] {
    assert!(Arc::ptr_eq(first_excluded, excluded));
    assert!(Arc::ptr_eq(first_included, included));
  }
}
