use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use buildcfg_lib::ConfigOptions;
use buildcfg_lib::platform::{ArchType, HostPlatform, OsType};

pub fn options() -> ConfigOptions {
  ConfigOptions {
    src_dir: PathBuf::from("/src/tree"),
    host: Some(HostPlatform::new(OsType::Linux, ArchType::X86_64)),
    ..Default::default()
  }
}

pub fn env(vars: &[(&str, &str)]) -> BTreeMap<String, String> {
  vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

pub fn write_variables(soong_out: &Path, json: &str) {
  fs::create_dir_all(soong_out).unwrap();
  fs::write(soong_out.join("soong.variables"), json).unwrap();
}
