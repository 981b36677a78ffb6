use anyhow::Result;
use serde_json::json;

use buildcfg_lib::platform::HostPlatform;

use crate::output::{OutputFormat, print_info, print_json, print_stat};

pub fn cmd_info(format: OutputFormat) -> Result<()> {
  let host = HostPlatform::detect(false)?;
  let prebuilt_os = host.prebuilt_os().unwrap_or("unsupported");

  if format.is_json() {
    return print_json(&json!({
      "version": env!("CARGO_PKG_VERSION"),
      "host": host.to_string(),
      "os": host.os.as_str(),
      "arch": host.arch.as_str(),
      "prebuilt_os": prebuilt_os,
    }));
  }

  print_info(&format!("buildcfg v{}", env!("CARGO_PKG_VERSION")));
  print_stat("Host", &host.to_string());
  print_stat("OS", host.os.as_str());
  print_stat("Arch", host.arch.as_str());
  print_stat("Prebuilts", prebuilt_os);

  Ok(())
}
