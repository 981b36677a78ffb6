mod configure;
mod env_check;
mod info;
mod targets;

pub use configure::{ConfigureOptions, cmd_configure};
pub use env_check::cmd_env_check;
pub use info::cmd_info;
pub use targets::cmd_targets;
