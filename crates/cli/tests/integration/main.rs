mod common;
mod configure_tests;
mod env_check_tests;
mod targets_tests;
