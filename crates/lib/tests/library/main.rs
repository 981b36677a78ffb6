//! End-to-end configuration runs through the public API.

mod common;
mod configure_tests;
mod env_tests;
mod threads_tests;
