// Library root: re-exports the application modules so integration tests can
// drive commands without spawning the binary.

pub mod app;
pub mod cli;
pub mod config;
pub mod import;
