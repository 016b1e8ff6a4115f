//! CLI module
//!
//! - init: write a default configuration file
//! - serve: boot the store, projector and HTTP server

mod args;
mod commands;
mod config;
mod errors;

pub use args::{Cli, Command};
pub use commands::{init, run, run_command, serve, Services};
pub use config::{Config, StoreBackend, StoreConfig};
pub use errors::{CliError, CliErrorCode, CliResult};
