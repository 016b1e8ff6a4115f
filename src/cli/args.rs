//! CLI argument definitions using clap
//!
//! Commands:
//! - plandb init --config <path>
//! - plandb serve --config <path>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// plandb - hierarchical plan document store with a search projection
#[derive(Parser, Debug)]
#[command(name = "plandb")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Write a default configuration file
    Init {
        /// Path to configuration file
        #[arg(long, default_value = "./plandb.json")]
        config: PathBuf,
    },

    /// Boot the store, projector and HTTP server
    Serve {
        /// Path to configuration file
        #[arg(long, default_value = "./plandb.json")]
        config: PathBuf,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
