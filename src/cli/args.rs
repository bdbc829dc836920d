//! CLI argument definitions using clap
//!
//! Commands:
//! - tombola init --config <path>
//! - tombola serve --config <path>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// tombola - event registration and raffle manager with real-time sync
#[derive(Parser, Debug)]
#[command(name = "tombola")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Write a default configuration file and create the data directory
    Init {
        /// Path to configuration file
        #[arg(long, default_value = "./tombola.json")]
        config: PathBuf,
    },

    /// Start the server
    Serve {
        /// Path to configuration file
        #[arg(long, default_value = "./tombola.json")]
        config: PathBuf,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
