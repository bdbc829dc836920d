//! CLI module for tombola
//!
//! Commands:
//! - init: write a default configuration file and create the data directory
//! - serve: boot the sync context and enter the serving loop

mod args;
mod commands;
mod errors;

pub use args::{Cli, Command};
pub use commands::{init, run_command, serve};
pub use errors::{CliError, CliResult};

/// Parse arguments and dispatch. The entry point called from `main`.
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    run_command(cli)
}
