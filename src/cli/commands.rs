//! CLI command implementations

use std::path::Path;

use super::args::{Cli, Command};
use super::errors::{CliError, CliResult};
use crate::config::TombolaConfig;
use crate::http::HttpServer;
use crate::observability::Logger;
use crate::sync::SyncContext;

/// Dispatch a parsed command.
pub fn run_command(cli: Cli) -> CliResult<()> {
    match cli.command {
        Command::Init { config } => init(&config),
        Command::Serve { config } => serve(&config),
    }
}

/// Write a default configuration file and create its data directory.
///
/// Refuses to overwrite an existing configuration.
pub fn init(config_path: &Path) -> CliResult<()> {
    init_with(config_path, &TombolaConfig::default())
}

fn init_with(config_path: &Path, config: &TombolaConfig) -> CliResult<()> {
    if config_path.exists() {
        return Err(CliError::Config(format!(
            "Configuration already exists: {}",
            config_path.display()
        )));
    }

    let contents = serde_json::to_string_pretty(config)
        .map_err(|e| CliError::Config(e.to_string()))?;
    std::fs::write(config_path, contents)?;
    std::fs::create_dir_all(&config.data_dir)?;

    Logger::info(
        "INIT_COMPLETE",
        &[("config", &config_path.display().to_string())],
    );
    Ok(())
}

/// Boot the sync context and serve until shutdown, then flush.
pub fn serve(config_path: &Path) -> CliResult<()> {
    let config = if config_path.exists() {
        TombolaConfig::load(config_path)?
    } else {
        Logger::warn(
            "CONFIG_MISSING",
            &[("path", &config_path.display().to_string())],
        );
        TombolaConfig::default()
    };

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        let ctx = SyncContext::init(&config)?;
        let server = HttpServer::new(config, std::sync::Arc::clone(&ctx));

        server.start().await?;

        // Graceful shutdown: cancel the debounce and run one final flush so
        // no committed mutation is dropped
        ctx.shutdown().await?;
        Ok(())
    })
}
