use anyhow::{Context, Result};
use clap::Parser;

use quarry_cli::cli::{Cli, Commands};
use quarry_cli::{commands, logging};
use quarry_config::QuarryConfig;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.level());

    let config = QuarryConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;

    match cli.command {
        Commands::Serve { listen } => commands::serve::execute(config, listen).await?,
        Commands::Doc {
            uri,
            command,
            timeout_ms,
        } => commands::doc::execute(config, uri, command, timeout_ms).await?,
        Commands::CheckConfig => commands::check_config::execute(config)?,
    }

    Ok(())
}
