//! vidcraft command-line entry point

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info};

use vidcraft::adapters::{init_logging, AppConfig};
use vidcraft::app::DefaultAppContainer;
use vidcraft::cli::{commands, Cli};

/// Main entry point for the vidcraft CLI application
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    commands::configure(&cli, &mut config);
    config.validate().context("Invalid configuration")?;

    init_logging(&config.logging);
    debug!(?config, "Effective configuration");

    let container = DefaultAppContainer::new(&config).context("Failed to initialize ffmpeg")?;
    commands::run(&container, cli.command).await?;

    info!("vidcraft completed successfully");
    Ok(())
}
