//! Command implementations

use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::adapters::toml_config::AppConfig;
use crate::app::AppContainer;
use crate::cli::args::{ExportArgs, ProbeArgs, RenderArgs};
use crate::cli::{Cli, Commands};
use crate::domain::model::{EditRequest, ExportRequest, Instructions};
use crate::error::VidcraftResult;
use crate::utils::time::TimeParser;

/// Apply command-line flags on top of the loaded configuration
pub fn configure(cli: &Cli, config: &mut AppConfig) {
    if let Some(level) = &cli.log_level {
        config.logging.level = level.clone();
    }
    if cli.json_logs {
        config.logging.json = true;
    }
    if let Some(dir) = &cli.output_dir {
        config.storage.output_dir = dir.clone();
    }
    if let Commands::Export(ExportArgs {
        media_dir: Some(dir),
        ..
    }) = &cli.command
    {
        config.storage.media_dir = dir.clone();
    }
}

/// Execute the parsed command against the wired application
pub async fn run(container: &dyn AppContainer, command: Commands) -> Result<()> {
    match command {
        Commands::Render(args) => render(container, args).await,
        Commands::Export(args) => export(container, args).await,
        Commands::Probe(args) => probe(container, args).await,
        Commands::Encoder => encoder(container).await,
    }
}

/// Execute the render command
pub async fn render(container: &dyn AppContainer, args: RenderArgs) -> Result<()> {
    let request = render_request(&args)?;
    info!(
        input = %request.source.display(),
        start = %TimeParser::format(request.clip_start),
        duration = ?request.clip_duration.map(TimeParser::format),
        "Starting render command"
    );

    let result = container
        .edit_interactor()
        .execute(&request)
        .await
        .with_context(|| format!("Failed to render {}", request.source.display()))?;

    print_json(&result)
}

/// Execute the export command
pub async fn export(container: &dyn AppContainer, args: ExportArgs) -> Result<()> {
    let request = ExportRequest::new(args.clips);
    let result = container
        .export_interactor()
        .execute(&request)
        .await
        .context("Failed to export clips")?;

    print_json(&result)
}

/// Execute the probe command
pub async fn probe(container: &dyn AppContainer, args: ProbeArgs) -> Result<()> {
    let asset = container
        .inspect_interactor()
        .probe(&args.input)
        .await
        .with_context(|| format!("Failed to probe {}", args.input.display()))?;

    print_json(&asset)
}

/// Execute the encoder command
pub async fn encoder(container: &dyn AppContainer) -> Result<()> {
    let profile = container.inspect_interactor().encoder().await;
    print_json(&profile)
}

/// Build the edit request described by the render flags
pub fn render_request(args: &RenderArgs) -> Result<EditRequest> {
    let instructions = match &args.instructions {
        Some(path) => load_instructions(path)
            .with_context(|| format!("Failed to load instructions from {}", path.display()))?,
        None => Instructions::default(),
    };

    let clip_start = match &args.clip_start {
        Some(value) => TimeParser::parse(value)
            .with_context(|| format!("Invalid clip start '{}'", value))?,
        None => 0.0,
    };
    let clip_duration = args
        .clip_duration
        .as_deref()
        .map(|value| {
            TimeParser::parse(value).with_context(|| format!("Invalid clip duration '{}'", value))
        })
        .transpose()?;

    let request = args.additional_sources.iter().fold(
        EditRequest::new(&args.input, instructions).with_selection(clip_start, clip_duration),
        |request, source| request.with_additional_source(source),
    );
    Ok(request)
}

/// Read an instruction payload; `.yaml`/`.yml` files are YAML, anything else JSON
pub fn load_instructions(path: &Path) -> VidcraftResult<Instructions> {
    let content = std::fs::read_to_string(path)?;
    parse_instructions(&content, is_yaml(path))
}

pub fn parse_instructions(content: &str, yaml: bool) -> VidcraftResult<Instructions> {
    if yaml {
        Ok(serde_yaml::from_str(content)?)
    } else {
        Ok(serde_json::from_str(content)?)
    }
}

fn is_yaml(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"))
        .unwrap_or(false)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize result")?;
    println!("{}", json);
    Ok(())
}
