//! CLI module for vidcraft
//!
//! This module handles command-line argument parsing and command execution.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub mod args;
pub mod commands;

pub use args::{ExportArgs, ProbeArgs, RenderArgs};

/// vidcraft declarative video editor
///
/// Renders edit instructions against a source video through ffmpeg, preferring
/// a hardware encoder and healing in software when it fails.
#[derive(Parser, Debug)]
#[command(name = "vidcraft")]
#[command(about = "vidcraft - Declarative video editing on top of ffmpeg")]
#[command(version)]
#[command(long_about = None)]
pub struct Cli {
    /// Configuration file (default: vidcraft.toml or config/vidcraft.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Logging level
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Directory rendered and exported files are written to
    #[arg(long, global = true)]
    pub output_dir: Option<PathBuf>,

    /// The command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Render a source video through edit instructions
    Render(RenderArgs),
    /// Join finished clips into one file
    Export(ExportArgs),
    /// Print what the prober sees in a media file
    Probe(ProbeArgs),
    /// Print the encoder renders will start with
    Encoder,
}
