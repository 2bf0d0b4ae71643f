//! Command-line argument definitions

use std::path::PathBuf;

use clap::Args;

/// Arguments for the render command
#[derive(Args, Debug)]
pub struct RenderArgs {
    /// Source video file
    #[arg(short, long)]
    pub input: PathBuf,

    /// Instruction payload (.json, .yaml or .yml); renders unchanged when omitted
    #[arg(long)]
    pub instructions: Option<PathBuf>,

    /// Start of the timeline selection (HH:MM:SS.ms, MM:SS.ms, or seconds)
    #[arg(long)]
    pub clip_start: Option<String>,

    /// Length of the timeline selection (HH:MM:SS.ms, MM:SS.ms, or seconds)
    #[arg(long)]
    pub clip_duration: Option<String>,

    /// Extra sources addressable by segment `source` index, in order
    #[arg(long = "additional-source")]
    pub additional_sources: Vec<PathBuf>,
}

/// Arguments for the export command
#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Clip filenames, relative to the media directory, in playback order
    #[arg(required = true)]
    pub clips: Vec<String>,

    /// Directory clip filenames are resolved against
    #[arg(long)]
    pub media_dir: Option<PathBuf>,
}

/// Arguments for the probe command
#[derive(Args, Debug)]
pub struct ProbeArgs {
    /// Media file to probe
    #[arg(short, long)]
    pub input: PathBuf,
}
