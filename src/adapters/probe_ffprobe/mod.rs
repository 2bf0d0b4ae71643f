//! FFprobe adapter for media file probing
//!
//! Runs `ffprobe` with JSON output and maps the first video and audio streams
//! onto a `MediaAsset`.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;
use tracing::debug;

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::ports::*;

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    format: Option<FfprobeFormat>,
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: Option<String>,
    codec_name: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    duration: Option<String>,
}

/// FFprobe-based probe adapter
pub struct FfprobeAdapter {
    binary: PathBuf,
}

impl FfprobeAdapter {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

#[async_trait]
impl ProbePort for FfprobeAdapter {
    async fn probe(&self, path: &Path) -> Result<MediaAsset, DomainError> {
        if !tokio::fs::try_exists(path).await.unwrap_or(false) {
            return Err(DomainError::InputNotFound(path.display().to_string()));
        }

        let output = Command::new(&self.binary)
            .args(["-v", "error", "-print_format", "json", "-show_format", "-show_streams"])
            .arg(path)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                DomainError::ProbeFailure(format!(
                    "Failed to launch {}: {}",
                    self.binary.display(),
                    e
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DomainError::ProbeFailure(format!(
                "ffprobe failed on {}: {}",
                path.display(),
                stderr.trim()
            )));
        }

        let asset = parse_ffprobe_output(path, &output.stdout)?;
        debug!(
            path = %path.display(),
            resolution = %asset.resolution(),
            duration = asset.duration_seconds,
            has_audio = asset.has_audio,
            "Probed media"
        );
        Ok(asset)
    }
}

/// Map ffprobe JSON onto a `MediaAsset`
fn parse_ffprobe_output(path: &Path, json: &[u8]) -> Result<MediaAsset, DomainError> {
    let output: FfprobeOutput = serde_json::from_slice(json).map_err(|e| {
        DomainError::ProbeFailure(format!("Unreadable ffprobe output for {}: {}", path.display(), e))
    })?;

    let of_type = |kind: &str| {
        output
            .streams
            .iter()
            .find(|s| s.codec_type.as_deref() == Some(kind))
    };

    let video = of_type("video")
        .filter(|s| s.width.unwrap_or(0) > 0 && s.height.unwrap_or(0) > 0)
        .ok_or_else(|| DomainError::NoVideoStream(path.display().to_string()))?;
    let audio = of_type("audio");

    let parse = |value: &Option<String>| value.as_deref().and_then(|s| s.parse::<f64>().ok());
    let duration_seconds = output
        .format
        .as_ref()
        .and_then(|f| parse(&f.duration))
        .or_else(|| {
            output
                .streams
                .iter()
                .filter_map(|s| parse(&s.duration))
                .reduce(f64::max)
        })
        .unwrap_or(0.0);

    Ok(MediaAsset {
        path: path.to_path_buf(),
        has_video: true,
        has_audio: audio.is_some(),
        width: video.width.unwrap_or(0),
        height: video.height.unwrap_or(0),
        duration_seconds,
        video_codec: video.codec_name.clone(),
        audio_codec: audio.and_then(|a| a.codec_name.clone()),
    })
}
