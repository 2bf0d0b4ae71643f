// Probe LibAV adapter - Media file analysis using libav

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use ffmpeg_next as ffmpeg;
use tracing::debug;

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::ports::*;

/// LibAV-based media probing adapter, reading headers in-process
pub struct LibavProbeAdapter;

impl LibavProbeAdapter {
    /// Create new LibAV probing adapter
    pub fn new() -> Result<Self, DomainError> {
        ffmpeg::init().map_err(|e| DomainError::ProbeFailure(format!("Failed to initialize libav: {}", e)))?;
        Ok(Self)
    }

    fn probe_blocking(path: PathBuf) -> Result<MediaAsset, DomainError> {
        let display = path.display().to_string();
        let input = ffmpeg::format::input(&path)
            .map_err(|e| DomainError::ProbeFailure(format!("Cannot open {}: {}", display, e)))?;

        let video = input
            .streams()
            .best(ffmpeg::media::Type::Video)
            .ok_or_else(|| DomainError::NoVideoStream(display.clone()))?;
        let video_codec = video.parameters().id().name().to_string();
        let decoder = ffmpeg::codec::context::Context::from_parameters(video.parameters())
            .and_then(|context| context.decoder().video())
            .map_err(|e| DomainError::ProbeFailure(format!("Cannot read video stream of {}: {}", display, e)))?;
        if decoder.width() == 0 || decoder.height() == 0 {
            return Err(DomainError::NoVideoStream(display));
        }

        let audio_codec = input
            .streams()
            .best(ffmpeg::media::Type::Audio)
            .map(|stream| stream.parameters().id().name().to_string());

        let duration_seconds = if input.duration() > 0 {
            input.duration() as f64 / ffmpeg::ffi::AV_TIME_BASE as f64
        } else {
            0.0
        };

        Ok(MediaAsset {
            path,
            has_video: true,
            has_audio: audio_codec.is_some(),
            width: decoder.width(),
            height: decoder.height(),
            duration_seconds,
            video_codec: Some(video_codec),
            audio_codec,
        })
    }
}

#[async_trait]
impl ProbePort for LibavProbeAdapter {
    async fn probe(&self, path: &Path) -> Result<MediaAsset, DomainError> {
        if !tokio::fs::try_exists(path).await.unwrap_or(false) {
            return Err(DomainError::InputNotFound(path.display().to_string()));
        }

        let owned = path.to_path_buf();
        let asset = tokio::task::spawn_blocking(move || Self::probe_blocking(owned))
            .await
            .map_err(|e| DomainError::ProbeFailure(format!("Probe task failed: {}", e)))??;
        debug!(path = %path.display(), resolution = %asset.resolution(), "Probed media with libav");
        Ok(asset)
    }
}
