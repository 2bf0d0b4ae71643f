//! In-memory port doubles for exercising the engine without ffmpeg

use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::errors::DomainError;
use crate::domain::model::MediaAsset;
use crate::engine::job::EncodeJob;
use crate::ports::{EncodePort, ProbePort};

/// Build a probed asset with h264/aac codecs
pub fn asset(path: impl Into<PathBuf>, width: u32, height: u32, duration: f64, has_audio: bool) -> MediaAsset {
    MediaAsset {
        path: path.into(),
        has_video: true,
        has_audio,
        width,
        height,
        duration_seconds: duration,
        video_codec: Some("h264".to_string()),
        audio_codec: has_audio.then(|| "aac".to_string()),
    }
}

/// Probe answering from a table.
///
/// Paths missing from the table fall back to a template asset when the file
/// exists on disk, which is how rendered outputs get probed.
#[derive(Default)]
pub struct MockProbe {
    assets: Mutex<HashMap<PathBuf, MediaAsset>>,
    fallback: Option<MediaAsset>,
}

impl MockProbe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_asset(self, asset: MediaAsset) -> Self {
        self.insert(asset);
        self
    }

    /// Template returned for unknown files that exist on disk
    pub fn with_fallback(mut self, asset: MediaAsset) -> Self {
        self.fallback = Some(asset);
        self
    }

    pub fn insert(&self, asset: MediaAsset) {
        if let Ok(mut assets) = self.assets.lock() {
            assets.insert(asset.path.clone(), asset);
        }
    }
}

#[async_trait]
impl ProbePort for MockProbe {
    async fn probe(&self, path: &Path) -> Result<MediaAsset, DomainError> {
        let known = self
            .assets
            .lock()
            .map_err(|_| DomainError::ProbeFailure("probe table poisoned".to_string()))?
            .get(path)
            .cloned();
        if let Some(asset) = known {
            return Ok(asset);
        }
        match &self.fallback {
            Some(template) if path.exists() => Ok(MediaAsset {
                path: path.to_path_buf(),
                ..template.clone()
            }),
            _ => Err(DomainError::InputNotFound(path.display().to_string())),
        }
    }
}

/// Encoder replaying scripted outcomes in call order.
///
/// Successful runs write a small placeholder file at the job output; failed
/// runs leave a partial file behind. Once the script is exhausted every run
/// succeeds.
#[derive(Default)]
pub struct ScriptedEncoder {
    script: Mutex<VecDeque<Result<(), DomainError>>>,
    jobs: Mutex<Vec<EncodeJob>>,
}

impl ScriptedEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an outcome for the next run
    pub fn then(self, outcome: Result<(), DomainError>) -> Self {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(outcome);
        }
        self
    }

    /// Queue an encoder failure for the next run
    pub fn then_fail(self, message: &str) -> Self {
        self.then(Err(DomainError::encoder_failure("scripted", message)))
    }

    /// Jobs received so far
    pub fn jobs(&self) -> Vec<EncodeJob> {
        self.jobs.lock().map(|jobs| jobs.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl EncodePort for ScriptedEncoder {
    async fn run(&self, job: &EncodeJob) -> Result<(), DomainError> {
        if let Ok(mut jobs) = self.jobs.lock() {
            jobs.push(job.clone());
        }
        let outcome = self
            .script
            .lock()
            .ok()
            .and_then(|mut script| script.pop_front())
            .unwrap_or(Ok(()));

        tokio::fs::write(job.output(), b"partial").await?;
        match outcome {
            Ok(()) => Ok(()),
            Err(DomainError::EncoderFailure { message, .. }) => Err(DomainError::encoder_failure(
                job.codec_label(),
                message,
            )),
            Err(other) => Err(other),
        }
    }
}
