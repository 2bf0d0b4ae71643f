// Inspect interactor - Media probing and encoder capability queries

use std::path::Path;
use std::sync::Arc;

use tracing::info;

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::ports::*;

/// Interactor for the read-only queries
pub struct InspectInteractor {
    probe_port: Arc<dyn ProbePort>,
    provider: Arc<dyn EncoderProvider>,
}

impl InspectInteractor {
    pub fn new(probe_port: Arc<dyn ProbePort>, provider: Arc<dyn EncoderProvider>) -> Self {
        Self {
            probe_port,
            provider,
        }
    }

    /// Probe a media file
    pub async fn probe(&self, path: &Path) -> Result<MediaAsset, DomainError> {
        let asset = self.probe_port.probe(path).await?;
        info!(
            input = %path.display(),
            resolution = %asset.resolution(),
            duration = asset.duration_seconds,
            has_audio = asset.has_audio,
            "Media file probed"
        );
        Ok(asset)
    }

    /// The encoder renders will start with
    pub async fn encoder(&self) -> EncoderProfile {
        self.provider.profile().await
    }
}
