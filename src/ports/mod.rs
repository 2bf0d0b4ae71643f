// Ports - Interface definitions (contracts)

use std::path::Path;

use async_trait::async_trait;

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::engine::job::EncodeJob;

/// Port for media file probing
#[async_trait]
pub trait ProbePort: Send + Sync {
    /// Probe a media file.
    ///
    /// Fails with `InputNotFound` when the path does not exist and with
    /// `NoVideoStream` for files without a video track.
    async fn probe(&self, path: &Path) -> Result<MediaAsset, DomainError>;
}

/// Port for the external encoding engine
#[async_trait]
pub trait EncodePort: Send + Sync {
    /// Run one encode job to completion.
    ///
    /// Fails with `EncoderFailure` carrying the engine diagnostic when the
    /// engine exits unsuccessfully.
    async fn run(&self, job: &EncodeJob) -> Result<(), DomainError>;
}

/// Port for querying which encoders the engine was built with
#[async_trait]
pub trait EncoderCatalogPort: Send + Sync {
    /// Names of all video encoders known to the engine
    async fn video_encoders(&self) -> Result<Vec<String>, DomainError>;

    /// Encode a single blank frame with `codec` and discard it. Listed
    /// hardware encoders can still fail here when no device is present.
    async fn try_encode(&self, codec: &str) -> Result<(), DomainError>;
}

/// Source of the process-wide encoder choice
#[async_trait]
pub trait EncoderProvider: Send + Sync {
    /// Best available encoder; stable for the lifetime of the provider
    async fn profile(&self) -> EncoderProfile;

    /// Universal software baseline used for fallbacks
    fn software(&self) -> EncoderProfile;
}
