//! Encoder capability selection

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::{info, warn};

use crate::domain::model::{EncoderProfile, HardwareAcceleration};
use crate::domain::rules::EncoderPriority;
use crate::ports::{EncoderCatalogPort, EncoderProvider};

/// Detects the best encoder once and serves it for the provider's lifetime
pub struct EncoderSelector {
    catalog: Arc<dyn EncoderCatalogPort>,
    software: EncoderProfile,
    allow_hardware: bool,
    candidates: Vec<HardwareAcceleration>,
    selected: OnceCell<EncoderProfile>,
}

impl EncoderSelector {
    pub fn new(catalog: Arc<dyn EncoderCatalogPort>, software: EncoderProfile) -> Self {
        Self {
            catalog,
            software,
            allow_hardware: true,
            candidates: EncoderPriority::candidates(),
            selected: OnceCell::new(),
        }
    }

    /// Disable hardware detection entirely
    pub fn with_hardware(mut self, allow: bool) -> Self {
        self.allow_hardware = allow;
        self
    }

    /// Override the hardware families considered, best first
    pub fn with_candidates(mut self, candidates: Vec<HardwareAcceleration>) -> Self {
        self.candidates = candidates;
        self
    }

    async fn detect(&self) -> EncoderProfile {
        if !self.allow_hardware {
            info!(codec = %self.software.codec_id, "Hardware encoding disabled");
            return self.software.clone();
        }

        let available = match self.catalog.video_encoders().await {
            Ok(available) => available,
            Err(e) => {
                warn!(error = %e, "Could not list encoders, using software encoding");
                return self.software.clone();
            }
        };

        let mut remaining = self.candidates.clone();
        loop {
            let profile = EncoderPriority::select(&remaining, &available, &self.software);
            if !profile.is_hardware() {
                info!(codec = %profile.codec_id, "No usable hardware encoder, using software encoding");
                return profile;
            }
            match self.catalog.try_encode(&profile.codec_id).await {
                Ok(()) => {
                    info!(codec = %profile.codec_id, "Hardware encoder detected");
                    return profile;
                }
                Err(e) => {
                    warn!(
                        codec = %profile.codec_id,
                        error_kind = e.kind(),
                        error = %e,
                        "Listed encoder failed trial encode"
                    );
                    remaining.retain(|accel| accel.codec_id() != profile.codec_id);
                }
            }
        }
    }
}

#[async_trait]
impl EncoderProvider for EncoderSelector {
    async fn profile(&self) -> EncoderProfile {
        self.selected.get_or_init(|| self.detect()).await.clone()
    }

    fn software(&self) -> EncoderProfile {
        self.software.clone()
    }
}

/// Provider returning a preset profile
#[derive(Debug, Clone)]
pub struct FixedEncoderProvider {
    profile: EncoderProfile,
    software: EncoderProfile,
}

impl FixedEncoderProvider {
    pub fn new(profile: EncoderProfile, software: EncoderProfile) -> Self {
        Self { profile, software }
    }

    /// Always the software baseline
    pub fn software_only() -> Self {
        let software = EncoderProfile::default_software();
        Self::new(software.clone(), software)
    }
}

#[async_trait]
impl EncoderProvider for FixedEncoderProvider {
    async fn profile(&self) -> EncoderProfile {
        self.profile.clone()
    }

    fn software(&self) -> EncoderProfile {
        self.software.clone()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::domain::errors::DomainError;

    struct CountingCatalog {
        encoders: Result<Vec<String>, DomainError>,
        broken: Vec<String>,
        calls: AtomicUsize,
        trials: std::sync::Mutex<Vec<String>>,
    }

    impl CountingCatalog {
        fn new(encoders: Result<Vec<&str>, DomainError>) -> Arc<Self> {
            Self::with_broken(encoders, &[])
        }

        /// Catalog whose `broken` encoders are listed but fail to encode
        fn with_broken(encoders: Result<Vec<&str>, DomainError>, broken: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                encoders: encoders.map(|list| list.into_iter().map(String::from).collect()),
                broken: broken.iter().map(|s| s.to_string()).collect(),
                calls: AtomicUsize::new(0),
                trials: std::sync::Mutex::new(Vec::new()),
            })
        }

        fn trials(&self) -> Vec<String> {
            self.trials.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl EncoderCatalogPort for CountingCatalog {
        async fn video_encoders(&self) -> Result<Vec<String>, DomainError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.encoders.clone()
        }

        async fn try_encode(&self, codec: &str) -> Result<(), DomainError> {
            self.trials.lock().unwrap().push(codec.to_string());
            if self.broken.iter().any(|b| b == codec) {
                return Err(DomainError::encoder_failure(codec, "No NVENC capable devices found"));
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_selects_by_priority_and_memoizes() {
        let catalog = CountingCatalog::new(Ok(vec!["libx264", "h264_qsv", "h264_nvenc"]));
        let selector = EncoderSelector::new(catalog.clone(), EncoderProfile::default_software())
            .with_candidates(vec![HardwareAcceleration::Nvenc, HardwareAcceleration::Qsv]);

        assert_eq!(selector.profile().await.codec_id, "h264_nvenc");
        assert_eq!(selector.profile().await.codec_id, "h264_nvenc");
        assert_eq!(catalog.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_concurrent_first_calls_converge() {
        let catalog = CountingCatalog::new(Ok(vec!["h264_qsv"]));
        let selector = Arc::new(
            EncoderSelector::new(catalog.clone(), EncoderProfile::default_software())
                .with_candidates(vec![HardwareAcceleration::Nvenc, HardwareAcceleration::Qsv]),
        );

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let selector = selector.clone();
                tokio::spawn(async move { selector.profile().await })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.await.unwrap().codec_id, "h264_qsv");
        }
        assert_eq!(catalog.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_falls_back_to_software() {
        let software = EncoderProfile::default_software();

        let catalog = CountingCatalog::new(Ok(vec!["libx264"]));
        let selector = EncoderSelector::new(catalog, software.clone());
        assert_eq!(selector.profile().await, software);

        let catalog = CountingCatalog::new(Err(DomainError::ProbeFailure("boom".to_string())));
        let selector = EncoderSelector::new(catalog, software.clone());
        assert_eq!(selector.profile().await, software);
    }

    #[tokio::test]
    async fn test_listed_encoder_failing_trial_is_skipped() {
        let catalog = CountingCatalog::with_broken(Ok(vec!["h264_nvenc", "h264_qsv"]), &["h264_nvenc"]);
        let selector = EncoderSelector::new(catalog.clone(), EncoderProfile::default_software())
            .with_candidates(vec![HardwareAcceleration::Nvenc, HardwareAcceleration::Qsv]);

        assert_eq!(selector.profile().await.codec_id, "h264_qsv");
        assert_eq!(catalog.trials(), vec!["h264_nvenc", "h264_qsv"]);

        let software = EncoderProfile::default_software();
        let catalog = CountingCatalog::with_broken(Ok(vec!["h264_nvenc"]), &["h264_nvenc"]);
        let selector = EncoderSelector::new(catalog.clone(), software.clone())
            .with_candidates(vec![HardwareAcceleration::Nvenc, HardwareAcceleration::Qsv]);

        assert_eq!(selector.profile().await, software);
        assert_eq!(selector.profile().await, software);
        assert_eq!(catalog.trials(), vec!["h264_nvenc"]);
    }

    #[tokio::test]
    async fn test_hardware_disabled_skips_detection() {
        let catalog = CountingCatalog::new(Ok(vec!["h264_nvenc"]));
        let selector = EncoderSelector::new(catalog.clone(), EncoderProfile::default_software())
            .with_hardware(false);

        assert!(!selector.profile().await.is_hardware());
        assert_eq!(catalog.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_fixed_provider() {
        let provider = FixedEncoderProvider::new(
            HardwareAcceleration::Nvenc.profile(),
            EncoderProfile::default_software(),
        );
        assert!(provider.profile().await.is_hardware());
        assert!(!provider.software().is_hardware());
    }
}
