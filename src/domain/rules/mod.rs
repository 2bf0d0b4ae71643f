// Domain rules - Business logic and policies

use crate::domain::errors::*;
use crate::domain::model::*;

/// Lowest tempo ratio a single audio tempo stage accepts
pub const MIN_TEMPO_STEP: f64 = 0.5;
/// Highest tempo ratio a single audio tempo stage accepts
pub const MAX_TEMPO_STEP: f64 = 2.0;

/// Decomposition of playback speed changes into audio tempo stages
pub struct TempoPlanner;

impl TempoPlanner {
    /// Split `factor` into stages that each lie within `[0.5, 2.0]` and whose
    /// product is `factor`.
    pub fn steps(factor: f64) -> Result<Vec<f64>, DomainError> {
        if !factor.is_finite() || factor <= 0.0 {
            return Err(DomainError::InvalidActionParams(format!(
                "Speed factor must be positive, got {}",
                factor
            )));
        }

        let mut steps = Vec::new();
        let mut remaining = factor;
        while remaining > MAX_TEMPO_STEP {
            steps.push(MAX_TEMPO_STEP);
            remaining /= MAX_TEMPO_STEP;
        }
        while remaining < MIN_TEMPO_STEP {
            steps.push(MIN_TEMPO_STEP);
            remaining /= MIN_TEMPO_STEP;
        }
        steps.push(remaining);
        Ok(steps)
    }
}

/// Validation of segment keep-lists
pub struct SegmentPolicy;

impl SegmentPolicy {
    /// Clamp negative starts to zero and drop empty or inverted ranges.
    ///
    /// A segment referring to a source index outside `0..source_count` fails
    /// the whole list.
    pub fn sanitize(segments: &[Segment], source_count: usize) -> Result<Vec<Segment>, DomainError> {
        let mut kept = Vec::with_capacity(segments.len());
        for segment in segments {
            if segment.source >= source_count {
                return Err(DomainError::InvalidActionParams(format!(
                    "Segment '{}' refers to source {} but only {} source(s) were given",
                    segment.label, segment.source, source_count
                )));
            }
            if !segment.start.is_finite() || !segment.end.is_finite() {
                tracing::warn!(label = %segment.label, "Skipping segment with non-finite bounds");
                continue;
            }

            let start = segment.start.max(0.0);
            if segment.end <= start {
                tracing::warn!(
                    label = %segment.label,
                    start = segment.start,
                    end = segment.end,
                    "Skipping empty segment"
                );
                continue;
            }

            kept.push(Segment {
                start,
                end: segment.end,
                label: segment.label.clone(),
                source: segment.source,
            });
        }
        Ok(kept)
    }
}

/// Common frame geometry used when stitching segments together
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionPolicy {
    /// Use the resolution of the first segment's source
    Native,
    /// Letterbox everything into a fixed canvas
    Fixed(Resolution),
}

impl Default for ResolutionPolicy {
    fn default() -> Self {
        ResolutionPolicy::Native
    }
}

impl ResolutionPolicy {
    /// Target resolution given the source of the first kept segment
    pub fn target(&self, first: &MediaAsset) -> Resolution {
        match self {
            ResolutionPolicy::Native => first.resolution().even(),
            ResolutionPolicy::Fixed(resolution) => resolution.even(),
        }
    }
}

/// Checks for joining streams without normalization
pub struct ConcatCompatibility;

impl ConcatCompatibility {
    /// Fail with `StitchIncompatible` unless every asset shares the first one's
    /// resolution, codec and audio layout.
    pub fn check(assets: &[MediaAsset]) -> Result<(), DomainError> {
        let Some(first) = assets.first() else {
            return Ok(());
        };

        for asset in &assets[1..] {
            if asset.resolution() != first.resolution() {
                return Err(DomainError::StitchIncompatible(format!(
                    "{} is {} but {} is {}",
                    asset.path.display(),
                    asset.resolution(),
                    first.path.display(),
                    first.resolution()
                )));
            }
            if asset.video_codec != first.video_codec {
                return Err(DomainError::StitchIncompatible(format!(
                    "{} uses video codec {:?} but {} uses {:?}",
                    asset.path.display(),
                    asset.video_codec,
                    first.path.display(),
                    first.video_codec
                )));
            }
            if asset.has_audio != first.has_audio || asset.audio_codec != first.audio_codec {
                return Err(DomainError::StitchIncompatible(format!(
                    "{} and {} have different audio layouts",
                    asset.path.display(),
                    first.path.display()
                )));
            }
        }
        Ok(())
    }

    /// Audio can only be concatenated when every input carries a track
    pub fn audio_joinable(assets: &[MediaAsset]) -> bool {
        !assets.is_empty() && assets.iter().all(|asset| asset.has_audio)
    }
}

/// Encoder preference order
pub struct EncoderPriority;

impl EncoderPriority {
    /// Hardware families to look for on this host, best first
    pub fn candidates() -> Vec<HardwareAcceleration> {
        let mut candidates = vec![HardwareAcceleration::Nvenc, HardwareAcceleration::Qsv];
        if cfg!(target_os = "macos") {
            candidates.push(HardwareAcceleration::VideoToolbox);
        }
        if cfg!(target_os = "windows") {
            candidates.push(HardwareAcceleration::MediaFoundation);
        }
        candidates
    }

    /// Pick the first candidate whose codec the engine reports, or the
    /// software baseline when none is present.
    pub fn select(
        candidates: &[HardwareAcceleration],
        available: &[String],
        software: &EncoderProfile,
    ) -> EncoderProfile {
        candidates
            .iter()
            .find(|accel| available.iter().any(|codec| codec == accel.codec_id()))
            .map(HardwareAcceleration::profile)
            .unwrap_or_else(|| software.clone())
    }

    /// Ordered encoder attempts for one render: a hardware profile is
    /// followed by exactly one software retry.
    pub fn attempts(profile: &EncoderProfile, software: &EncoderProfile) -> Vec<EncoderProfile> {
        if profile.is_hardware() {
            vec![profile.clone(), software.clone()]
        } else {
            vec![profile.clone()]
        }
    }
}
