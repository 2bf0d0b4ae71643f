//! Self-healing renderer

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use tracing::{info, warn};

use crate::domain::errors::DomainError;
use crate::domain::model::RenderResult;
use crate::domain::rules::EncoderPriority;
use crate::engine::job::{EncodeJob, JobInput, OutputOptions};
use crate::planner::RenderPlan;
use crate::ports::{EncodePort, EncoderProvider, ProbePort};
use crate::utils::path::remove_partial;

/// Executes render plans against the selected encoder, retrying once in
/// software when a hardware encoder fails.
pub struct Renderer {
    encoder: Arc<dyn EncodePort>,
    probe: Arc<dyn ProbePort>,
    provider: Arc<dyn EncoderProvider>,
    options: OutputOptions,
}

impl Renderer {
    pub fn new(
        encoder: Arc<dyn EncodePort>,
        probe: Arc<dyn ProbePort>,
        provider: Arc<dyn EncoderProvider>,
    ) -> Self {
        Self {
            encoder,
            probe,
            provider,
            options: OutputOptions::default(),
        }
    }

    pub fn with_options(mut self, options: OutputOptions) -> Self {
        self.options = options;
        self
    }

    /// Render `plan` into `output` and report the duration actually produced.
    ///
    /// A failed attempt never leaves its partial file behind.
    pub async fn render(&self, plan: &RenderPlan, output: &Path) -> Result<RenderResult, DomainError> {
        let preferred = self.provider.profile().await;
        let attempts = EncoderPriority::attempts(&preferred, &self.provider.software());
        let inputs: Vec<JobInput> = plan.inputs.iter().map(JobInput::file).collect();

        let mut last_error = None;
        for (attempt, profile) in attempts.into_iter().enumerate() {
            let job = EncodeJob::encode(inputs.clone(), plan.graph.clone(), profile.clone(), output)
                .with_options(self.options);
            let started = Instant::now();
            info!(attempt = attempt + 1, encoder = %profile, output = %output.display(), "Rendering");

            match self.encoder.run(&job).await {
                Ok(()) => {
                    let elapsed_ms = started.elapsed().as_millis() as u64;
                    let asset = match self.probe.probe(output).await {
                        Ok(asset) => asset,
                        Err(e) => {
                            remove_partial(output).await;
                            return Err(e);
                        }
                    };
                    info!(
                        codec = %profile.codec_id,
                        elapsed_ms,
                        duration = asset.duration_seconds,
                        "Render complete"
                    );
                    return Ok(RenderResult {
                        output_path: output.to_path_buf(),
                        duration_seconds: asset.duration_seconds,
                        encoder: profile,
                    });
                }
                Err(e @ DomainError::EncoderFailure { .. }) => {
                    warn!(
                        attempt = attempt + 1,
                        codec = %profile.codec_id,
                        error_kind = e.kind(),
                        error = %e,
                        "Encode attempt failed"
                    );
                    remove_partial(output).await;
                    last_error = Some(e);
                }
                Err(e) => {
                    remove_partial(output).await;
                    return Err(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            DomainError::encoder_failure(preferred.codec_id, "no encode attempt was made")
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{EncoderProfile, HardwareAcceleration};
    use crate::engine::encoder::FixedEncoderProvider;
    use crate::planner::{PlanMode, Pipeline};
    use crate::testing::{asset, MockProbe, ScriptedEncoder};

    fn plan() -> RenderPlan {
        RenderPlan {
            inputs: vec!["in.mp4".into()],
            graph: Pipeline::new(true).into_graph(0),
            mode: PlanMode::Legacy,
        }
    }

    fn hardware_provider() -> Arc<FixedEncoderProvider> {
        Arc::new(FixedEncoderProvider::new(
            HardwareAcceleration::Nvenc.profile(),
            EncoderProfile::default_software(),
        ))
    }

    fn probe() -> Arc<MockProbe> {
        Arc::new(MockProbe::new().with_fallback(asset("template.mp4", 1280, 720, 5.0, true)))
    }

    #[tokio::test]
    async fn test_hardware_failure_heals_in_software() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.mp4");
        let encoder = Arc::new(ScriptedEncoder::new().then_fail("no CUDA device"));
        let renderer = Renderer::new(encoder.clone(), probe(), hardware_provider());

        let result = renderer.render(&plan(), &output).await.unwrap();

        assert_eq!(result.output_path, output);
        assert_eq!(result.duration_seconds, 5.0);
        assert_eq!(result.encoder.codec_id, "libx264");
        let codecs: Vec<String> = encoder.jobs().iter().map(|j| j.codec_label().to_string()).collect();
        assert_eq!(codecs, vec!["h264_nvenc", "libx264"]);
    }

    #[tokio::test]
    async fn test_software_failure_is_terminal_and_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.mp4");
        let encoder = Arc::new(ScriptedEncoder::new().then_fail("bad graph"));
        let provider = Arc::new(FixedEncoderProvider::software_only());
        let renderer = Renderer::new(encoder.clone(), probe(), provider);

        let err = renderer.render(&plan(), &output).await.unwrap_err();

        assert!(matches!(err, DomainError::EncoderFailure { ref codec, .. } if codec == "libx264"));
        assert_eq!(encoder.jobs().len(), 1);
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn test_both_tiers_failing_surfaces_last_error() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.mp4");
        let encoder = Arc::new(
            ScriptedEncoder::new()
                .then_fail("hardware busy")
                .then_fail("software broke"),
        );
        let renderer = Renderer::new(encoder.clone(), probe(), hardware_provider());

        let err = renderer.render(&plan(), &output).await.unwrap_err();

        assert!(err.to_string().contains("software broke"));
        assert_eq!(encoder.jobs().len(), 2);
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn test_non_encoder_errors_are_not_retried() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.mp4");
        let encoder = Arc::new(
            ScriptedEncoder::new().then(Err(DomainError::Io("disk full".to_string()))),
        );
        let renderer = Renderer::new(encoder.clone(), probe(), hardware_provider());

        let err = renderer.render(&plan(), &output).await.unwrap_err();

        assert!(matches!(err, DomainError::Io(_)));
        assert_eq!(encoder.jobs().len(), 1);
    }

    #[tokio::test]
    async fn test_output_options_reach_the_job() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.mp4");
        let encoder = Arc::new(ScriptedEncoder::new());
        let renderer = Renderer::new(encoder.clone(), probe(), Arc::new(FixedEncoderProvider::software_only()))
            .with_options(OutputOptions {
                faststart: false,
                threads: Some(2),
            });

        renderer.render(&plan(), &output).await.unwrap();

        let jobs = encoder.jobs();
        assert_eq!(jobs[0].options.threads, Some(2));
        assert!(!jobs[0].options.faststart);
    }
}
