// Edit interactor - Orchestrates the render-from-instructions use case

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use tracing::info;

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::engine::Renderer;
use crate::planner::ActionInterpreter;
use crate::ports::*;
use crate::utils::path::{ensure_dir, unique_output};

/// Prefix of rendered output files
pub const RENDER_PREFIX: &str = "processed";

/// Interactor for the render use case
pub struct EditInteractor {
    probe_port: Arc<dyn ProbePort>,
    interpreter: ActionInterpreter,
    renderer: Renderer,
    output_dir: PathBuf,
}

impl EditInteractor {
    /// Create new edit interactor with injected ports
    pub fn new(
        probe_port: Arc<dyn ProbePort>,
        interpreter: ActionInterpreter,
        renderer: Renderer,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            probe_port,
            interpreter,
            renderer,
            output_dir: output_dir.into(),
        }
    }

    /// Probe the sources, plan the graph and render it into a fresh file
    pub async fn execute(&self, request: &EditRequest) -> Result<RenderResult, DomainError> {
        let started = Instant::now();
        info!(
            input = %request.source.display(),
            mode = request.instructions.mode_name(),
            "Starting render"
        );

        let mut assets = Vec::with_capacity(1 + request.additional_sources.len());
        for source in request.sources() {
            assets.push(self.probe_port.probe(source).await?);
        }

        let plan = self.interpreter.plan(request, &assets)?;

        ensure_dir(&self.output_dir).await?;
        let output = unique_output(&self.output_dir, RENDER_PREFIX);
        let result = self.renderer.render(&plan, &output).await?;

        info!(
            output = %result.output_path.display(),
            duration = result.duration_seconds,
            encoder = %result.encoder,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Render completed"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::FixedEncoderProvider;
    use crate::testing::{asset, MockProbe, ScriptedEncoder};

    struct Fixture {
        dir: tempfile::TempDir,
        source: PathBuf,
        encoder: Arc<ScriptedEncoder>,
        interactor: EditInteractor,
    }

    fn fixture(encoder: ScriptedEncoder) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("source.mp4");
        std::fs::write(&source, b"source").unwrap();
        let probe = Arc::new(
            MockProbe::new()
                .with_asset(asset(&source, 1280, 720, 10.0, true))
                .with_fallback(asset("rendered.mp4", 1280, 720, 5.0, true)),
        );
        let encoder = Arc::new(encoder);
        let renderer = Renderer::new(
            encoder.clone(),
            probe.clone(),
            Arc::new(FixedEncoderProvider::software_only()),
        );
        let interactor = EditInteractor::new(
            probe,
            ActionInterpreter::default(),
            renderer,
            dir.path().join("out"),
        );
        Fixture {
            dir,
            source,
            encoder,
            interactor,
        }
    }

    #[tokio::test]
    async fn test_render_creates_output_dir_and_names_file() {
        let f = fixture(ScriptedEncoder::new());
        let request = EditRequest::new(
            &f.source,
            Instructions::Legacy {
                actions: vec![EditAction::Filter {
                    kind: FilterKind::Grayscale,
                }],
            },
        )
        .with_selection(2.0, Some(5.0));

        let result = f.interactor.execute(&request).await.unwrap();

        assert_eq!(result.output_path.parent(), Some(f.dir.path().join("out").as_path()));
        let name = result.output_path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("processed_") && name.ends_with(".mp4"));
        assert_eq!(result.duration_seconds, 5.0);

        let jobs = f.encoder.jobs();
        assert_eq!(jobs.len(), 1);
        let graph = jobs[0].graph.as_ref().unwrap().to_string();
        assert!(graph.contains("trim=start=2:end=7"));
        assert!(graph.contains("hue=s=0"));
    }

    #[tokio::test]
    async fn test_missing_source_is_reported() {
        let f = fixture(ScriptedEncoder::new());
        let request = EditRequest::new(f.dir.path().join("nope.mp4"), Instructions::default());
        let err = f.interactor.execute(&request).await.unwrap_err();
        assert!(matches!(err, DomainError::InputNotFound(_)));
        assert!(f.encoder.jobs().is_empty());
    }

    #[tokio::test]
    async fn test_encoder_failure_propagates() {
        let f = fixture(ScriptedEncoder::new().then_fail("invalid argument"));
        let request = EditRequest::new(&f.source, Instructions::default());
        let err = f.interactor.execute(&request).await.unwrap_err();
        assert!(matches!(err, DomainError::EncoderFailure { .. }));
    }
}
