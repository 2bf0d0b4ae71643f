//! Clip exporter: joins rendered clips into one file

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::domain::errors::DomainError;
use crate::domain::model::{ExportRequest, ExportResult, ExportStrategy, MediaAsset};
use crate::domain::rules::ConcatCompatibility;
use crate::engine::job::{EncodeJob, JobInput, OutputOptions};
use crate::planner::{concat_graph, ConcatPart};
use crate::ports::{EncodePort, EncoderProvider, ProbePort};
use crate::utils::path::{ensure_dir, is_file, remove_partial, resolve_clip, unique_output};

/// Directories the exporter reads from and writes to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportDirs {
    /// Clip filenames are resolved against this directory
    pub media_dir: PathBuf,
    pub output_dir: PathBuf,
}

/// Two-tier concatenation: stream copy when the clips allow it, otherwise a
/// normalized software re-encode.
pub struct ClipExporter {
    encoder: Arc<dyn EncodePort>,
    probe: Arc<dyn ProbePort>,
    provider: Arc<dyn EncoderProvider>,
    dirs: ExportDirs,
    options: OutputOptions,
}

impl ClipExporter {
    pub fn new(
        encoder: Arc<dyn EncodePort>,
        probe: Arc<dyn ProbePort>,
        provider: Arc<dyn EncoderProvider>,
        dirs: ExportDirs,
    ) -> Self {
        Self {
            encoder,
            probe,
            provider,
            dirs,
            options: OutputOptions::default(),
        }
    }

    pub fn with_options(mut self, options: OutputOptions) -> Self {
        self.options = options;
        self
    }

    /// Export the clips of `request`, in order, into a new file
    pub async fn export(&self, request: &ExportRequest) -> Result<ExportResult, DomainError> {
        let clips = self.existing_clips(request).await;
        if clips.is_empty() {
            return Err(DomainError::NoValidInputs);
        }

        let mut assets = Vec::with_capacity(clips.len());
        for clip in &clips {
            assets.push(self.probe.probe(clip).await?);
        }

        ensure_dir(&self.dirs.output_dir).await?;
        let output = unique_output(&self.dirs.output_dir, "export");
        info!(clips = assets.len(), output = %output.display(), "Exporting clips");

        match self.fast_path(&assets, &output).await {
            Ok(()) => {
                info!("Export finished by stream copy");
                return Ok(ExportResult {
                    path: output,
                    strategy: ExportStrategy::StreamCopy,
                });
            }
            Err(e) => {
                remove_partial(&output).await;
                info!(error_kind = e.kind(), reason = %e, "Stream copy not possible, re-encoding");
            }
        }

        self.fallback(&assets, &output).await
    }

    /// Resolve and keep the clips that exist, preserving order
    async fn existing_clips(&self, request: &ExportRequest) -> Vec<PathBuf> {
        let mut clips = Vec::with_capacity(request.clips.len());
        for clip in &request.clips {
            match resolve_clip(&self.dirs.media_dir, &clip.filename) {
                Some(path) if is_file(&path).await => clips.push(path),
                Some(path) => warn!(path = %path.display(), "Skipping missing clip"),
                None => warn!(filename = %clip.filename, "Skipping invalid clip name"),
            }
        }
        clips
    }

    async fn fast_path(&self, assets: &[MediaAsset], output: &Path) -> Result<(), DomainError> {
        ConcatCompatibility::check(assets)?;

        let list_dir = tempfile::tempdir()?;
        let list_path = list_dir.path().join("concat_list.txt");
        let mut list = String::new();
        for asset in assets {
            let absolute = tokio::fs::canonicalize(&asset.path).await?;
            list.push_str(&concat_entry(&absolute));
        }
        tokio::fs::write(&list_path, list).await?;
        debug!(list = %list_path.display(), "Wrote concat list");

        let job = EncodeJob::stream_copy(vec![JobInput::concat_list(&list_path)], output)
            .with_options(self.options);
        self.encoder.run(&job).await
    }

    async fn fallback(&self, assets: &[MediaAsset], output: &Path) -> Result<ExportResult, DomainError> {
        let target = assets[0].resolution().even();
        let inputs: Vec<JobInput> = assets.iter().map(|a| JobInput::file(&a.path)).collect();
        let parts: Vec<ConcatPart> = (0..assets.len()).map(ConcatPart::whole).collect();
        let software = self.provider.software();

        let mut tiers = Vec::with_capacity(2);
        if ConcatCompatibility::audio_joinable(assets) {
            tiers.push((true, ExportStrategy::Reencoded));
        }
        tiers.push((false, ExportStrategy::ReencodedVideoOnly));

        let mut last_error = None;
        for (with_audio, strategy) in tiers {
            let graph = concat_graph(&parts, Some(target), with_audio);
            let job = EncodeJob::encode(inputs.clone(), graph, software.clone(), output)
                .with_options(self.options);
            match self.encoder.run(&job).await {
                Ok(()) => {
                    info!(?strategy, target = %target, "Export finished by re-encode");
                    return Ok(ExportResult {
                        path: output.to_path_buf(),
                        strategy,
                    });
                }
                Err(e) => {
                    warn!(with_audio, error_kind = e.kind(), error = %e, "Re-encoded export failed");
                    remove_partial(output).await;
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or(DomainError::NoValidInputs))
    }
}

/// One concat demuxer line with the path single-quoted
fn concat_entry(path: &Path) -> String {
    let path = path.to_string_lossy().replace('\\', "/").replace('\'', "'\\''");
    format!("file '{}'\n", path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::HardwareAcceleration;
    use crate::engine::encoder::FixedEncoderProvider;
    use crate::engine::job::{Codec, InputKind};
    use crate::testing::{asset, MockProbe, ScriptedEncoder};

    struct Fixture {
        dir: tempfile::TempDir,
        probe: MockProbe,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                dir: tempfile::tempdir().unwrap(),
                probe: MockProbe::new(),
            }
        }

        fn clip(mut self, name: &str, width: u32, height: u32, duration: f64, has_audio: bool) -> Self {
            let path = self.dir.path().join(name);
            std::fs::write(&path, b"clip").unwrap();
            self.probe = self.probe.with_asset(asset(path, width, height, duration, has_audio));
            self
        }

        fn exporter(self, encoder: Arc<ScriptedEncoder>) -> (tempfile::TempDir, ClipExporter) {
            let dirs = ExportDirs {
                media_dir: self.dir.path().to_path_buf(),
                output_dir: self.dir.path().join("exports"),
            };
            let provider = Arc::new(FixedEncoderProvider::new(
                HardwareAcceleration::Nvenc.profile(),
                crate::domain::model::EncoderProfile::default_software(),
            ));
            let exporter = ClipExporter::new(encoder, Arc::new(self.probe), provider, dirs);
            (self.dir, exporter)
        }
    }

    #[tokio::test]
    async fn test_no_existing_clips() {
        let (_dir, exporter) = Fixture::new().exporter(Arc::new(ScriptedEncoder::new()));
        let err = exporter
            .export(&ExportRequest::new(["missing.mp4", "../escape.mp4"]))
            .await
            .unwrap_err();
        assert_eq!(err, DomainError::NoValidInputs);

        let err = exporter.export(&ExportRequest::default()).await.unwrap_err();
        assert_eq!(err, DomainError::NoValidInputs);
    }

    #[tokio::test]
    async fn test_uniform_clips_use_stream_copy() {
        let encoder = Arc::new(ScriptedEncoder::new());
        let (_dir, exporter) = Fixture::new()
            .clip("a.mp4", 1280, 720, 3.0, true)
            .clip("b.mp4", 1280, 720, 2.0, true)
            .clip("c.mp4", 1280, 720, 4.0, true)
            .exporter(encoder.clone());

        let result = exporter
            .export(&ExportRequest::new(["a.mp4", "missing.mp4", "b.mp4", "c.mp4"]))
            .await
            .unwrap();

        assert_eq!(result.strategy, ExportStrategy::StreamCopy);
        assert!(result.path.file_name().unwrap().to_string_lossy().starts_with("export_"));
        let jobs = encoder.jobs();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].codec, Codec::StreamCopy);
        assert_eq!(jobs[0].inputs[0].kind, InputKind::ConcatList);
    }

    #[tokio::test]
    async fn test_mismatched_resolution_skips_to_reencode() {
        let encoder = Arc::new(ScriptedEncoder::new());
        let (_dir, exporter) = Fixture::new()
            .clip("a.mp4", 1280, 720, 3.0, true)
            .clip("b.mp4", 640, 360, 2.0, true)
            .exporter(encoder.clone());

        let result = exporter.export(&ExportRequest::new(["a.mp4", "b.mp4"])).await.unwrap();

        assert_eq!(result.strategy, ExportStrategy::Reencoded);
        let jobs = encoder.jobs();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].codec_label(), "libx264");
        let graph = jobs[0].graph.as_ref().unwrap().to_string();
        assert!(graph.contains("pad=1280:720:"));
        assert!(graph.ends_with("concat=n=2:v=1:a=1[vout][aout]"));
    }

    #[tokio::test]
    async fn test_failed_copy_falls_back() {
        let encoder = Arc::new(ScriptedEncoder::new().then_fail("non-monotonic DTS"));
        let (_dir, exporter) = Fixture::new()
            .clip("a.mp4", 1280, 720, 3.0, true)
            .clip("b.mp4", 1280, 720, 2.0, true)
            .exporter(encoder.clone());

        let result = exporter.export(&ExportRequest::new(["a.mp4", "b.mp4"])).await.unwrap();

        assert_eq!(result.strategy, ExportStrategy::Reencoded);
        assert_eq!(encoder.jobs().len(), 2);
        assert!(result.path.exists());
    }

    #[tokio::test]
    async fn test_audio_failure_degrades_to_video_only() {
        let encoder = Arc::new(
            ScriptedEncoder::new()
                .then_fail("copy failed")
                .then_fail("audio layout mismatch"),
        );
        let (_dir, exporter) = Fixture::new()
            .clip("a.mp4", 1280, 720, 3.0, true)
            .clip("b.mp4", 1280, 720, 2.0, true)
            .exporter(encoder.clone());

        let result = exporter.export(&ExportRequest::new(["a.mp4", "b.mp4"])).await.unwrap();

        assert_eq!(result.strategy, ExportStrategy::ReencodedVideoOnly);
        let jobs = encoder.jobs();
        assert_eq!(jobs.len(), 3);
        assert_eq!(jobs[2].graph.as_ref().unwrap().output_maps(), vec!["[vout]"]);
    }

    #[tokio::test]
    async fn test_silent_clip_goes_straight_to_video_only() {
        let encoder = Arc::new(ScriptedEncoder::new());
        let (_dir, exporter) = Fixture::new()
            .clip("a.mp4", 1280, 720, 3.0, true)
            .clip("b.mp4", 1280, 720, 2.0, false)
            .exporter(encoder.clone());

        let result = exporter.export(&ExportRequest::new(["a.mp4", "b.mp4"])).await.unwrap();

        assert_eq!(result.strategy, ExportStrategy::ReencodedVideoOnly);
        assert_eq!(encoder.jobs().len(), 1);
    }

    #[tokio::test]
    async fn test_all_tiers_failing_reports_failure() {
        let encoder = Arc::new(
            ScriptedEncoder::new()
                .then_fail("copy failed")
                .then_fail("reencode failed")
                .then_fail("video only failed"),
        );
        let (_dir, exporter) = Fixture::new()
            .clip("a.mp4", 1280, 720, 3.0, true)
            .clip("b.mp4", 1280, 720, 2.0, true)
            .exporter(encoder.clone());

        let err = exporter.export(&ExportRequest::new(["a.mp4", "b.mp4"])).await.unwrap_err();
        assert!(matches!(err, DomainError::EncoderFailure { .. }));
        assert!(err.to_string().contains("video only failed"));
    }

    #[test]
    fn test_concat_entry_quoting() {
        assert_eq!(concat_entry(Path::new("/tmp/a.mp4")), "file '/tmp/a.mp4'\n");
        assert_eq!(
            concat_entry(Path::new("/tmp/it's.mp4")),
            "file '/tmp/it'\\''s.mp4'\n"
        );
    }
}
