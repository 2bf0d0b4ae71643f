use std::sync::Arc;

use tracing::debug;

use crate::adapters::toml_config::{AppConfig, EncoderConfig, ProbeBackend};
use crate::adapters::{FfmpegAdapter, FfprobeAdapter};
use crate::app::{
    edit_interactor::EditInteractor, export_interactor::ExportInteractor,
    inspect_interactor::InspectInteractor,
};
use crate::domain::errors::DomainError;
use crate::engine::{ClipExporter, EncoderSelector, ExportDirs, Renderer};
use crate::planner::{ActionInterpreter, PipelineBuilder, SmartStitcher};
use crate::ports::{EncodePort, EncoderCatalogPort, EncoderProvider, ProbePort};
use crate::utils::locate_tool;

pub trait AppContainer: Send + Sync {
    fn edit_interactor(&self) -> Arc<EditInteractor>;
    fn export_interactor(&self) -> Arc<ExportInteractor>;
    fn inspect_interactor(&self) -> Arc<InspectInteractor>;
}

pub struct DefaultAppContainer {
    edit_interactor: Arc<EditInteractor>,
    export_interactor: Arc<ExportInteractor>,
    inspect_interactor: Arc<InspectInteractor>,
}

impl DefaultAppContainer {
    /// Wire the ffmpeg-backed adapters described by `config`
    pub fn new(config: &AppConfig) -> Result<Self, DomainError> {
        let ffmpeg = locate_tool(config.encoder.ffmpeg_path.as_deref(), "ffmpeg")?;
        debug!(ffmpeg = %ffmpeg.display(), "Located ffmpeg");

        let ffmpeg_adapter = Arc::new(FfmpegAdapter::new(ffmpeg));
        let probe_port = Self::probe_port(&config.encoder)?;
        let provider = Arc::new(
            EncoderSelector::new(
                Arc::clone(&ffmpeg_adapter) as Arc<dyn EncoderCatalogPort>,
                config.encoder.software_profile(),
            )
            .with_hardware(config.encoder.allow_hardware),
        );

        Ok(Self::with_ports(
            config,
            probe_port,
            ffmpeg_adapter,
            provider,
        ))
    }

    fn probe_port(encoder: &EncoderConfig) -> Result<Arc<dyn ProbePort>, DomainError> {
        match encoder.probe_backend {
            ProbeBackend::Ffprobe => {
                let ffprobe = locate_tool(encoder.ffprobe_path.as_deref(), "ffprobe")?;
                debug!(ffprobe = %ffprobe.display(), "Probing with ffprobe");
                Ok(Arc::new(FfprobeAdapter::new(ffprobe)))
            }
            #[cfg(feature = "libav")]
            ProbeBackend::Libav => {
                debug!("Probing in-process with libav");
                Ok(Arc::new(crate::adapters::LibavProbeAdapter::new()?))
            }
            #[cfg(not(feature = "libav"))]
            ProbeBackend::Libav => Err(DomainError::Config(
                "probe backend libav is not compiled in; rebuild with --features libav".to_string(),
            )),
        }
    }

    /// Wire the interactors around already-built ports
    pub fn with_ports(
        config: &AppConfig,
        probe_port: Arc<dyn ProbePort>,
        encode_port: Arc<dyn EncodePort>,
        provider: Arc<dyn EncoderProvider>,
    ) -> Self {
        let options = config.encoder.output_options();

        let interpreter = ActionInterpreter::new(
            PipelineBuilder::new().with_warm_red_gamma(config.pipeline.warm_red_gamma),
            SmartStitcher::new(config.stitch.policy()),
        );
        let renderer = Renderer::new(
            Arc::clone(&encode_port),
            Arc::clone(&probe_port),
            Arc::clone(&provider),
        )
        .with_options(options);
        let edit_interactor = Arc::new(EditInteractor::new(
            Arc::clone(&probe_port),
            interpreter,
            renderer,
            config.storage.output_dir.clone(),
        ));

        let exporter = ClipExporter::new(
            Arc::clone(&encode_port),
            Arc::clone(&probe_port),
            Arc::clone(&provider),
            ExportDirs {
                media_dir: config.storage.media_dir.clone(),
                output_dir: config.storage.output_dir.clone(),
            },
        )
        .with_options(options);
        let export_interactor = Arc::new(ExportInteractor::new(exporter));

        let inspect_interactor = Arc::new(InspectInteractor::new(probe_port, provider));

        Self {
            edit_interactor,
            export_interactor,
            inspect_interactor,
        }
    }
}

impl AppContainer for DefaultAppContainer {
    fn edit_interactor(&self) -> Arc<EditInteractor> {
        Arc::clone(&self.edit_interactor)
    }

    fn export_interactor(&self) -> Arc<ExportInteractor> {
        Arc::clone(&self.export_interactor)
    }

    fn inspect_interactor(&self) -> Arc<InspectInteractor> {
        Arc::clone(&self.inspect_interactor)
    }
}
