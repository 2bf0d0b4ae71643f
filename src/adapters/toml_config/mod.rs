// TOML config adapter - Configuration management using TOML files

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::domain::model::{EncoderProfile, Resolution};
use crate::domain::rules::ResolutionPolicy;
use crate::engine::job::OutputOptions;
use crate::error::{VidcraftError, VidcraftResult};

/// Config file names searched when no explicit path is given
pub const DEFAULT_CONFIG_PATHS: &[&str] = &["vidcraft.toml", "config/vidcraft.toml"];

/// Prefix of environment overrides
pub const ENV_PREFIX: &str = "VIDCRAFT_";

/// Application configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub storage: StorageConfig,
    pub encoder: EncoderConfig,
    pub stitch: StitchConfig,
    pub pipeline: PipelineConfig,
    pub logging: LoggingConfig,
}

/// Where clips are read from and written to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub output_dir: PathBuf,
    /// Export filenames resolve against this directory
    pub media_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("temp_storage"),
            media_dir: PathBuf::from("temp_storage"),
        }
    }
}

/// Media inspection backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeBackend {
    /// Run the ffprobe binary
    Ffprobe,
    /// Read headers in-process through libav; needs the `libav` feature
    Libav,
}

/// Encoding engine settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderConfig {
    /// Explicit ffmpeg binary; searched on PATH when unset
    pub ffmpeg_path: Option<PathBuf>,
    /// Explicit ffprobe binary; searched on PATH when unset
    pub ffprobe_path: Option<PathBuf>,
    pub probe_backend: ProbeBackend,
    pub allow_hardware: bool,
    pub software_codec: String,
    pub software_preset: String,
    pub threads: usize,
    pub faststart: bool,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: None,
            ffprobe_path: None,
            probe_backend: ProbeBackend::Ffprobe,
            allow_hardware: true,
            software_codec: "libx264".to_string(),
            software_preset: "fast".to_string(),
            threads: num_cpus::get(),
            faststart: true,
        }
    }
}

impl EncoderConfig {
    pub fn software_profile(&self) -> EncoderProfile {
        EncoderProfile::software(self.software_codec.clone(), self.software_preset.clone())
    }

    pub fn output_options(&self) -> OutputOptions {
        OutputOptions {
            faststart: self.faststart,
            threads: (self.threads > 0).then_some(self.threads),
        }
    }
}

/// Segment stitching resolution policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StitchPolicy {
    Native,
    Fixed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StitchConfig {
    pub resolution_policy: StitchPolicy,
    pub fixed_width: u32,
    pub fixed_height: u32,
}

impl Default for StitchConfig {
    fn default() -> Self {
        Self {
            resolution_policy: StitchPolicy::Native,
            fixed_width: 1920,
            fixed_height: 1080,
        }
    }
}

impl StitchConfig {
    pub fn policy(&self) -> ResolutionPolicy {
        match self.resolution_policy {
            StitchPolicy::Native => ResolutionPolicy::Native,
            StitchPolicy::Fixed => {
                ResolutionPolicy::Fixed(Resolution::new(self.fixed_width, self.fixed_height))
            }
        }
    }
}

/// Tuning of the legacy tool transforms
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Red gamma added by the `warm` filter
    pub warm_red_gamma: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl AppConfig {
    /// Load configuration: the explicit file if given, else the first default
    /// path that exists, else built-in defaults. Environment overrides are
    /// applied on top. Callers validate once every override source is in.
    pub fn load(explicit: Option<&Path>) -> VidcraftResult<Self> {
        let mut config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => match DEFAULT_CONFIG_PATHS.iter().map(Path::new).find(|p| p.is_file()) {
                Some(path) => Self::from_file(path)?,
                None => {
                    debug!("No config file found, using defaults");
                    Self::default()
                }
            },
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Parse a TOML config file
    pub fn from_file(path: &Path) -> VidcraftResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            VidcraftError::config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;
        let config = Self::from_toml(&content)?;
        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    pub fn from_toml(content: &str) -> VidcraftResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Apply `VIDCRAFT_*` overrides through `lookup`
    pub fn apply_env<F>(&mut self, lookup: F) -> VidcraftResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(&format!("{}{}", ENV_PREFIX, name));

        if let Some(value) = var("OUTPUT_DIR") {
            self.storage.output_dir = PathBuf::from(value);
        }
        if let Some(value) = var("MEDIA_DIR") {
            self.storage.media_dir = PathBuf::from(value);
        }
        if let Some(value) = var("FFMPEG") {
            self.encoder.ffmpeg_path = Some(PathBuf::from(value));
        }
        if let Some(value) = var("FFPROBE") {
            self.encoder.ffprobe_path = Some(PathBuf::from(value));
        }
        if let Some(value) = var("PROBE_BACKEND") {
            self.encoder.probe_backend = match value.trim().to_lowercase().as_str() {
                "ffprobe" => ProbeBackend::Ffprobe,
                "libav" => ProbeBackend::Libav,
                other => {
                    return Err(VidcraftError::config(format!(
                        "{}PROBE_BACKEND must be ffprobe or libav, got {:?}",
                        ENV_PREFIX, other
                    )))
                }
            };
        }
        if let Some(value) = var("ALLOW_HARDWARE") {
            self.encoder.allow_hardware = parse_bool("ALLOW_HARDWARE", &value)?;
        }
        if let Some(value) = var("THREADS") {
            self.encoder.threads = value.trim().parse().map_err(|_| {
                VidcraftError::config(format!("{}THREADS must be a number, got {:?}", ENV_PREFIX, value))
            })?;
        }
        if let Some(value) = var("STITCH_POLICY") {
            self.stitch.resolution_policy = match value.trim().to_lowercase().as_str() {
                "native" => StitchPolicy::Native,
                "fixed" => StitchPolicy::Fixed,
                other => {
                    return Err(VidcraftError::config(format!(
                        "{}STITCH_POLICY must be native or fixed, got {:?}",
                        ENV_PREFIX, other
                    )))
                }
            };
        }
        if let Some(value) = var("LOG_LEVEL") {
            self.logging.level = value;
        }
        if let Some(value) = var("LOG_JSON") {
            self.logging.json = parse_bool("LOG_JSON", &value)?;
        }
        Ok(())
    }

    /// Reject values that would only fail later inside the engine
    pub fn validate(&self) -> VidcraftResult<()> {
        if self.encoder.software_codec.trim().is_empty() {
            return Err(VidcraftError::config("encoder.software_codec must not be empty"));
        }
        if self.encoder.software_preset.trim().is_empty() {
            return Err(VidcraftError::config("encoder.software_preset must not be empty"));
        }
        if self.encoder.probe_backend == ProbeBackend::Libav && !cfg!(feature = "libav") {
            return Err(VidcraftError::config(
                "encoder.probe_backend = \"libav\" requires building with the libav feature",
            ));
        }
        if self.stitch.resolution_policy == StitchPolicy::Fixed {
            let (w, h) = (self.stitch.fixed_width, self.stitch.fixed_height);
            if w == 0 || h == 0 || w % 2 != 0 || h % 2 != 0 {
                return Err(VidcraftError::config(format!(
                    "stitch.fixed_width/fixed_height must be positive and even, got {}x{}",
                    w, h
                )));
            }
        }
        if let Some(gamma) = self.pipeline.warm_red_gamma {
            if !(0.1..=10.0).contains(&gamma) {
                return Err(VidcraftError::config(format!(
                    "pipeline.warm_red_gamma must be within 0.1..=10, got {}",
                    gamma
                )));
            }
        }
        self.logging
            .level
            .parse::<tracing::Level>()
            .map_err(|_| {
                VidcraftError::config(format!(
                    "Invalid log level: {}. Valid levels: trace, debug, info, warn, error",
                    self.logging.level
                ))
            })?;
        Ok(())
    }
}

fn parse_bool(name: &str, value: &str) -> VidcraftResult<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(VidcraftError::config(format!(
            "{}{} must be a boolean, got {:?}",
            ENV_PREFIX, name, value
        ))),
    }
}
