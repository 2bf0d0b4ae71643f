// Domain models - Core types and data structures

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::errors::DomainError;

/// Frame geometry in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Full HD, the canonical letterbox target
    pub fn full_hd() -> Self {
        Self::new(1920, 1080)
    }

    /// Round both sides down to even values; yuv420p encoders reject odd sizes
    pub fn even(self) -> Self {
        Self::new((self.width & !1).max(2), (self.height & !1).max(2))
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Probed attributes of a media file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaAsset {
    pub path: PathBuf,
    pub has_video: bool,
    pub has_audio: bool,
    pub width: u32,
    pub height: u32,
    pub duration_seconds: f64,
    pub video_codec: Option<String>,
    pub audio_codec: Option<String>,
}

impl MediaAsset {
    pub fn resolution(&self) -> Resolution {
        Resolution::new(self.width, self.height)
    }
}

/// Color filter presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterKind {
    Grayscale,
    Sepia,
    Invert,
    Warm,
}

impl FromStr for FilterKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "grayscale" | "greyscale" => Ok(FilterKind::Grayscale),
            "sepia" => Ok(FilterKind::Sepia),
            "invert" => Ok(FilterKind::Invert),
            "warm" => Ok(FilterKind::Warm),
            other => Err(DomainError::InvalidActionParams(format!(
                "Unknown filter type: {}. Valid types: grayscale, sepia, invert, warm",
                other
            ))),
        }
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FilterKind::Grayscale => "grayscale",
            FilterKind::Sepia => "sepia",
            FilterKind::Invert => "invert",
            FilterKind::Warm => "warm",
        };
        f.write_str(name)
    }
}

/// One edit operation of a legacy tool sequence.
///
/// Decoded from the `{ "tool": ..., "params": { ... } }` wire shape. Missing
/// numeric parameters take the tool's neutral default; invariants such as
/// `end > start` are enforced by the pipeline builder, which skips offending
/// actions instead of failing the job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawAction", into = "RawAction")]
pub enum EditAction {
    Trim { start: f64, end: f64 },
    Speed { factor: f64 },
    Filter { kind: FilterKind },
    Adjust { contrast: f64, brightness: f64, saturation: f64 },
    AudioCleanup,
}

impl EditAction {
    /// Tool name on the wire
    pub fn tool(&self) -> &'static str {
        match self {
            EditAction::Trim { .. } => "trim",
            EditAction::Speed { .. } => "speed",
            EditAction::Filter { .. } => "filter",
            EditAction::Adjust { .. } => "adjust",
            EditAction::AudioCleanup => "audio_cleanup",
        }
    }
}

/// Wire shape of an action
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawAction {
    pub tool: String,
    #[serde(default)]
    pub params: Value,
}

fn param_f64(params: &Value, key: &str, default: f64) -> Result<f64, DomainError> {
    match params.get(key) {
        None | Some(Value::Null) => Ok(default),
        Some(Value::Number(n)) => n.as_f64().ok_or_else(|| {
            DomainError::InvalidActionParams(format!("{} is not a finite number", key))
        }),
        Some(Value::String(s)) => s.trim().parse::<f64>().map_err(|_| {
            DomainError::InvalidActionParams(format!("{} is not a number: {:?}", key, s))
        }),
        Some(other) => Err(DomainError::InvalidActionParams(format!(
            "{} must be a number, got {}",
            key, other
        ))),
    }
}

impl TryFrom<RawAction> for EditAction {
    type Error = DomainError;

    fn try_from(raw: RawAction) -> Result<Self, Self::Error> {
        let params = &raw.params;
        match raw.tool.trim().to_lowercase().as_str() {
            "trim" => Ok(EditAction::Trim {
                start: param_f64(params, "start", 0.0)?,
                end: param_f64(params, "end", 0.0)?,
            }),
            "speed" => Ok(EditAction::Speed {
                factor: param_f64(params, "factor", 1.0)?,
            }),
            "filter" => {
                let kind = params
                    .get("type")
                    .or_else(|| params.get("kind"))
                    .and_then(Value::as_str)
                    .ok_or_else(|| {
                        DomainError::InvalidActionParams("filter requires a type".to_string())
                    })?;
                Ok(EditAction::Filter {
                    kind: kind.parse()?,
                })
            }
            "adjust" => Ok(EditAction::Adjust {
                contrast: param_f64(params, "contrast", 1.0)?,
                brightness: param_f64(params, "brightness", 0.0)?,
                saturation: param_f64(params, "saturation", 1.0)?,
            }),
            "audio_cleanup" | "remove_silence" => Ok(EditAction::AudioCleanup),
            other => Err(DomainError::InvalidActionParams(format!(
                "Unknown tool: {}",
                other
            ))),
        }
    }
}

impl From<EditAction> for RawAction {
    fn from(action: EditAction) -> Self {
        let tool = action.tool().to_string();
        let params = match action {
            EditAction::Trim { start, end } => serde_json::json!({ "start": start, "end": end }),
            EditAction::Speed { factor } => serde_json::json!({ "factor": factor }),
            EditAction::Filter { kind } => serde_json::json!({ "type": kind.to_string() }),
            EditAction::Adjust {
                contrast,
                brightness,
                saturation,
            } => serde_json::json!({
                "contrast": contrast,
                "brightness": brightness,
                "saturation": saturation,
            }),
            EditAction::AudioCleanup => serde_json::json!({}),
        };
        RawAction { tool, params }
    }
}

/// A keep-range on a source timeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub start: f64,
    pub end: f64,
    #[serde(default)]
    pub label: String,
    /// Index into the request's source list; 0 is the primary source
    #[serde(default)]
    pub source: usize,
}

impl Segment {
    pub fn new(start: f64, end: f64, label: impl Into<String>) -> Self {
        Self {
            start,
            end,
            label: label.into(),
            source: 0,
        }
    }

    /// Take the range from another source of a multi-source request
    pub fn from_source(mut self, source: usize) -> Self {
        self.source = source;
        self
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// Instruction payload with an explicit mode discriminator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Instructions {
    /// Ordered tool sequence applied to one source
    Legacy {
        #[serde(default)]
        actions: Vec<EditAction>,
    },
    /// Keep-list stitched into one timeline
    Segments {
        #[serde(default)]
        segments: Vec<Segment>,
    },
}

impl Instructions {
    pub fn is_empty(&self) -> bool {
        match self {
            Instructions::Legacy { actions } => actions.is_empty(),
            Instructions::Segments { segments } => segments.is_empty(),
        }
    }

    /// Wire value of the `mode` discriminator
    pub fn mode_name(&self) -> &'static str {
        match self {
            Instructions::Legacy { .. } => "legacy",
            Instructions::Segments { .. } => "segments",
        }
    }
}

impl Default for Instructions {
    fn default() -> Self {
        Instructions::Legacy {
            actions: Vec::new(),
        }
    }
}

/// Portion of the source selected on the editor timeline
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TimelineSelection {
    pub clip_start: f64,
    pub clip_duration: Option<f64>,
}

impl TimelineSelection {
    pub fn new(clip_start: f64, clip_duration: Option<f64>) -> Self {
        Self {
            clip_start,
            clip_duration,
        }
    }

    /// A selection that starts at zero and has no positive duration selects everything
    pub fn is_trivial(&self) -> bool {
        !(self.clip_start > 0.0 || self.clip_duration.map_or(false, |d| d > 0.0))
    }

    /// End of the selection, if bounded
    pub fn end(&self) -> Option<f64> {
        self.clip_duration
            .filter(|d| *d > 0.0)
            .map(|d| self.clip_start.max(0.0) + d)
    }
}

/// A render request as received from the API layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditRequest {
    pub source: PathBuf,
    #[serde(default)]
    pub additional_sources: Vec<PathBuf>,
    #[serde(default)]
    pub instructions: Instructions,
    #[serde(default)]
    pub clip_start: f64,
    #[serde(default)]
    pub clip_duration: Option<f64>,
}

impl EditRequest {
    pub fn new(source: impl Into<PathBuf>, instructions: Instructions) -> Self {
        Self {
            source: source.into(),
            additional_sources: Vec::new(),
            instructions,
            clip_start: 0.0,
            clip_duration: None,
        }
    }

    pub fn with_selection(mut self, clip_start: f64, clip_duration: Option<f64>) -> Self {
        self.clip_start = clip_start;
        self.clip_duration = clip_duration;
        self
    }

    pub fn with_additional_source(mut self, source: impl Into<PathBuf>) -> Self {
        self.additional_sources.push(source.into());
        self
    }

    pub fn selection(&self) -> TimelineSelection {
        TimelineSelection::new(self.clip_start, self.clip_duration)
    }

    /// Primary source followed by the additional ones
    pub fn sources(&self) -> Vec<&Path> {
        std::iter::once(self.source.as_path())
            .chain(self.additional_sources.iter().map(PathBuf::as_path))
            .collect()
    }
}

/// Hardware or software encoder classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncoderTier {
    Hardware,
    Software,
}

/// Video encoder selection used for a render
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncoderProfile {
    pub codec_id: String,
    pub preset_id: String,
    pub tier: EncoderTier,
}

impl EncoderProfile {
    pub fn hardware(codec_id: impl Into<String>, preset_id: impl Into<String>) -> Self {
        Self {
            codec_id: codec_id.into(),
            preset_id: preset_id.into(),
            tier: EncoderTier::Hardware,
        }
    }

    pub fn software(codec_id: impl Into<String>, preset_id: impl Into<String>) -> Self {
        Self {
            codec_id: codec_id.into(),
            preset_id: preset_id.into(),
            tier: EncoderTier::Software,
        }
    }

    /// The universal baseline: libx264 at the `fast` preset
    pub fn default_software() -> Self {
        Self::software("libx264", "fast")
    }

    pub fn is_hardware(&self) -> bool {
        self.tier == EncoderTier::Hardware
    }
}

impl fmt::Display for EncoderProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tier = match self.tier {
            EncoderTier::Hardware => "hardware",
            EncoderTier::Software => "software",
        };
        write!(f, "{} ({}, preset {})", self.codec_id, tier, self.preset_id)
    }
}

/// Hardware encoder families, in selection priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HardwareAcceleration {
    /// NVIDIA NVENC
    Nvenc,
    /// Intel Quick Sync Video
    Qsv,
    /// Apple VideoToolbox (macOS)
    VideoToolbox,
    /// Windows Media Foundation
    MediaFoundation,
}

impl HardwareAcceleration {
    pub fn codec_id(&self) -> &'static str {
        match self {
            HardwareAcceleration::Nvenc => "h264_nvenc",
            HardwareAcceleration::Qsv => "h264_qsv",
            HardwareAcceleration::VideoToolbox => "h264_videotoolbox",
            HardwareAcceleration::MediaFoundation => "h264_mf",
        }
    }

    /// Preset name understood by the encoder; empty when it takes none
    pub fn preset_id(&self) -> &'static str {
        match self {
            HardwareAcceleration::Nvenc => "p4",
            HardwareAcceleration::Qsv => "faster",
            HardwareAcceleration::VideoToolbox => "",
            HardwareAcceleration::MediaFoundation => "",
        }
    }

    pub fn profile(&self) -> EncoderProfile {
        EncoderProfile::hardware(self.codec_id(), self.preset_id())
    }
}

/// Successful render outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderResult {
    #[serde(rename = "path")]
    pub output_path: PathBuf,
    pub duration_seconds: f64,
    pub encoder: EncoderProfile,
}

/// Reference to a previously rendered clip
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClipRef {
    pub filename: String,
}

impl ClipRef {
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
        }
    }
}

/// Ordered list of clips to join
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExportRequest {
    pub clips: Vec<ClipRef>,
}

impl ExportRequest {
    pub fn new<I, S>(filenames: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            clips: filenames.into_iter().map(ClipRef::new).collect(),
        }
    }
}

/// How an export was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportStrategy {
    /// Stream copy, no re-encoding
    StreamCopy,
    /// Re-encoded with normalized geometry
    Reencoded,
    /// Re-encoded with audio dropped
    ReencodedVideoOnly,
}

/// Successful export outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportResult {
    pub path: PathBuf,
    pub strategy: ExportStrategy,
}
