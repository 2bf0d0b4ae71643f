// Domain errors - Failure taxonomy for render and export jobs

use std::fmt;

/// Domain-specific error types
#[derive(Debug, Clone, PartialEq)]
pub enum DomainError {
    /// Source file does not exist
    InputNotFound(String),
    /// File has no decodable video track
    NoVideoStream(String),
    /// Instruction parameters cannot produce a transformation
    InvalidActionParams(String),
    /// The encoding engine rejected or aborted the job
    EncoderFailure { codec: String, message: String },
    /// Inputs cannot be concatenated without normalization
    StitchIncompatible(String),
    /// Export request with zero existing clip files
    NoValidInputs,
    /// Probe tool failed or produced unreadable output
    ProbeFailure(String),
    /// Filesystem error while preparing inputs or outputs
    Io(String),
    /// Invalid configuration value
    Config(String),
}

impl DomainError {
    /// Create an encoder failure error
    pub fn encoder_failure(codec: impl Into<String>, message: impl Into<String>) -> Self {
        Self::EncoderFailure {
            codec: codec.into(),
            message: message.into(),
        }
    }

    /// Short machine-readable kind for the `error_kind` log field
    pub fn kind(&self) -> &'static str {
        match self {
            DomainError::InputNotFound(_) => "input_not_found",
            DomainError::NoVideoStream(_) => "no_video_stream",
            DomainError::InvalidActionParams(_) => "invalid_action_params",
            DomainError::EncoderFailure { .. } => "encoder_failure",
            DomainError::StitchIncompatible(_) => "stitch_incompatible",
            DomainError::NoValidInputs => "no_valid_inputs",
            DomainError::ProbeFailure(_) => "probe_failure",
            DomainError::Io(_) => "io",
            DomainError::Config(_) => "config",
        }
    }
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DomainError::InputNotFound(path) => write!(f, "Input file not found: {}", path),
            DomainError::NoVideoStream(path) => write!(f, "No video stream found in {}", path),
            DomainError::InvalidActionParams(msg) => write!(f, "Invalid action parameters: {}", msg),
            DomainError::EncoderFailure { codec, message } => {
                write!(f, "Encoder {} failed: {}", codec, message)
            }
            DomainError::StitchIncompatible(msg) => {
                write!(f, "Clips cannot be concatenated as-is: {}", msg)
            }
            DomainError::NoValidInputs => write!(f, "No valid input files to export"),
            DomainError::ProbeFailure(msg) => write!(f, "Probe failed: {}", msg),
            DomainError::Io(msg) => write!(f, "I/O error: {}", msg),
            DomainError::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for DomainError {}

impl From<std::io::Error> for DomainError {
    fn from(err: std::io::Error) -> Self {
        DomainError::Io(err.to_string())
    }
}
