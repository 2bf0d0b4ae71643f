//! Rendering engine module
//!
//! Encoder selection, the self-healing renderer and the clip exporter. All
//! engine work goes through the ports so it can run against doubles.

pub mod encoder;
pub mod exporter;
pub mod job;
pub mod renderer;

pub use encoder::{EncoderSelector, FixedEncoderProvider};
pub use exporter::{ClipExporter, ExportDirs};
pub use job::{Codec, EncodeJob, InputKind, JobInput, OutputOptions};
pub use renderer::Renderer;
