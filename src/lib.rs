//! vidcraft declarative video editor
//!
//! Turns edit instructions into ffmpeg filter graphs and renders them,
//! preferring a hardware encoder and healing in software when it fails.
//!
//! # Features
//!
//! - Legacy mode: an ordered tool sequence (trim, speed, filter, adjust,
//!   audio cleanup) applied to one source
//! - Segment mode: a keep-list stitched into one normalized timeline
//! - Encoder selection with hardware priority, memoized per process
//! - Clip export by stream copy, falling back to a normalized re-encode
//!
//! # Usage
//!
//! ```bash
//! vidcraft render --input talk.mp4 --instructions edit.json --clip-start 00:02 --clip-duration 5
//! vidcraft export intro.mp4 talk.mp4 outro.mp4
//! vidcraft probe --input talk.mp4
//! ```

pub mod adapters;
pub mod app;
pub mod cli;
pub mod domain;
pub mod engine;
pub mod error;
pub mod planner;
pub mod ports;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod utils;

// Re-export commonly used types
pub use domain::errors::DomainError;
pub use domain::model::{
    EditAction, EditRequest, EncoderProfile, ExportRequest, ExportResult, FilterKind, Instructions,
    MediaAsset, RenderResult, Segment,
};
pub use error::{VidcraftError, VidcraftResult};
