//! Pipeline planning module
//!
//! Turns edit instructions into filter graphs. Nothing in here touches the
//! filesystem or runs the encoding engine.

use std::path::PathBuf;

pub mod graph;
pub mod interpreter;
pub mod legacy;
pub mod stitch;

pub use graph::{Chain, Filter, FilterGraph, Pipeline, StreamKind, AUDIO_OUT, VIDEO_OUT};
pub use interpreter::ActionInterpreter;
pub use legacy::PipelineBuilder;
pub use stitch::{concat_graph, ConcatPart, SmartStitcher};

/// Which builder produced a plan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanMode {
    /// Single source through an ordered tool sequence
    Legacy,
    /// Segment keep-list stitched into one timeline
    Stitch,
}

/// A fully planned render, ready to be encoded
#[derive(Debug, Clone, PartialEq)]
pub struct RenderPlan {
    /// Input files; graph pads refer to them by position
    pub inputs: Vec<PathBuf>,
    pub graph: FilterGraph,
    pub mode: PlanMode,
}

impl RenderPlan {
    /// Whether the graph produces an audio output
    pub fn has_audio(&self) -> bool {
        self.graph.produces(AUDIO_OUT)
    }
}
