//! Dispatch of instruction payloads to the matching pipeline builder

use tracing::{info, warn};

use crate::domain::errors::DomainError;
use crate::domain::model::{EditAction, EditRequest, Instructions, MediaAsset};
use crate::planner::legacy::PipelineBuilder;
use crate::planner::stitch::SmartStitcher;
use crate::planner::{PlanMode, RenderPlan};

/// Turns an edit request into a render plan
#[derive(Debug, Clone, Default)]
pub struct ActionInterpreter {
    builder: PipelineBuilder,
    stitcher: SmartStitcher,
}

impl ActionInterpreter {
    pub fn new(builder: PipelineBuilder, stitcher: SmartStitcher) -> Self {
        Self { builder, stitcher }
    }

    /// Plan a render. `assets` are the probed request sources, primary first.
    pub fn plan(&self, request: &EditRequest, assets: &[MediaAsset]) -> Result<RenderPlan, DomainError> {
        let primary = assets
            .first()
            .ok_or_else(|| DomainError::InputNotFound(request.source.display().to_string()))?;

        match &request.instructions {
            Instructions::Segments { segments } if !segments.is_empty() => {
                if !request.selection().is_trivial() {
                    warn!("Timeline selection is ignored in segment mode");
                }
                let graph = self.stitcher.build(segments, assets)?;
                info!(segments = segments.len(), sources = assets.len(), "Planned smart stitch");
                Ok(RenderPlan {
                    inputs: assets.iter().map(|a| a.path.clone()).collect(),
                    graph,
                    mode: PlanMode::Stitch,
                })
            }
            instructions => {
                let actions: &[EditAction] = match instructions {
                    Instructions::Legacy { actions } => actions.as_slice(),
                    Instructions::Segments { .. } => &[],
                };
                if assets.len() > 1 {
                    warn!(
                        extra = assets.len() - 1,
                        "Additional sources are only used in segment mode"
                    );
                }
                let pipeline = self
                    .builder
                    .build(primary.has_audio, &request.selection(), actions);
                info!(actions = actions.len(), "Planned legacy pipeline");
                Ok(RenderPlan {
                    inputs: vec![primary.path.clone()],
                    graph: pipeline.into_graph(0),
                    mode: PlanMode::Legacy,
                })
            }
        }
    }
}
