// Export interactor - Orchestrates the clip export use case

use std::time::Instant;

use tracing::info;

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::engine::ClipExporter;

/// Interactor for joining finished clips into one download
pub struct ExportInteractor {
    exporter: ClipExporter,
}

impl ExportInteractor {
    pub fn new(exporter: ClipExporter) -> Self {
        Self { exporter }
    }

    pub async fn execute(&self, request: &ExportRequest) -> Result<ExportResult, DomainError> {
        let started = Instant::now();
        info!(clips = request.clips.len(), "Starting export");

        let result = self.exporter.export(request).await?;

        info!(
            output = %result.path.display(),
            strategy = ?result.strategy,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Export completed"
        );
        Ok(result)
    }
}
