//! Types for the orchestrator.

use thiserror::Error;

use crate::acquisition::AcquisitionError;
use crate::extraction::ExtractionError;

/// Errors that can occur while running the pipeline.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("Acquisition failed: {0}")]
    Acquisition(#[from] AcquisitionError),

    #[error("Extraction failed: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("Extraction task aborted: {0}")]
    Task(String),
}
