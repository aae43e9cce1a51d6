//! Pipeline orchestration: wires the acquisition producer and extraction
//! consumer together around the artifact queue.

mod runner;
mod types;

pub use runner::Orchestrator;
pub use types::OrchestratorError;
