//! Per-code acquisition: portal search, document classification, download
//! relocation, and outcome reporting.

mod downloads;
mod types;
mod worker;

pub use downloads::{relocate_archive, DownloadWatcher, RelocateOutcome};
pub use types::{sanitize_label, AcquisitionError, ReportKind};
pub use worker::AcquisitionWorker;
