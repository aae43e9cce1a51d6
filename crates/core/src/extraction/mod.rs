//! Archive extraction: consumes relocated archives from the queue and
//! unpacks them next to where they landed.

mod worker;

pub use worker::{ExtractionError, ExtractionWorker};
