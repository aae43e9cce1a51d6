//! Producer/consumer handoff of extraction-pending archive paths.
//!
//! An unbounded FIFO channel between the acquisition worker (producer) and
//! the extraction worker (consumer). End-of-stream is a channel close, not a
//! sentinel payload: `ArtifactQueue::close` consumes the sole producer
//! handle, so the close happens exactly once by construction and the
//! consumer drains everything pushed before it.

use std::path::PathBuf;

use tokio::sync::mpsc;
use tracing::warn;

/// Create a connected queue/receiver pair.
pub fn artifact_queue() -> (ArtifactQueue, ArtifactReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ArtifactQueue { tx }, ArtifactReceiver { rx })
}

/// Producer handle. Owned by the acquisition worker.
pub struct ArtifactQueue {
    tx: mpsc::UnboundedSender<PathBuf>,
}

impl ArtifactQueue {
    /// Enqueue an archive path for extraction. Never blocks.
    pub fn push(&self, path: PathBuf) {
        // Only fails if the consumer is gone, which means the run is
        // already tearing down; the artifact stays on disk for the next run.
        if let Err(e) = self.tx.send(path) {
            warn!("Extraction consumer gone, dropping artifact: {}", e.0.display());
        }
    }

    /// Signal that no more artifacts will ever be produced.
    pub fn close(self) {
        drop(self.tx);
    }
}

/// Consumer handle. Owned by the extraction worker.
pub struct ArtifactReceiver {
    rx: mpsc::UnboundedReceiver<PathBuf>,
}

impl ArtifactReceiver {
    /// Dequeue the next artifact, waiting until one is available.
    /// Returns `None` once the producer has closed the queue and all
    /// pushed artifacts have been consumed.
    pub async fn pop(&mut self) -> Option<PathBuf> {
        self.rx.recv().await
    }
}
