//! The extraction worker: the queue consumer.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::ledger::{CodeStatus, Ledger, LedgerError};
use crate::queue::ArtifactReceiver;

/// Errors that can occur during extraction.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("Extraction task failed: {0}")]
    Task(String),
}

/// Consumes archive paths from the queue and unpacks each one into a
/// sibling directory (the archive path with its `.zip` suffix stripped),
/// deleting the archive afterwards and recording the owning code as
/// `completed` in the ledger.
///
/// A failed extraction marks the code `failed` and moves on; there is no
/// automatic retry, the code becomes a candidate again on the next run.
pub struct ExtractionWorker {
    ledger: Arc<dyn Ledger>,
}

impl ExtractionWorker {
    pub fn new(ledger: Arc<dyn Ledger>) -> Self {
        Self { ledger }
    }

    /// Drain the queue until the producer closes it. Only ledger failures
    /// abort the loop; per-archive failures are recorded and skipped.
    pub async fn run(&self, mut receiver: ArtifactReceiver) -> Result<(), ExtractionError> {
        let mut extracted = 0usize;

        while let Some(archive) = receiver.pop().await {
            let Some(code) = owning_code(&archive) else {
                warn!(path = %archive.display(), "Artifact path carries no owning code, skipping");
                continue;
            };

            match extract_archive(&archive).await {
                Ok(destination) => {
                    debug!(code, path = %destination.display(), "Archive extracted");
                    self.ledger.mark(&code, CodeStatus::Completed)?;
                    extracted += 1;
                }
                Err(e) => {
                    error!(code, path = %archive.display(), error = %e, "Extraction failed");
                    self.ledger.mark(&code, CodeStatus::Failed)?;
                }
            }
        }

        info!(extracted, "Extraction worker finished");
        Ok(())
    }
}

/// The owning code is the grandparent directory name, from the
/// `{base}/{code}/{report_type}/{label}.zip` layout.
fn owning_code(archive: &Path) -> Option<String> {
    archive
        .parent()?
        .parent()?
        .file_name()?
        .to_str()
        .map(String::from)
}

/// Unpack an archive into `{archive minus .zip}/` and delete the source.
/// Decompression is synchronous, so it runs on the blocking pool.
async fn extract_archive(archive: &Path) -> Result<PathBuf, ExtractionError> {
    let destination = archive.with_extension("");
    let archive_path = archive.to_path_buf();
    let dest = destination.clone();

    tokio::task::spawn_blocking(move || -> Result<(), ExtractionError> {
        let file = std::fs::File::open(&archive_path)?;
        let mut zip = zip::ZipArchive::new(file)?;
        std::fs::create_dir_all(&dest)?;
        zip.extract(&dest)?;
        Ok(())
    })
    .await
    .map_err(|e| ExtractionError::Task(e.to_string()))??;

    tokio::fs::remove_file(archive).await?;
    Ok(destination)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::SqliteLedger;
    use crate::queue::artifact_queue;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_zip(path: &Path, entry: &str, contents: &[u8]) {
        let file = std::fs::File::create(path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        writer
            .start_file(entry, zip::write::SimpleFileOptions::default())
            .unwrap();
        writer.write_all(contents).unwrap();
        writer.finish().unwrap();
    }

    fn worker_and_ledger() -> (ExtractionWorker, Arc<dyn Ledger>) {
        let ledger: Arc<dyn Ledger> = Arc::new(SqliteLedger::in_memory().unwrap());
        (ExtractionWorker::new(Arc::clone(&ledger)), ledger)
    }

    #[test]
    fn test_owning_code_from_layout() {
        assert_eq!(
            owning_code(Path::new("/data/1301/Quarterly/report.zip")),
            Some("1301".to_string())
        );
        assert_eq!(owning_code(Path::new("report.zip")), None);
    }

    #[tokio::test]
    async fn test_extracts_and_marks_completed() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("1301/Quarterly");
        std::fs::create_dir_all(&dir).unwrap();
        let archive = dir.join("Q1 Report.zip");
        write_zip(&archive, "data.csv", b"a,b\n1,2\n");

        let (worker, ledger) = worker_and_ledger();
        let (queue, rx) = artifact_queue();
        queue.push(archive.clone());
        queue.close();
        worker.run(rx).await.unwrap();

        let extracted = dir.join("Q1 Report/data.csv");
        assert_eq!(std::fs::read(extracted).unwrap(), b"a,b\n1,2\n");
        assert!(!archive.exists());
        assert!(ledger.is_completed("1301").unwrap());
    }

    #[tokio::test]
    async fn test_corrupt_archive_marks_failed() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("2002/Annual");
        std::fs::create_dir_all(&dir).unwrap();
        let archive = dir.join("report.zip");
        std::fs::write(&archive, b"not a zip").unwrap();

        let (worker, ledger) = worker_and_ledger();
        let (queue, rx) = artifact_queue();
        queue.push(archive.clone());
        queue.close();
        worker.run(rx).await.unwrap();

        let record = ledger.get("2002").unwrap().unwrap();
        assert_eq!(record.status, CodeStatus::Failed);
        assert!(!ledger.is_completed("2002").unwrap());
    }

    #[tokio::test]
    async fn test_shallow_path_is_skipped() {
        let (worker, ledger) = worker_and_ledger();
        let (queue, rx) = artifact_queue();
        queue.push(PathBuf::from("orphan.zip"));
        queue.close();
        worker.run(rx).await.unwrap();

        assert!(ledger.get("orphan").unwrap().is_none());
    }

    #[tokio::test]
    async fn test_drains_multiple_archives_in_order() {
        let temp = TempDir::new().unwrap();
        let (worker, ledger) = worker_and_ledger();
        let (queue, rx) = artifact_queue();

        for code in ["1301", "1302"] {
            let dir = temp.path().join(code).join("Annual");
            std::fs::create_dir_all(&dir).unwrap();
            let archive = dir.join("report.zip");
            write_zip(&archive, "report.csv", code.as_bytes());
            queue.push(archive);
        }
        queue.close();
        worker.run(rx).await.unwrap();

        assert!(ledger.is_completed("1301").unwrap());
        assert!(ledger.is_completed("1302").unwrap());
    }
}
