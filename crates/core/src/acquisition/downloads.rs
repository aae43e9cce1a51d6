//! Download completion detection and archive relocation.
//!
//! Triggering a download through the browser yields no file handle, so
//! completion is detected by watching the shared download directory: the
//! watcher snapshots the archives present before the click, then polls for
//! a new `.zip` whose size is stable across two consecutive polls. This
//! replaces a fixed settle delay and avoids misattributing pre-existing
//! files, at the cost of requiring downloads to be triggered one at a time.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::fs;
use tokio::time::{sleep, Instant};
use tracing::debug;

use super::AcquisitionError;

/// Watches a download directory for one newly arriving archive.
pub struct DownloadWatcher {
    dir: PathBuf,
    seen: HashSet<PathBuf>,
}

impl DownloadWatcher {
    /// Snapshot the archives already present. Call before triggering the
    /// download.
    pub async fn begin(dir: &Path) -> std::io::Result<Self> {
        let seen = scan_archives(dir).await?.into_iter().collect();
        Ok(Self {
            dir: dir.to_path_buf(),
            seen,
        })
    }

    /// Wait (bounded) for a new archive to appear and settle.
    pub async fn wait_for_archive(
        &self,
        timeout: Duration,
        poll: Duration,
    ) -> Result<PathBuf, AcquisitionError> {
        let deadline = Instant::now() + timeout;
        let mut candidate: Option<(PathBuf, u64)> = None;

        loop {
            for path in scan_archives(&self.dir).await? {
                if self.seen.contains(&path) {
                    continue;
                }
                // The file may vanish between listing and stat.
                let Ok(meta) = fs::metadata(&path).await else {
                    continue;
                };
                let size = meta.len();
                match &candidate {
                    Some((prev, prev_size)) if *prev == path && *prev_size == size => {
                        debug!(path = %path.display(), size, "Download settled");
                        return Ok(path);
                    }
                    _ => candidate = Some((path, size)),
                }
                break;
            }

            if Instant::now() >= deadline {
                return Err(AcquisitionError::DownloadTimeout(
                    self.dir.display().to_string(),
                ));
            }
            sleep(poll).await;
        }
    }
}

/// List completed `.zip` archives in a directory. In-flight browser
/// downloads carry temporary extensions (`.crdownload`, `.part`) and are
/// excluded by the extension check.
async fn scan_archives(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut entries = fs::read_dir(dir).await?;
    let mut archives = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) == Some("zip") {
            archives.push(path);
        }
    }
    Ok(archives)
}

/// Outcome of relocating a downloaded archive to its canonical path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelocateOutcome {
    Moved,
    /// The destination already exists from an earlier run; the relocation
    /// is skipped so re-runs never overwrite or duplicate.
    AlreadyExists,
}

/// Move a downloaded archive into `{base}/{code}/{report_type}/{label}.zip`,
/// creating parent directories as needed.
pub async fn relocate_archive(
    source: &Path,
    destination: &Path,
) -> std::io::Result<RelocateOutcome> {
    if fs::try_exists(destination).await? {
        return Ok(RelocateOutcome::AlreadyExists);
    }

    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent).await?;
    }

    match fs::rename(source, destination).await {
        Ok(()) => Ok(RelocateOutcome::Moved),
        Err(e)
            if e.kind() == std::io::ErrorKind::CrossesDevices || e.raw_os_error() == Some(18) =>
        {
            // Download dir and base dir can live on different filesystems.
            fs::copy(source, destination).await?;
            fs::remove_file(source).await?;
            Ok(RelocateOutcome::Moved)
        }
        Err(e) => Err(e),
    }
}
