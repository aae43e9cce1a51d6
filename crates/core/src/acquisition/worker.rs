//! The acquisition worker: drives one browser session across all candidate
//! codes, producing archives for the extraction worker.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, error, info, warn};

use crate::browser::{
    BrowserConnector, BrowserDriver, BrowserError, ElementHandle, Pacer,
};
use crate::config::{Config, PortalConfig, StorageConfig};
use crate::ledger::{CodeRecord, CodeStatus, Ledger, LedgerError};
use crate::queue::ArtifactQueue;
use crate::registry::{CodeOutcome, CodeRegistry};

use super::{
    relocate_archive, sanitize_label, AcquisitionError, DownloadWatcher, RelocateOutcome,
    ReportKind,
};

/// Per-run producer: fetches candidate codes, searches the portal for each,
/// downloads and relocates discovered archives, and reports outcomes.
///
/// Fully sequential by design: codes and document links are processed one
/// at a time so that at most one download is ever in flight, which is what
/// makes the download-directory watch unambiguous.
pub struct AcquisitionWorker {
    storage: StorageConfig,
    portal: PortalConfig,
    processing_lease: chrono::Duration,
    pacer: Pacer,
    ledger: Arc<dyn Ledger>,
    registry: Arc<dyn CodeRegistry>,
}

impl AcquisitionWorker {
    pub fn new(config: &Config, ledger: Arc<dyn Ledger>, registry: Arc<dyn CodeRegistry>) -> Self {
        Self {
            storage: config.storage.clone(),
            portal: config.portal.clone(),
            processing_lease: chrono::Duration::seconds(
                config.acquisition.processing_lease_secs as i64,
            ),
            pacer: Pacer::new(config.pacing.clone()),
            ledger,
            registry,
        }
    }

    /// Run the acquisition loop to completion. Consumes the queue handle:
    /// the queue is closed when this returns, normally or not, so the
    /// extraction consumer always drains and exits.
    pub async fn run(
        &self,
        connector: &dyn BrowserConnector,
        queue: ArtifactQueue,
    ) -> Result<(), AcquisitionError> {
        let codes = self.candidate_codes().await?;
        if codes.is_empty() {
            info!("No unprocessed codes available, skipping browser session");
            queue.close();
            return Ok(());
        }

        info!(codes = codes.len(), "Starting acquisition run");
        let driver = connector.connect().await?;

        for (idx, code) in codes.iter().enumerate() {
            info!(code, "Processing code");
            if let Err(e) = self.ledger.mark(code, CodeStatus::Processing) {
                let _ = driver.close().await;
                return Err(e.into());
            }

            let found = match self.process_code(driver.as_ref(), code, &queue).await {
                Ok(found) => found,
                Err(e @ AcquisitionError::Ledger(_)) => {
                    // Durable state is the correctness backbone; never
                    // proceed if it cannot be recorded.
                    let _ = driver.close().await;
                    return Err(e);
                }
                Err(e) => {
                    warn!(code, error = %e, "Acquisition failed for code");
                    if let Err(mark_err) = self.ledger.mark(code, CodeStatus::Failed) {
                        let _ = driver.close().await;
                        return Err(mark_err.into());
                    }
                    false
                }
            };

            let outcome = CodeOutcome {
                code: code.clone(),
                data_found: found,
            };
            if let Err(e) = self.registry.post_result(&outcome).await {
                error!(code, error = %e, "Failed to report outcome");
            }

            self.pacer.between_codes(idx).await;
        }

        info!("Acquisition run complete");
        if let Err(e) = driver.close().await {
            warn!(error = %e, "Failed to close browser session");
        }
        queue.close();
        Ok(())
    }

    /// Fetch the candidate list, minus codes the ledger rules out.
    /// Registry failures degrade to an empty list; ledger failures propagate.
    async fn candidate_codes(&self) -> Result<Vec<String>, LedgerError> {
        let all = match self.registry.fetch_codes().await {
            Ok(codes) => codes,
            Err(e) => {
                error!(error = %e, "Failed to fetch codes from registry");
                Vec::new()
            }
        };

        let mut candidates = Vec::new();
        for code in all {
            match self.ledger.get(&code)? {
                Some(record) if !self.is_retryable(&record) => {
                    debug!(code, status = record.status.as_str(), "Skipping code");
                }
                _ => candidates.push(code),
            }
        }
        Ok(candidates)
    }

    /// `completed` is terminal. A `processing` record is only skipped while
    /// its lease (age of `updated_at`) is fresh, so codes orphaned by a
    /// crashed run become retryable once the lease expires.
    fn is_retryable(&self, record: &CodeRecord) -> bool {
        match record.status {
            CodeStatus::Completed => false,
            CodeStatus::Failed => true,
            CodeStatus::Processing => {
                Utc::now().signed_duration_since(record.updated_at) >= self.processing_lease
            }
        }
    }

    /// Search the portal for one code and download every classified
    /// document. Returns whether at least one candidate link existed.
    async fn process_code(
        &self,
        driver: &dyn BrowserDriver,
        code: &str,
        queue: &ArtifactQueue,
    ) -> Result<bool, AcquisitionError> {
        let sel = &self.portal.selectors;
        let results_timeout = Duration::from_secs(self.portal.results_timeout_secs as u64);

        driver.navigate(&self.portal.search_url).await?;
        self.pacer.simulate_reading(driver).await?;

        let input = driver.wait_for(&sel.search_input, results_timeout).await?;
        self.ledger.touch(code)?;
        driver.type_text(&input, code).await?;
        self.pacer.short_pause().await;

        let button = driver
            .find_elements(&sel.search_button)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| BrowserError::ElementNotFound(sel.search_button.clone()))?;
        driver.click(&button).await?;

        // The results DOM needs a bounded wait; timing out just means the
        // search came back empty.
        match driver.wait_for(&sel.result_row, results_timeout).await {
            Ok(_) => {}
            Err(BrowserError::Timeout(_)) => {
                info!(code, "Search returned no results");
                return Ok(false);
            }
            Err(e) => return Err(e.into()),
        }

        let rows = driver.find_elements(&sel.result_row).await?;
        debug!(code, rows = rows.len(), "Result rows located");

        let mut links_found = 0usize;
        for (idx, row) in rows.iter().enumerate() {
            let link = match driver.find_from(row, &sel.document_link).await {
                Ok(links) => match links.into_iter().next() {
                    Some(link) => link,
                    None => continue,
                },
                Err(e) => {
                    warn!(code, row = idx, error = %e, "Failed to inspect result row");
                    continue;
                }
            };
            links_found += 1;

            // One failing document never aborts the code.
            if let Err(e) = self.download_document(driver, code, row, &link, queue).await {
                if matches!(e, AcquisitionError::Ledger(_)) {
                    return Err(e);
                }
                warn!(code, row = idx, error = %e, "Failed to download document");
            }
        }

        Ok(links_found > 0)
    }

    /// Classify, download, and relocate a single document link.
    async fn download_document(
        &self,
        driver: &dyn BrowserDriver,
        code: &str,
        row: &ElementHandle,
        link: &ElementHandle,
        queue: &ArtifactQueue,
    ) -> Result<(), AcquisitionError> {
        let sel = &self.portal.selectors;

        let label_text = match driver
            .find_from(row, &sel.document_label)
            .await?
            .into_iter()
            .next()
        {
            Some(cell) => driver.element_text(&cell).await?,
            None => String::new(),
        };
        let kind = ReportKind::classify(&label_text);
        let mut label = sanitize_label(&label_text);
        if label.is_empty() {
            label = "document".to_string();
        }

        driver.scroll_into_view(link).await?;
        self.pacer.short_pause().await;

        // Snapshot before the click so only the triggered download matches.
        let watcher = DownloadWatcher::begin(&self.storage.download_dir).await?;
        driver.click(link).await?;
        info!(code, kind = kind.as_dir_name(), label = %label, "Download triggered");

        let settle = Duration::from_secs(self.portal.download.settle_timeout_secs as u64);
        let poll = Duration::from_millis(self.portal.download.poll_interval_ms);
        let downloaded = watcher.wait_for_archive(settle, poll).await?;

        let destination = self
            .storage
            .base_dir
            .join(code)
            .join(kind.as_dir_name())
            .join(format!("{label}.zip"));

        match relocate_archive(&downloaded, &destination).await? {
            RelocateOutcome::Moved => {
                info!(code, path = %destination.display(), "Archive saved");
                queue.push(destination);
                self.ledger.touch(code)?;
            }
            RelocateOutcome::AlreadyExists => {
                debug!(code, path = %destination.display(), "Destination exists, skipping");
            }
        }

        Ok(())
    }
}
