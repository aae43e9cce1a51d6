//! One-shot pipeline runner.

use std::sync::Arc;

use tracing::info;

use crate::acquisition::AcquisitionWorker;
use crate::browser::BrowserConnector;
use crate::config::Config;
use crate::extraction::ExtractionWorker;
use crate::ledger::Ledger;
use crate::queue::artifact_queue;
use crate::registry::CodeRegistry;

use super::OrchestratorError;

/// Runs one full acquisition pass: the extraction consumer is spawned
/// first, the acquisition producer runs to completion (closing the queue),
/// and the consumer is then awaited so the pipeline drains fully before
/// `run` returns.
pub struct Orchestrator {
    acquisition: AcquisitionWorker,
    extraction: Arc<ExtractionWorker>,
}

impl Orchestrator {
    pub fn new(
        config: &Config,
        ledger: Arc<dyn Ledger>,
        registry: Arc<dyn CodeRegistry>,
    ) -> Self {
        Self {
            acquisition: AcquisitionWorker::new(config, Arc::clone(&ledger), registry),
            extraction: Arc::new(ExtractionWorker::new(ledger)),
        }
    }

    pub async fn run(&self, connector: &dyn BrowserConnector) -> Result<(), OrchestratorError> {
        let (queue, receiver) = artifact_queue();

        let extraction = Arc::clone(&self.extraction);
        let consumer = tokio::spawn(async move { extraction.run(receiver).await });

        let acquisition_result = self.acquisition.run(connector, queue).await;

        // The queue is closed by now (run consumes the handle), so the
        // consumer drains whatever was produced and exits.
        let extraction_result = consumer
            .await
            .map_err(|e| OrchestratorError::Task(e.to_string()))?;

        acquisition_result?;
        extraction_result?;

        info!("Pipeline run complete");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_config_from_str;
    use crate::ledger::{CodeStatus, SqliteLedger};
    use crate::testing::{MockBrowser, MockConnector, MockRegistry, MockRow};
    use std::io::Write;
    use tempfile::TempDir;

    fn zip_bytes(entry: &str, contents: &[u8]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
        writer
            .start_file(entry, zip::write::SimpleFileOptions::default())
            .unwrap();
        writer.write_all(contents).unwrap();
        writer.finish().unwrap().into_inner()
    }

    fn test_config(temp: &TempDir) -> Config {
        let mut config = load_config_from_str(&format!(
            r#"
[storage]
base_dir = "{base}"
download_dir = "{download}"

[registry]
codes_url = "https://example.com/api/codes"
result_url = "https://example.com/api/report-download"

[portal]
search_url = "https://disclosure.example.com/search"
results_timeout_secs = 1

[portal.download]
settle_timeout_secs = 2
poll_interval_ms = 10
"#,
            base = temp.path().join("base").display(),
            download = temp.path().join("incoming").display(),
        ))
        .unwrap();
        config.pacing = crate::browser::PacingConfig::none();
        std::fs::create_dir_all(&config.storage.base_dir).unwrap();
        std::fs::create_dir_all(&config.storage.download_dir).unwrap();
        config
    }

    #[tokio::test]
    async fn test_single_code_flows_through_pipeline() {
        let temp = TempDir::new().unwrap();
        let config = test_config(&temp);

        let ledger: Arc<dyn Ledger> = Arc::new(SqliteLedger::in_memory().unwrap());
        let registry = Arc::new(MockRegistry::with_codes(vec!["1301"]));
        let browser = MockBrowser::new(&config.storage.download_dir);
        browser
            .set_rows(
                "1301",
                vec![MockRow::with_archive(
                    "Quarterly Report Q1",
                    zip_bytes("data.csv", b"a,b\n"),
                )],
            )
            .await;
        let connector = MockConnector::new(browser.clone());

        let orchestrator = Orchestrator::new(&config, Arc::clone(&ledger), registry.clone());
        orchestrator.run(&connector).await.unwrap();

        // Archive extracted in place, code completed, outcome reported.
        let extracted = config
            .storage
            .base_dir
            .join("1301/Quarterly/Quarterly Report Q1/data.csv");
        assert!(extracted.exists());
        assert_eq!(
            ledger.get("1301").unwrap().unwrap().status,
            CodeStatus::Completed
        );
        let posted = registry.posted_outcomes().await;
        assert_eq!(posted.len(), 1);
        assert!(posted[0].data_found);
        assert!(browser.is_closed().await);
    }

    #[tokio::test]
    async fn test_run_with_no_candidates_is_a_noop() {
        let temp = TempDir::new().unwrap();
        let config = test_config(&temp);

        let ledger: Arc<dyn Ledger> = Arc::new(SqliteLedger::in_memory().unwrap());
        let registry = Arc::new(MockRegistry::new());
        let connector = MockConnector::default();

        let orchestrator = Orchestrator::new(&config, ledger, registry);
        orchestrator.run(&connector).await.unwrap();

        assert_eq!(connector.connections(), 0);
    }
}
