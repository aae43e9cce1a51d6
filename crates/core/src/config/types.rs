use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::browser::PacingConfig;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub storage: StorageConfig,
    pub registry: RegistryConfig,
    pub portal: PortalConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub webdriver: WebDriverConfig,
    #[serde(default)]
    pub pacing: PacingConfig,
    #[serde(default)]
    pub acquisition: AcquisitionConfig,
}

/// Filesystem layout configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Root of the archive tree: `{base_dir}/{code}/{report_type}/{label}.zip`.
    pub base_dir: PathBuf,
    /// The browser's shared download directory, watched for arriving archives.
    pub download_dir: PathBuf,
}

/// Ledger database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("kessan.db")
}

/// Remote code registry and result-reporting endpoints
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RegistryConfig {
    /// GET endpoint returning `{"codes": [...]}`.
    pub codes_url: String,
    /// POST endpoint accepting per-code outcomes.
    pub result_url: String,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

fn default_timeout() -> u32 {
    30
}

/// WebDriver endpoint configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WebDriverConfig {
    /// WebDriver server URL (e.g., a local chromedriver).
    #[serde(default = "default_webdriver_url")]
    pub url: String,
    /// HTTP timeout for individual WebDriver commands, in seconds.
    #[serde(default = "default_webdriver_timeout")]
    pub timeout_secs: u32,
}

impl Default for WebDriverConfig {
    fn default() -> Self {
        Self {
            url: default_webdriver_url(),
            timeout_secs: default_webdriver_timeout(),
        }
    }
}

fn default_webdriver_url() -> String {
    "http://localhost:9515".to_string()
}

fn default_webdriver_timeout() -> u32 {
    60
}

/// Disclosure portal configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PortalConfig {
    /// Disclosure search page URL.
    pub search_url: String,
    #[serde(default)]
    pub selectors: SelectorConfig,
    /// How long to wait for the results DOM after submitting a search.
    #[serde(default = "default_results_timeout")]
    pub results_timeout_secs: u32,
    #[serde(default)]
    pub download: DownloadConfig,
}

fn default_results_timeout() -> u32 {
    20
}

/// CSS selectors for the portal's search page
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SelectorConfig {
    #[serde(default = "default_search_input")]
    pub search_input: String,
    #[serde(default = "default_search_button")]
    pub search_button: String,
    #[serde(default = "default_result_row")]
    pub result_row: String,
    #[serde(default = "default_document_link")]
    pub document_link: String,
    #[serde(default = "default_document_label")]
    pub document_label: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            search_input: default_search_input(),
            search_button: default_search_button(),
            result_row: default_result_row(),
            document_link: default_document_link(),
            document_label: default_document_label(),
        }
    }
}

fn default_search_input() -> String {
    "input#keyword".to_string()
}

fn default_search_button() -> String {
    "button#search".to_string()
}

fn default_result_row() -> String {
    "table.results tr.result".to_string()
}

fn default_document_link() -> String {
    "a.csv-download".to_string()
}

fn default_document_label() -> String {
    "td.doc-title".to_string()
}

/// Download completion detection
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DownloadConfig {
    /// Upper bound on waiting for a triggered download to land on disk.
    #[serde(default = "default_settle_timeout")]
    pub settle_timeout_secs: u32,
    /// How often the download directory is polled.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            settle_timeout_secs: default_settle_timeout(),
            poll_interval_ms: default_poll_interval(),
        }
    }
}

fn default_settle_timeout() -> u32 {
    60
}

fn default_poll_interval() -> u64 {
    500
}

/// Acquisition loop tuning
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AcquisitionConfig {
    /// A `processing` ledger entry younger than this is considered held by a
    /// live worker and skipped; older ones are orphans eligible for retry.
    #[serde(default = "default_processing_lease")]
    pub processing_lease_secs: u64,
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            processing_lease_secs: default_processing_lease(),
        }
    }
}

fn default_processing_lease() -> u64 {
    3600
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_minimal_config() {
        let toml = r#"
[storage]
base_dir = "/data/disclosures"
download_dir = "/data/incoming"

[registry]
codes_url = "https://example.com/api/codes"
result_url = "https://example.com/api/report-download"

[portal]
search_url = "https://disclosure.example.com/search"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.storage.base_dir, PathBuf::from("/data/disclosures"));
        assert_eq!(config.registry.timeout_secs, 30);
        assert_eq!(config.database.path, PathBuf::from("kessan.db"));
        assert_eq!(config.webdriver.url, "http://localhost:9515");
        assert_eq!(config.portal.results_timeout_secs, 20);
        assert_eq!(config.portal.download.settle_timeout_secs, 60);
        assert_eq!(config.acquisition.processing_lease_secs, 3600);
        assert_eq!(config.portal.selectors.search_input, "input#keyword");
    }

    #[test]
    fn test_deserialize_missing_registry_fails() {
        let toml = r#"
[storage]
base_dir = "/data"
download_dir = "/data/incoming"

[portal]
search_url = "https://disclosure.example.com/search"
"#;
        let result: Result<Config, _> = toml::from_str(toml);
        assert!(result.is_err());
    }

    #[test]
    fn test_deserialize_with_overrides() {
        let toml = r#"
[storage]
base_dir = "/data"
download_dir = "/data/incoming"

[registry]
codes_url = "https://example.com/api/codes"
result_url = "https://example.com/api/report-download"
timeout_secs = 10

[portal]
search_url = "https://disclosure.example.com/search"
results_timeout_secs = 5

[portal.selectors]
search_input = "input#W0018"

[portal.download]
settle_timeout_secs = 12
poll_interval_ms = 100

[database]
path = "/data/ledger.db"

[acquisition]
processing_lease_secs = 600
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.registry.timeout_secs, 10);
        assert_eq!(config.portal.selectors.search_input, "input#W0018");
        assert_eq!(
            config.portal.selectors.result_row,
            "table.results tr.result"
        );
        assert_eq!(config.portal.download.poll_interval_ms, 100);
        assert_eq!(config.database.path, PathBuf::from("/data/ledger.db"));
        assert_eq!(config.acquisition.processing_lease_secs, 600);
    }
}
