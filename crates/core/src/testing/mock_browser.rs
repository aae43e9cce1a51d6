//! Mock browser backend simulating the disclosure portal.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::browser::{BrowserConnector, BrowserDriver, BrowserError, ElementHandle};
use crate::config::SelectorConfig;

/// One simulated search-result row.
#[derive(Debug, Clone)]
pub struct MockRow {
    /// Text of the label cell next to the download link.
    pub label: String,
    /// Archive bytes written to the download directory when the row's link
    /// is clicked. `None` simulates a row without a download link.
    pub archive: Option<Vec<u8>>,
}

impl MockRow {
    pub fn with_archive(label: impl Into<String>, archive: impl Into<Vec<u8>>) -> Self {
        Self {
            label: label.into(),
            archive: Some(archive.into()),
        }
    }

    pub fn without_link(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            archive: None,
        }
    }
}

#[derive(Debug, Default)]
struct MockState {
    typed_code: String,
    active_rows: Vec<MockRow>,
    navigations: Vec<String>,
    downloads_written: u32,
    pointer_moves: u32,
    closed: bool,
    next_error: Option<BrowserError>,
}

/// Mock implementation of the [`BrowserDriver`] trait.
///
/// Behaves like the portal: typing a code and clicking the search button
/// surfaces the rows configured for that code, and clicking a document
/// link drops its archive bytes into the download directory. Selectors
/// are matched against [`SelectorConfig::default`], so tests using the
/// default selector set work unchanged.
///
/// All state is behind shared handles; cloning yields a view of the same
/// session.
#[derive(Debug, Clone)]
pub struct MockBrowser {
    rows_by_code: Arc<RwLock<HashMap<String, Vec<MockRow>>>>,
    state: Arc<RwLock<MockState>>,
    selectors: SelectorConfig,
    download_dir: PathBuf,
}

impl MockBrowser {
    pub fn new(download_dir: impl Into<PathBuf>) -> Self {
        Self {
            rows_by_code: Arc::new(RwLock::new(HashMap::new())),
            state: Arc::new(RwLock::new(MockState::default())),
            selectors: SelectorConfig::default(),
            download_dir: download_dir.into(),
        }
    }

    /// Configure the result rows a search for `code` will surface.
    pub async fn set_rows(&self, code: impl Into<String>, rows: Vec<MockRow>) {
        self.rows_by_code.write().await.insert(code.into(), rows);
    }

    /// Configure the next driver call to fail with the given error.
    pub async fn set_next_error(&self, error: BrowserError) {
        self.state.write().await.next_error = Some(error);
    }

    /// URLs navigated to, in order.
    pub async fn navigations(&self) -> Vec<String> {
        self.state.read().await.navigations.clone()
    }

    /// Whether the session has been closed.
    pub async fn is_closed(&self) -> bool {
        self.state.read().await.closed
    }

    /// Number of archives written to the download directory.
    pub async fn downloads_written(&self) -> u32 {
        self.state.read().await.downloads_written
    }

    /// Number of pointer hovers performed.
    pub async fn pointer_moves(&self) -> u32 {
        self.state.read().await.pointer_moves
    }

    async fn take_error(&self) -> Result<(), BrowserError> {
        let mut state = self.state.write().await;
        if state.closed {
            return Err(BrowserError::SessionClosed);
        }
        match state.next_error.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn row_index(handle: &ElementHandle, prefix: &str) -> Option<usize> {
        handle.id().strip_prefix(prefix)?.parse().ok()
    }
}

#[async_trait]
impl BrowserDriver for MockBrowser {
    fn name(&self) -> &str {
        "mock"
    }

    async fn navigate(&self, url: &str) -> Result<(), BrowserError> {
        self.take_error().await?;
        let mut state = self.state.write().await;
        state.navigations.push(url.to_string());
        state.active_rows.clear();
        Ok(())
    }

    async fn find_elements(&self, selector: &str) -> Result<Vec<ElementHandle>, BrowserError> {
        self.take_error().await?;
        if selector == self.selectors.search_input {
            return Ok(vec![ElementHandle::new("search-input")]);
        }
        if selector == self.selectors.search_button {
            return Ok(vec![ElementHandle::new("search-button")]);
        }
        if selector == self.selectors.result_row {
            let state = self.state.read().await;
            return Ok((0..state.active_rows.len())
                .map(|i| ElementHandle::new(format!("row:{i}")))
                .collect());
        }
        if selector == "*" {
            // A page always has something to hover over.
            return Ok((0..3)
                .map(|i| ElementHandle::new(format!("el:{i}")))
                .collect());
        }
        Ok(Vec::new())
    }

    async fn find_from(
        &self,
        parent: &ElementHandle,
        selector: &str,
    ) -> Result<Vec<ElementHandle>, BrowserError> {
        self.take_error().await?;
        let Some(idx) = Self::row_index(parent, "row:") else {
            return Ok(Vec::new());
        };
        let state = self.state.read().await;
        let Some(row) = state.active_rows.get(idx) else {
            return Ok(Vec::new());
        };

        if selector == self.selectors.document_link {
            if row.archive.is_some() {
                return Ok(vec![ElementHandle::new(format!("link:{idx}"))]);
            }
            return Ok(Vec::new());
        }
        if selector == self.selectors.document_label {
            return Ok(vec![ElementHandle::new(format!("label:{idx}"))]);
        }
        Ok(Vec::new())
    }

    async fn element_text(&self, element: &ElementHandle) -> Result<String, BrowserError> {
        self.take_error().await?;
        let Some(idx) = Self::row_index(element, "label:") else {
            return Err(BrowserError::ElementNotFound(element.id().to_string()));
        };
        let state = self.state.read().await;
        state
            .active_rows
            .get(idx)
            .map(|row| row.label.clone())
            .ok_or_else(|| BrowserError::ElementNotFound(element.id().to_string()))
    }

    async fn click(&self, element: &ElementHandle) -> Result<(), BrowserError> {
        self.take_error().await?;

        if element.id() == "search-button" {
            let typed = self.state.read().await.typed_code.clone();
            let rows = self
                .rows_by_code
                .read()
                .await
                .get(&typed)
                .cloned()
                .unwrap_or_default();
            self.state.write().await.active_rows = rows;
            return Ok(());
        }

        if let Some(idx) = Self::row_index(element, "link:") {
            let archive = {
                let state = self.state.read().await;
                state.active_rows.get(idx).and_then(|row| row.archive.clone())
            };
            let Some(bytes) = archive else {
                return Err(BrowserError::ElementNotFound(element.id().to_string()));
            };

            let mut state = self.state.write().await;
            state.downloads_written += 1;
            let path = self
                .download_dir
                .join(format!("mock-download-{}.zip", state.downloads_written));
            tokio::fs::write(&path, bytes)
                .await
                .map_err(|e| BrowserError::ApiError(e.to_string()))?;
        }

        Ok(())
    }

    async fn type_text(&self, element: &ElementHandle, text: &str) -> Result<(), BrowserError> {
        self.take_error().await?;
        if element.id() != "search-input" {
            return Err(BrowserError::ElementNotFound(element.id().to_string()));
        }
        self.state.write().await.typed_code = text.to_string();
        Ok(())
    }

    async fn wait_for(
        &self,
        selector: &str,
        _timeout: Duration,
    ) -> Result<ElementHandle, BrowserError> {
        // The mock DOM updates synchronously, so waiting degenerates to a
        // single lookup.
        self.find_elements(selector)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| BrowserError::Timeout(selector.to_string()))
    }

    async fn scroll_by(&self, _dx: i64, _dy: i64) -> Result<(), BrowserError> {
        self.take_error().await
    }

    async fn scroll_into_view(&self, _element: &ElementHandle) -> Result<(), BrowserError> {
        self.take_error().await
    }

    async fn hover(&self, _element: &ElementHandle) -> Result<(), BrowserError> {
        self.take_error().await?;
        self.state.write().await.pointer_moves += 1;
        Ok(())
    }

    async fn close(&self) -> Result<(), BrowserError> {
        self.state.write().await.closed = true;
        Ok(())
    }
}

/// Mock session factory handing out views of a shared [`MockBrowser`].
#[derive(Debug)]
pub struct MockConnector {
    browser: MockBrowser,
    connections: AtomicUsize,
    fail_next: RwLock<Option<BrowserError>>,
}

impl MockConnector {
    pub fn new(browser: MockBrowser) -> Self {
        Self {
            browser,
            connections: AtomicUsize::new(0),
            fail_next: RwLock::new(None),
        }
    }

    /// Configure the next connect attempt to fail.
    pub async fn fail_next_connect(&self, error: BrowserError) {
        *self.fail_next.write().await = Some(error);
    }

    /// Number of sessions handed out.
    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }
}

impl Default for MockConnector {
    fn default() -> Self {
        Self::new(MockBrowser::new(std::env::temp_dir()))
    }
}

#[async_trait]
impl BrowserConnector for MockConnector {
    async fn connect(&self) -> Result<Box<dyn BrowserDriver>, BrowserError> {
        if let Some(err) = self.fail_next.write().await.take() {
            return Err(err);
        }
        self.connections.fetch_add(1, Ordering::SeqCst);
        // A fresh session reopens a previously closed browser.
        self.browser.state.write().await.closed = false;
        Ok(Box::new(self.browser.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn selectors() -> SelectorConfig {
        SelectorConfig::default()
    }

    #[tokio::test]
    async fn test_search_surfaces_configured_rows() {
        let browser = MockBrowser::new("/tmp");
        browser
            .set_rows(
                "1301",
                vec![
                    MockRow::with_archive("Quarterly Report", b"q".to_vec()),
                    MockRow::without_link("Press Release"),
                ],
            )
            .await;

        let input = browser
            .wait_for(&selectors().search_input, Duration::from_secs(1))
            .await
            .unwrap();
        browser.type_text(&input, "1301").await.unwrap();
        let button = browser
            .find_elements(&selectors().search_button)
            .await
            .unwrap()
            .remove(0);
        browser.click(&button).await.unwrap();

        let rows = browser
            .find_elements(&selectors().result_row)
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);

        let links = browser
            .find_from(&rows[0], &selectors().document_link)
            .await
            .unwrap();
        assert_eq!(links.len(), 1);
        let links = browser
            .find_from(&rows[1], &selectors().document_link)
            .await
            .unwrap();
        assert!(links.is_empty());
    }

    #[tokio::test]
    async fn test_link_click_writes_archive() {
        let temp = TempDir::new().unwrap();
        let browser = MockBrowser::new(temp.path());
        browser
            .set_rows("1301", vec![MockRow::with_archive("Annual", b"bytes".to_vec())])
            .await;

        let input = ElementHandle::new("search-input");
        browser.type_text(&input, "1301").await.unwrap();
        browser
            .click(&ElementHandle::new("search-button"))
            .await
            .unwrap();
        browser.click(&ElementHandle::new("link:0")).await.unwrap();

        assert_eq!(browser.downloads_written().await, 1);
        let written = temp.path().join("mock-download-1.zip");
        assert_eq!(std::fs::read(written).unwrap(), b"bytes");
    }

    #[tokio::test]
    async fn test_unknown_code_yields_no_rows() {
        let browser = MockBrowser::new("/tmp");
        browser.type_text(&ElementHandle::new("search-input"), "9999").await.unwrap();
        browser
            .click(&ElementHandle::new("search-button"))
            .await
            .unwrap();

        let result = browser
            .wait_for(&selectors().result_row, Duration::from_millis(10))
            .await;
        assert!(matches!(result, Err(BrowserError::Timeout(_))));
    }

    #[tokio::test]
    async fn test_hover_is_counted() {
        let browser = MockBrowser::new("/tmp");
        let targets = browser.find_elements("*").await.unwrap();
        assert!(!targets.is_empty());

        browser.hover(&targets[0]).await.unwrap();
        browser.hover(&targets[1]).await.unwrap();
        assert_eq!(browser.pointer_moves().await, 2);
    }

    #[tokio::test]
    async fn test_error_injection_is_consumed() {
        let browser = MockBrowser::new("/tmp");
        browser
            .set_next_error(BrowserError::ApiError("boom".into()))
            .await;

        assert!(browser.navigate("https://example.com").await.is_err());
        assert!(browser.navigate("https://example.com").await.is_ok());
    }

    #[tokio::test]
    async fn test_closed_session_rejects_calls() {
        let browser = MockBrowser::new("/tmp");
        browser.close().await.unwrap();

        let result = browser.navigate("https://example.com").await;
        assert!(matches!(result, Err(BrowserError::SessionClosed)));
    }

    #[tokio::test]
    async fn test_connector_counts_and_fails() {
        let connector = MockConnector::default();
        assert_eq!(connector.connections(), 0);

        connector.connect().await.unwrap();
        assert_eq!(connector.connections(), 1);

        connector
            .fail_next_connect(BrowserError::ConnectionFailed("refused".into()))
            .await;
        assert!(connector.connect().await.is_err());
        assert_eq!(connector.connections(), 1);
    }
}
