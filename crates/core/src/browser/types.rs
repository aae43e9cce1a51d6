//! Types for browser automation backends.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur during browser automation.
#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Timed out waiting for: {0}")]
    Timeout(String),

    #[error("Script execution failed: {0}")]
    ScriptFailed(String),

    #[error("Session closed")]
    SessionClosed,

    #[error("API error: {0}")]
    ApiError(String),
}

/// Opaque handle to a located DOM element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementHandle {
    pub(crate) id: String,
}

impl ElementHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    /// Backend-assigned element identifier.
    pub fn id(&self) -> &str {
        &self.id
    }
}

/// Trait for browser automation backends.
///
/// One session corresponds to one browser window; the acquisition worker
/// opens a single session per run and drives it fully sequentially.
#[async_trait]
pub trait BrowserDriver: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &str;

    /// Navigate the session to a URL.
    async fn navigate(&self, url: &str) -> Result<(), BrowserError>;

    /// Find all elements matching a CSS selector. An empty result is not
    /// an error.
    async fn find_elements(&self, selector: &str) -> Result<Vec<ElementHandle>, BrowserError>;

    /// Find elements matching a CSS selector within a parent element.
    async fn find_from(
        &self,
        parent: &ElementHandle,
        selector: &str,
    ) -> Result<Vec<ElementHandle>, BrowserError>;

    /// Read an element's visible text.
    async fn element_text(&self, element: &ElementHandle) -> Result<String, BrowserError>;

    /// Click an element.
    async fn click(&self, element: &ElementHandle) -> Result<(), BrowserError>;

    /// Clear an input element and type text into it.
    async fn type_text(&self, element: &ElementHandle, text: &str) -> Result<(), BrowserError>;

    /// Wait (bounded) until at least one element matches the selector, and
    /// return the first match.
    async fn wait_for(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<ElementHandle, BrowserError>;

    /// Scroll the viewport by a pixel offset.
    async fn scroll_by(&self, dx: i64, dy: i64) -> Result<(), BrowserError>;

    /// Scroll an element into the center of the viewport.
    async fn scroll_into_view(&self, element: &ElementHandle) -> Result<(), BrowserError>;

    /// Move the pointer over an element without clicking it.
    async fn hover(&self, element: &ElementHandle) -> Result<(), BrowserError>;

    /// End the session.
    async fn close(&self) -> Result<(), BrowserError>;
}

/// Creates browser sessions on demand, so a run with no candidate codes
/// never pays the session setup cost.
#[async_trait]
pub trait BrowserConnector: Send + Sync {
    async fn connect(&self) -> Result<Box<dyn BrowserDriver>, BrowserError>;
}
