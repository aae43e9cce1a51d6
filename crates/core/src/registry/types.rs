//! Types for the code registry interface.

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur talking to the registry.
///
/// All of these are transient external-service errors: callers log them and
/// carry on (empty code list, dropped result notification).
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Request timeout")]
    Timeout,

    #[error("API error: {0}")]
    ApiError(String),
}

/// Per-code acquisition outcome reported back to the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeOutcome {
    pub code: String,
    /// Whether at least one candidate document link was found for the code,
    /// independent of whether any individual download succeeded.
    pub data_found: bool,
}

/// Trait for the remote code registry and result endpoint.
#[async_trait]
pub trait CodeRegistry: Send + Sync {
    /// Fetch the full candidate code list.
    async fn fetch_codes(&self) -> Result<Vec<String>, RegistryError>;

    /// Report a per-code outcome. Delivery is best-effort.
    async fn post_result(&self, outcome: &CodeOutcome) -> Result<(), RegistryError>;
}
