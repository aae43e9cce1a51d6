//! Mock code registry for testing.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::registry::{CodeOutcome, CodeRegistry, RegistryError};

/// Mock implementation of the [`CodeRegistry`] trait.
///
/// Serves a configurable code list, records posted outcomes for
/// assertions, and supports one-shot error injection on either endpoint.
#[derive(Debug, Default)]
pub struct MockRegistry {
    codes: Arc<RwLock<Vec<String>>>,
    posted: Arc<RwLock<Vec<CodeOutcome>>>,
    next_fetch_error: Arc<RwLock<Option<RegistryError>>>,
    next_post_error: Arc<RwLock<Option<RegistryError>>>,
}

impl MockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_codes<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            codes: Arc::new(RwLock::new(codes.into_iter().map(Into::into).collect())),
            ..Self::new()
        }
    }

    pub async fn set_codes<I, S>(&self, codes: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        *self.codes.write().await = codes.into_iter().map(Into::into).collect();
    }

    /// Outcomes received via `post_result`, in order.
    pub async fn posted_outcomes(&self) -> Vec<CodeOutcome> {
        self.posted.read().await.clone()
    }

    /// Configure the next `fetch_codes` call to fail.
    pub async fn fail_next_fetch(&self) {
        *self.next_fetch_error.write().await =
            Some(RegistryError::ConnectionFailed("mock".to_string()));
    }

    /// Configure the next `post_result` call to fail.
    pub async fn fail_next_post(&self) {
        *self.next_post_error.write().await =
            Some(RegistryError::ConnectionFailed("mock".to_string()));
    }
}

#[async_trait]
impl CodeRegistry for MockRegistry {
    async fn fetch_codes(&self) -> Result<Vec<String>, RegistryError> {
        if let Some(err) = self.next_fetch_error.write().await.take() {
            return Err(err);
        }
        Ok(self.codes.read().await.clone())
    }

    async fn post_result(&self, outcome: &CodeOutcome) -> Result<(), RegistryError> {
        if let Some(err) = self.next_post_error.write().await.take() {
            return Err(err);
        }
        self.posted.write().await.push(outcome.clone());
        Ok(())
    }
}
