//! HTTP implementation of the code registry interface.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::RegistryConfig;

use super::{CodeOutcome, CodeRegistry, RegistryError};

#[derive(Debug, Deserialize)]
struct CodesResponse {
    #[serde(default)]
    codes: Vec<String>,
}

#[derive(Debug, Serialize)]
struct ResultPayload<'a> {
    code: &'a str,
    data_found: u8,
    created_at: String,
    updated_at: String,
}

/// HTTP-backed code registry client.
pub struct HttpCodeRegistry {
    client: Client,
    config: RegistryConfig,
}

impl HttpCodeRegistry {
    pub fn new(config: RegistryConfig) -> Result<Self, RegistryError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()
            .map_err(|e| RegistryError::ConnectionFailed(e.to_string()))?;

        Ok(Self { client, config })
    }

    fn map_send_error(e: reqwest::Error) -> RegistryError {
        if e.is_timeout() {
            RegistryError::Timeout
        } else if e.is_connect() {
            RegistryError::ConnectionFailed(e.to_string())
        } else {
            RegistryError::ApiError(e.to_string())
        }
    }
}

#[async_trait]
impl CodeRegistry for HttpCodeRegistry {
    async fn fetch_codes(&self) -> Result<Vec<String>, RegistryError> {
        let response = self
            .client
            .get(&self.config.codes_url)
            .send()
            .await
            .map_err(Self::map_send_error)?;

        if !response.status().is_success() {
            return Err(RegistryError::ApiError(format!(
                "HTTP {}",
                response.status()
            )));
        }

        let body: CodesResponse = response
            .json()
            .await
            .map_err(|e| RegistryError::ApiError(format!("Failed to parse response: {}", e)))?;

        debug!(codes = body.codes.len(), "Fetched candidate codes");
        Ok(body.codes)
    }

    async fn post_result(&self, outcome: &CodeOutcome) -> Result<(), RegistryError> {
        let now = Utc::now().to_rfc3339();
        let payload = ResultPayload {
            code: &outcome.code,
            data_found: outcome.data_found as u8,
            created_at: now.clone(),
            updated_at: now,
        };

        let response = self
            .client
            .post(&self.config.result_url)
            .json(&payload)
            .send()
            .await
            .map_err(Self::map_send_error)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(RegistryError::ApiError(format!(
                "HTTP {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_payload_shape() {
        let payload = ResultPayload {
            code: "1301",
            data_found: 1,
            created_at: "2025-01-01T00:00:00+00:00".into(),
            updated_at: "2025-01-01T00:00:00+00:00".into(),
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["code"], "1301");
        assert_eq!(json["data_found"], 1);
        assert!(json["created_at"].is_string());
    }

    #[test]
    fn test_codes_response_missing_field_defaults_empty() {
        let body: CodesResponse = serde_json::from_str("{}").unwrap();
        assert!(body.codes.is_empty());

        let body: CodesResponse =
            serde_json::from_str(r#"{"codes": ["1301", "1302"]}"#).unwrap();
        assert_eq!(body.codes, vec!["1301", "1302"]);
    }
}
