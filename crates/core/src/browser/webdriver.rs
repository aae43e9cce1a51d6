//! W3C WebDriver protocol backend.
//!
//! Speaks the WebDriver JSON wire protocol over HTTP against a local
//! chromedriver (or compatible) endpoint. The session is created with the
//! shared download directory preconfigured so triggered downloads land
//! where the download watcher expects them.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::time::{sleep, Instant};
use tracing::debug;

use crate::config::WebDriverConfig;

use super::{BrowserConnector, BrowserDriver, BrowserError, ElementHandle};

/// W3C element identifier key in WebDriver responses.
const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

/// Poll interval for `wait_for`.
const WAIT_POLL: Duration = Duration::from_millis(250);

#[derive(Debug, Deserialize)]
struct WdResponse<T> {
    value: T,
}

#[derive(Debug, Deserialize)]
struct WdNewSession {
    #[serde(rename = "sessionId")]
    session_id: String,
}

#[derive(Debug, Deserialize)]
struct WdError {
    error: String,
    message: String,
}

/// An open WebDriver browser session.
pub struct WebDriverSession {
    client: Client,
    base_url: String,
    session_id: String,
}

impl WebDriverSession {
    /// Create a new session against `config.url`, with `download_dir` set
    /// as the browser's default download directory.
    pub async fn connect(
        config: &WebDriverConfig,
        download_dir: &Path,
    ) -> Result<Self, BrowserError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()
            .map_err(|e| BrowserError::ConnectionFailed(e.to_string()))?;

        let base_url = config.url.trim_end_matches('/').to_string();

        let capabilities = json!({
            "capabilities": {
                "alwaysMatch": {
                    "goog:chromeOptions": {
                        "prefs": {
                            "download.default_directory": download_dir.display().to_string(),
                            "download.prompt_for_download": false,
                            "safebrowsing.enabled": true
                        }
                    }
                }
            }
        });

        let response = client
            .post(format!("{}/session", base_url))
            .json(&capabilities)
            .send()
            .await
            .map_err(|e| BrowserError::ConnectionFailed(e.to_string()))?;

        let session: WdResponse<WdNewSession> = Self::decode(response).await?;
        debug!(session_id = %session.value.session_id, "WebDriver session created");

        Ok(Self {
            client,
            base_url,
            session_id: session.value.session_id,
        })
    }

    fn session_url(&self, path: &str) -> String {
        format!("{}/session/{}{}", self.base_url, self.session_id, path)
    }

    async fn decode<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<WdResponse<T>, BrowserError> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| BrowserError::ApiError(e.to_string()))?;

        if !status.is_success() {
            return Err(Self::map_error(&body, status.as_u16()));
        }

        serde_json::from_str(&body)
            .map_err(|e| BrowserError::ApiError(format!("Malformed response: {}", e)))
    }

    fn map_error(body: &str, status: u16) -> BrowserError {
        if let Ok(err) = serde_json::from_str::<WdResponse<WdError>>(body) {
            match err.value.error.as_str() {
                "no such element" | "stale element reference" => {
                    BrowserError::ElementNotFound(err.value.message)
                }
                "timeout" | "script timeout" => BrowserError::Timeout(err.value.message),
                "invalid session id" => BrowserError::SessionClosed,
                "javascript error" => BrowserError::ScriptFailed(err.value.message),
                _ => BrowserError::ApiError(format!("{}: {}", err.value.error, err.value.message)),
            }
        } else {
            BrowserError::ApiError(format!(
                "HTTP {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            ))
        }
    }

    async fn post(&self, path: &str, body: Value) -> Result<WdResponse<Value>, BrowserError> {
        let response = self
            .client
            .post(self.session_url(path))
            .json(&body)
            .send()
            .await
            .map_err(|e| BrowserError::ConnectionFailed(e.to_string()))?;
        Self::decode(response).await
    }

    fn parse_elements(value: &Value) -> Result<Vec<ElementHandle>, BrowserError> {
        let refs: Vec<HashMap<String, String>> = serde_json::from_value(value.clone())
            .map_err(|e| BrowserError::ApiError(format!("Malformed element list: {}", e)))?;

        refs.into_iter()
            .map(|mut r| {
                r.remove(ELEMENT_KEY)
                    .or_else(|| r.into_values().next())
                    .map(ElementHandle::new)
                    .ok_or_else(|| BrowserError::ApiError("Element reference without id".into()))
            })
            .collect()
    }

    fn element_arg(element: &ElementHandle) -> Value {
        json!({ ELEMENT_KEY: element.id })
    }

    /// W3C Actions payload for a pointer move onto an element.
    fn pointer_move_actions(element: &ElementHandle) -> Value {
        json!({
            "actions": [{
                "type": "pointer",
                "id": "mouse",
                "parameters": { "pointerType": "mouse" },
                "actions": [{
                    "type": "pointerMove",
                    "duration": 200,
                    "x": 0,
                    "y": 0,
                    "origin": Self::element_arg(element)
                }]
            }]
        })
    }
}

#[async_trait]
impl BrowserDriver for WebDriverSession {
    fn name(&self) -> &str {
        "webdriver"
    }

    async fn navigate(&self, url: &str) -> Result<(), BrowserError> {
        self.post("/url", json!({ "url": url })).await?;
        Ok(())
    }

    async fn find_elements(&self, selector: &str) -> Result<Vec<ElementHandle>, BrowserError> {
        let response = self
            .post(
                "/elements",
                json!({ "using": "css selector", "value": selector }),
            )
            .await?;
        Self::parse_elements(&response.value)
    }

    async fn find_from(
        &self,
        parent: &ElementHandle,
        selector: &str,
    ) -> Result<Vec<ElementHandle>, BrowserError> {
        let response = self
            .post(
                &format!("/element/{}/elements", parent.id),
                json!({ "using": "css selector", "value": selector }),
            )
            .await?;
        Self::parse_elements(&response.value)
    }

    async fn element_text(&self, element: &ElementHandle) -> Result<String, BrowserError> {
        let response = self
            .client
            .get(self.session_url(&format!("/element/{}/text", element.id)))
            .send()
            .await
            .map_err(|e| BrowserError::ConnectionFailed(e.to_string()))?;
        let decoded: WdResponse<String> = Self::decode(response).await?;
        Ok(decoded.value)
    }

    async fn click(&self, element: &ElementHandle) -> Result<(), BrowserError> {
        self.post(&format!("/element/{}/click", element.id), json!({}))
            .await?;
        Ok(())
    }

    async fn type_text(&self, element: &ElementHandle, text: &str) -> Result<(), BrowserError> {
        self.post(&format!("/element/{}/clear", element.id), json!({}))
            .await?;
        self.post(
            &format!("/element/{}/value", element.id),
            json!({ "text": text }),
        )
        .await?;
        Ok(())
    }

    async fn wait_for(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<ElementHandle, BrowserError> {
        let deadline = Instant::now() + timeout;
        loop {
            let found = self.find_elements(selector).await?;
            if let Some(first) = found.into_iter().next() {
                return Ok(first);
            }
            if Instant::now() >= deadline {
                return Err(BrowserError::Timeout(selector.to_string()));
            }
            sleep(WAIT_POLL).await;
        }
    }

    async fn scroll_by(&self, dx: i64, dy: i64) -> Result<(), BrowserError> {
        self.post(
            "/execute/sync",
            json!({
                "script": "window.scrollBy(arguments[0], arguments[1]);",
                "args": [dx, dy]
            }),
        )
        .await?;
        Ok(())
    }

    async fn scroll_into_view(&self, element: &ElementHandle) -> Result<(), BrowserError> {
        self.post(
            "/execute/sync",
            json!({
                "script":
                    "arguments[0].scrollIntoView({behavior: 'smooth', block: 'center'});",
                "args": [Self::element_arg(element)]
            }),
        )
        .await?;
        Ok(())
    }

    async fn hover(&self, element: &ElementHandle) -> Result<(), BrowserError> {
        self.post("/actions", Self::pointer_move_actions(element))
            .await?;
        Ok(())
    }

    async fn close(&self) -> Result<(), BrowserError> {
        let response = self
            .client
            .delete(self.session_url(""))
            .send()
            .await
            .map_err(|e| BrowserError::ConnectionFailed(e.to_string()))?;
        let _: WdResponse<Value> = Self::decode(response).await?;
        Ok(())
    }
}

/// Connector producing [`WebDriverSession`]s from configuration.
pub struct WebDriverConnector {
    config: WebDriverConfig,
    download_dir: std::path::PathBuf,
}

impl WebDriverConnector {
    pub fn new(config: WebDriverConfig, download_dir: impl Into<std::path::PathBuf>) -> Self {
        Self {
            config,
            download_dir: download_dir.into(),
        }
    }
}

#[async_trait]
impl BrowserConnector for WebDriverConnector {
    async fn connect(&self) -> Result<Box<dyn BrowserDriver>, BrowserError> {
        let session = WebDriverSession::connect(&self.config, &self.download_dir).await?;
        Ok(Box::new(session))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_elements_w3c_key() {
        let value = json!([
            { ELEMENT_KEY: "abc" },
            { ELEMENT_KEY: "def" }
        ]);
        let elements = WebDriverSession::parse_elements(&value).unwrap();
        assert_eq!(elements.len(), 2);
        assert_eq!(elements[0], ElementHandle::new("abc"));
    }

    #[test]
    fn test_parse_elements_legacy_key() {
        let value = json!([{ "ELEMENT": "xyz" }]);
        let elements = WebDriverSession::parse_elements(&value).unwrap();
        assert_eq!(elements, vec![ElementHandle::new("xyz")]);
    }

    #[test]
    fn test_parse_elements_empty() {
        let elements = WebDriverSession::parse_elements(&json!([])).unwrap();
        assert!(elements.is_empty());
    }

    #[test]
    fn test_pointer_move_targets_element_origin() {
        let actions = WebDriverSession::pointer_move_actions(&ElementHandle::new("abc"));
        let steps = &actions["actions"][0]["actions"];
        assert_eq!(steps[0]["type"], "pointerMove");
        assert_eq!(steps[0]["origin"][ELEMENT_KEY], "abc");
    }

    #[test]
    fn test_map_error_no_such_element() {
        let body = r#"{"value":{"error":"no such element","message":"nope"}}"#;
        let err = WebDriverSession::map_error(body, 404);
        assert!(matches!(err, BrowserError::ElementNotFound(_)));
    }

    #[test]
    fn test_map_error_invalid_session() {
        let body = r#"{"value":{"error":"invalid session id","message":"gone"}}"#;
        let err = WebDriverSession::map_error(body, 404);
        assert!(matches!(err, BrowserError::SessionClosed));
    }

    #[test]
    fn test_map_error_unstructured_body() {
        let err = WebDriverSession::map_error("not json", 500);
        assert!(matches!(err, BrowserError::ApiError(_)));
    }
}
