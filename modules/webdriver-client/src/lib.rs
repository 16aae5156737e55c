//! Minimal W3C WebDriver client covering what a document exploration
//! session needs: session lifecycle, navigation, window sizing, sync
//! script execution, element interaction, pointer gestures, screenshots.

pub mod actions;
pub mod error;

pub use actions::PointerAction;
pub use error::{Result, WebDriverError};

use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

/// The key under which the protocol wraps element references.
pub const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

pub struct WebDriverClient {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct WireValue<T> {
    value: T,
}

#[derive(Debug, Deserialize)]
struct NewSessionValue {
    #[serde(rename = "sessionId")]
    session_id: String,
}

impl WebDriverClient {
    pub fn new(base_url: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Create a headless session. The chrome-specific options are ignored
    /// by non-Chromium drivers per the capability extension rules.
    pub async fn new_session(&self) -> Result<String> {
        let body = json!({
            "capabilities": {
                "alwaysMatch": {
                    "goog:chromeOptions": {
                        "args": [
                            "--headless=new",
                            "--disable-gpu",
                            "--allow-file-access-from-files",
                        ]
                    }
                }
            }
        });

        let resp = self
            .client
            .post(format!("{}/session", self.base_url))
            .json(&body)
            .send()
            .await?;
        let resp = Self::check(resp).await?;
        let parsed: WireValue<NewSessionValue> = resp.json().await?;
        tracing::debug!(session = %parsed.value.session_id, "WebDriver session created");
        Ok(parsed.value.session_id)
    }

    pub async fn delete_session(&self, session_id: &str) -> Result<()> {
        let resp = self
            .client
            .delete(format!("{}/session/{session_id}", self.base_url))
            .send()
            .await?;
        Self::check(resp).await?;
        Ok(())
    }

    pub async fn goto(&self, session_id: &str, url: &str) -> Result<()> {
        self.post_value(session_id, "url", json!({ "url": url })).await?;
        Ok(())
    }

    pub async fn current_url(&self, session_id: &str) -> Result<String> {
        let value = self.get_value(session_id, "url").await?;
        value
            .as_str()
            .map(String::from)
            .ok_or_else(|| WebDriverError::Protocol("current url is not a string".to_string()))
    }

    pub async fn page_source(&self, session_id: &str) -> Result<String> {
        let value = self.get_value(session_id, "source").await?;
        value
            .as_str()
            .map(String::from)
            .ok_or_else(|| WebDriverError::Protocol("page source is not a string".to_string()))
    }

    pub async fn set_window_rect(&self, session_id: &str, width: u32, height: u32) -> Result<()> {
        self.post_value(
            session_id,
            "window/rect",
            json!({ "x": 0, "y": 0, "width": width, "height": height }),
        )
        .await?;
        Ok(())
    }

    /// Execute a script synchronously in the page and return whatever it
    /// returns, as JSON.
    pub async fn execute(
        &self,
        session_id: &str,
        script: &str,
        args: Vec<serde_json::Value>,
    ) -> Result<serde_json::Value> {
        self.post_value(
            session_id,
            "execute/sync",
            json!({ "script": script, "args": args }),
        )
        .await
    }

    /// Execute a script that resolves through the driver-appended callback
    /// (the last entry of `arguments`), for promise-based page APIs.
    pub async fn execute_async(
        &self,
        session_id: &str,
        script: &str,
        args: Vec<serde_json::Value>,
    ) -> Result<serde_json::Value> {
        self.post_value(
            session_id,
            "execute/async",
            json!({ "script": script, "args": args }),
        )
        .await
    }

    /// Wrap an element id so it deserializes to a live DOM element when
    /// passed as a script argument.
    pub fn element_arg(element_id: &str) -> serde_json::Value {
        json!({ ELEMENT_KEY: element_id })
    }

    pub async fn find_elements(&self, session_id: &str, css: &str) -> Result<Vec<String>> {
        let value = self
            .post_value(
                session_id,
                "elements",
                json!({ "using": "css selector", "value": css }),
            )
            .await?;
        let ids = value
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| item.get(ELEMENT_KEY))
                    .filter_map(|id| id.as_str())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();
        Ok(ids)
    }

    pub async fn element_click(&self, session_id: &str, element_id: &str) -> Result<()> {
        self.post_value(session_id, &format!("element/{element_id}/click"), json!({}))
            .await?;
        Ok(())
    }

    pub async fn element_send_keys(
        &self,
        session_id: &str,
        element_id: &str,
        text: &str,
    ) -> Result<()> {
        self.post_value(
            session_id,
            &format!("element/{element_id}/value"),
            json!({ "text": text }),
        )
        .await?;
        Ok(())
    }

    /// Dispatch one touch-pointer action sequence.
    pub async fn perform_pointer_actions(
        &self,
        session_id: &str,
        actions: Vec<PointerAction>,
    ) -> Result<()> {
        let body = json!({
            "actions": [{
                "type": "pointer",
                "id": "touch-1",
                "parameters": { "pointerType": "touch" },
                "actions": actions,
            }]
        });
        self.post_value(session_id, "actions", body).await?;
        Ok(())
    }

    pub async fn release_actions(&self, session_id: &str) -> Result<()> {
        let resp = self
            .client
            .delete(format!("{}/session/{session_id}/actions", self.base_url))
            .send()
            .await?;
        Self::check(resp).await?;
        Ok(())
    }

    /// Viewport screenshot as base64 PNG.
    pub async fn screenshot(&self, session_id: &str) -> Result<String> {
        let value = self.get_value(session_id, "screenshot").await?;
        value
            .as_str()
            .map(String::from)
            .ok_or_else(|| WebDriverError::Protocol("screenshot is not a string".to_string()))
    }

    async fn post_value(
        &self,
        session_id: &str,
        path: &str,
        body: serde_json::Value,
    ) -> Result<serde_json::Value> {
        let resp = self
            .client
            .post(format!("{}/session/{session_id}/{path}", self.base_url))
            .json(&body)
            .send()
            .await?;
        let resp = Self::check(resp).await?;
        let parsed: WireValue<serde_json::Value> = resp.json().await?;
        Ok(parsed.value)
    }

    async fn get_value(&self, session_id: &str, path: &str) -> Result<serde_json::Value> {
        let resp = self
            .client
            .get(format!("{}/session/{session_id}/{path}", self.base_url))
            .send()
            .await?;
        let resp = Self::check(resp).await?;
        let parsed: WireValue<serde_json::Value> = resp.json().await?;
        Ok(parsed.value)
    }

    async fn check(resp: reqwest::Response) -> Result<reqwest::Response> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        Err(WebDriverError::Api {
            status: status.as_u16(),
            message: extract_error_message(&body),
        })
    }
}

/// Pull the readable message out of a W3C error body, falling back to the
/// raw text for non-conforming drivers.
fn extract_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            let value = v.get("value")?;
            let error = value.get("error")?.as_str()?;
            let message = value.get("message").and_then(|m| m.as_str()).unwrap_or("");
            if message.is_empty() {
                Some(error.to_string())
            } else {
                Some(format!("{error}: {message}"))
            }
        })
        .unwrap_or_else(|| body.to_string())
}
