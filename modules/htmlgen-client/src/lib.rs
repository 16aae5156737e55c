//! Client for the sessioned HTML generation service. One session per
//! document, then a streaming request whose `data:` lines carry JSON
//! chunks with the generated markup embedded at one of several paths.

pub mod error;

pub use error::{HtmlGenError, Result};

use serde_json::{json, Value};
use std::collections::BTreeSet;
use std::time::Duration;
use uuid::Uuid;

/// Appended to every prompt so the service answers in one turn instead of
/// asking follow-up questions.
pub const BYPASS_INSTRUCTION: &str = " Do not ask for clarification. If details are missing, make a reasonable assumption based on the context and proceed. If multiple valid options exist, choose the most common one. Your goal is to provide a final answer in the first response.";

#[derive(Debug, Clone)]
pub struct GeneratedDocument {
    pub html: String,
    pub debug: String,
}

pub struct HtmlGenClient {
    client: reqwest::Client,
    base_url: String,
    token: String,
    user_id: String,
    agent_id: String,
}

impl HtmlGenClient {
    pub fn new(
        base_url: &str,
        token: &str,
        user_id: &str,
        agent_id: &str,
        timeout_secs: u64,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            user_id: user_id.to_string(),
            agent_id: agent_id.to_string(),
        }
    }

    pub fn decorate_prompt(prompt: &str) -> String {
        format!("{prompt}{BYPASS_INSTRUCTION}")
    }

    /// Create a generation session and return its id.
    pub async fn create_session(&self) -> Result<String> {
        let payload = json!({ "user_id": self.user_id, "agent_id": self.agent_id });

        let resp = self
            .client
            .post(format!("{}/sessions", self.base_url))
            .bearer_auth(&self.token)
            .header("x-request-id", Uuid::new_v4().to_string())
            .json(&payload)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(HtmlGenError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let data: Value = resp.json().await?;
        let session_id = session_id_from(&data)
            .ok_or_else(|| HtmlGenError::Session(format!("no session_id in response: {data}")))?;
        tracing::info!(session = %session_id, "Generation session created");
        Ok(session_id)
    }

    /// Send a prompt into an existing session and collect the generated
    /// document from the response stream.
    pub async fn generate(&self, prompt: &str, session_id: &str) -> Result<GeneratedDocument> {
        let full_prompt = Self::decorate_prompt(prompt);
        let url = format!(
            "{}/response/stream?user_id={}&session_id={}&agent_id={}",
            self.base_url, self.user_id, session_id, self.agent_id
        );
        let body = json!({ "payload": { "type": "user", "text": full_prompt } });

        tracing::info!(session = %session_id, "Generation request");

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .header("x-request-id", Uuid::new_v4().to_string())
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(HtmlGenError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let text = resp.text().await?;
        let doc = scan_stream(&text);
        if doc.html.is_empty() {
            tracing::warn!(session = %session_id, debug = %doc.debug, "Stream finished without HTML");
        } else {
            tracing::info!(session = %session_id, bytes = doc.html.len(), "HTML extracted from stream");
        }
        Ok(doc)
    }
}

fn session_id_from(data: &Value) -> Option<String> {
    data.get("session_id")
        .or_else(|| data.get("data").and_then(|d| d.get("session_id")))
        .and_then(|v| v.as_str())
        .map(String::from)
}

/// Walk the known chunk shapes for an embedded HTML fragment: top-level
/// `html`, `payload.html`, `content.preview-payload.data.html`, and
/// `content.html` as a last resort.
fn html_fragment(chunk: &Value) -> Option<&str> {
    if let Some(html) = chunk.get("html").and_then(|v| v.as_str()) {
        return Some(html);
    }
    if let Some(html) = chunk
        .get("payload")
        .and_then(|p| p.get("html"))
        .and_then(|v| v.as_str())
    {
        return Some(html);
    }
    if let Some(content) = chunk.get("content") {
        if let Some(html) = content
            .get("preview-payload")
            .and_then(|p| p.get("data"))
            .and_then(|d| d.get("html"))
            .and_then(|v| v.as_str())
        {
            return Some(html);
        }
        if let Some(html) = content.get("html").and_then(|v| v.as_str()) {
            return Some(html);
        }
    }
    None
}

/// Scan a buffered stream body line by line. Each chunk carries the whole
/// document as regenerated so far, so the last fragment seen wins;
/// concatenating fragments would duplicate the document. Non-JSON lines
/// are skipped.
fn scan_stream(body: &str) -> GeneratedDocument {
    let mut html = String::new();
    let mut seen_keys: BTreeSet<String> = BTreeSet::new();
    let mut last_line = "";

    for raw_line in body.lines() {
        let line = raw_line.strip_prefix("data:").unwrap_or(raw_line).trim();
        if line.is_empty() {
            continue;
        }
        last_line = line;

        let Ok(chunk) = serde_json::from_str::<Value>(line) else {
            continue;
        };
        if let Some(map) = chunk.as_object() {
            seen_keys.extend(map.keys().cloned());
        }
        if let Some(fragment) = html_fragment(&chunk) {
            html = fragment.to_string();
        }
    }

    let debug = if html.is_empty() {
        format!(
            "No HTML in stream. Keys seen: {:?}. Last line: {}",
            seen_keys,
            head(last_line, 200)
        )
    } else {
        "Success: HTML extracted".to_string()
    };

    GeneratedDocument { html, debug }
}

fn head(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while !s.is_char_boundary(end) && end > 0 {
        end -= 1;
    }
    &s[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_top_level_html() {
        let body = r#"data: {"html": "<html><body>hi</body></html>"}"#;
        let doc = scan_stream(body);
        assert_eq!(doc.html, "<html><body>hi</body></html>");
        assert_eq!(doc.debug, "Success: HTML extracted");
    }

    #[test]
    fn extracts_payload_html() {
        let body = r#"{"payload": {"html": "<p>a</p>"}}"#;
        assert_eq!(scan_stream(body).html, "<p>a</p>");
    }

    #[test]
    fn extracts_nested_preview_payload_path() {
        let body = r#"data: {"content": {"preview-payload": {"data": {"html": "<div>x</div>"}}}}"#;
        assert_eq!(scan_stream(body).html, "<div>x</div>");
    }

    #[test]
    fn last_fragment_wins_over_earlier_chunks() {
        let body = concat!(
            "data: {\"html\": \"<p>draft</p>\"}\n",
            "data: {\"progress\": 50}\n",
            "data: {\"html\": \"<p>final</p>\"}\n",
        );
        let doc = scan_stream(body);
        assert_eq!(doc.html, "<p>final</p>");
    }

    #[test]
    fn skips_non_json_lines() {
        let body = "event: ping\ndata: not-json-at-all\ndata: {\"html\": \"<b>ok</b>\"}";
        assert_eq!(scan_stream(body).html, "<b>ok</b>");
    }

    #[test]
    fn reports_seen_keys_when_no_html_found() {
        let body = r#"data: {"status": "thinking", "progress": 10}"#;
        let doc = scan_stream(body);
        assert!(doc.html.is_empty());
        assert!(doc.debug.contains("progress"));
        assert!(doc.debug.contains("status"));
    }

    #[test]
    fn session_id_parsed_from_either_shape() {
        let flat = serde_json::json!({ "session_id": "abc" });
        let nested = serde_json::json!({ "data": { "session_id": "def" } });
        assert_eq!(session_id_from(&flat).as_deref(), Some("abc"));
        assert_eq!(session_id_from(&nested).as_deref(), Some("def"));
        assert_eq!(session_id_from(&serde_json::json!({})), None);
    }

    #[test]
    fn decorate_appends_bypass_instruction() {
        let decorated = HtmlGenClient::decorate_prompt("Make a banner.");
        assert!(decorated.starts_with("Make a banner."));
        assert!(decorated.ends_with("first response."));
    }
}
