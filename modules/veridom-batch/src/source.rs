use anyhow::Result;
use async_trait::async_trait;

use htmlgen_client::{GeneratedDocument, HtmlGenClient};

// --- GenerationSource trait ---

/// A service that turns prompts into HTML documents, one session per
/// document. The batch pipeline only ever talks to this trait so tests can
/// swap in scripted sources.
#[async_trait]
pub trait GenerationSource: Send + Sync {
    /// Open a generation session and return its id.
    async fn create_session(&self) -> Result<String>;

    /// Send one prompt into the session and collect the generated document.
    async fn generate(&self, prompt: &str, session_id: &str) -> Result<GeneratedDocument>;

    /// The exact prompt text the source will send, after any decoration.
    /// Recorded on batch rows so a run can be replayed by hand.
    fn decorate(&self, prompt: &str) -> String {
        prompt.to_string()
    }

    fn name(&self) -> &str;
}

#[async_trait]
impl GenerationSource for HtmlGenClient {
    async fn create_session(&self) -> Result<String> {
        Ok(HtmlGenClient::create_session(self).await?)
    }

    async fn generate(&self, prompt: &str, session_id: &str) -> Result<GeneratedDocument> {
        Ok(HtmlGenClient::generate(self, prompt, session_id).await?)
    }

    fn decorate(&self, prompt: &str) -> String {
        HtmlGenClient::decorate_prompt(prompt)
    }

    fn name(&self) -> &str {
        "htmlgen"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use htmlgen_client::BYPASS_INSTRUCTION;

    #[test]
    fn htmlgen_source_decorates_prompts() {
        let client = HtmlGenClient::new("http://localhost:9", "token", "user", "agent", 5);
        let source: &dyn GenerationSource = &client;

        let decorated = source.decorate("Make a pricing page");
        assert!(decorated.starts_with("Make a pricing page"));
        assert!(decorated.ends_with(BYPASS_INSTRUCTION));
        assert_eq!(source.name(), "htmlgen");
    }
}
