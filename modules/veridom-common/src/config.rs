use anyhow::Result;

/// Which judgment provider backs the specialist and lead calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    OpenAi,
    Gemini,
}

/// Application configuration loaded from environment variables.
/// Every external collaborator is optional: a missing render surface
/// degrades browser phases, a missing provider key switches the
/// orchestrator to mock verdicts, a missing generation source limits
/// the CLI to pre-generated documents.
#[derive(Debug, Clone)]
pub struct Config {
    // Render surface (WebDriver-compatible endpoint)
    pub webdriver_url: Option<String>,

    // Judgment provider
    pub provider: ProviderKind,
    pub openai_api_key: Option<String>,
    pub gemini_api_key: Option<String>,
    pub llm_model: String,
    pub llm_base_url: Option<String>,
    pub judge_timeout_secs: u64,

    // Injectable accessibility rule engine (JS source, read at startup)
    pub rule_engine_js: Option<String>,

    // SDK globals stubbed inside evaluated documents
    pub sdk_globals: Vec<String>,

    // Generation source
    pub gen_base_url: Option<String>,
    pub gen_token: Option<String>,
    pub gen_user_id: String,
    pub gen_agent_id: String,
    pub gen_timeout_secs: u64,

    // Batch driver
    pub batch_concurrency: usize,
    pub capture_screenshots: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let provider = match std::env::var("LLM_PROVIDER").as_deref() {
            Ok("gemini") => ProviderKind::Gemini,
            _ => ProviderKind::OpenAi,
        };

        let default_model = match provider {
            ProviderKind::OpenAi => "gpt-4o",
            ProviderKind::Gemini => "gemini-2.0-flash",
        };

        let rule_engine_js = std::env::var("RULE_ENGINE_JS_PATH")
            .ok()
            .and_then(|path| match std::fs::read_to_string(&path) {
                Ok(src) => Some(src),
                Err(e) => {
                    tracing::warn!(path, error = %e, "Rule engine script unreadable, skipping");
                    None
                }
            });

        let config = Self {
            webdriver_url: std::env::var("WEBDRIVER_URL").ok(),
            provider,
            openai_api_key: std::env::var("OPENAI_API_KEY").ok(),
            gemini_api_key: std::env::var("GEMINI_API_KEY").ok(),
            llm_model: std::env::var("LLM_MODEL").unwrap_or_else(|_| default_model.to_string()),
            llm_base_url: std::env::var("LLM_BASE_URL").ok(),
            judge_timeout_secs: parse_env("JUDGE_TIMEOUT_SECS", 60),
            rule_engine_js,
            sdk_globals: std::env::var("SDK_GLOBALS")
                .unwrap_or_else(|_| "Moengage,moe".to_string())
                .split(',')
                .filter(|s| !s.is_empty())
                .map(|s| s.trim().to_string())
                .collect(),
            gen_base_url: std::env::var("GEN_BASE_URL").ok(),
            gen_token: std::env::var("GEN_TOKEN").ok(),
            gen_user_id: std::env::var("GEN_USER_ID").unwrap_or_default(),
            gen_agent_id: std::env::var("GEN_AGENT_ID").unwrap_or_default(),
            gen_timeout_secs: parse_env("GEN_TIMEOUT_SECS", 900),
            batch_concurrency: parse_env("BATCH_CONCURRENCY", 3),
            capture_screenshots: std::env::var("CAPTURE_SCREENSHOTS")
                .unwrap_or_else(|_| "false".to_string())
                .parse()
                .unwrap_or(false),
        };

        config.log_keys();
        Ok(config)
    }

    /// The credential backing the configured provider, if any.
    pub fn provider_key(&self) -> Option<&str> {
        match self.provider {
            ProviderKind::OpenAi => self.openai_api_key.as_deref(),
            ProviderKind::Gemini => self.gemini_api_key.as_deref(),
        }
    }

    fn log_keys(&self) {
        fn preview(val: &str) -> String {
            let head: String = val.chars().take(5).collect();
            format!("{head}...({} chars)", val.len())
        }
        fn preview_opt(val: &Option<String>) -> String {
            match val {
                Some(v) if !v.is_empty() => preview(v),
                _ => "<not set>".to_string(),
            }
        }

        tracing::info!("Config loaded:");
        tracing::info!("  WEBDRIVER_URL: {}", preview_opt(&self.webdriver_url));
        tracing::info!("  LLM_PROVIDER: {:?}", self.provider);
        tracing::info!("  LLM_MODEL: {}", self.llm_model);
        tracing::info!("  OPENAI_API_KEY: {}", preview_opt(&self.openai_api_key));
        tracing::info!("  GEMINI_API_KEY: {}", preview_opt(&self.gemini_api_key));
        tracing::info!("  GEN_BASE_URL: {}", preview_opt(&self.gen_base_url));
        tracing::info!("  GEN_TOKEN: {}", preview_opt(&self.gen_token));
        tracing::info!(
            "  RULE_ENGINE_JS: {}",
            if self.rule_engine_js.is_some() { "loaded" } else { "<not set>" }
        );
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_key_follows_provider_kind() {
        let config = Config {
            webdriver_url: None,
            provider: ProviderKind::Gemini,
            openai_api_key: Some("sk-openai".to_string()),
            gemini_api_key: Some("gm-key".to_string()),
            llm_model: "gemini-2.0-flash".to_string(),
            llm_base_url: None,
            judge_timeout_secs: 60,
            rule_engine_js: None,
            sdk_globals: vec!["Moengage".to_string()],
            gen_base_url: None,
            gen_token: None,
            gen_user_id: String::new(),
            gen_agent_id: String::new(),
            gen_timeout_secs: 900,
            batch_concurrency: 3,
            capture_screenshots: false,
        };
        assert_eq!(config.provider_key(), Some("gm-key"));
    }
}
