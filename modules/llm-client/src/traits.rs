use anyhow::Result;
use async_trait::async_trait;

/// One judgment call: a system instruction plus a user payload, answered
/// with a JSON object. Implementations must request a JSON response mode
/// from their provider and parse before returning, so callers never see
/// raw model text.
#[async_trait]
pub trait JudgmentProvider: Send + Sync {
    async fn judge(&self, system: &str, user: &str) -> Result<serde_json::Value>;
}
