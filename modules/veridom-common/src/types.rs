use serde::{Deserialize, Serialize};

// =============================================================================
// Conversation messages
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }
}

// =============================================================================
// Findings
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Critical,
    Serious,
    Warning,
}

/// A single defect observed in the document, either statically or in-page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Finding {
    pub severity: Severity,
    pub message: String,
}

impl Finding {
    pub fn critical(message: impl Into<String>) -> Self {
        Self { severity: Severity::Critical, message: message.into() }
    }

    pub fn serious(message: impl Into<String>) -> Self {
        Self { severity: Severity::Serious, message: message.into() }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self { severity: Severity::Warning, message: message.into() }
    }
}

// =============================================================================
// Verdict
// =============================================================================

/// The aggregated evaluation of one generated document. Field names are the
/// wire contract consumed downstream; do not rename.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Verdict {
    pub score_accessibility: u8,
    pub score_visual: u8,
    pub score_mobile: u8,
    pub score_syntax: u8,
    pub score_fidelity: u8,
    pub score_interaction: u8,
    pub rationale: String,
    pub final_judgement: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fixed_html: Option<String>,
    #[serde(default)]
    pub execution_trace: Vec<String>,
}

impl Verdict {
    pub fn scores(&self) -> [u8; 6] {
        [
            self.score_accessibility,
            self.score_visual,
            self.score_mobile,
            self.score_syntax,
            self.score_fidelity,
            self.score_interaction,
        ]
    }

    pub fn mean_score(&self) -> f32 {
        let sum: u32 = self.scores().iter().map(|&s| s as u32).sum();
        sum as f32 / 6.0
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Verdict: {} (mean: {:.1})", self.final_judgement, self.mean_score())?;
        writeln!(f, "  accessibility: {}", self.score_accessibility)?;
        writeln!(f, "  visual:        {}", self.score_visual)?;
        writeln!(f, "  mobile:        {}", self.score_mobile)?;
        writeln!(f, "  syntax:        {}", self.score_syntax)?;
        writeln!(f, "  fidelity:      {}", self.score_fidelity)?;
        writeln!(f, "  interaction:   {}", self.score_interaction)?;
        Ok(())
    }
}
