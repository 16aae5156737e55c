//! The evaluation orchestrator: locate the document, gather engine evidence,
//! fan out to six specialists, then synthesize one verdict.
//!
//! `evaluate` never returns an error. Every failure mode inside it (missing
//! document, missing credential, dead render surface, provider timeouts, an
//! unusable lead response) degrades to a verdict that says what happened.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use llm_client::{truncate_to_char_boundary, GeminiJudge, JudgmentProvider, OpenAiJudge};
use veridom_common::{ChatMessage, Config, ProviderKind, Role, Verdict};
use veridom_engine::{
    explore, ExploreOptions, Screenshot, SurfaceProvider, WebDriverSurfaceProvider,
};

use crate::dimensions::Dimension;
use crate::normalize::{clamp_score, normalize, DimensionReport, SpecialistOutput};

/// Upper bound on the rendered conversation handed to each specialist.
const MAX_HISTORY_BYTES: usize = 100_000;
/// Upper bound on the raw document handed to the lead call.
const MAX_LEAD_DOCUMENT_BYTES: usize = 60_000;

const LEAD_PROMPT: &str = r#"You are the lead judge synthesizing six specialist reviews of one generated HTML document.

You receive the six specialist scores and rationales plus the document itself. Produce the final verdict:
1. Tool-derived evidence quoted in the rationales (SYSTEM REPORT lines, score caps, UNRESPONSIVE findings) outranks any single specialist's opinion when they conflict.
2. Respect stated score caps; never raise a capped dimension above its cap.
3. Keep each dimension's score unless you have a concrete reason to adjust it.
4. If the document has small fixable defects, you may include a corrected full document under "fixed_html".

Return strictly a JSON object:
{
  "score_accessibility": <0-100>, "score_visual": <0-100>, "score_mobile": <0-100>,
  "score_syntax": <0-100>, "score_fidelity": <0-100>, "score_interaction": <0-100>,
  "rationale": "<markdown, one short section per dimension>",
  "final_judgement": "<one sentence>",
  "fixed_html": "<optional corrected document>"
}
"#;

/// One full evaluation: the verdict plus any screenshots the engine captured.
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub verdict: Verdict,
    pub screenshots: Vec<Screenshot>,
}

pub struct Orchestrator {
    provider: Option<Arc<dyn JudgmentProvider>>,
    surface: Option<Arc<dyn SurfaceProvider>>,
    options: ExploreOptions,
    judge_timeout: Duration,
}

impl Orchestrator {
    pub fn new(
        provider: Option<Arc<dyn JudgmentProvider>>,
        surface: Option<Arc<dyn SurfaceProvider>>,
        options: ExploreOptions,
        judge_timeout_secs: u64,
    ) -> Self {
        Self {
            provider,
            surface,
            options,
            judge_timeout: Duration::from_secs(judge_timeout_secs),
        }
    }

    /// Wire up collaborators from configuration. Missing credentials and a
    /// missing WebDriver endpoint are both legal; the orchestrator degrades
    /// per capability.
    pub fn from_config(config: &Config) -> Self {
        let provider: Option<Arc<dyn JudgmentProvider>> =
            match (config.provider, config.provider_key()) {
                (ProviderKind::OpenAi, Some(key)) => {
                    let mut judge = OpenAiJudge::new(key, &config.llm_model);
                    if let Some(base) = &config.llm_base_url {
                        judge = judge.with_base_url(base);
                    }
                    Some(Arc::new(judge))
                }
                (ProviderKind::Gemini, Some(key)) => {
                    Some(Arc::new(GeminiJudge::new(key, &config.llm_model)))
                }
                (_, None) => None,
            };

        let surface: Option<Arc<dyn SurfaceProvider>> = config
            .webdriver_url
            .as_ref()
            .map(|url| Arc::new(WebDriverSurfaceProvider::new(url)) as Arc<dyn SurfaceProvider>);

        let options = ExploreOptions {
            rule_engine_js: config.rule_engine_js.clone(),
            sdk_globals: config.sdk_globals.clone(),
            capture_screenshots: config.capture_screenshots,
        };

        Self::new(provider, surface, options, config.judge_timeout_secs)
    }

    /// Evaluate the document carried by `history`. Infallible by contract.
    pub async fn evaluate(&self, history: &[ChatMessage]) -> Evaluation {
        let Some(doc) = locate_document(history) else {
            warn!("No document-bearing message in history");
            return Evaluation {
                verdict: mock_verdict("No HTML document found in the conversation history."),
                screenshots: Vec::new(),
            };
        };

        let Some(provider) = &self.provider else {
            info!("No judgment provider configured. Returning mock verdict");
            return Evaluation {
                verdict: mock_verdict(
                    "No judgment-provider credential configured. Fixed development scores \
                     returned so the pipeline stays testable offline.",
                ),
                screenshots: Vec::new(),
            };
        };
        let provider = provider.as_ref();

        let reports = explore(doc.html, self.surface.as_deref(), &self.options).await;

        let rendered = render_history(history);
        let deadline = self.judge_timeout;
        let fidelity_evidence = match doc.instruction {
            Some(instruction) => format!("ORIGINAL REQUEST:\n{instruction}\n\n{}", reports.fidelity),
            None => reports.fidelity.clone(),
        };

        info!(timeout_secs = deadline.as_secs(), "Dispatching 6 specialist calls");
        let (accessibility, visual, mobile, syntax, fidelity, interaction) = tokio::join!(
            specialist(
                provider,
                Dimension::Accessibility,
                &rendered,
                Dimension::Accessibility.evidence(&reports),
                deadline
            ),
            specialist(
                provider,
                Dimension::Visual,
                &rendered,
                Dimension::Visual.evidence(&reports),
                deadline
            ),
            specialist(
                provider,
                Dimension::Mobile,
                &rendered,
                Dimension::Mobile.evidence(&reports),
                deadline
            ),
            specialist(
                provider,
                Dimension::Syntax,
                &rendered,
                Dimension::Syntax.evidence(&reports),
                deadline
            ),
            specialist(provider, Dimension::Fidelity, &rendered, &fidelity_evidence, deadline),
            specialist(
                provider,
                Dimension::Interaction,
                &rendered,
                Dimension::Interaction.evidence(&reports),
                deadline
            ),
        );

        let normalized = [
            normalize(Dimension::Accessibility, accessibility),
            normalize(Dimension::Visual, visual),
            normalize(Dimension::Mobile, mobile),
            normalize(Dimension::Syntax, syntax),
            normalize(Dimension::Fidelity, fidelity),
            normalize(Dimension::Interaction, interaction),
        ];

        let mut verdict = match self.lead_call(provider, &normalized, doc.html).await {
            Ok(verdict) => verdict,
            Err(reason) => {
                warn!(reason = %reason, "Lead synthesis unusable. Merging mechanically");
                mechanical_merge(&normalized)
            }
        };

        // The trace rides along regardless of which path produced the scores
        verdict.execution_trace = reports.trace;

        Evaluation { verdict, screenshots: reports.screenshots }
    }

    async fn lead_call(
        &self,
        provider: &dyn JudgmentProvider,
        reports: &[DimensionReport; 6],
        html: &str,
    ) -> Result<Verdict, String> {
        let mut records = serde_json::Map::new();
        for report in reports {
            records.insert(report.dimension.score_key().to_string(), json!(report.score));
            records.insert(
                report.dimension.rationale_key().to_string(),
                json!(report.rationale),
            );
        }
        let user = format!(
            "SPECIALIST REPORTS:\n{}\n\nDOCUMENT UNDER TEST:\n{}",
            Value::Object(records),
            truncate_to_char_boundary(html, MAX_LEAD_DOCUMENT_BYTES),
        );

        let value = match timeout(self.judge_timeout, provider.judge(LEAD_PROMPT, &user)).await {
            Ok(Ok(value)) => value,
            Ok(Err(e)) => return Err(e.to_string()),
            Err(_) => return Err(format!("timed out after {}s", self.judge_timeout.as_secs())),
        };

        verdict_from_lead(&value).ok_or_else(|| "missing required verdict fields".to_string())
    }
}

/// The document under test and the user instruction that asked for it.
#[derive(Debug)]
pub struct LocatedDocument<'a> {
    pub html: &'a str,
    pub instruction: Option<&'a str>,
}

/// Find the most recent document-bearing message, plus the nearest user
/// message before it for fidelity context.
pub fn locate_document(history: &[ChatMessage]) -> Option<LocatedDocument<'_>> {
    let index = history.iter().rposition(|m| {
        let lower = m.content.to_lowercase();
        lower.contains("<html") || lower.contains("<!doctype")
    })?;
    let instruction = history[..index]
        .iter()
        .rev()
        .find(|m| m.role == Role::User)
        .map(|m| m.content.as_str());
    Some(LocatedDocument { html: &history[index].content, instruction })
}

/// Fixed verdict for paths that cannot reach a judgment provider. The scores
/// are stable on purpose: offline runs and integration tests assert on them.
pub fn mock_verdict(reason: &str) -> Verdict {
    Verdict {
        score_accessibility: 60,
        score_visual: 80,
        score_mobile: 75,
        score_syntax: 90,
        score_fidelity: 85,
        score_interaction: 70,
        rationale: format!("[MOCK] {reason}"),
        final_judgement: "Mock verdict (no live judgment performed).".to_string(),
        fixed_html: None,
        execution_trace: Vec::new(),
    }
}

async fn specialist(
    provider: &dyn JudgmentProvider,
    dimension: Dimension,
    rendered_history: &str,
    evidence: &str,
    deadline: Duration,
) -> SpecialistOutput {
    let user = format!("# CONVERSATION\n{rendered_history}\n# TOOL EVIDENCE\n{evidence}");
    debug!(dimension = dimension.key(), "Dispatching specialist call");
    match timeout(deadline, provider.judge(dimension.instruction(), &user)).await {
        Ok(Ok(value)) => SpecialistOutput::Report(value),
        Ok(Err(e)) => {
            warn!(dimension = dimension.key(), error = %e, "Specialist call failed");
            SpecialistOutput::Failure(e.to_string())
        }
        Err(_) => {
            warn!(
                dimension = dimension.key(),
                secs = deadline.as_secs(),
                "Specialist call timed out"
            );
            SpecialistOutput::Failure(format!("timed out after {}s", deadline.as_secs()))
        }
    }
}

fn render_history(history: &[ChatMessage]) -> String {
    let mut out = String::new();
    for message in history {
        let role = match message.role {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        };
        out.push_str(&format!("[{role}]\n{}\n\n", message.content));
    }
    truncate_to_char_boundary(&out, MAX_HISTORY_BYTES).to_string()
}

/// Build a verdict from the lead response, or reject it if any required
/// field is missing or mistyped.
fn verdict_from_lead(value: &Value) -> Option<Verdict> {
    let score = |d: Dimension| value.get(d.score_key()).and_then(clamp_score);
    Some(Verdict {
        score_accessibility: score(Dimension::Accessibility)?,
        score_visual: score(Dimension::Visual)?,
        score_mobile: score(Dimension::Mobile)?,
        score_syntax: score(Dimension::Syntax)?,
        score_fidelity: score(Dimension::Fidelity)?,
        score_interaction: score(Dimension::Interaction)?,
        rationale: value.get("rationale")?.as_str()?.to_string(),
        final_judgement: value.get("final_judgement")?.as_str()?.to_string(),
        fixed_html: value.get("fixed_html").and_then(Value::as_str).map(String::from),
        execution_trace: Vec::new(),
    })
}

/// Deterministic fallback when the lead call is unusable: per-dimension
/// scores straight from the normalized records, rationale sections in
/// canonical dimension order.
pub fn mechanical_merge(reports: &[DimensionReport; 6]) -> Verdict {
    let score = |d: Dimension| {
        reports
            .iter()
            .find(|r| r.dimension == d)
            .map_or(0, |r| r.score)
    };

    let mut rationale = String::new();
    for report in reports {
        rationale.push_str(&format!(
            "## {}\n\n{}\n\n",
            report.dimension.title(),
            report.rationale
        ));
    }
    rationale.push_str(
        "_Lead synthesis was unavailable; scores were merged mechanically from the specialist reports._",
    );

    let mean = reports.iter().map(|r| u32::from(r.score)).sum::<u32>() as f32 / 6.0;

    Verdict {
        score_accessibility: score(Dimension::Accessibility),
        score_visual: score(Dimension::Visual),
        score_mobile: score(Dimension::Mobile),
        score_syntax: score(Dimension::Syntax),
        score_fidelity: score(Dimension::Fidelity),
        score_interaction: score(Dimension::Interaction),
        rationale,
        final_judgement: judgement_for_mean(mean),
        fixed_html: None,
        execution_trace: Vec::new(),
    }
}

fn judgement_for_mean(mean: f32) -> String {
    let label = if mean >= 85.0 {
        "Excellent"
    } else if mean >= 70.0 {
        "Good"
    } else if mean >= 50.0 {
        "Needs improvement"
    } else {
        "Poor"
    };
    format!("{label} (mean score {mean:.0}/100)")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn message(role: Role, content: &str) -> ChatMessage {
        ChatMessage { role, content: content.to_string() }
    }

    #[test]
    fn locates_the_latest_document_and_its_instruction() {
        let history = vec![
            message(Role::User, "Make a landing page"),
            message(Role::Assistant, "<html><body>v1</body></html>"),
            message(Role::User, "Make it a scratch card instead"),
            message(Role::Assistant, "<!DOCTYPE html><html><body>v2</body></html>"),
        ];
        let doc = locate_document(&history).unwrap();
        assert!(doc.html.contains("v2"));
        assert_eq!(doc.instruction, Some("Make it a scratch card instead"));
    }

    #[test]
    fn no_document_means_none() {
        let history = vec![message(Role::User, "hello"), message(Role::Assistant, "hi")];
        assert!(locate_document(&history).is_none());
    }

    #[test]
    fn document_without_preceding_user_message_has_no_instruction() {
        let history = vec![message(Role::Assistant, "<html></html>")];
        let doc = locate_document(&history).unwrap();
        assert!(doc.instruction.is_none());
    }

    #[test]
    fn mock_verdict_is_stable() {
        let verdict = mock_verdict("why");
        assert_eq!(verdict.scores(), [60, 80, 75, 90, 85, 70]);
        assert!(verdict.rationale.starts_with("[MOCK] why"));
    }

    #[test]
    fn lead_output_missing_a_score_is_rejected() {
        let value = json!({
            "score_accessibility": 90, "score_visual": 80, "score_mobile": 70,
            "score_syntax": 95, "score_fidelity": 85,
            "rationale": "r", "final_judgement": "j"
        });
        assert!(verdict_from_lead(&value).is_none());
    }

    #[test]
    fn lead_output_with_all_fields_is_accepted() {
        let value = json!({
            "score_accessibility": 90, "score_visual": "80", "score_mobile": 70.4,
            "score_syntax": 95, "score_fidelity": 85, "score_interaction": 120,
            "rationale": "r", "final_judgement": "j", "fixed_html": "<html></html>"
        });
        let verdict = verdict_from_lead(&value).unwrap();
        assert_eq!(verdict.score_visual, 80);
        assert_eq!(verdict.score_mobile, 70);
        assert_eq!(verdict.score_interaction, 100);
        assert_eq!(verdict.fixed_html.as_deref(), Some("<html></html>"));
    }

    #[test]
    fn mechanical_merge_sections_follow_canonical_order() {
        let reports: [DimensionReport; 6] = std::array::from_fn(|i| DimensionReport {
            dimension: Dimension::ALL[i],
            score: (i as u8 + 1) * 10,
            rationale: format!("reason {i}"),
        });
        let verdict = mechanical_merge(&reports);

        assert_eq!(verdict.scores(), [10, 20, 30, 40, 50, 60]);
        let acc = verdict.rationale.find("## Accessibility").unwrap();
        let visual = verdict.rationale.find("## Visual Design").unwrap();
        let interaction = verdict.rationale.find("## Interaction Flow").unwrap();
        assert!(acc < visual && visual < interaction);
        assert!(verdict.rationale.contains("Lead synthesis was unavailable"));
        assert!(verdict.final_judgement.contains("Poor"));
    }

    #[test]
    fn judgement_labels_track_the_mean() {
        assert!(judgement_for_mean(92.0).starts_with("Excellent"));
        assert!(judgement_for_mean(75.0).starts_with("Good"));
        assert!(judgement_for_mean(55.0).starts_with("Needs improvement"));
        assert!(judgement_for_mean(20.0).starts_with("Poor"));
    }
}
