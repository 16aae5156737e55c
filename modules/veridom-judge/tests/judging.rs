//! Orchestrator runs against scripted judgment providers.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use llm_client::JudgmentProvider;
use veridom_common::ChatMessage;
use veridom_engine::ExploreOptions;
use veridom_judge::{Dimension, Orchestrator};

fn history() -> Vec<ChatMessage> {
    vec![
        ChatMessage::user("Build a reward claim page"),
        ChatMessage::assistant(
            r#"<html lang="en"><head><title>Reward</title><meta name="viewport" content="width=device-width"></head><body><button>Claim</button></body></html>"#,
        ),
    ]
}

/// Answers each specialist by the score key its instruction names; the lead
/// call is recognized by its "lead judge" opener. Lead `None` means the lead
/// call errors out.
struct StubJudge {
    by_key: HashMap<&'static str, Value>,
    lead: Option<Value>,
    calls: Mutex<Vec<(String, String)>>,
}

impl StubJudge {
    fn new() -> Self {
        Self {
            by_key: HashMap::new(),
            lead: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Scripts all six specialists with scores 50, 55, 60, 65, 70, 75 in
    /// canonical dimension order.
    fn with_specialists(mut self) -> Self {
        for (i, dimension) in Dimension::ALL.iter().enumerate() {
            let mut map = serde_json::Map::new();
            map.insert(dimension.score_key().to_string(), json!(50 + (i as i64) * 5));
            map.insert(
                dimension.rationale_key().to_string(),
                json!(format!("{} assessed", dimension.key())),
            );
            self.by_key.insert(dimension.score_key(), Value::Object(map));
        }
        self
    }

    fn with_lead(mut self, value: Value) -> Self {
        self.lead = Some(value);
        self
    }

    fn user_payload_for(&self, score_key: &str) -> Option<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .find(|(system, _)| system.contains(score_key))
            .map(|(_, user)| user.clone())
    }
}

#[async_trait]
impl JudgmentProvider for StubJudge {
    async fn judge(&self, system: &str, user: &str) -> Result<Value> {
        self.calls
            .lock()
            .unwrap()
            .push((system.to_string(), user.to_string()));
        if system.contains("lead judge") {
            return self
                .lead
                .clone()
                .ok_or_else(|| anyhow!("lead scripted to fail"));
        }
        for (key, value) in &self.by_key {
            if system.contains(key) {
                return Ok(value.clone());
            }
        }
        Err(anyhow!("no scripted response for this instruction"))
    }
}

struct SlowJudge;

#[async_trait]
impl JudgmentProvider for SlowJudge {
    async fn judge(&self, _system: &str, _user: &str) -> Result<Value> {
        tokio::time::sleep(Duration::from_millis(200)).await;
        Ok(json!({}))
    }
}

#[tokio::test]
async fn missing_credential_short_circuits_to_mock() {
    let orchestrator = Orchestrator::new(None, None, ExploreOptions::default(), 5);
    let evaluation = orchestrator.evaluate(&history()).await;

    assert_eq!(evaluation.verdict.scores(), [60, 80, 75, 90, 85, 70]);
    assert!(evaluation.verdict.rationale.starts_with("[MOCK]"));
    assert!(evaluation.verdict.execution_trace.is_empty());
    assert!(evaluation.screenshots.is_empty());
}

#[tokio::test]
async fn missing_document_mocks_with_the_reason() {
    let orchestrator = Orchestrator::new(None, None, ExploreOptions::default(), 5);
    let chat = vec![
        ChatMessage::user("hello"),
        ChatMessage::assistant("hi, what should I build?"),
    ];
    let evaluation = orchestrator.evaluate(&chat).await;

    assert!(evaluation.verdict.rationale.contains("No HTML document"));
}

#[tokio::test]
async fn lead_verdict_wins_and_carries_the_trace() {
    let lead = json!({
        "score_accessibility": 61, "score_visual": 72, "score_mobile": 83,
        "score_syntax": 94, "score_fidelity": 55, "score_interaction": 66,
        "rationale": "## Overall\nSolid.", "final_judgement": "Ship it."
    });
    let judge = Arc::new(StubJudge::new().with_specialists().with_lead(lead));
    let provider: Arc<dyn JudgmentProvider> = judge.clone();
    let orchestrator = Orchestrator::new(Some(provider), None, ExploreOptions::default(), 5);

    let evaluation = orchestrator.evaluate(&history()).await;
    let verdict = &evaluation.verdict;

    assert_eq!(verdict.scores(), [61, 72, 83, 94, 55, 66]);
    assert_eq!(verdict.final_judgement, "Ship it.");
    // Engine trace attached even though the lead call produced the scores
    assert!(verdict.execution_trace.iter().any(|l| l.starts_with(":rocket:")));

    // Evidence slicing: each specialist saw only its own report
    let access_payload = judge.user_payload_for("score_accessibility").unwrap();
    assert!(access_payload.contains("SYSTEM REPORT: ACCESSIBILITY & SYNTAX"));
    let mobile_payload = judge.user_payload_for("score_mobile").unwrap();
    assert!(mobile_payload.contains("[UNAVAILABLE]"));
    assert!(!mobile_payload.contains("SYSTEM REPORT: ACCESSIBILITY"));
    let fidelity_payload = judge.user_payload_for("score_fidelity").unwrap();
    assert!(fidelity_payload.contains("ORIGINAL REQUEST:"));
    assert!(fidelity_payload.contains("Build a reward claim page"));
}

#[tokio::test]
async fn unusable_lead_falls_back_to_mechanical_merge() {
    // Lead omits score_interaction, so it must be discarded
    let lead = json!({
        "score_accessibility": 61, "score_visual": 72, "score_mobile": 83,
        "score_syntax": 94, "score_fidelity": 55,
        "rationale": "r", "final_judgement": "j"
    });
    let judge = Arc::new(StubJudge::new().with_specialists().with_lead(lead));
    let provider: Arc<dyn JudgmentProvider> = judge.clone();
    let orchestrator = Orchestrator::new(Some(provider), None, ExploreOptions::default(), 5);

    let verdict = orchestrator.evaluate(&history()).await.verdict;

    assert_eq!(verdict.scores(), [50, 55, 60, 65, 70, 75]);
    assert!(verdict.rationale.contains("## Visual Design"));
    assert!(verdict.rationale.contains("Lead synthesis was unavailable"));
    assert!(verdict.execution_trace.iter().any(|l| l.starts_with(":rocket:")));
}

#[tokio::test]
async fn one_failed_specialist_scores_zero_without_sinking_the_rest() {
    let mut judge = StubJudge::new().with_specialists();
    judge.by_key.remove("score_visual");
    let judge = Arc::new(judge);
    let provider: Arc<dyn JudgmentProvider> = judge.clone();
    let orchestrator = Orchestrator::new(Some(provider), None, ExploreOptions::default(), 5);

    let verdict = orchestrator.evaluate(&history()).await.verdict;

    assert_eq!(verdict.score_visual, 0);
    assert_eq!(verdict.score_accessibility, 50);
    assert_eq!(verdict.score_interaction, 75);
    assert!(verdict.rationale.contains("Specialist call failed"));
}

#[tokio::test]
async fn timeouts_degrade_to_zero_scores() {
    let orchestrator = Orchestrator::new(
        Some(Arc::new(SlowJudge)),
        None,
        ExploreOptions::default(),
        0,
    );
    let verdict = orchestrator.evaluate(&history()).await.verdict;

    assert_eq!(verdict.scores(), [0, 0, 0, 0, 0, 0]);
    assert!(verdict.rationale.contains("timed out after 0s"));
}
