use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tracing::{info, warn};

use veridom_common::{ChatMessage, Verdict};
use veridom_engine::Screenshot;
use veridom_judge::Orchestrator;

use crate::source::GenerationSource;

/// One prompt to push through the generate-then-evaluate pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchItem {
    pub prompt: String,
}

/// Outcome of a single pipeline row. Failed rows keep their slot so the
/// output file lines up with the input file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchRow {
    pub index: usize,
    pub prompt: String,
    pub decorated_prompt: String,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub generation_debug: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verdict: Option<Verdict>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub screenshots: Vec<Screenshot>,
    pub elapsed_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BatchRow {
    fn fail(mut self, started: Instant, message: String) -> Self {
        self.elapsed_ms = started.elapsed().as_millis() as u64;
        self.error = Some(message);
        self
    }
}

/// Run every item through generation and evaluation, at most `concurrency`
/// rows in flight at once. `join_all` keeps input order, so row N of the
/// output always answers item N of the input no matter which row finished
/// first. A failed row never aborts the batch.
pub async fn run_batch(
    source: &dyn GenerationSource,
    orchestrator: &Orchestrator,
    items: Vec<BatchItem>,
    concurrency: usize,
) -> Vec<BatchRow> {
    let cap = concurrency.max(1);
    let semaphore = Semaphore::new(cap);
    info!(rows = items.len(), concurrency = cap, "Starting batch run");

    let semaphore = &semaphore;
    futures::future::join_all(
        items
            .into_iter()
            .enumerate()
            .map(|(index, item)| process_row(source, orchestrator, semaphore, index, item)),
    )
    .await
}

async fn process_row(
    source: &dyn GenerationSource,
    orchestrator: &Orchestrator,
    semaphore: &Semaphore,
    index: usize,
    item: BatchItem,
) -> BatchRow {
    let mut row = BatchRow {
        index,
        prompt: item.prompt.clone(),
        decorated_prompt: source.decorate(&item.prompt),
        started_at: Utc::now(),
        generation_debug: String::new(),
        html: None,
        verdict: None,
        screenshots: Vec::new(),
        elapsed_ms: 0,
        error: None,
    };

    let _permit = match semaphore.acquire().await {
        Ok(permit) => permit,
        Err(e) => {
            warn!(row = index, error = %e, "Batch semaphore closed");
            row.error = Some("Batch semaphore closed before the row could start.".to_string());
            return row;
        }
    };

    // Timed from here so queue wait behind the semaphore is not billed to the row
    let started = Instant::now();
    row.started_at = Utc::now();
    info!(row = index, source = source.name(), "Generating document");

    let session_id = match source.create_session().await {
        Ok(id) => id,
        Err(e) => {
            warn!(row = index, error = %e, "Session creation failed");
            return row.fail(started, format!("Session creation failed: {e:#}"));
        }
    };

    let generated = match source.generate(&item.prompt, &session_id).await {
        Ok(doc) => doc,
        Err(e) => {
            warn!(row = index, error = %e, "Generation failed");
            return row.fail(started, format!("Generation failed: {e:#}"));
        }
    };

    row.generation_debug = generated.debug;
    if generated.html.trim().is_empty() {
        warn!(row = index, "Generation returned no HTML document");
        return row.fail(started, "Generation returned no HTML document.".to_string());
    }

    let history = [
        ChatMessage::user(item.prompt.as_str()),
        ChatMessage::assistant(generated.html.as_str()),
    ];
    let evaluation = orchestrator.evaluate(&history).await;

    row.elapsed_ms = started.elapsed().as_millis() as u64;
    info!(
        row = index,
        mean = evaluation.verdict.mean_score(),
        elapsed_ms = row.elapsed_ms,
        "Row complete"
    );

    row.html = Some(generated.html);
    row.verdict = Some(evaluation.verdict);
    row.screenshots = evaluation.screenshots;
    row
}

/// Load a batch input file: a JSON array of `{"prompt": ...}` items.
pub fn load_items(path: &Path) -> Result<Vec<BatchItem>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let items: Vec<BatchItem> = serde_json::from_str(&raw).with_context(|| {
        format!(
            "{} is not a JSON array of {{\"prompt\"}} items",
            path.display()
        )
    })?;
    Ok(items)
}

/// Write result rows out as pretty-printed JSON.
pub fn write_rows(path: &Path, rows: &[BatchRow]) -> Result<()> {
    let json = serde_json::to_string_pretty(rows).context("Failed to serialize batch rows")?;
    std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}
