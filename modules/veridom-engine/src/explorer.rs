//! One exploration session per document: static pass, in-page audit,
//! desktop inventory, then the adaptive interaction loop on a phone-sized
//! viewport.
//!
//! Phases degrade independently. A broken inventory script or a crashing
//! widget downgrades its own report and the session carries on; only
//! staging and session-open failures abort the browser half entirely.

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::time::Duration;
use tracing::{info, warn};

use veridom_common::ExecutionTrace;

use crate::checks::{self, StaticReport};
use crate::interact::{self, Candidate, Descriptor, InteractionKind};
use crate::report::{self, EngineReports, RuleViolation, Screenshot, StyleDna, UiInventory};
use crate::scripts;
use crate::shim::StagedDocument;
use crate::surface::{RenderSurface, SurfaceProvider, ANDROID, DESKTOP, MOBILE_LANDSCAPE, MOBILE_PORTRAIT};

/// Hard ceiling on interaction rounds per document.
const MAX_ROUNDS: usize = 10;
/// Settle delay after navigation, viewport changes, and interactions.
const SETTLE_MS: u64 = 200;
/// Extra settle after tapping a spin/wheel trigger, which usually starts a
/// long animation before revealing anything.
const SPIN_SETTLE_MS: u64 = 2000;

/// Engine options, sliced out of the application config.
#[derive(Debug, Clone, Default)]
pub struct ExploreOptions {
    /// Source of an in-page accessibility rule engine (an axe-core bundle).
    pub rule_engine_js: Option<String>,
    /// Vendor globals to stub out before any document script runs.
    pub sdk_globals: Vec<String>,
    /// Capture desktop and portrait screenshots along the way.
    pub capture_screenshots: bool,
}

/// Evaluate one document. Static checks always run; browser phases run when
/// a [`SurfaceProvider`] is available and degrade to sentinel reports when
/// it is not, or when the session dies underneath us.
pub async fn explore(
    html: &str,
    provider: Option<&dyn SurfaceProvider>,
    options: &ExploreOptions,
) -> EngineReports {
    let mut trace = ExecutionTrace::new();
    trace.push("rocket", "Exploration engine initialized");
    trace.section("Static Analysis");
    trace.push(
        "mag_right",
        format!("Starting static analysis ({} bytes)", html.len()),
    );

    let static_report = checks::run_static_checks(html);
    trace.push(
        "mag",
        format!(
            "Static checks complete: {} findings",
            static_report.findings.len()
        ),
    );

    let Some(provider) = provider else {
        trace.push("warning", "No render surface configured. Skipping browser phases.");
        let access = report::access_summary(&static_report.findings, static_report.score_cap());
        return EngineReports {
            access,
            mobile: report::UNAVAILABLE.to_string(),
            fidelity: report::UNAVAILABLE.to_string(),
            visual: report::UNAVAILABLE.to_string(),
            trace: trace.into_lines(),
            screenshots: Vec::new(),
        };
    };

    match run_session(html, provider, options, &mut trace).await {
        Ok(evidence) => assemble(static_report, evidence, trace),
        Err(e) => {
            warn!(error = %e, "Browser session failed");
            trace.push("warning", format!("Browser session failed: {e}"));
            let err = format!("System Error: {e:#}");
            EngineReports {
                access: err.clone(),
                mobile: err.clone(),
                fidelity: err.clone(),
                visual: err,
                trace: trace.into_lines(),
                screenshots: Vec::new(),
            }
        }
    }
}

/// Everything the browser half of the session produced.
#[derive(Debug, Default)]
struct SessionEvidence {
    rule_violations: Vec<RuleViolation>,
    inventory: UiInventory,
    dna: StyleDna,
    mobile_logs: Vec<String>,
    runtime_errors: Vec<String>,
    screenshots: Vec<Screenshot>,
}

fn assemble(
    static_report: StaticReport,
    evidence: SessionEvidence,
    trace: ExecutionTrace,
) -> EngineReports {
    let (rule_findings, rule_cap) = report::rule_findings(&evidence.rule_violations);
    let mut findings = static_report.findings.clone();
    findings.extend(rule_findings);
    let cap = static_report.score_cap().min(rule_cap);

    EngineReports {
        access: report::access_summary(&findings, cap),
        mobile: report::mobile_summary(&evidence.runtime_errors, &evidence.mobile_logs),
        fidelity: report::fidelity_summary(&evidence.inventory),
        visual: report::visual_summary(&evidence.dna),
        trace: trace.into_lines(),
        screenshots: evidence.screenshots,
    }
}

async fn run_session(
    html: &str,
    provider: &dyn SurfaceProvider,
    options: &ExploreOptions,
    trace: &mut ExecutionTrace,
) -> Result<SessionEvidence> {
    // The staged file must outlive the session; the browser reads it lazily.
    let staged =
        StagedDocument::stage(html, &options.sdk_globals).context("Failed to stage document")?;

    trace.section("Browser Session");
    trace.push("computer", "Opening render surface...");
    let surface = provider
        .open()
        .await
        .context("Failed to open render surface")?;

    let outcome = drive_session(surface.as_ref(), &staged, options, trace).await;

    if let Err(e) = surface.close().await {
        warn!(error = %e, "Failed to close render surface");
    }
    outcome
}

async fn drive_session(
    surface: &dyn RenderSurface,
    staged: &StagedDocument,
    options: &ExploreOptions,
    trace: &mut ExecutionTrace,
) -> Result<SessionEvidence> {
    let mut evidence = SessionEvidence::default();

    trace.push(
        "desktop_computer",
        format!("Desktop context ({}x{})", DESKTOP.width, DESKTOP.height),
    );
    surface.set_viewport(DESKTOP.width, DESKTOP.height).await?;
    surface
        .goto(staged.url())
        .await
        .context("Failed to load staged document")?;
    settle().await;

    // In-page accessibility audit
    if let Some(rule_js) = &options.rule_engine_js {
        trace.push("wheelchair", "Running in-page accessibility audit...");
        match run_rule_engine(surface, rule_js).await {
            Ok(violations) => evidence.rule_violations = violations,
            Err(e) => {
                warn!(error = %e, "In-page audit failed");
                trace.push("warning", format!("In-page audit failed: {e}"));
            }
        }
    } else {
        trace.push(
            "warning",
            "No accessibility rule engine configured. Skipping in-page audit.",
        );
    }

    // UI inventory
    trace.push("clipboard", "Scanning UI inventory (buttons, inputs, images)...");
    match surface.execute(&scripts::inventory_script()).await {
        Ok(value) => evidence.inventory = serde_json::from_value(value).unwrap_or_default(),
        Err(e) => {
            warn!(error = %e, "Inventory scan failed");
            trace.push("warning", format!("Inventory scan failed: {e}"));
        }
    }

    // Visual style DNA
    trace.push("art", "Extracting visual style DNA...");
    match surface.execute(scripts::STYLE_DNA).await {
        Ok(value) => evidence.dna = serde_json::from_value(value).unwrap_or_default(),
        Err(e) => {
            warn!(error = %e, "Style extraction failed");
            trace.push("warning", format!("Style extraction failed: {e}"));
        }
    }

    if options.capture_screenshots {
        capture(surface, DESKTOP.name, &mut evidence.screenshots).await;
    }

    // Portrait simulation: overflow probe plus the interaction loop
    trace.section("Mobile Simulation");
    trace.push(
        "iphone",
        format!(
            "Resizing viewport to {}x{}...",
            MOBILE_PORTRAIT.width, MOBILE_PORTRAIT.height
        ),
    );
    if let Err(e) = portrait_phase(surface, trace, &mut evidence.mobile_logs).await {
        warn!(error = %e, "Portrait phase failed");
        evidence.mobile_logs.push(format!("iOS Check Crash: {e}"));
    }

    // Still in portrait here; landscape_check rotates next
    if options.capture_screenshots {
        capture(surface, MOBILE_PORTRAIT.name, &mut evidence.screenshots).await;
    }

    if let Err(e) = landscape_check(surface, &mut evidence.mobile_logs).await {
        warn!(error = %e, "Landscape check failed");
        evidence.mobile_logs.push(format!("iOS Check Crash: {e}"));
    }

    // Android pass
    trace.push(
        "calling",
        format!("Resizing viewport to {}x{}...", ANDROID.width, ANDROID.height),
    );
    if let Err(e) = android_phase(surface, &mut evidence.mobile_logs).await {
        warn!(error = %e, "Android phase failed");
        evidence.mobile_logs.push(format!("Android Check Crash: {e}"));
    }

    // Drain the instrumentation event log
    evidence.runtime_errors = match surface.execute(scripts::READ_EVENTS).await {
        Ok(value) => runtime_errors_from(&value),
        Err(e) => {
            warn!(error = %e, "Event drain failed");
            Vec::new()
        }
    };

    Ok(evidence)
}

async fn run_rule_engine(
    surface: &dyn RenderSurface,
    rule_js: &str,
) -> Result<Vec<RuleViolation>> {
    surface
        .execute(rule_js)
        .await
        .context("Failed to install rule engine")?;
    let value = surface
        .execute_async(scripts::RULE_RUNNER)
        .await
        .context("Rule engine run failed")?;
    if value.get("missing").and_then(|v| v.as_bool()) == Some(true) {
        anyhow::bail!("rule engine did not register a global");
    }
    if let Some(err) = value.get("error").and_then(|v| v.as_str()) {
        anyhow::bail!("rule engine reported: {err}");
    }
    let violations = value
        .get("violations")
        .cloned()
        .unwrap_or_else(|| serde_json::Value::Array(Vec::new()));
    Ok(serde_json::from_value(violations).unwrap_or_default())
}

async fn portrait_phase(
    surface: &dyn RenderSurface,
    trace: &mut ExecutionTrace,
    logs: &mut Vec<String>,
) -> Result<()> {
    surface
        .set_viewport(MOBILE_PORTRAIT.width, MOBILE_PORTRAIT.height)
        .await?;
    settle().await;
    let vp = surface.execute(scripts::VIEWPORT_SIZE).await?;
    logs.push(format!(
        "Viewport Verified: {}x{}",
        vp.get("width").and_then(|v| v.as_i64()).unwrap_or(0),
        vp.get("height").and_then(|v| v.as_i64()).unwrap_or(0)
    ));

    // Overflow is checked before any interaction can mutate the layout
    let scroll_width = surface
        .execute(scripts::SCROLL_WIDTH)
        .await?
        .as_i64()
        .unwrap_or(0);
    if scroll_width > i64::from(MOBILE_PORTRAIT.width) {
        logs.push(format!(
            "MOBILE FAIL: Horizontal scroll detected ({scroll_width}px > {}px).",
            MOBILE_PORTRAIT.width
        ));
        trace.push("warning", "Horizontal overflow on portrait viewport");
    }

    let stats = interaction_loop(surface, trace, logs).await?;
    info!(
        rounds = stats.rounds,
        interactions = stats.interactions,
        progress_events = stats.progress_events,
        "Interaction loop complete"
    );
    Ok(())
}

/// Rotate to landscape and probe for horizontal overflow.
async fn landscape_check(surface: &dyn RenderSurface, logs: &mut Vec<String>) -> Result<()> {
    surface
        .set_viewport(MOBILE_LANDSCAPE.width, MOBILE_LANDSCAPE.height)
        .await?;
    settle().await;
    let scroll_width = surface
        .execute(scripts::SCROLL_WIDTH)
        .await?
        .as_i64()
        .unwrap_or(0);
    if scroll_width > i64::from(MOBILE_LANDSCAPE.width) {
        logs.push("LANDSCAPE FAIL: Horizontal scroll detected.".to_string());
    } else {
        logs.push("LANDSCAPE PASS: No horizontal scroll.".to_string());
    }
    Ok(())
}

#[derive(Debug, Default)]
struct LoopStats {
    rounds: usize,
    interactions: usize,
    progress_events: usize,
}

/// The adaptive loop. Each round rescans the page, ranks what it finds, and
/// drives candidates best-first until one changes the page. Rounds continue
/// while something progresses; silence ends the exploration.
async fn interaction_loop(
    surface: &dyn RenderSurface,
    trace: &mut ExecutionTrace,
    logs: &mut Vec<String>,
) -> Result<LoopStats> {
    let mut executed: HashSet<String> = HashSet::new();
    let mut stats = LoopStats::default();
    let scan_script = scripts::scan_script();

    for round in 1..=MAX_ROUNDS {
        stats.rounds = round;
        let value = surface
            .execute(&scan_script)
            .await
            .context("Element scan failed")?;
        let descriptors: Vec<Descriptor> =
            serde_json::from_value(value).context("Element scan returned malformed data")?;
        let handles = surface.find_elements(scripts::INTERACTIVE_SELECTOR).await?;

        if round == 1 {
            logs.push(format!("Found {} interactive targets.", descriptors.len()));
        }

        let candidates = interact::rank_candidates(&descriptors, &executed);
        trace.push(
            "mag",
            format!("Round {round}: {} candidates", candidates.len()),
        );
        if candidates.is_empty() {
            break;
        }

        let mut progressed = false;
        for candidate in &candidates {
            let d = &candidate.descriptor;
            let Some(handle) = handles.get(candidate.index) else {
                // The DOM shifted between scan and handle lookup; rescan
                progressed = true;
                break;
            };

            let before_url = surface.current_url().await.unwrap_or_default();
            let before_html = surface.page_source().await.unwrap_or_default();

            let outcome = drive_candidate(surface, handle, candidate, trace).await;
            executed.insert(d.signature());
            stats.interactions += 1;

            if let Err(e) = outcome {
                logs.push(format!("{}: interaction failed.", d.describe()));
                trace.push("warning", format!("Failed to drive {}: {e}", d.describe()));
                continue;
            }

            settle().await;
            let after_url = surface.current_url().await.unwrap_or_default();
            let after_html = surface.page_source().await.unwrap_or_default();

            if !after_url.is_empty() && after_url != before_url {
                logs.push(format!("{}: navigated to {after_url}.", d.describe()));
                trace.push("point_up_2", format!("Navigation detected after {}", d.describe()));
                stats.progress_events += 1;
                progressed = true;
                break;
            }
            if after_html != before_html {
                logs.push(format!("{}: UI updated.", d.describe()));
                trace.push("point_up_2", format!("UI update detected after {}", d.describe()));
                stats.progress_events += 1;
                progressed = true;
                break;
            }
            if candidate.kind == InteractionKind::Fill {
                // Typed data counts as progress even without a DOM delta
                logs.push(format!("{}: Typable.", d.describe()));
                trace.push("keyboard", format!("Typed into {}", d.describe()));
                stats.progress_events += 1;
                progressed = true;
                continue;
            }
            if interact::is_primary_actionable(d) {
                logs.push(format!(
                    "{}: UNRESPONSIVE (no DOM change after tap).",
                    d.describe()
                ));
                trace.push("warning", format!("Unresponsive element: {}", d.describe()));
            }
        }

        if !progressed {
            break;
        }
    }
    Ok(stats)
}

async fn drive_candidate(
    surface: &dyn RenderSurface,
    handle: &str,
    candidate: &Candidate,
    trace: &mut ExecutionTrace,
) -> Result<()> {
    let d = &candidate.descriptor;
    match candidate.kind {
        InteractionKind::Fill => {
            let value = interact::fill_value(d);
            surface.send_keys(handle, &value).await
        }
        InteractionKind::Select => surface.select_option(handle).await.map(|_| ()),
        InteractionKind::Toggle => match surface.click(handle).await {
            Ok(()) => Ok(()),
            // Styled toggles often hide the native control behind a label
            Err(_) => surface.toggle_via_label(handle).await.map(|_| ()),
        },
        InteractionKind::Scratch => {
            trace.push("art", format!("Scratching {}", d.describe()));
            surface.drag(&interact::scratch_strokes(d)).await
        }
        InteractionKind::Spin => {
            surface.click(handle).await?;
            tokio::time::sleep(Duration::from_millis(SPIN_SETTLE_MS)).await;
            Ok(())
        }
        InteractionKind::Tap => match surface.click(handle).await {
            Ok(()) => Ok(()),
            Err(e) if e.to_string().contains("intercepted") => {
                trace.push(
                    "point_up_2",
                    format!("Click intercepted on {}. Forcing script click.", d.describe()),
                );
                surface.force_click(handle).await
            }
            Err(e) => Err(e),
        },
    }
}

async fn android_phase(surface: &dyn RenderSurface, logs: &mut Vec<String>) -> Result<()> {
    surface.set_viewport(ANDROID.width, ANDROID.height).await?;
    settle().await;
    let vp = surface.execute(scripts::VIEWPORT_SIZE).await?;
    logs.push(format!(
        "Android Viewport Verified: {}x{}",
        vp.get("width").and_then(|v| v.as_i64()).unwrap_or(0),
        vp.get("height").and_then(|v| v.as_i64()).unwrap_or(0)
    ));
    let handles = surface
        .find_elements(scripts::PRIMARY_CONTROL_SELECTOR)
        .await?;
    if let Some(handle) = handles.first() {
        match surface.click(handle).await {
            Ok(()) => logs.push("Android Target Check: Tappable.".to_string()),
            Err(_) => logs.push("Android Target Check: FAILED TAP (Layout Shift?).".to_string()),
        }
    }
    Ok(())
}

fn runtime_errors_from(value: &serde_json::Value) -> Vec<String> {
    value
        .as_array()
        .map(|events| {
            events
                .iter()
                .filter_map(|v| v.as_str())
                .filter(|line| {
                    let lower = line.to_lowercase();
                    lower.contains("error") || lower.contains("exception")
                })
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}

async fn capture(surface: &dyn RenderSurface, label: &str, screenshots: &mut Vec<Screenshot>) {
    match surface.screenshot().await {
        Ok(base64_png) => screenshots.push(Screenshot {
            label: label.to_string(),
            base64_png,
        }),
        Err(e) => warn!(error = %e, label, "Screenshot failed"),
    }
}

async fn settle() {
    tokio::time::sleep(Duration::from_millis(SETTLE_MS)).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn runtime_errors_keep_error_and_exception_events() {
        let events = json!([
            "console-error: Uncaught TypeError",
            "console-warn: deprecated API",
            "console-warn: Unhandled Exception in tracker",
            "page-error: boom (inline:3)",
            "sdk: Moengage.track_event"
        ]);
        let errors = runtime_errors_from(&events);
        assert_eq!(
            errors,
            vec![
                "console-error: Uncaught TypeError".to_string(),
                "console-warn: Unhandled Exception in tracker".to_string(),
                "page-error: boom (inline:3)".to_string()
            ]
        );
    }

    #[test]
    fn runtime_errors_tolerate_non_array_payloads() {
        assert!(runtime_errors_from(&json!(null)).is_empty());
        assert!(runtime_errors_from(&json!({"weird": true})).is_empty());
    }
}
