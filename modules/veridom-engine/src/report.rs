//! Assembly of the labelled evidence reports handed to the judging layer.
//!
//! Line formats here are load-bearing: the judge prompts tell the models to
//! trust these sections over their own reading of the markup, so the shapes
//! stay fixed even where they look quirky (rule findings carry their impact
//! tag inside the message and get a second tag from the list prefix).

use regex::Regex;
use serde::{Deserialize, Serialize};

use veridom_common::{Finding, Severity};

/// Sentinel used for every browser-dependent report when no render surface
/// is configured.
pub const UNAVAILABLE: &str = "[UNAVAILABLE] (render surface not configured).";

/// Score ceiling for a critical in-page rule violation.
pub const RULE_CRITICAL_CAP: u8 = 50;
/// Score ceiling for a serious in-page rule violation.
pub const RULE_SERIOUS_CAP: u8 = 70;

/// Number of preview characters quoted from the page text.
const TEXT_PREVIEW_CHARS: usize = 300;

/// Everything the engine hands back for one document.
#[derive(Debug, Clone)]
pub struct EngineReports {
    pub access: String,
    pub mobile: String,
    pub fidelity: String,
    pub visual: String,
    pub trace: Vec<String>,
    pub screenshots: Vec<Screenshot>,
}

/// A captured viewport, labelled with the profile it came from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Screenshot {
    pub label: String,
    pub base64_png: String,
}

/// One violation reported by the in-page rule engine.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RuleViolation {
    pub impact: String,
    pub help: String,
    pub nodes: usize,
}

/// Convert rule violations into findings plus the ceiling they impose.
/// Critical violations cap harder than critical static findings do.
pub fn rule_findings(violations: &[RuleViolation]) -> (Vec<Finding>, u8) {
    let mut findings = Vec::new();
    let mut cap = 100u8;
    for v in violations {
        let impact = v.impact.to_lowercase();
        let message = format!(
            "[{}] {} ({} occurrences)",
            impact.to_uppercase(),
            v.help,
            v.nodes
        );
        match impact.as_str() {
            "critical" => {
                cap = cap.min(RULE_CRITICAL_CAP);
                findings.push(Finding::critical(message));
            }
            "serious" => {
                cap = cap.min(RULE_SERIOUS_CAP);
                findings.push(Finding::serious(message));
            }
            _ => findings.push(Finding::warning(message)),
        }
    }
    (findings, cap)
}

/// Accessibility and syntax report: override line first, then findings
/// grouped by severity.
pub fn access_summary(findings: &[Finding], score_cap: u8) -> String {
    let mut lines = vec!["### SYSTEM REPORT: ACCESSIBILITY & SYNTAX".to_string()];
    if score_cap < 100 {
        lines.push(format!("**OVERRIDE**: Score Max Capped at {score_cap}/100."));
    }
    for f in findings.iter().filter(|f| f.severity == Severity::Critical) {
        lines.push(format!("- [CRITICAL] {}", f.message));
    }
    for f in findings.iter().filter(|f| f.severity == Severity::Serious) {
        lines.push(format!("- [SERIOUS] {}", f.message));
    }
    for f in findings.iter().filter(|f| f.severity == Severity::Warning) {
        lines.push(format!("- [WARN] {}", f.message));
    }
    lines.join("\n")
}

/// Mobile simulation report. Runtime errors lead so a crashing page cannot
/// bury them under interaction noise.
pub fn mobile_summary(runtime_errors: &[String], logs: &[String]) -> String {
    let mut lines = vec!["### SYSTEM REPORT: MOBILE SIMULATION LOGS".to_string()];
    if runtime_errors.is_empty() {
        lines.push("No Runtime Console Errors detected.".to_string());
    } else {
        lines.push(format!(
            "Runtime Errors Detected: {} found.",
            runtime_errors.len()
        ));
        for err in runtime_errors.iter().take(3) {
            lines.push(format!("- {err}"));
        }
    }
    if logs.is_empty() {
        lines.push("No mobile interaction logs available.".to_string());
    } else {
        for item in logs {
            lines.push(format!("- {item}"));
        }
    }
    lines.join("\n")
}

/// Raw inventory readings from the desktop pass.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UiInventory {
    pub buttons: usize,
    pub inputs: usize,
    pub images: usize,
    pub text: String,
    pub primary_bg: String,
    pub primary_text: String,
}

impl Default for UiInventory {
    fn default() -> Self {
        Self {
            buttons: 0,
            inputs: 0,
            images: 0,
            text: String::new(),
            primary_bg: "N/A".to_string(),
            primary_text: "N/A".to_string(),
        }
    }
}

/// UI inventory report grounding the fidelity judgment.
pub fn fidelity_summary(inventory: &UiInventory) -> String {
    let collapse = Regex::new(r"\s+").expect("valid regex");
    let collapsed = collapse.replace_all(inventory.text.trim(), " ");
    let preview: String = collapsed.chars().take(TEXT_PREVIEW_CHARS).collect();
    [
        "### SYSTEM REPORT: UI INVENTORY".to_string(),
        format!(
            "Found {} Buttons, {} Inputs, {} Images.",
            inventory.buttons, inventory.inputs, inventory.images
        ),
        format!("Visible Text Preview: \"{preview}...\""),
        format!(
            "Primary Button Computed Style: BG={}, Text={}",
            inventory.primary_bg, inventory.primary_text
        ),
    ]
    .join("\n")
}

/// Computed style signals from the desktop pass.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StyleDna {
    pub font_family: String,
    pub features: Vec<String>,
}

impl Default for StyleDna {
    fn default() -> Self {
        Self {
            font_family: "Unknown".to_string(),
            features: Vec::new(),
        }
    }
}

/// Visual style report grounding the visual judgment.
pub fn visual_summary(dna: &StyleDna) -> String {
    let mut lines = vec!["### SYSTEM REPORT: VISUAL STYLE DNA".to_string()];
    let font = dna.font_family.to_lowercase();
    if font.contains("times") || (font.contains("serif") && !font.contains("sans")) {
        lines.push(format!(
            "**Typography**: Detected Generic/Outdated Font ('{}'). [NEGATIVE SIGNAL]",
            dna.font_family
        ));
    } else {
        lines.push(format!(
            "**Typography**: Detected Sans-Serif/Modern Font ('{}'). [POSITIVE SIGNAL]",
            dna.font_family
        ));
    }
    if dna.features.is_empty() {
        lines.push(
            "**Modern Features**: None detected (Flat/Basic design). [NEUTRAL/NEGATIVE SIGNAL]"
                .to_string(),
        );
    } else {
        lines.push(format!(
            "**Modern Features**: Detected {}. [POSITIVE SIGNAL]",
            dna.features.join(", ")
        ));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn override_line_appears_only_when_capped() {
        let capped = access_summary(&[Finding::critical("bad")], 60);
        assert!(capped.contains("**OVERRIDE**: Score Max Capped at 60/100."));

        let clean = access_summary(&[], 100);
        assert!(!clean.contains("OVERRIDE"));
        assert_eq!(clean, "### SYSTEM REPORT: ACCESSIBILITY & SYNTAX");
    }

    #[test]
    fn findings_group_by_severity_in_order() {
        let findings = vec![
            Finding::warning("w1"),
            Finding::critical("c1"),
            Finding::serious("s1"),
        ];
        let report = access_summary(&findings, 50);
        let c = report.find("- [CRITICAL] c1").unwrap();
        let s = report.find("- [SERIOUS] s1").unwrap();
        let w = report.find("- [WARN] w1").unwrap();
        assert!(c < s && s < w);
    }

    #[test]
    fn rule_findings_keep_the_impact_tag_in_the_message() {
        let violations = vec![
            RuleViolation {
                impact: "critical".to_string(),
                help: "Images must have alternate text".to_string(),
                nodes: 2,
            },
            RuleViolation {
                impact: "moderate".to_string(),
                help: "Landmarks should be unique".to_string(),
                nodes: 1,
            },
        ];
        let (findings, cap) = rule_findings(&violations);
        assert_eq!(cap, RULE_CRITICAL_CAP);
        assert_eq!(
            findings[0].message,
            "[CRITICAL] Images must have alternate text (2 occurrences)"
        );
        assert_eq!(findings[0].severity, Severity::Critical);
        assert_eq!(findings[1].severity, Severity::Warning);
    }

    #[test]
    fn serious_rule_violations_cap_at_70() {
        let violations = vec![RuleViolation {
            impact: "serious".to_string(),
            help: "Elements must have sufficient color contrast".to_string(),
            nodes: 4,
        }];
        let (_, cap) = rule_findings(&violations);
        assert_eq!(cap, RULE_SERIOUS_CAP);
    }

    #[test]
    fn runtime_errors_lead_the_mobile_report() {
        let errors = vec![
            "console-error: boom".to_string(),
            "page-error: undefined is not a function".to_string(),
        ];
        let logs = vec!["Viewport Verified: 390x844".to_string()];
        let report = mobile_summary(&errors, &logs);
        let lines: Vec<&str> = report.lines().collect();
        assert_eq!(lines[0], "### SYSTEM REPORT: MOBILE SIMULATION LOGS");
        assert_eq!(lines[1], "Runtime Errors Detected: 2 found.");
        assert_eq!(lines[2], "- console-error: boom");
        assert!(report.contains("- Viewport Verified: 390x844"));
    }

    #[test]
    fn mobile_report_truncates_to_three_errors() {
        let errors: Vec<String> = (0..5).map(|i| format!("err {i}")).collect();
        let report = mobile_summary(&errors, &[]);
        assert!(report.contains("Runtime Errors Detected: 5 found."));
        assert!(report.contains("- err 2"));
        assert!(!report.contains("- err 3"));
    }

    #[test]
    fn empty_mobile_logs_get_a_placeholder() {
        let report = mobile_summary(&[], &[]);
        assert!(report.contains("No Runtime Console Errors detected."));
        assert!(report.contains("No mobile interaction logs available."));
    }

    #[test]
    fn fidelity_preview_collapses_whitespace() {
        let inventory = UiInventory {
            buttons: 3,
            inputs: 2,
            images: 1,
            text: "  Welcome\n\n   to the    offer\tpage  ".to_string(),
            ..Default::default()
        };
        let report = fidelity_summary(&inventory);
        assert!(report.contains("Found 3 Buttons, 2 Inputs, 1 Images."));
        assert!(report.contains("Visible Text Preview: \"Welcome to the offer page...\""));
        assert!(report.contains("Primary Button Computed Style: BG=N/A, Text=N/A"));
    }

    #[test]
    fn serif_fonts_read_as_negative_signal() {
        let dna = StyleDna {
            font_family: "Times New Roman".to_string(),
            features: vec![],
        };
        let report = visual_summary(&dna);
        assert!(report.contains("[NEGATIVE SIGNAL]"));
        assert!(report.contains("None detected (Flat/Basic design)"));
    }

    #[test]
    fn modern_features_join_into_one_line() {
        let dna = StyleDna {
            font_family: "Inter, sans-serif".to_string(),
            features: vec!["Shadows".to_string(), "Rounded Corners".to_string()],
        };
        let report = visual_summary(&dna);
        assert!(report.contains("**Typography**: Detected Sans-Serif/Modern Font ('Inter, sans-serif'). [POSITIVE SIGNAL]"));
        assert!(report.contains("**Modern Features**: Detected Shadows, Rounded Corners. [POSITIVE SIGNAL]"));
    }
}
