//! The six evaluation dimensions and what each specialist is allowed to see.
//!
//! Every dimension carries its canonical score/rationale keys, its system
//! instruction, and the one engine report that is its evidence slice. A
//! specialist never sees another dimension's evidence; cross-dimension
//! reconciliation is the lead call's job.

use veridom_engine::EngineReports;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dimension {
    Accessibility,
    Visual,
    Mobile,
    Syntax,
    Fidelity,
    Interaction,
}

impl Dimension {
    /// Canonical order. Verdict fields, merge sections, and lead payloads
    /// all follow it.
    pub const ALL: [Dimension; 6] = [
        Dimension::Accessibility,
        Dimension::Visual,
        Dimension::Mobile,
        Dimension::Syntax,
        Dimension::Fidelity,
        Dimension::Interaction,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Dimension::Accessibility => "accessibility",
            Dimension::Visual => "visual",
            Dimension::Mobile => "mobile",
            Dimension::Syntax => "syntax",
            Dimension::Fidelity => "fidelity",
            Dimension::Interaction => "interaction",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Dimension::Accessibility => "Accessibility",
            Dimension::Visual => "Visual Design",
            Dimension::Mobile => "Mobile Responsiveness",
            Dimension::Syntax => "Syntax & Code Quality",
            Dimension::Fidelity => "Requirement Fidelity",
            Dimension::Interaction => "Interaction Flow",
        }
    }

    pub fn score_key(self) -> &'static str {
        match self {
            Dimension::Accessibility => "score_accessibility",
            Dimension::Visual => "score_visual",
            Dimension::Mobile => "score_mobile",
            Dimension::Syntax => "score_syntax",
            Dimension::Fidelity => "score_fidelity",
            Dimension::Interaction => "score_interaction",
        }
    }

    pub fn rationale_key(self) -> &'static str {
        match self {
            Dimension::Accessibility => "rationale_accessibility",
            Dimension::Visual => "rationale_visual",
            Dimension::Mobile => "rationale_mobile",
            Dimension::Syntax => "rationale_syntax",
            Dimension::Fidelity => "rationale_fidelity",
            Dimension::Interaction => "rationale_interaction",
        }
    }

    pub fn instruction(self) -> &'static str {
        match self {
            Dimension::Accessibility => ACCESSIBILITY_PROMPT,
            Dimension::Visual => VISUAL_PROMPT,
            Dimension::Mobile => MOBILE_PROMPT,
            Dimension::Syntax => SYNTAX_PROMPT,
            Dimension::Fidelity => FIDELITY_PROMPT,
            Dimension::Interaction => INTERACTION_PROMPT,
        }
    }

    /// The engine report this specialist receives. Accessibility and syntax
    /// share the static/audit report; mobile and interaction share the
    /// simulation log.
    pub fn evidence(self, reports: &EngineReports) -> &str {
        match self {
            Dimension::Accessibility | Dimension::Syntax => &reports.access,
            Dimension::Visual => &reports.visual,
            Dimension::Mobile | Dimension::Interaction => &reports.mobile,
            Dimension::Fidelity => &reports.fidelity,
        }
    }
}

const ACCESSIBILITY_PROMPT: &str = r#"You are an accessibility specialist on an HTML quality review panel. Evaluate the document for WCAG fundamentals: alt text, accessible names, label associations, and semantic structure.

A SYSTEM REPORT produced by real tooling (a structural parser plus an in-page rule engine) is included after the conversation. Treat it as ground truth:
- If it states a score cap, your score must not exceed that cap.
- If it lists [CRITICAL] findings, reflect them even where the markup looks fine to you.

Score only accessibility. Visual taste, mobile layout, and business logic belong to other reviewers.

Return strictly a JSON object:
{"score_accessibility": <integer 0-100>, "rationale_accessibility": "<2-4 sentences>"}
"#;

const VISUAL_PROMPT: &str = r#"You are a visual design reviewer for generated marketing documents. Judge typography, color use, spacing, hierarchy, and whether the design reads as modern or dated.

The included SYSTEM REPORT carries the computed style DNA of the rendered page: font stack plus detected shadows, rounded corners, gradients, and glassmorphism. Its [POSITIVE SIGNAL] and [NEGATIVE SIGNAL] tags come from real computed styles; weigh them above your own reading of the raw CSS.

Return strictly a JSON object:
{"score_visual": <integer 0-100>, "rationale_visual": "<2-4 sentences>"}
"#;

const MOBILE_PROMPT: &str = r#"You are a mobile web QA engineer. Evaluate how the document behaves on phone-sized viewports: layout overflow, viewport configuration, runtime errors, and touch-target health.

The included SYSTEM REPORT contains logs from a real simulated device session (portrait and landscape passes plus an Android tap check). Hard evidence rules:
- "LANDSCAPE FAIL" means the layout overflows horizontally; score it down.
- "Runtime Errors Detected" means page scripts crashed on mobile; score it down hard.

Return strictly a JSON object:
{"score_mobile": <integer 0-100>, "rationale_mobile": "<2-4 sentences>"}
"#;

const SYNTAX_PROMPT: &str = r#"You are an HTML syntax and code-quality reviewer. Evaluate markup validity: doctype, tag closure, nesting, attribute correctness, and head metadata.

The included SYSTEM REPORT lists findings from a structural parser. Its [WARN] lines (missing doctype, missing title, suspicious hrefs) are verified facts; do not argue with them.

Score only code quality. Accessibility and design are other reviewers' jobs.

Return strictly a JSON object:
{"score_syntax": <integer 0-100>, "rationale_syntax": "<2-4 sentences>"}
"#;

const FIDELITY_PROMPT: &str = r#"You are a requirements reviewer. Compare the generated document against the user's original request: does it contain what was asked for, with real copy and no placeholder filler?

The included SYSTEM REPORT is a UI inventory measured from the rendered page: component counts, a visible-text preview, and the primary button's computed styling. Use it to verify claims the markup alone cannot prove (a button that exists in source but renders invisible does not count).

Return strictly a JSON object:
{"score_fidelity": <integer 0-100>, "rationale_fidelity": "<2-4 sentences>"}
"#;

const INTERACTION_PROMPT: &str = r#"You are an interaction-flow tester. Evaluate whether the document's interactive journey works end to end: controls respond, forms accept input, primary actions lead somewhere.

The included SYSTEM REPORT logs a real automated session: which elements were Typable, which taps navigated or updated the UI, and which primary controls were UNRESPONSIVE. An unresponsive primary action is the strongest negative signal there is.

Return strictly a JSON object:
{"score_interaction": <integer 0-100>, "rationale_interaction": "<2-4 sentences>"}
"#;

#[cfg(test)]
mod tests {
    use super::*;

    fn reports() -> EngineReports {
        EngineReports {
            access: "ACCESS".to_string(),
            mobile: "MOBILE".to_string(),
            fidelity: "FIDELITY".to_string(),
            visual: "VISUAL".to_string(),
            trace: vec![],
            screenshots: vec![],
        }
    }

    #[test]
    fn canonical_order_matches_verdict_fields() {
        let keys: Vec<&str> = Dimension::ALL.iter().map(|d| d.score_key()).collect();
        assert_eq!(
            keys,
            vec![
                "score_accessibility",
                "score_visual",
                "score_mobile",
                "score_syntax",
                "score_fidelity",
                "score_interaction"
            ]
        );
    }

    #[test]
    fn accessibility_and_syntax_share_the_audit_report() {
        let reports = reports();
        assert_eq!(Dimension::Accessibility.evidence(&reports), "ACCESS");
        assert_eq!(Dimension::Syntax.evidence(&reports), "ACCESS");
    }

    #[test]
    fn mobile_and_interaction_share_the_simulation_log() {
        let reports = reports();
        assert_eq!(Dimension::Mobile.evidence(&reports), "MOBILE");
        assert_eq!(Dimension::Interaction.evidence(&reports), "MOBILE");
        assert_eq!(Dimension::Visual.evidence(&reports), "VISUAL");
        assert_eq!(Dimension::Fidelity.evidence(&reports), "FIDELITY");
    }

    #[test]
    fn every_instruction_names_its_own_score_key() {
        for dimension in Dimension::ALL {
            assert!(
                dimension.instruction().contains(dimension.score_key()),
                "{:?} prompt must name {}",
                dimension,
                dimension.score_key()
            );
        }
    }
}
