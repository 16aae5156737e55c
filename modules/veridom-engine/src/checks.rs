//! Static structural checks, run before any browser phase.
//!
//! These parse the raw markup and never need a render surface, so they still
//! contribute findings when no WebDriver endpoint is configured.

use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;

use veridom_common::{Finding, Severity};

/// Score ceiling imposed by a critical static finding.
pub const STATIC_CRITICAL_CAP: u8 = 60;
/// Score ceiling imposed by a serious static finding.
pub const STATIC_SERIOUS_CAP: u8 = 70;

#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentStats {
    pub images: usize,
    pub interactive_elements: usize,
}

/// Outcome of the static pass.
#[derive(Debug, Clone)]
pub struct StaticReport {
    pub findings: Vec<Finding>,
    pub stats: DocumentStats,
}

impl StaticReport {
    /// Worst score ceiling these findings impose. Ceilings only ever tighten.
    pub fn score_cap(&self) -> u8 {
        self.findings.iter().fold(100, |cap, f| match f.severity {
            Severity::Critical => cap.min(STATIC_CRITICAL_CAP),
            Severity::Serious => cap.min(STATIC_SERIOUS_CAP),
            Severity::Warning => cap,
        })
    }
}

/// Run every static check against the raw document.
pub fn run_static_checks(html: &str) -> StaticReport {
    let document = Html::parse_document(html);
    let mut findings = Vec::new();

    let img_selector = Selector::parse("img").unwrap();
    let interactive_selector = Selector::parse("button, a, input, select, textarea").unwrap();
    let control_selector = Selector::parse("input, textarea, select").unwrap();
    let label_selector = Selector::parse("label[for]").unwrap();
    let child_img_selector = Selector::parse("img[alt]").unwrap();
    let html_selector = Selector::parse("html").unwrap();
    let title_selector = Selector::parse("title").unwrap();
    let viewport_selector = Selector::parse("meta[name='viewport']").unwrap();
    let anchor_selector = Selector::parse("a[href]").unwrap();
    let id_selector = Selector::parse("[id]").unwrap();

    let images: Vec<ElementRef> = document.select(&img_selector).collect();
    let stats = DocumentStats {
        images: images.len(),
        interactive_elements: document.select(&interactive_selector).count(),
    };

    // Missing alt text
    for img in &images {
        let alt_missing = img.value().attr("alt").map_or(true, |a| a.is_empty());
        if alt_missing && img.value().attr("role") != Some("presentation") {
            let src = img.value().attr("src").unwrap_or("unknown");
            findings.push(Finding::critical(format!(
                "Image <img src='{src}'> is missing 'alt' text."
            )));
        }
    }

    // Interactive elements with no accessible name
    for el in document.select(&interactive_selector) {
        let tag = el.value().name();
        if tag != "button" && tag != "a" {
            continue;
        }
        let named = !element_text(&el).is_empty()
            || el.value().attr("aria-label").map_or(false, |v| !v.is_empty())
            || el.value().attr("title").map_or(false, |v| !v.is_empty());
        if named {
            continue;
        }
        let child_alt = el
            .select(&child_img_selector)
            .next()
            .and_then(|img| img.value().attr("alt"))
            .map_or(false, |alt| !alt.is_empty());
        if !child_alt {
            findings.push(Finding::critical(format!(
                "Interactive element <{tag}> has no accessible name."
            )));
        }
    }

    // Form controls with no label association
    let labeled_ids: HashSet<&str> = document
        .select(&label_selector)
        .filter_map(|l| l.value().attr("for"))
        .collect();
    for control in document.select(&control_selector) {
        let tag = control.value().name();
        let input_type = control.value().attr("type").unwrap_or("").to_lowercase();
        if tag == "input"
            && matches!(
                input_type.as_str(),
                "hidden" | "submit" | "reset" | "button" | "image"
            )
        {
            continue;
        }
        let labelled = control
            .value()
            .attr("aria-label")
            .map_or(false, |v| !v.is_empty())
            || control
                .value()
                .attr("aria-labelledby")
                .map_or(false, |v| !v.is_empty())
            || has_label_ancestor(&control)
            || control
                .value()
                .attr("id")
                .map_or(false, |id| labeled_ids.contains(id));
        if labelled {
            continue;
        }
        let shown = if tag == "input" {
            let t = if input_type.is_empty() { "text" } else { &input_type };
            format!("<input type='{t}'>")
        } else {
            format!("<{tag}>")
        };
        findings.push(Finding::serious(format!(
            "Form control {shown} has no associated label."
        )));
    }

    // Document language
    let has_lang = document
        .select(&html_selector)
        .next()
        .and_then(|el| el.value().attr("lang"))
        .map_or(false, |v| !v.is_empty());
    if !has_lang {
        findings.push(Finding::serious("<html> tag missing 'lang' attribute."));
    }

    // Anchors: broken fragments and unnavigable hrefs
    let ids: HashSet<&str> = document
        .select(&id_selector)
        .filter_map(|el| el.value().attr("id"))
        .collect();
    for anchor in document.select(&anchor_selector) {
        let href = anchor.value().attr("href").unwrap_or("").trim();
        if let Some(target) = href.strip_prefix('#') {
            if !target.is_empty() && !ids.contains(target) {
                findings.push(Finding::warning(format!(
                    "Broken Internal Link: href='{href}' points to non-existent ID."
                )));
            }
        } else if !href.starts_with("http")
            && !href.starts_with("mailto")
            && !href.starts_with("tel")
            && !href.starts_with('/')
        {
            findings.push(Finding::warning(format!(
                "Suspicious Link: href='{href}' is likely invalid."
            )));
        }
    }

    // Baseline document structure
    if !html.to_lowercase().contains("<!doctype") {
        findings.push(Finding::warning(
            "HTML5 Validation: Missing <!DOCTYPE html> declaration.",
        ));
    }
    let has_title = document
        .select(&title_selector)
        .next()
        .map_or(false, |t| !element_text(&t).is_empty());
    if !has_title {
        findings.push(Finding::warning("<title> tag missing in <head>."));
    }
    if document.select(&viewport_selector).next().is_none() {
        findings.push(Finding::warning(
            "Missing viewport meta tag for responsiveness.",
        ));
    }

    StaticReport { findings, stats }
}

fn element_text(element: &ElementRef) -> String {
    let text: String = element.text().collect::<Vec<_>>().join(" ");
    text.trim().to_string()
}

fn has_label_ancestor(element: &ElementRef) -> bool {
    let mut current = element.parent();
    while let Some(node) = current {
        if let Some(el) = ElementRef::wrap(node) {
            if el.value().name() == "label" {
                return true;
            }
        }
        current = node.parent();
    }
    false
}
