//! Candidate scoring and interaction planning for the adaptive loop.
//!
//! Every round the engine scans the page into [`Descriptor`]s, ranks them
//! with [`rank_candidates`], and works down the list until something moves
//! the page forward. All of this is pure so the heuristics can be unit
//! tested without a browser.

use serde::Deserialize;
use std::collections::HashSet;

use crate::surface::Stroke;

/// Words that suggest an element advances the flow.
pub const AFFIRMATIVE_WORDS: &[&str] = &["next", "submit", "continue", "start", "ok", "yes"];

/// Words that suggest an element abandons the flow.
pub const DISMISSAL_WORDS: &[&str] = &["close", "cancel", "back", "dismiss", "skip"];

/// Glyphs that mark rating or reaction widgets.
const SELECTION_GLYPHS: &[char] = &[
    '★', '☆', '⭐', '🌟', '👍', '👎', '❤', '😀', '😊', '🙂', '😐', '🙁', '😠',
];

/// One interactive element as seen by the in-page scan, in document order.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Descriptor {
    pub tag: String,
    pub id: String,
    pub classes: Vec<String>,
    pub text: String,
    pub role: String,
    pub input_type: String,
    pub name: String,
    pub placeholder: String,
    pub aria_checked: String,
    #[serde(rename = "rating")]
    pub has_rating_attr: bool,
    #[serde(rename = "dismiss")]
    pub has_dismiss_attr: bool,
    pub visible: bool,
    pub disabled: bool,
    pub x: i64,
    pub y: i64,
    pub w: i64,
    pub h: i64,
}

impl Descriptor {
    /// Identity used to avoid re-driving an element the loop already
    /// handled. Includes the disabled state, so a control that a previous
    /// interaction enabled counts as fresh.
    pub fn signature(&self) -> String {
        format!(
            "{}|{}|{}|{}|{}|{}",
            self.tag,
            self.id,
            self.text,
            self.classes.join("."),
            self.name,
            self.disabled
        )
    }

    /// Short label for logs: `<button 'Claim Reward'>` or `<input#email>`.
    pub fn describe(&self) -> String {
        if !self.text.is_empty() {
            format!("<{} '{}'>", self.tag, self.text)
        } else if !self.id.is_empty() {
            format!("<{}#{}>", self.tag, self.id)
        } else {
            format!("<{}>", self.tag)
        }
    }

    fn attr_text(&self) -> String {
        format!("{} {} {}", self.name, self.id, self.classes.join(" "))
    }

    fn class_contains(&self, needle: &str) -> bool {
        self.classes
            .iter()
            .any(|c| c.to_lowercase().contains(needle))
    }
}

/// How the loop should drive an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionKind {
    /// Type a synthetic value into a text-entry control.
    Fill,
    /// Flip a checkbox or radio.
    Toggle,
    /// Advance a `<select>` to a non-default option.
    Select,
    /// Multi-stroke touch drag across a scratch surface.
    Scratch,
    /// Tap a spin/wheel trigger and wait out the animation.
    Spin,
    /// Plain tap.
    Tap,
}

pub fn classify(d: &Descriptor) -> InteractionKind {
    if d.tag == "select" {
        return InteractionKind::Select;
    }
    if d.tag == "input" && matches!(d.input_type.as_str(), "checkbox" | "radio") {
        return InteractionKind::Toggle;
    }
    if d.tag == "textarea"
        || (d.tag == "input"
            && !matches!(d.input_type.as_str(), "button" | "submit" | "reset" | "image"))
    {
        return InteractionKind::Fill;
    }
    if d.tag == "canvas" || d.class_contains("scratch") {
        return InteractionKind::Scratch;
    }
    if d.class_contains("spin") || d.role == "slider" {
        return InteractionKind::Spin;
    }
    InteractionKind::Tap
}

/// Heuristic priority of an element. Data entry ranks above progression,
/// selection widgets above both, and dismissal controls sink to the bottom.
pub fn score(d: &Descriptor) -> i32 {
    let mut score = 0;

    let form_control = matches!(
        classify(d),
        InteractionKind::Fill | InteractionKind::Select | InteractionKind::Toggle
    );
    if form_control {
        score += 10;
    }
    if classify(d) == InteractionKind::Toggle {
        score += 2;
    }

    let selection = is_selection_target(d);
    if selection {
        score += 12;
    }

    let affirmative = !selection
        && has_word(
            &format!("{} {}", d.text, d.attr_text()),
            AFFIRMATIVE_WORDS,
        );
    if affirmative {
        score += 5;
    }

    if is_button_like(d) && !form_control && !selection && !affirmative {
        score += 2;
    }

    if is_dismissal(d) {
        score -= 50;
    }

    score
}

fn is_selection_target(d: &Descriptor) -> bool {
    d.has_rating_attr
        || !d.aria_checked.is_empty()
        || d.text.chars().any(|c| SELECTION_GLYPHS.contains(&c))
}

fn is_button_like(d: &Descriptor) -> bool {
    d.tag == "button"
        || d.tag == "a"
        || d.role == "button"
        || (d.tag == "input" && matches!(d.input_type.as_str(), "button" | "submit" | "reset"))
}

/// True for controls whose silence after a tap is worth reporting.
pub fn is_primary_actionable(d: &Descriptor) -> bool {
    d.tag == "button"
        || d.role == "button"
        || d.tag == "a"
        || (d.tag == "input" && matches!(d.input_type.as_str(), "button" | "submit"))
}

/// Dismissal detection. Visible text outranks attribute hints: a button
/// labelled "Submit" is never a dismissal no matter what its class or
/// aria-label says, while icon-only and unlabelled controls fall back to
/// their attributes.
pub fn is_dismissal(d: &Descriptor) -> bool {
    let text = d.text.trim();
    if matches!(text, "x" | "X" | "×" | "✕" | "✖") {
        return true;
    }
    if text.chars().count() > 2 {
        if has_word(text, AFFIRMATIVE_WORDS) {
            return false;
        }
        return has_word(text, DISMISSAL_WORDS);
    }
    d.has_dismiss_attr || has_word(&d.attr_text(), DISMISSAL_WORDS)
}

fn has_word(haystack: &str, words: &[&str]) -> bool {
    let lower = haystack.to_lowercase();
    lower
        .split(|c: char| !c.is_alphanumeric())
        .any(|token| !token.is_empty() && words.contains(&token))
}

/// A ranked element the loop may drive this round.
#[derive(Debug, Clone)]
pub struct Candidate {
    /// Position in the scanned element list; joins the descriptor to its
    /// handle from `find_elements` on the same selector.
    pub index: usize,
    pub score: i32,
    pub kind: InteractionKind,
    pub descriptor: Descriptor,
}

/// Filter to visible, enabled, not-yet-driven elements and sort by score.
/// The sort is stable, so equal scores keep document order.
pub fn rank_candidates(descriptors: &[Descriptor], executed: &HashSet<String>) -> Vec<Candidate> {
    let mut candidates: Vec<Candidate> = descriptors
        .iter()
        .enumerate()
        .filter(|(_, d)| d.visible && !d.disabled)
        .filter(|(_, d)| !executed.contains(&d.signature()))
        .map(|(index, d)| Candidate {
            index,
            score: score(d),
            kind: classify(d),
            descriptor: d.clone(),
        })
        .collect();
    candidates.sort_by(|a, b| b.score.cmp(&a.score));
    candidates
}

/// Synthetic value for a text-entry control, picked from its type and
/// naming hints.
pub fn fill_value(d: &Descriptor) -> String {
    let hints = format!("{} {} {}", d.name, d.id, d.placeholder).to_lowercase();
    let t = d.input_type.as_str();
    if t == "email" || hints.contains("email") {
        "qa.tester@example.com".to_string()
    } else if t == "tel" || hints.contains("phone") || hints.contains("mobile") {
        "5551234567".to_string()
    } else if t == "number"
        || hints.contains("amount")
        || hints.contains("age")
        || hints.contains("qty")
        || hints.contains("quantity")
    {
        "42".to_string()
    } else if t == "date" {
        "2025-01-15".to_string()
    } else if t == "password" || hints.contains("password") {
        "Str0ng!Pass".to_string()
    } else if t == "url" || hints.contains("website") {
        "https://example.com".to_string()
    } else if hints.contains("zip") || hints.contains("postal") {
        "94105".to_string()
    } else if hints.contains("name") {
        "Alex Tester".to_string()
    } else {
        "test".to_string()
    }
}

/// Touch strokes covering a scratch surface: two horizontal passes and one
/// vertical, all inside the element's box.
pub fn scratch_strokes(d: &Descriptor) -> Vec<Stroke> {
    let x = d.x;
    let y = d.y;
    let w = d.w.max(10);
    let h = d.h.max(10);
    vec![
        Stroke {
            x1: x + w / 10,
            y1: y + h / 2,
            x2: x + 9 * w / 10,
            y2: y + h / 2,
        },
        Stroke {
            x1: x + w / 10,
            y1: y + h / 4,
            x2: x + 9 * w / 10,
            y2: y + 3 * h / 4,
        },
        Stroke {
            x1: x + w / 2,
            y1: y + h / 10,
            x2: x + w / 2,
            y2: y + 9 * h / 10,
        },
    ]
}
