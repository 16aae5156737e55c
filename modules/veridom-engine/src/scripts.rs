//! Scripts evaluated inside the rendered page.
//!
//! Everything here is plain ES5-ish JavaScript so it runs the same under any
//! WebDriver-driven Chromium. Element-scoped scripts receive the element as
//! `arguments[0]`.

/// Broad capability selector for interactive-element scans. Document order of
/// the matches lines up with the handle list from `find_elements`, so the two
/// can be joined by index.
pub const INTERACTIVE_SELECTOR: &str = "button, a, input, textarea, select, \
     [role='button'], [role='slider'], [onclick], canvas, \
     [class*='scratch'], [class*='spin']";

/// Selector counted as "buttons" in the UI inventory.
pub const BUTTON_SELECTOR: &str =
    "button, input[type='button'], input[type='submit'], a[class*='btn']";

/// First primary control tapped during the Android pass.
pub const PRIMARY_CONTROL_SELECTOR: &str =
    "button, a, input[type='button'], input[type='submit']";

/// Script that describes every interactive element, in document order.
pub fn scan_script() -> String {
    format!(
        r#"
const items = [];
for (const el of document.querySelectorAll("{INTERACTIVE_SELECTOR}")) {{
    const rect = el.getBoundingClientRect();
    const style = window.getComputedStyle(el);
    const visible = rect.width > 0 && rect.height > 0 &&
        style.display !== 'none' && style.visibility !== 'hidden';
    items.push({{
        tag: el.tagName.toLowerCase(),
        id: el.id || '',
        classes: (el.getAttribute('class') || '').split(/\s+/).filter(Boolean),
        text: (el.innerText || el.value || '').trim().slice(0, 50),
        role: el.getAttribute('role') || '',
        input_type: (el.getAttribute('type') || '').toLowerCase(),
        name: el.getAttribute('name') || el.getAttribute('aria-label') || '',
        placeholder: el.getAttribute('placeholder') || '',
        aria_checked: el.getAttribute('aria-checked') || '',
        rating: el.hasAttribute('data-rating') || el.hasAttribute('data-value') ||
            el.hasAttribute('data-star'),
        dismiss: el.hasAttribute('data-dismiss'),
        visible: visible,
        disabled: !!el.disabled || el.getAttribute('aria-disabled') === 'true',
        x: Math.round(rect.left),
        y: Math.round(rect.top),
        w: Math.round(rect.width),
        h: Math.round(rect.height)
    }});
}}
return items;
"#
    )
}

/// Reports the rendered viewport size.
pub const VIEWPORT_SIZE: &str =
    "return { width: window.innerWidth, height: window.innerHeight };";

/// Horizontal overflow probe.
pub const SCROLL_WIDTH: &str = "return document.body ? document.body.scrollWidth : 0;";

/// Component counts, visible text, and the primary button's computed colors.
pub fn inventory_script() -> String {
    format!(
        r#"
const count = (sel) => document.querySelectorAll(sel).length;
const result = {{
    buttons: count("{BUTTON_SELECTOR}"),
    inputs: count("input:not([type='hidden'])"),
    images: count("img"),
    text: (document.body && document.body.innerText) || '',
    primary_bg: 'N/A',
    primary_text: 'N/A'
}};
const btn = document.querySelector("button, input[type='submit'], a[class*='btn']");
if (btn) {{
    const style = window.getComputedStyle(btn);
    result.primary_bg = style.backgroundColor;
    result.primary_text = style.color;
}}
return result;
"#
    )
}

/// Typography and modern-CSS signals from a representative element.
pub const STYLE_DNA: &str = r#"
const el = document.querySelector('button') || document.querySelector('.card') ||
    document.querySelector('div');
const style = window.getComputedStyle(el || document.body);
const features = [];
if (style.boxShadow !== 'none') features.push('Shadows');
if (parseInt(style.borderRadius) > 0) features.push('Rounded Corners');
if (style.backgroundImage.includes('gradient')) features.push('Gradients');
if (style.backdropFilter && style.backdropFilter !== 'none') features.push('Glassmorphism');
return {
    font_family: window.getComputedStyle(document.body).fontFamily,
    features: features
};
"#;

/// Drains the event log the instrumentation shim accumulates.
pub const READ_EVENTS: &str = "return window.__veridom_events || [];";

/// Runs the injected accessibility rule engine, if present, through the
/// driver-appended completion callback.
pub const RULE_RUNNER: &str = r#"
const done = arguments[arguments.length - 1];
if (!window.axe || typeof window.axe.run !== 'function') {
    done({ missing: true, violations: [] });
    return;
}
window.axe.run(document)
    .then((report) => done({
        violations: (report.violations || []).map((v) => ({
            impact: v.impact || '',
            help: v.help || '',
            nodes: (v.nodes || []).length
        }))
    }))
    .catch((e) => done({ error: String(e), violations: [] }));
"#;

/// Script-dispatched click for elements whose native click is intercepted.
pub const FORCE_CLICK: &str = "arguments[0].click();";

/// Advance a `<select>` to its second option and fire `change`.
pub const SELECT_SECOND_OPTION: &str = r#"
const el = arguments[0];
if (!el.options || el.options.length === 0) return false;
el.selectedIndex = el.options.length > 1 ? 1 : 0;
el.dispatchEvent(new Event('change', { bubbles: true }));
return true;
"#;

/// Click the label associated with a checkbox or radio, falling back to a
/// script click on the control itself.
pub const TOGGLE_VIA_LABEL: &str = r#"
const el = arguments[0];
let label = null;
if (el.id) label = document.querySelector('label[for="' + el.id + '"]');
if (!label) label = el.closest('label');
if (label) {
    label.click();
    return true;
}
el.click();
return false;
"#;
