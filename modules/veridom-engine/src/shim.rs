//! Document staging: instrumentation shim plus on-disk `file://` delivery.
//!
//! Generated documents routinely carry vendor SDK calls and `document.write`
//! tricks that would crash or blank the page in a clean browser. The shim is
//! spliced in ahead of all document scripts so those land on stubs instead,
//! and every console error, page error, and stubbed call is accumulated in
//! `window.__veridom_events` for the engine to drain later.

use anyhow::{anyhow, Context, Result};
use regex::Regex;
use std::io::Write;
use tempfile::NamedTempFile;
use url::Url;

const SHIM_HEAD: &str = r#"(function () {
  window.__veridom_events = [];
  var log = function (kind, message) {
    try { window.__veridom_events.push(kind + ': ' + message); } catch (e) {}
  };
  var origError = console.error;
  console.error = function () {
    log('console-error', Array.prototype.slice.call(arguments).join(' '));
    if (origError) origError.apply(console, arguments);
  };
  var origWarn = console.warn;
  console.warn = function () {
    log('console-warn', Array.prototype.slice.call(arguments).join(' '));
    if (origWarn) origWarn.apply(console, arguments);
  };
  window.onerror = function (message, source, lineno) {
    log('page-error', message + ' (' + (source || 'inline') + ':' + lineno + ')');
    return false;
  };
  var sdkStub = function (name) {
    return new Proxy(function () {}, {
      get: function (target, prop) {
        if (typeof prop === 'symbol') return undefined;
        log('sdk', name + '.' + String(prop));
        return sdkStub(name + '.' + String(prop));
      },
      apply: function () {
        log('sdk', name + '()');
        return undefined;
      }
    });
  };
"#;

const SHIM_TAIL: &str = r#"  document.write = function (markup) {
    log('sdk', 'document.write intercepted');
    try {
      if (document.body) document.body.insertAdjacentHTML('beforeend', markup);
    } catch (e) {}
  };
  window.open = function (url) {
    log('sdk', 'window.open intercepted: ' + url);
    return null;
  };
})();
"#;

/// The shim script with a stub installed for each configured SDK global.
pub fn instrumentation_shim(sdk_globals: &[String]) -> String {
    let stubs: String = sdk_globals
        .iter()
        .map(|name| format!("  window['{name}'] = sdkStub('{name}');\n"))
        .collect();
    format!("{SHIM_HEAD}{stubs}{SHIM_TAIL}")
}

/// Splice the shim into `html` ahead of any document script: right after the
/// opening `<head>` when there is one, after `<html>` otherwise, or prepended
/// to fragments with neither.
pub fn splice_shim(html: &str, shim: &str) -> String {
    let tag = format!("<script>{shim}</script>");
    let head_re = Regex::new(r"(?i)<head[^>]*>").expect("valid regex");
    if let Some(m) = head_re.find(html) {
        let mut out = String::with_capacity(html.len() + tag.len());
        out.push_str(&html[..m.end()]);
        out.push_str(&tag);
        out.push_str(&html[m.end()..]);
        return out;
    }
    let html_re = Regex::new(r"(?i)<html[^>]*>").expect("valid regex");
    if let Some(m) = html_re.find(html) {
        let mut out = String::with_capacity(html.len() + tag.len());
        out.push_str(&html[..m.end()]);
        out.push_str(&tag);
        out.push_str(&html[m.end()..]);
        return out;
    }
    format!("{tag}{html}")
}

/// A shimmed document staged on disk. The backing file lives as long as this
/// value does, so keep it alive for the whole browser session.
pub struct StagedDocument {
    file: NamedTempFile,
    url: String,
}

impl StagedDocument {
    /// Splice the shim into `html` and write the result to a temp `.html`
    /// file the browser can load over `file://`.
    pub fn stage(html: &str, sdk_globals: &[String]) -> Result<Self> {
        let shimmed = splice_shim(html, &instrumentation_shim(sdk_globals));
        let mut file = tempfile::Builder::new()
            .prefix("veridom-")
            .suffix(".html")
            .tempfile()
            .context("Failed to create staging file")?;
        file.write_all(shimmed.as_bytes())
            .context("Failed to write staged document")?;
        file.flush().context("Failed to flush staged document")?;
        let url = Url::from_file_path(file.path())
            .map_err(|_| anyhow!("Staging path is not absolute: {:?}", file.path()))?
            .to_string();
        Ok(Self { file, url })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn path(&self) -> &std::path::Path {
        self.file.path()
    }
}
