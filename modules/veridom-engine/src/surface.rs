//! Seam between the exploration engine and a live browser.
//!
//! Everything the engine does to a page goes through [`RenderSurface`], so
//! sessions can be scripted in tests without a WebDriver endpoint behind them.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;

use webdriver_client::{PointerAction, WebDriverClient};

use crate::scripts;

// --- Viewport profiles ---

/// A named device class applied to the surface before a phase runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewportProfile {
    pub name: &'static str,
    pub width: u32,
    pub height: u32,
}

/// Desktop context used for the inventory and style extraction phases.
pub const DESKTOP: ViewportProfile = ViewportProfile {
    name: "desktop",
    width: 1280,
    height: 720,
};

/// iPhone 12 class portrait profile. The interaction loop runs here.
pub const MOBILE_PORTRAIT: ViewportProfile = ViewportProfile {
    name: "mobile-portrait",
    width: 390,
    height: 844,
};

/// Rotated phone profile for the horizontal-overflow check.
pub const MOBILE_LANDSCAPE: ViewportProfile = ViewportProfile {
    name: "mobile-landscape",
    width: 844,
    height: 390,
};

/// Pixel 5 class Android profile.
pub const ANDROID: ViewportProfile = ViewportProfile {
    name: "android",
    width: 412,
    height: 915,
};

/// One press-drag-release segment in viewport coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stroke {
    pub x1: i64,
    pub y1: i64,
    pub x2: i64,
    pub y2: i64,
}

// --- RenderSurface trait ---

/// A rendered document the engine can inspect and poke.
///
/// Element handles come from [`find_elements`](RenderSurface::find_elements)
/// and stay valid until the DOM is replaced underneath them.
#[async_trait]
pub trait RenderSurface: Send + Sync {
    async fn goto(&self, url: &str) -> Result<()>;

    async fn current_url(&self) -> Result<String>;

    async fn page_source(&self) -> Result<String>;

    async fn set_viewport(&self, width: u32, height: u32) -> Result<()>;

    /// Run a script in the page and return its value.
    async fn execute(&self, script: &str) -> Result<Value>;

    /// Run a promise-style script that reports through a completion callback.
    async fn execute_async(&self, script: &str) -> Result<Value>;

    /// Handles for every element matching `css`, in document order.
    async fn find_elements(&self, css: &str) -> Result<Vec<String>>;

    async fn click(&self, handle: &str) -> Result<()>;

    /// Synthetic click dispatched from script, for when the native one is
    /// intercepted by an overlay.
    async fn force_click(&self, handle: &str) -> Result<()>;

    async fn send_keys(&self, handle: &str, text: &str) -> Result<()>;

    /// Pick the second option of a `<select>`, or the first when only one
    /// exists. Returns false when the element has no options.
    async fn select_option(&self, handle: &str) -> Result<bool>;

    /// Toggle a checkbox or radio through its associated label.
    async fn toggle_via_label(&self, handle: &str) -> Result<bool>;

    async fn drag(&self, strokes: &[Stroke]) -> Result<()>;

    /// Base64 PNG of the current viewport.
    async fn screenshot(&self) -> Result<String>;

    async fn close(&self) -> Result<()>;
}

/// Opens a fresh [`RenderSurface`] for each evaluated document.
#[async_trait]
pub trait SurfaceProvider: Send + Sync {
    async fn open(&self) -> Result<Box<dyn RenderSurface>>;
}

// --- WebDriver-backed surface ---

/// One WebDriver session, torn down on [`RenderSurface::close`].
pub struct WebDriverSurface {
    client: WebDriverClient,
    session_id: String,
}

impl WebDriverSurface {
    pub async fn open(base_url: &str) -> Result<Self> {
        let client = WebDriverClient::new(base_url);
        let session_id = client
            .new_session()
            .await
            .context("Failed to open WebDriver session")?;
        Ok(Self { client, session_id })
    }
}

#[async_trait]
impl RenderSurface for WebDriverSurface {
    async fn goto(&self, url: &str) -> Result<()> {
        self.client.goto(&self.session_id, url).await?;
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        Ok(self.client.current_url(&self.session_id).await?)
    }

    async fn page_source(&self) -> Result<String> {
        Ok(self.client.page_source(&self.session_id).await?)
    }

    async fn set_viewport(&self, width: u32, height: u32) -> Result<()> {
        self.client
            .set_window_rect(&self.session_id, width, height)
            .await?;
        Ok(())
    }

    async fn execute(&self, script: &str) -> Result<Value> {
        Ok(self
            .client
            .execute(&self.session_id, script, Vec::new())
            .await?)
    }

    async fn execute_async(&self, script: &str) -> Result<Value> {
        Ok(self
            .client
            .execute_async(&self.session_id, script, Vec::new())
            .await?)
    }

    async fn find_elements(&self, css: &str) -> Result<Vec<String>> {
        Ok(self.client.find_elements(&self.session_id, css).await?)
    }

    async fn click(&self, handle: &str) -> Result<()> {
        self.client.element_click(&self.session_id, handle).await?;
        Ok(())
    }

    async fn force_click(&self, handle: &str) -> Result<()> {
        self.client
            .execute(
                &self.session_id,
                scripts::FORCE_CLICK,
                vec![WebDriverClient::element_arg(handle)],
            )
            .await?;
        Ok(())
    }

    async fn send_keys(&self, handle: &str, text: &str) -> Result<()> {
        self.client
            .element_send_keys(&self.session_id, handle, text)
            .await?;
        Ok(())
    }

    async fn select_option(&self, handle: &str) -> Result<bool> {
        let value = self
            .client
            .execute(
                &self.session_id,
                scripts::SELECT_SECOND_OPTION,
                vec![WebDriverClient::element_arg(handle)],
            )
            .await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    async fn toggle_via_label(&self, handle: &str) -> Result<bool> {
        let value = self
            .client
            .execute(
                &self.session_id,
                scripts::TOGGLE_VIA_LABEL,
                vec![WebDriverClient::element_arg(handle)],
            )
            .await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    async fn drag(&self, strokes: &[Stroke]) -> Result<()> {
        for stroke in strokes {
            self.client
                .perform_pointer_actions(
                    &self.session_id,
                    PointerAction::stroke(stroke.x1, stroke.y1, stroke.x2, stroke.y2),
                )
                .await?;
        }
        self.client.release_actions(&self.session_id).await?;
        Ok(())
    }

    async fn screenshot(&self) -> Result<String> {
        Ok(self.client.screenshot(&self.session_id).await?)
    }

    async fn close(&self) -> Result<()> {
        self.client.delete_session(&self.session_id).await?;
        Ok(())
    }
}

/// Default provider pointed at a WebDriver endpoint (chromedriver or a
/// Selenium hub).
pub struct WebDriverSurfaceProvider {
    base_url: String,
}

impl WebDriverSurfaceProvider {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl SurfaceProvider for WebDriverSurfaceProvider {
    async fn open(&self) -> Result<Box<dyn RenderSurface>> {
        Ok(Box::new(WebDriverSurface::open(&self.base_url).await?))
    }
}
