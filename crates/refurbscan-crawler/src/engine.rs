//! Browser capability contract.
//!
//! The pipeline depends only on these traits, never on a concrete automation
//! backend. [`chromium`] provides the production implementation; tests script
//! fake engines instead of launching a browser.

pub mod chromium;

use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("browser launch failed: {0}")]
    Launch(String),

    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("page did not settle within {timeout_secs}s")]
    StableTimeout { timeout_secs: u64 },

    #[error("browser protocol error: {0}")]
    Protocol(String),
}

/// A live browser that can open rendered pages.
#[allow(async_fn_in_trait)]
pub trait BrowserEngine {
    type Page: PageSession;

    /// Opens `url` in a fresh page and begins loading it. The returned
    /// session is live until [`PageSession::close`] or drop.
    async fn open(&self, url: &str) -> Result<Self::Page, EngineError>;
}

/// One open page in a [`BrowserEngine`].
#[allow(async_fn_in_trait)]
pub trait PageSession {
    /// Waits until dynamic content has settled (no pending navigation or
    /// render activity), bounded by `timeout`.
    ///
    /// # Errors
    ///
    /// [`EngineError::StableTimeout`] when the page does not settle in time.
    async fn wait_for_stable(&self, timeout: Duration) -> Result<(), EngineError>;

    /// Returns the visible text of the first element matching `selector`,
    /// or `None` when no such element exists. Absence is not an error.
    async fn query_text(&self, selector: &str) -> Result<Option<String>, EngineError>;

    /// Returns the full rendered markup of the page as currently displayed.
    async fn current_content(&self) -> Result<String, EngineError>;

    /// Closes the page. Engines that tie resources to pages release them here.
    async fn close(self) -> Result<(), EngineError>;
}
