//! Chromium-backed implementation of the browser capability contract.
//!
//! Launches a headless Chromium via `chromiumoxide` and keeps its CDP event
//! handler alive on a tracked task. The handler task must be aborted when the
//! engine is dropped or it would run forever after the browser exits.

use std::time::Duration;

use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::page::Page;
use futures::StreamExt;
use tokio::task::JoinHandle;

use crate::engine::{BrowserEngine, EngineError, PageSession};

/// Extra settle time after the navigation event, for late JS rendering.
const RENDER_SETTLE: Duration = Duration::from_millis(750);

pub struct ChromiumEngine {
    browser: Browser,
    handler: JoinHandle<()>,
}

impl ChromiumEngine {
    /// Launches a headless browser with the given user agent.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Launch`] if the browser config is invalid or
    /// the Chromium process cannot be started.
    pub async fn launch(user_agent: &str) -> Result<Self, EngineError> {
        let config = BrowserConfig::builder()
            .request_timeout(Duration::from_secs(60))
            .window_size(1440, 900)
            .arg(format!("--user-agent={user_agent}"))
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--mute-audio")
            .arg("--hide-scrollbars")
            .build()
            .map_err(EngineError::Launch)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| EngineError::Launch(e.to_string()))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!(error = %e, "browser event handler error");
                }
            }
            tracing::debug!("browser event handler finished");
        });

        Ok(Self {
            browser,
            handler: handler_task,
        })
    }

    /// Closes the browser process. Best effort; the drop path aborts the
    /// handler either way.
    pub async fn shutdown(mut self) {
        if let Err(e) = self.browser.close().await {
            tracing::warn!(error = %e, "browser close failed");
        }
    }
}

impl Drop for ChromiumEngine {
    fn drop(&mut self) {
        self.handler.abort();
    }
}

impl BrowserEngine for ChromiumEngine {
    type Page = ChromiumPage;

    async fn open(&self, url: &str) -> Result<Self::Page, EngineError> {
        let page = self
            .browser
            .new_page(url)
            .await
            .map_err(|e| EngineError::Navigation {
                url: url.to_string(),
                reason: e.to_string(),
            })?;
        Ok(ChromiumPage { page })
    }
}

pub struct ChromiumPage {
    page: Page,
}

impl PageSession for ChromiumPage {
    async fn wait_for_stable(&self, timeout: Duration) -> Result<(), EngineError> {
        let waited = tokio::time::timeout(timeout, async {
            self.page
                .wait_for_navigation()
                .await
                .map_err(|e| EngineError::Protocol(e.to_string()))?;
            // wait_for_navigation resolves on the HTTP response; storefront
            // tiles are rendered by JS afterwards.
            tokio::time::sleep(RENDER_SETTLE).await;
            Ok(())
        })
        .await;

        match waited {
            Ok(result) => result,
            Err(_) => Err(EngineError::StableTimeout {
                timeout_secs: timeout.as_secs(),
            }),
        }
    }

    async fn query_text(&self, selector: &str) -> Result<Option<String>, EngineError> {
        let Ok(element) = self.page.find_element(selector).await else {
            return Ok(None);
        };
        let text = element
            .inner_text()
            .await
            .map_err(|e| EngineError::Protocol(e.to_string()))?;
        Ok(text.map(|t| t.trim().to_string()).filter(|t| !t.is_empty()))
    }

    async fn current_content(&self) -> Result<String, EngineError> {
        self.page
            .content()
            .await
            .map_err(|e| EngineError::Protocol(e.to_string()))
    }

    async fn close(self) -> Result<(), EngineError> {
        self.page
            .close()
            .await
            .map_err(|e| EngineError::Protocol(e.to_string()))
    }
}
