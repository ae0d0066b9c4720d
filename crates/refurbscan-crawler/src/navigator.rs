//! Sequential page navigation over one storefront's listing pages.
//!
//! The navigator owns no retry policy. It reports each page-scoped failure
//! and leaves the decision to the run controller: after a
//! [`CrawlError::Navigation`] or [`CrawlError::Blocked`] the same page is
//! attempted again on the next call, while a [`CrawlError::RenderTimeout`]
//! skips the page so one stuck render cannot stall the whole country.

use std::time::Duration;

use chrono::Utc;

use refurbscan_core::StorefrontTarget;

use crate::engine::{BrowserEngine, EngineError, PageSession};
use crate::error::CrawlError;
use crate::extract::has_listing_markup;
use crate::types::RawPageCapture;

/// Challenge/denial markers checked against rendered content. A match is a
/// retriable [`CrawlError::Blocked`], not a successful capture.
const BLOCK_MARKERS: &[&str] = &[
    "access denied",
    "request blocked",
    "verify you are human",
    "captcha",
    "unusual traffic",
    "pardon our interruption",
];

pub struct Navigator<'a, E: BrowserEngine> {
    engine: &'a E,
    target: &'a StorefrontTarget,
    max_pages: usize,
    stable_timeout: Duration,
    next_index: usize,
    exhausted: bool,
}

impl<'a, E: BrowserEngine> Navigator<'a, E> {
    pub fn new(
        engine: &'a E,
        target: &'a StorefrontTarget,
        max_pages: usize,
        stable_timeout: Duration,
    ) -> Self {
        Self {
            engine,
            target,
            max_pages,
            stable_timeout,
            next_index: 0,
            exhausted: false,
        }
    }

    /// Index of the page the next [`fetch_next`](Self::fetch_next) call will
    /// attempt.
    #[must_use]
    pub fn next_page_index(&self) -> usize {
        self.next_index
    }

    /// Fetches the next listing page, lazily.
    ///
    /// Returns `Ok(None)` once the sequence is exhausted: the pagination
    /// strategy has no further URL, a page past the first renders without any
    /// listing markup, or the page cap is reached.
    ///
    /// # Errors
    ///
    /// Page-scoped [`CrawlError`]s. [`CrawlError::RenderTimeout`] consumes
    /// the page (the next call moves on); [`CrawlError::Navigation`] and
    /// [`CrawlError::Blocked`] leave the cursor in place so the caller can
    /// retry after backing off.
    pub async fn fetch_next(&mut self) -> Result<Option<RawPageCapture>, CrawlError> {
        if self.exhausted || self.next_index >= self.max_pages {
            return Ok(None);
        }
        let page_index = self.next_index;

        let Some(url) = self.target.page_url(page_index) else {
            self.exhausted = true;
            return Ok(None);
        };

        tracing::debug!(
            country = %self.target.country_code,
            page = page_index,
            url = %url,
            "fetching listing page"
        );

        let page = self
            .engine
            .open(&url)
            .await
            .map_err(|source| CrawlError::Navigation { page_index, source })?;

        if let Err(e) = page.wait_for_stable(self.stable_timeout).await {
            let result = match e {
                EngineError::StableTimeout { timeout_secs } => {
                    // Skip the page rather than retrying a render that will
                    // not settle.
                    self.next_index += 1;
                    Err(CrawlError::RenderTimeout {
                        page_index,
                        timeout_secs,
                    })
                }
                other => Err(CrawlError::Navigation {
                    page_index,
                    source: other,
                }),
            };
            close_quietly(page, &self.target.country_code, page_index).await;
            return result;
        }

        let content = match page.current_content().await {
            Ok(content) => content,
            Err(source) => {
                close_quietly(page, &self.target.country_code, page_index).await;
                return Err(CrawlError::Navigation { page_index, source });
            }
        };
        close_quietly(page, &self.target.country_code, page_index).await;

        if is_blocked(&content) {
            return Err(CrawlError::Blocked { page_index });
        }

        // Pages past the first that render without listing markup mark the
        // end of the sequence.
        if page_index > 0 && !has_listing_markup(&content) {
            self.exhausted = true;
            return Ok(None);
        }

        self.next_index += 1;
        Ok(Some(RawPageCapture {
            storefront_country: self.target.country_code.clone(),
            page_index,
            rendered_content: content,
            captured_at: Utc::now(),
        }))
    }
}

fn is_blocked(content: &str) -> bool {
    let lower = content.to_lowercase();
    BLOCK_MARKERS.iter().any(|marker| lower.contains(marker))
}

async fn close_quietly<P: PageSession>(page: P, country: &str, page_index: usize) {
    if let Err(e) = page.close().await {
        tracing::debug!(country = %country, page = page_index, error = %e, "page close failed");
    }
}

#[cfg(test)]
#[path = "navigator_test.rs"]
mod tests;
