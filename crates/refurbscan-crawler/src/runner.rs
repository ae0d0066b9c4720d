//! Per-country run controller.
//!
//! Drives one country through navigate → extract → normalize → merge and
//! classifies the outcome. Countries are isolated: a failed country reports
//! [`CountryStatus::Failed`] and leaves the artifact's prior slice untouched,
//! while a partial country merges what it did collect.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::Utc;

use refurbscan_core::{ArtifactFile, StorefrontTarget};

use crate::artifact::merge_country;
use crate::backoff::{backoff_delay, is_retriable, jittered_delay};
use crate::engine::BrowserEngine;
use crate::error::CrawlError;
use crate::extract::extract_listings;
use crate::navigator::Navigator;
use crate::normalize::normalize_candidates;
use crate::types::CandidateListing;

#[derive(Debug, Clone)]
pub struct CrawlOptions {
    /// Hard cap on pages fetched per country.
    pub max_pages: usize,
    /// Base inter-page delay; jittered ±25% before each fetch.
    pub page_delay_ms: u64,
    /// How long to wait for a page render to settle.
    pub stable_timeout: Duration,
    /// Retries per page for transport failures and challenges.
    pub max_nav_retries: u32,
    /// Base for the exponential retry backoff.
    pub backoff_base_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountryStatus {
    /// Every page fetched and merged.
    Done,
    /// Some pages failed or the run was stopped; what was collected merged.
    Partial,
    /// Retries exhausted; nothing merged, the prior slice stands.
    Failed,
}

#[derive(Debug)]
pub struct CountryReport {
    pub country_code: String,
    pub status: CountryStatus,
    pub pages_ok: usize,
    pub pages_failed: usize,
    /// Records merged into the artifact this run.
    pub listings: usize,
    pub error: Option<CrawlError>,
}

/// Crawls one country and merges the result into `artifact`.
///
/// `stop` is checked at each page boundary; when set, the country finishes
/// early as [`CountryStatus::Partial`] with everything collected so far
/// merged.
pub async fn run_country<E: BrowserEngine>(
    engine: &E,
    target: &StorefrontTarget,
    options: &CrawlOptions,
    artifact: &mut ArtifactFile,
    stop: &AtomicBool,
) -> CountryReport {
    let mut navigator = Navigator::new(engine, target, options.max_pages, options.stable_timeout);

    let mut candidates: Vec<CandidateListing> = Vec::new();
    let mut pages_ok = 0usize;
    let mut pages_failed = 0usize;
    let mut retries = 0u32;
    let mut stopped = false;
    let mut fatal: Option<CrawlError> = None;

    loop {
        if stop.load(Ordering::Relaxed) {
            stopped = true;
            break;
        }

        if pages_ok + pages_failed > 0 && options.page_delay_ms > 0 {
            tokio::time::sleep(jittered_delay(options.page_delay_ms)).await;
        }

        match navigator.fetch_next().await {
            Ok(Some(capture)) => {
                retries = 0;
                let page_candidates = extract_listings(&capture, &target.base_url);
                if page_candidates.is_empty() {
                    tracing::warn!(
                        country = %target.country_code,
                        page = capture.page_index,
                        "page rendered but yielded no candidates"
                    );
                }
                pages_ok += 1;
                candidates.extend(page_candidates);
            }
            Ok(None) => break,
            Err(e) if is_retriable(&e) => {
                if retries >= options.max_nav_retries {
                    fatal = Some(e);
                    break;
                }
                let delay = backoff_delay(options.backoff_base_secs, retries);
                tracing::warn!(
                    country = %target.country_code,
                    error = %e,
                    attempt = retries + 1,
                    delay_secs = delay.as_secs(),
                    "retriable page failure, backing off"
                );
                retries += 1;
                tokio::time::sleep(delay).await;
            }
            Err(e) => {
                tracing::warn!(
                    country = %target.country_code,
                    error = %e,
                    "page failed, continuing with the next one"
                );
                pages_failed += 1;
                retries = 0;
            }
        }
    }

    if let Some(e) = fatal {
        tracing::error!(
            country = %target.country_code,
            error = %e,
            pages_ok,
            "country failed, prior artifact slice left untouched"
        );
        return CountryReport {
            country_code: target.country_code.clone(),
            status: CountryStatus::Failed,
            pages_ok,
            pages_failed,
            listings: 0,
            error: Some(e),
        };
    }

    let now = Utc::now();
    let records = normalize_candidates(candidates, target, now);
    let listings = records.len();
    if pages_ok > 0 {
        merge_country(artifact, &target.country_code, records, now);
    }

    let status = if stopped || pages_failed > 0 {
        CountryStatus::Partial
    } else {
        CountryStatus::Done
    };

    tracing::info!(
        country = %target.country_code,
        status = ?status,
        pages_ok,
        pages_failed,
        listings,
        "country finished"
    );

    CountryReport {
        country_code: target.country_code.clone(),
        status,
        pages_ok,
        pages_failed,
        listings,
        error: None,
    }
}

#[cfg(test)]
#[path = "runner_test.rs"]
mod tests;
