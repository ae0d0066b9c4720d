//! Ephemeral pipeline types, scoped to one page's processing.
//!
//! Nothing here is persisted. [`RawPageCapture`] is produced by the
//! navigator and discarded once extracted; [`CandidateListing`] feeds the
//! normalizer and may be malformed (missing price, truncated title); the
//! normalizer tolerates that per candidate rather than per page.

use chrono::{DateTime, Utc};

/// One rendered listing page as captured by the navigator.
#[derive(Debug, Clone)]
pub struct RawPageCapture {
    pub storefront_country: String,
    /// 0-based position in the country's page sequence.
    pub page_index: usize,
    /// Full rendered markup at capture time.
    pub rendered_content: String,
    pub captured_at: DateTime<Utc>,
}

/// A raw listing candidate extracted from a capture.
#[derive(Debug, Clone)]
pub struct CandidateListing {
    pub raw_title: String,
    /// May be empty when no price-like token was found near the listing.
    pub raw_price_text: String,
    /// Spec tokens (storage, memory, chip) mined from the listing markup.
    pub raw_specs_text: String,
    pub source_url: String,
    pub page_index: usize,
}
