use thiserror::Error;

use crate::engine::EngineError;

/// Failure taxonomy for the crawl pipeline.
///
/// Failures are classified at the smallest scope that can absorb them:
/// a candidate ([`CrawlError::UnparsablePrice`]), a page
/// ([`CrawlError::RenderTimeout`], [`CrawlError::Navigation`],
/// [`CrawlError::Blocked`]), or a country's artifact write
/// ([`CrawlError::Write`], [`CrawlError::Serialize`]). The run controller
/// escalates only when recovery at the original scope is impossible.
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("page {page_index} did not reach a stable render within {timeout_secs}s")]
    RenderTimeout { page_index: usize, timeout_secs: u64 },

    #[error("navigation failed on page {page_index}: {source}")]
    Navigation {
        page_index: usize,
        #[source]
        source: EngineError,
    },

    #[error("blocked or challenged on page {page_index}")]
    Blocked { page_index: usize },

    #[error("no numeric price token in {raw:?}")]
    UnparsablePrice { raw: String },

    #[error("failed to serialize artifact for {context}: {source}")]
    Serialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("artifact write failed for {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("artifact read failed for {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("artifact parse failed for {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}
