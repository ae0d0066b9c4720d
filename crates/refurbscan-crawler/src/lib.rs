pub mod artifact;
pub mod backoff;
pub mod engine;
pub mod error;
pub mod extract;
pub mod navigator;
pub mod normalize;
mod price;
pub mod runner;
pub mod types;

pub use engine::{BrowserEngine, EngineError, PageSession};
pub use error::CrawlError;
pub use navigator::Navigator;
pub use runner::{run_country, CountryReport, CountryStatus, CrawlOptions};
pub use types::{CandidateListing, RawPageCapture};

#[cfg(test)]
pub(crate) mod test_engine;
