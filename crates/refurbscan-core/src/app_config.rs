use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub log_level: String,
    /// Optional path to a countries YAML file; the compiled-in registry is
    /// used when `None`.
    pub countries_path: Option<PathBuf>,
    /// Path of the output artifact file.
    pub output_path: PathBuf,
    /// Hard cap on listing pages fetched per country.
    pub max_pages_per_country: usize,
    /// Base delay between page fetches within one country, before jitter.
    pub page_delay_ms: u64,
    /// Bounded wait for a page's dynamic content to settle.
    pub stable_timeout_secs: u64,
    /// Per-page navigation retry budget before a country is failed.
    pub max_nav_retries: u32,
    /// Base for exponential backoff after a blocked/challenge response.
    pub backoff_base_secs: u64,
    pub user_agent: String,
}
