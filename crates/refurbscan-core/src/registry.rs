//! Static catalog of per-country refurbished storefronts.
//!
//! The registry is loaded from `config/countries.yaml` when present, with a
//! compiled-in default set covering the storefronts we crawl today. Each
//! entry carries everything the crawler needs to drive one country: the
//! landing URL, the locale, the storefront currency, and how its listing
//! pages paginate.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Currencies we know how to normalize. All are two-decimal currencies, so
/// minor-unit conversion is uniformly `major * 100`.
pub const KNOWN_CURRENCIES: &[&str] = &[
    "USD", "CAD", "MXN", "GBP", "EUR", "SEK", "CHF", "DKK", "NOK", "AUD", "NZD", "SGD",
];

/// How a storefront's listing pages advance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "kind")]
pub enum PaginationStrategy {
    /// Page number appended as a query parameter, 1-based (`?page=2`).
    QueryParam { param: String },
    /// Everything is rendered on the landing page; there is no page 2.
    SinglePage,
}

impl Default for PaginationStrategy {
    fn default() -> Self {
        PaginationStrategy::QueryParam {
            param: "page".to_string(),
        }
    }
}

/// One per-country storefront. Immutable once loaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorefrontTarget {
    /// Registry key, e.g. `"US"` or `"CH-DE"`.
    pub country_code: String,
    /// BCP 47 locale of the storefront, e.g. `"de-DE"`.
    pub locale: String,
    /// Landing URL of the refurbished category.
    pub base_url: String,
    /// ISO 4217 currency the storefront prices in.
    pub currency_code: String,
    #[serde(default)]
    pub pagination: PaginationStrategy,
}

impl StorefrontTarget {
    /// Builds the URL for the 0-based `page_index`.
    ///
    /// Returns `None` when the pagination strategy has no such page (every
    /// index past 0 for a single-page storefront).
    #[must_use]
    pub fn page_url(&self, page_index: usize) -> Option<String> {
        if page_index == 0 {
            return Some(self.base_url.clone());
        }
        match &self.pagination {
            PaginationStrategy::SinglePage => None,
            PaginationStrategy::QueryParam { param } => {
                let sep = if self.base_url.contains('?') { '&' } else { '?' };
                // Query pages are 1-based on the storefronts.
                Some(format!("{}{sep}{param}={}", self.base_url, page_index + 1))
            }
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CountriesFile {
    pub countries: Vec<StorefrontTarget>,
}

/// Load and validate the country registry from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails
/// validation.
pub fn load_countries(path: &Path) -> Result<CountriesFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::CountriesFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let countries_file: CountriesFile =
        serde_yaml::from_str(&content).map_err(ConfigError::CountriesFileParse)?;

    validate_countries(&countries_file)?;

    Ok(countries_file)
}

fn validate_countries(countries_file: &CountriesFile) -> Result<(), ConfigError> {
    if countries_file.countries.is_empty() {
        return Err(ConfigError::Validation(
            "countries file contains no entries".to_string(),
        ));
    }

    let mut seen_codes = HashSet::new();
    for target in &countries_file.countries {
        if target.country_code.trim().is_empty() {
            return Err(ConfigError::Validation(
                "country_code must be non-empty".to_string(),
            ));
        }

        let upper = target.country_code.to_uppercase();
        if !seen_codes.insert(upper) {
            return Err(ConfigError::Validation(format!(
                "duplicate country code: '{}'",
                target.country_code
            )));
        }

        if !target.base_url.starts_with("http://") && !target.base_url.starts_with("https://") {
            return Err(ConfigError::Validation(format!(
                "country '{}' has invalid base_url '{}'",
                target.country_code, target.base_url
            )));
        }

        if !KNOWN_CURRENCIES.contains(&target.currency_code.as_str()) {
            return Err(ConfigError::Validation(format!(
                "country '{}' has unknown currency '{}'",
                target.country_code, target.currency_code
            )));
        }
    }

    Ok(())
}

/// The compiled-in registry, used when no countries file is configured.
#[must_use]
pub fn builtin_targets() -> Vec<StorefrontTarget> {
    let defaults: &[(&str, &str, &str, &str)] = &[
        ("US", "en-US", "https://www.apple.com/shop/refurbished", "USD"),
        ("CA", "en-CA", "https://www.apple.com/ca/shop/refurbished", "CAD"),
        ("MX", "es-MX", "https://www.apple.com/mx/shop/refurbished", "MXN"),
        ("GB", "en-GB", "https://www.apple.com/uk/shop/refurbished", "GBP"),
        ("DE", "de-DE", "https://www.apple.com/de/shop/refurbished", "EUR"),
        ("FR", "fr-FR", "https://www.apple.com/fr/shop/refurbished", "EUR"),
        ("ES", "es-ES", "https://www.apple.com/es/shop/refurbished", "EUR"),
        ("IT", "it-IT", "https://www.apple.com/it/shop/refurbished", "EUR"),
        ("NL", "nl-NL", "https://www.apple.com/nl/shop/refurbished", "EUR"),
        ("SE", "sv-SE", "https://www.apple.com/se/shop/refurbished", "SEK"),
        ("IE", "en-IE", "https://www.apple.com/ie/shop/refurbished", "EUR"),
        (
            "CH-DE",
            "de-CH",
            "https://www.apple.com/ch-de/shop/refurbished",
            "CHF",
        ),
    ];

    defaults
        .iter()
        .map(|(code, locale, url, currency)| StorefrontTarget {
            country_code: (*code).to_string(),
            locale: (*locale).to_string(),
            base_url: (*url).to_string(),
            currency_code: (*currency).to_string(),
            pagination: PaginationStrategy::default(),
        })
        .collect()
}
