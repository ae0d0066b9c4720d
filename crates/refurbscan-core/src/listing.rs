//! Canonical persisted listing types and the output artifact schema.
//!
//! Field names on these types are the compatibility contract with the static
//! viewer page that consumes the artifact file. Renaming a serialized field
//! is a breaking change for the viewer; add, don't rename.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// One refurbished listing in its canonical, persisted form.
///
/// Created on first observation, updated in place on re-observation, and
/// retained across runs until explicitly pruned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingRecord {
    /// Stable fingerprint, see [`listing_fingerprint`].
    pub id: String,
    pub country_code: String,
    /// Canonical model line, e.g. `"MacBook Pro"`.
    pub model_family: String,
    /// Remaining configuration text, e.g. `"14-inch M3 Pro 18GB 512GB"`.
    pub configuration_summary: String,
    /// Price in minor currency units (cents, pence, öre). Never negative.
    pub price_amount: i64,
    pub currency_code: String,
    pub availability_flag: bool,
    pub source_url: String,
    pub first_seen_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
}

/// Per-country slice of the output artifact: listing id → record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryArtifact {
    pub country_code: String,
    pub listings: BTreeMap<String, ListingRecord>,
    pub generated_at: DateTime<Utc>,
}

impl CountryArtifact {
    #[must_use]
    pub fn empty(country_code: &str, generated_at: DateTime<Utc>) -> Self {
        Self {
            country_code: country_code.to_string(),
            listings: BTreeMap::new(),
            generated_at,
        }
    }
}

/// The on-disk artifact: the union of all per-country slices.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArtifactFile {
    #[serde(default)]
    pub generated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub countries: BTreeMap<String, CountryArtifact>,
}

/// Derives the stable listing id from the identity fields.
///
/// SHA-256 over the fields joined with `\n` (none of them may contain a
/// newline after normalization), truncated to 16 hex characters. The same
/// inputs always produce the same id, so repeated runs update rather than
/// duplicate a listing.
#[must_use]
pub fn listing_fingerprint(
    country_code: &str,
    model_family: &str,
    configuration_summary: &str,
    source_url: &str,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(country_code.as_bytes());
    hasher.update(b"\n");
    hasher.update(model_family.as_bytes());
    hasher.update(b"\n");
    hasher.update(configuration_summary.as_bytes());
    hasher.update(b"\n");
    hasher.update(source_url.as_bytes());
    let digest = hasher.finalize();

    let mut out = String::with_capacity(16);
    for byte in digest.iter().take(8) {
        use std::fmt::Write;
        // Writing to a String cannot fail.
        let _ = write!(out, "{byte:02x}");
    }
    out
}
