//! Normalization from raw extracted candidates to canonical
//! [`ListingRecord`]s.
//!
//! Price parsing is delegated to [`crate::price`]; this module canonicalizes
//! titles into model family + configuration, derives availability, assigns
//! the stable fingerprint id, and deduplicates within the run. Completeness
//! wins over strict canonicalization: an unrecognized title passes through
//! with its raw text as the model family rather than being dropped.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;

use refurbscan_core::{listing_fingerprint, ListingRecord, StorefrontTarget};

use crate::price::parse_price;
use crate::types::CandidateListing;

/// Marketing/localized phrases stripped from titles before the family match
/// remainder becomes the configuration summary. Longest first.
const MARKETING_PHRASES: &[&str] = &[
    "certified refurbished",
    "refurbished",
    "remis à neuf",
    "reconditionné",
    "generalüberholtes",
    "generalüberholt",
    "wiederaufbereitet",
    "ricondizionato",
    "reacondicionado",
    "renoverad",
    "refurbi",
];

/// Model family lookup table. Most specific needle first: `ipad pro` must
/// match before `ipad`, `airpods max` before `airpods`.
const MODEL_FAMILIES: &[(&str, &str)] = &[
    ("macbook pro", "MacBook Pro"),
    ("macbook air", "MacBook Air"),
    ("mac mini", "Mac mini"),
    ("mac studio", "Mac Studio"),
    ("mac pro", "Mac Pro"),
    ("imac", "iMac"),
    ("ipad pro", "iPad Pro"),
    ("ipad air", "iPad Air"),
    ("ipad mini", "iPad mini"),
    ("ipad", "iPad"),
    ("iphone", "iPhone"),
    ("apple watch", "Apple Watch"),
    ("apple tv", "Apple TV"),
    ("homepod mini", "HomePod mini"),
    ("homepod", "HomePod"),
    ("airpods max", "AirPods Max"),
    ("airpods pro", "AirPods Pro"),
    ("airpods", "AirPods"),
    ("studio display", "Studio Display"),
    ("pro display xdr", "Pro Display XDR"),
];

/// Sold-out markers across the storefront locales.
const SOLD_OUT_MARKERS: &[&str] = &[
    "sold out",
    "out of stock",
    "currently unavailable",
    "ausverkauft",
    "nicht verfügbar",
    "épuisé",
    "agotado",
    "esaurito",
    "niet beschikbaar",
    "slutsåld",
];

fn go_unit_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b(\d{1,4})\s?[Gg]o\b").expect("unit pattern is a valid literal"))
}

fn to_unit_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b(\d{1,4})\s?To\b").expect("unit pattern is a valid literal"))
}

/// Normalizes one run's candidates for a country.
///
/// Candidates whose price cannot be parsed are dropped individually with a
/// warning. Within the run, records deduplicate on the fingerprint id;
/// the later duplicate in source order wins (re-rendered pagination repeats
/// boundary items), while output keeps the insertion order of the first
/// occurrence.
#[must_use]
pub fn normalize_candidates(
    candidates: Vec<CandidateListing>,
    target: &StorefrontTarget,
    now: DateTime<Utc>,
) -> Vec<ListingRecord> {
    let mut records: Vec<ListingRecord> = Vec::new();
    let mut index_by_id: HashMap<String, usize> = HashMap::new();

    for candidate in candidates {
        let record = match normalize_candidate(&candidate, target, now) {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(
                    country = %target.country_code,
                    page = candidate.page_index,
                    title = %candidate.raw_title,
                    error = %e,
                    "dropping candidate"
                );
                continue;
            }
        };

        match index_by_id.entry(record.id.clone()) {
            Entry::Occupied(slot) => {
                records[*slot.get()] = record;
            }
            Entry::Vacant(slot) => {
                slot.insert(records.len());
                records.push(record);
            }
        }
    }

    records
}

fn normalize_candidate(
    candidate: &CandidateListing,
    target: &StorefrontTarget,
    now: DateTime<Utc>,
) -> Result<ListingRecord, crate::CrawlError> {
    let (price_amount, currency_code) =
        parse_price(&candidate.raw_price_text, &target.currency_code)?;

    let (model_family, configuration_summary) =
        canonicalize_title(&candidate.raw_title, &candidate.raw_specs_text);

    let availability_flag = !is_sold_out(candidate);

    let id = listing_fingerprint(
        &target.country_code,
        &model_family,
        &configuration_summary,
        &candidate.source_url,
    );

    Ok(ListingRecord {
        id,
        country_code: target.country_code.clone(),
        model_family,
        configuration_summary,
        price_amount,
        currency_code,
        availability_flag,
        source_url: candidate.source_url.clone(),
        first_seen_at: now,
        last_seen_at: now,
    })
}

/// Splits a raw title into (model family, configuration summary).
///
/// When the title matches the family table, the family needle and marketing
/// phrases are removed and the remainder becomes the configuration summary
/// (falling back to the mined spec tokens when nothing remains). Unrecognized
/// titles pass through raw.
pub(crate) fn canonicalize_title(raw_title: &str, raw_specs_text: &str) -> (String, String) {
    let cleaned = strip_marketing(raw_title);

    for (needle, family) in MODEL_FAMILIES {
        if let Some((start, end)) = find_ci(&cleaned, needle) {
            let mut remainder = String::with_capacity(cleaned.len());
            remainder.push_str(&cleaned[..start]);
            remainder.push(' ');
            remainder.push_str(&cleaned[end..]);

            let summary = tidy_summary(&remainder);
            let summary = if summary.is_empty() {
                normalize_units(raw_specs_text)
            } else {
                normalize_units(&summary)
            };
            return ((*family).to_string(), summary);
        }
    }

    let fallback_family = if cleaned.is_empty() {
        raw_title.trim().to_string()
    } else {
        cleaned
    };
    (fallback_family, normalize_units(raw_specs_text))
}

fn strip_marketing(title: &str) -> String {
    let mut text = title.to_string();
    for phrase in MARKETING_PHRASES {
        while let Some((start, end)) = find_ci(&text, phrase) {
            text.replace_range(start..end, " ");
        }
    }
    tidy_summary(&text)
}

/// Case-insensitive substring search over the original text. Returns the
/// byte range of the match, always on char boundaries, so the surrounding
/// text keeps its casing. `needle` must already be lowercase.
fn find_ci(haystack: &str, needle: &str) -> Option<(usize, usize)> {
    for (start, _) in haystack.char_indices() {
        if let Some(len) = ci_match_len(&haystack[start..], needle) {
            return Some((start, start + len));
        }
    }
    None
}

/// Byte length of the prefix of `text` matching `needle` case-insensitively.
/// Characters whose lowercase mapping is not a single char never match.
fn ci_match_len(text: &str, needle: &str) -> Option<usize> {
    let mut needle_chars = needle.chars();
    let mut len = 0;
    for c in text.chars() {
        let Some(n) = needle_chars.next() else {
            return Some(len);
        };
        let mut lower = c.to_lowercase();
        if lower.next() != Some(n) || lower.next().is_some() {
            return None;
        }
        len += c.len_utf8();
    }
    if needle_chars.next().is_none() {
        Some(len)
    } else {
        None
    }
}

fn tidy_summary(text: &str) -> String {
    let collapsed = crate::extract::collapse_whitespace(text);
    collapsed
        .trim_matches(|c: char| c.is_whitespace() || ",-–—:;".contains(c))
        .to_string()
}

/// Converts French storage units (`Go`/`To`) to `GB`/`TB` so configurations
/// compare across storefronts.
fn normalize_units(text: &str) -> String {
    let step = go_unit_re().replace_all(text, "${1}GB");
    to_unit_re().replace_all(&step, "${1}TB").into_owned()
}

fn is_sold_out(candidate: &CandidateListing) -> bool {
    let haystack = format!(
        "{} {} {}",
        candidate.raw_title, candidate.raw_price_text, candidate.raw_specs_text
    )
    .to_lowercase();
    SOLD_OUT_MARKERS
        .iter()
        .any(|marker| haystack.contains(marker))
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
