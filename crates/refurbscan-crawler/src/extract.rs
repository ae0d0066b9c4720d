//! Listing extraction from rendered storefront markup.
//!
//! Extraction is pure and synchronous relative to one capture; it never
//! re-fetches. Matching is a chain of fallbacks so that markup drift degrades
//! quality instead of failing outright: structural product-tile selectors
//! first, then product-link anchors paired with price-like text tokens.
//! A page yielding zero candidates is not an error here; the run controller
//! treats it as a low-yield signal.

use std::sync::OnceLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::types::{CandidateListing, RawPageCapture};

/// Structural tile selectors, most specific first. The storefronts rename
/// these classes occasionally; the anchor fallback covers the gap.
const TILE_SELECTORS: &[&str] = &[
    ".rf-refurb-producttile",
    ".rf-refurb-category-grid-no-js li",
    ".as-producttile",
    "[data-autom='product-tile']",
];

/// Title selectors tried inside a tile, in order.
const TITLE_SELECTORS: &[&str] = &["h3 a", "h2 a", ".rf-ccard-content-header a", "a"];

/// Price selectors tried inside a tile before falling back to text matching.
const PRICE_SELECTORS: &[&str] = &[".as-price-currentprice", ".rf-ccard-content-price", ".price"];

fn price_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)(?:[€£$]|\bCHF\b|\bkr\b)\s*\d[\d.,\s'’\u{a0}]*\d|(?:[€£$]|\bCHF\b|\bkr\b)\s*\d|\d[\d.,\s'’\u{a0}]*\d\s*(?:[€£$]|\bCHF\b|\bkr\b)|\d\s*(?:[€£$]|\bCHF\b|\bkr\b)",
        )
        .expect("price pattern is a valid literal")
    })
}

fn product_href_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)/shop/product/|/product/|/product-page|refurbished.*product")
            .expect("href pattern is a valid literal")
    })
}

fn spec_token_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        // Storage/memory sizes (incl. French Go/To), Apple silicon, A-series.
        Regex::new(r"(?i)\b\d{1,4}\s?(?:GB|TB|Go|To)\b|\bM\d(?:\s*(?:Pro|Max|Ultra))?\b|\bA\d{2}(?:\s*(?:Bionic|Pro))?\b")
            .expect("spec pattern is a valid literal")
    })
}

/// Extracts candidate listings from one captured page.
///
/// `base_url` is the URL the capture was fetched from; relative product links
/// are resolved against it.
#[must_use]
pub fn extract_listings(capture: &RawPageCapture, base_url: &str) -> Vec<CandidateListing> {
    let doc = Html::parse_document(&capture.rendered_content);

    let candidates = structural_pass(&doc, capture.page_index, base_url);
    if !candidates.is_empty() {
        return candidates;
    }
    anchor_pass(&doc, capture.page_index, base_url)
}

/// Quick probe used by the navigator to detect pagination exhaustion: does
/// this markup contain anything that looks like a listing at all?
#[must_use]
pub fn has_listing_markup(content: &str) -> bool {
    let doc = Html::parse_document(content);

    for sel in TILE_SELECTORS {
        if let Ok(selector) = Selector::parse(sel) {
            if doc.select(&selector).next().is_some() {
                return true;
            }
        }
    }

    if let Ok(anchors) = Selector::parse("a[href]") {
        for anchor in doc.select(&anchors) {
            if let Some(href) = anchor.value().attr("href") {
                if href.starts_with('#') || href.starts_with("javascript:") {
                    continue;
                }
                if product_href_re().is_match(href) {
                    return true;
                }
            }
        }
    }

    false
}

fn element_text(el: ElementRef<'_>) -> String {
    let joined = el.text().collect::<Vec<_>>().join(" ");
    collapse_whitespace(&joined)
}

pub(crate) fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn first_text(tile: ElementRef<'_>, selectors: &[&str]) -> Option<String> {
    for sel in selectors {
        let Ok(selector) = Selector::parse(sel) else {
            continue;
        };
        if let Some(node) = tile.select(&selector).next() {
            let text = element_text(node);
            if !text.is_empty() {
                return Some(text);
            }
        }
    }
    None
}

/// Mines spec tokens (storage, memory, chip) out of arbitrary listing text.
pub(crate) fn mine_spec_tokens(text: &str) -> String {
    let mut seen: Vec<String> = Vec::new();
    for m in spec_token_re().find_iter(text) {
        let token = collapse_whitespace(m.as_str());
        if !seen.iter().any(|t| t == &token) {
            seen.push(token);
        }
    }
    seen.join(" ")
}

fn structural_pass(doc: &Html, page_index: usize, base_url: &str) -> Vec<CandidateListing> {
    for sel in TILE_SELECTORS {
        let Ok(selector) = Selector::parse(sel) else {
            continue;
        };
        let tiles: Vec<ElementRef<'_>> = doc.select(&selector).collect();
        if tiles.is_empty() {
            continue;
        }

        let mut out = Vec::with_capacity(tiles.len());
        for tile in tiles {
            let Some(raw_title) = first_text(tile, TITLE_SELECTORS) else {
                continue;
            };
            let tile_text = element_text(tile);

            let raw_price_text = first_text(tile, PRICE_SELECTORS)
                .or_else(|| {
                    price_re()
                        .find(&tile_text)
                        .map(|m| m.as_str().trim().to_string())
                })
                .unwrap_or_default();

            let source_url = tile_product_href(tile)
                .map(|href| resolve_url(base_url, &href))
                .unwrap_or_else(|| base_url.to_string());

            out.push(CandidateListing {
                raw_title,
                raw_price_text,
                raw_specs_text: mine_spec_tokens(&tile_text),
                source_url,
                page_index,
            });
        }
        if !out.is_empty() {
            return out;
        }
    }
    Vec::new()
}

fn tile_product_href(tile: ElementRef<'_>) -> Option<String> {
    let anchors = Selector::parse("a[href]").ok()?;
    let mut first: Option<String> = None;
    for anchor in tile.select(&anchors) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        if href.starts_with('#') || href.starts_with("javascript:") {
            continue;
        }
        if product_href_re().is_match(href) {
            return Some(href.to_string());
        }
        if first.is_none() {
            first = Some(href.to_string());
        }
    }
    first
}

/// Text-pattern fallback for pages whose tile markup has drifted: pair
/// product-link anchors with the nearest price-like token.
fn anchor_pass(doc: &Html, page_index: usize, base_url: &str) -> Vec<CandidateListing> {
    let Ok(anchors) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    let mut out = Vec::new();
    for anchor in doc.select(&anchors) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        if href.starts_with('#') || href.starts_with("javascript:") {
            continue;
        }
        if !product_href_re().is_match(href) {
            continue;
        }

        let raw_title = element_text(anchor);
        if raw_title.len() < 3 {
            continue;
        }

        // The anchor's enclosing element usually carries the price and specs.
        let context_text = anchor
            .parent()
            .and_then(ElementRef::wrap)
            .map(element_text)
            .unwrap_or_default();

        let raw_price_text = price_re()
            .find(&context_text)
            .map(|m| m.as_str().trim().to_string())
            .unwrap_or_default();

        out.push(CandidateListing {
            raw_title,
            raw_price_text,
            raw_specs_text: mine_spec_tokens(&context_text),
            source_url: resolve_url(base_url, href),
            page_index,
        });
    }
    out
}

/// Resolves a possibly relative `href` against the page URL. Falls back to
/// the href verbatim when the base is not a parseable URL.
pub(crate) fn resolve_url(base: &str, href: &str) -> String {
    match Url::parse(base).and_then(|b| b.join(href)) {
        Ok(resolved) => resolved.into(),
        Err(_) => href.to_string(),
    }
}

#[cfg(test)]
#[path = "extract_test.rs"]
mod tests;
