//! Price-text parsing: locale-formatted price strings to minor currency
//! units plus an ISO 4217 code.
//!
//! The storefronts format prices a dozen ways: `$1,299.00`, `1.189,00 €`,
//! `£999`, `CHF 1'099.00`, `2 499,00 €`. An embedded ISO code or unambiguous
//! symbol wins over the storefront's default currency; `$` and `kr` are
//! ambiguous across storefronts and defer to the default.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::CrawlError;

fn iso_code_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b(USD|CAD|MXN|GBP|EUR|SEK|CHF|DKK|NOK|AUD|NZD|SGD)\b")
            .expect("iso code pattern is a valid literal")
    })
}

fn number_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\d[\d.,\s'’\u{a0}]*\d|\d").expect("number pattern is a valid literal")
    })
}

/// Parses `text` into (minor units, currency code).
///
/// # Errors
///
/// [`CrawlError::UnparsablePrice`] when no numeric token is present. The
/// caller drops the candidate, not the page.
pub(crate) fn parse_price(text: &str, fallback_currency: &str) -> Result<(i64, String), CrawlError> {
    let amount = extract_minor_units(text).ok_or_else(|| CrawlError::UnparsablePrice {
        raw: text.to_string(),
    })?;
    let currency = detect_currency(text).unwrap_or_else(|| fallback_currency.to_string());
    Ok((amount, currency))
}

/// Detects a currency embedded in the price text, if unambiguous.
fn detect_currency(text: &str) -> Option<String> {
    if let Some(m) = iso_code_re().find(text) {
        return Some(m.as_str().to_string());
    }
    if text.contains('€') {
        return Some("EUR".to_string());
    }
    if text.contains('£') {
        return Some("GBP".to_string());
    }
    // `$` (USD/CAD/MXN/…) and `kr` (SEK/NOK/DKK) depend on the storefront.
    None
}

fn extract_minor_units(text: &str) -> Option<i64> {
    let token = number_re().find(text)?.as_str();

    // Strip grouping characters that are never decimal separators.
    let cleaned: String = token
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '\'' && *c != '’' && *c != '\u{a0}')
        .collect();

    let normalized = normalize_separators(&cleaned);
    let major: f64 = normalized.parse().ok()?;
    if !major.is_finite() || major < 0.0 {
        return None;
    }
    #[allow(clippy::cast_possible_truncation)]
    let minor = (major * 100.0).round() as i64;
    Some(minor)
}

/// Reduces a digit string with `.`/`,` separators to plain `1234.56` form.
///
/// When both separators appear, the right-most one is the decimal separator.
/// A lone separator followed by exactly two digits is decimal; anything else
/// is a thousands separator.
fn normalize_separators(s: &str) -> String {
    let has_dot = s.contains('.');
    let has_comma = s.contains(',');

    match (has_dot, has_comma) {
        (true, true) => {
            let decimal = if s.rfind('.') > s.rfind(',') { '.' } else { ',' };
            let grouping = if decimal == '.' { ',' } else { '.' };
            s.chars()
                .filter(|&c| c != grouping)
                .map(|c| if c == decimal { '.' } else { c })
                .collect()
        }
        (true, false) => resolve_single_separator(s, '.'),
        (false, true) => resolve_single_separator(s, ','),
        (false, false) => s.to_string(),
    }
}

fn resolve_single_separator(s: &str, sep: char) -> String {
    let occurrences = s.matches(sep).count();
    let trailing_digits = s.rsplit(sep).next().map_or(0, str::len);
    if occurrences == 1 && trailing_digits == 2 {
        s.replace(sep, ".")
    } else {
        s.chars().filter(|&c| c != sep).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str, fallback: &str) -> (i64, String) {
        parse_price(text, fallback).unwrap()
    }

    #[test]
    fn euro_symbol_with_us_style_grouping() {
        assert_eq!(parse("€1,234.56", "USD"), (123_456, "EUR".to_string()));
    }

    #[test]
    fn pound_whole_amount() {
        assert_eq!(parse("£999", "EUR"), (99_900, "GBP".to_string()));
    }

    #[test]
    fn german_style_grouping() {
        assert_eq!(parse("1.189,00 €", "EUR"), (118_900, "EUR".to_string()));
    }

    #[test]
    fn swiss_apostrophe_grouping_and_iso_code() {
        assert_eq!(parse("CHF 1'099.00", "EUR"), (109_900, "CHF".to_string()));
    }

    #[test]
    fn french_space_grouping() {
        assert_eq!(parse("2 499,00 €", "EUR"), (249_900, "EUR".to_string()));
    }

    #[test]
    fn dollar_defers_to_storefront_currency() {
        assert_eq!(parse("$1,299.00", "CAD"), (129_900, "CAD".to_string()));
        assert_eq!(parse("$1,299.00", "USD"), (129_900, "USD".to_string()));
    }

    #[test]
    fn krona_defers_to_storefront_currency() {
        assert_eq!(parse("11 990,00 kr", "SEK"), (1_199_000, "SEK".to_string()));
    }

    #[test]
    fn lone_separator_with_three_digits_is_grouping() {
        assert_eq!(parse("1,234 €", "EUR").0, 123_400);
        assert_eq!(parse("1.234 €", "EUR").0, 123_400);
    }

    #[test]
    fn lone_separator_with_two_digits_is_decimal() {
        assert_eq!(parse("999,00 kr", "SEK").0, 99_900);
        assert_eq!(parse("999.00", "USD").0, 99_900);
    }

    #[test]
    fn nbsp_grouping() {
        assert_eq!(parse("1\u{a0}299,00 €", "EUR").0, 129_900);
    }

    #[test]
    fn malformed_text_is_unparsable() {
        let err = parse_price("Contact us", "USD").unwrap_err();
        assert!(matches!(err, CrawlError::UnparsablePrice { .. }));
    }

    #[test]
    fn empty_text_is_unparsable() {
        assert!(matches!(
            parse_price("", "USD"),
            Err(CrawlError::UnparsablePrice { .. })
        ));
    }

    #[test]
    fn single_digit_price() {
        assert_eq!(parse("€5", "EUR"), (500, "EUR".to_string()));
    }
}
