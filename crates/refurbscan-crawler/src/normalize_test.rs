use chrono::Utc;

use refurbscan_core::{PaginationStrategy, StorefrontTarget};

use super::*;

fn target(country: &str, currency: &str) -> StorefrontTarget {
    StorefrontTarget {
        country_code: country.to_string(),
        locale: "en-US".to_string(),
        base_url: "https://www.example.com/shop/refurbished".to_string(),
        currency_code: currency.to_string(),
        pagination: PaginationStrategy::QueryParam {
            param: "page".to_string(),
        },
    }
}

fn candidate(title: &str, price: &str, url: &str) -> CandidateListing {
    CandidateListing {
        raw_title: title.to_string(),
        raw_price_text: price.to_string(),
        raw_specs_text: String::new(),
        source_url: url.to_string(),
        page_index: 0,
    }
}

#[test]
fn canonicalizes_localized_title_into_family_and_config() {
    let (family, config) = canonicalize_title(
        "Generalüberholtes MacBook Air 13\" M2 Chip mit 8-Core CPU",
        "",
    );
    assert_eq!(family, "MacBook Air");
    assert!(config.contains("13\""));
    assert!(config.contains("M2"));
    assert!(!config.to_lowercase().contains("generalüberholt"));
}

#[test]
fn most_specific_family_wins() {
    assert_eq!(canonicalize_title("iPad Pro 11-inch Wi-Fi", "").0, "iPad Pro");
    assert_eq!(canonicalize_title("iPad Wi-Fi 64GB", "").0, "iPad");
    assert_eq!(canonicalize_title("AirPods Max - Space Grey", "").0, "AirPods Max");
}

#[test]
fn unrecognized_title_passes_through() {
    let (family, config) = canonicalize_title("Refurbished Beats Studio Buds", "USB-C");
    assert_eq!(family, "Beats Studio Buds");
    assert_eq!(config, "USB-C");
}

#[test]
fn multibyte_case_mappings_keep_surrounding_casing() {
    // 'İ' grows by a byte when lowercased; the summary must still come out
    // of the original text, with its casing, and without slicing mid-char.
    let (family, config) =
        canonicalize_title("Refurbished MacBook Pro 14\" İstanbul Edition", "");
    assert_eq!(family, "MacBook Pro");
    assert!(config.contains("İstanbul Edition"), "config was {config:?}");

    let (family, config) = canonicalize_title("ẞİ GENERALÜBERHOLTES MacBook Air M2", "");
    assert_eq!(family, "MacBook Air");
    assert!(config.contains("M2"));
    assert!(!config.to_lowercase().contains("generalüberholt"));
}

#[test]
fn french_storage_units_are_normalized() {
    let (family, config) = canonicalize_title(
        "MacBook Pro 14 pouces reconditionné 512 Go SSD 1 To option",
        "",
    );
    assert_eq!(family, "MacBook Pro");
    assert!(config.contains("512GB"), "config was {config:?}");
    assert!(config.contains("1TB"), "config was {config:?}");
}

#[test]
fn fingerprint_is_stable_across_candidate_order() {
    let t = target("US", "USD");
    let a = candidate(
        "Refurbished Mac mini M2",
        "$499.00",
        "https://www.example.com/shop/product/A1/mac-mini",
    );
    let b = candidate(
        "Refurbished iMac 24-inch",
        "$1,249.00",
        "https://www.example.com/shop/product/B2/imac",
    );

    let now = Utc::now();
    let forward = normalize_candidates(vec![a.clone(), b.clone()], &t, now);
    let reverse = normalize_candidates(vec![b, a], &t, now);

    let mut forward_ids: Vec<_> = forward.iter().map(|r| r.id.clone()).collect();
    let mut reverse_ids: Vec<_> = reverse.iter().map(|r| r.id.clone()).collect();
    forward_ids.sort();
    reverse_ids.sort();
    assert_eq!(forward_ids, reverse_ids);
}

#[test]
fn duplicate_fingerprints_keep_last_record_at_first_position() {
    let t = target("US", "USD");
    let url = "https://www.example.com/shop/product/A1/mac-mini";
    let first = candidate("Refurbished Mac mini M2", "$499.00", url);
    let other = candidate(
        "Refurbished Apple TV 4K",
        "$129.00",
        "https://www.example.com/shop/product/T1/apple-tv",
    );
    // Same identity fields, re-rendered with an updated price.
    let repeat = candidate("Refurbished Mac mini M2", "$479.00", url);

    let records = normalize_candidates(vec![first, other, repeat], &t, Utc::now());
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].model_family, "Mac mini");
    assert_eq!(records[0].price_amount, 47_900);
    assert_eq!(records[1].model_family, "Apple TV");
}

#[test]
fn unparsable_price_drops_only_that_candidate() {
    let t = target("GB", "GBP");
    let good = candidate(
        "Refurbished MacBook Pro 14-inch",
        "£1,899.00",
        "https://www.example.com/uk/shop/product/P1/mbp",
    );
    let bad = candidate(
        "Refurbished Mac Studio",
        "Contact us for pricing",
        "https://www.example.com/uk/shop/product/P2/studio",
    );

    let records = normalize_candidates(vec![good, bad], &t, Utc::now());
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].model_family, "MacBook Pro");
    assert_eq!(records[0].price_amount, 189_900);
    assert_eq!(records[0].currency_code, "GBP");
}

#[test]
fn embedded_currency_overrides_storefront_default() {
    let t = target("CH", "CHF");
    let c = candidate(
        "Refurbished iPhone 14",
        "619,00 €",
        "https://www.example.com/ch-de/shop/product/I1/iphone",
    );
    let records = normalize_candidates(vec![c], &t, Utc::now());
    assert_eq!(records[0].currency_code, "EUR");
}

#[test]
fn sold_out_marker_clears_availability() {
    let t = target("DE", "EUR");
    let mut c = candidate(
        "MacBook Air 13\" generalüberholt",
        "1.189,00 €",
        "https://www.example.com/de/shop/product/M1/mba",
    );
    c.raw_specs_text = "Ausverkauft".to_string();

    let records = normalize_candidates(vec![c], &t, Utc::now());
    assert_eq!(records.len(), 1);
    assert!(!records[0].availability_flag);
}

#[test]
fn timestamps_are_set_to_run_time() {
    let t = target("US", "USD");
    let now = Utc::now();
    let records = normalize_candidates(
        vec![candidate(
            "Refurbished iMac",
            "$1,249.00",
            "https://www.example.com/shop/product/I2/imac",
        )],
        &t,
        now,
    );
    assert_eq!(records[0].first_seen_at, now);
    assert_eq!(records[0].last_seen_at, now);
}
