use offerwatch_engine::{ExtractError, FieldMapping, OfferExtractor, SelectorExtractor};
use pretty_assertions::assert_eq;

const BASE_URL: &str = "https://example.test/listings";

fn mapping() -> FieldMapping {
    FieldMapping {
        row: "div.offer".to_owned(),
        title: "h2".to_owned(),
        link: "a.details".to_owned(),
        link_attr: "href".to_owned(),
        price: Some("span.price".to_owned()),
        location: Some("span.location".to_owned()),
        posted_at: Some("time".to_owned()),
        id_attr: None,
    }
}

#[test]
fn extracts_all_mapped_fields() {
    let html = r#"
        <div class="offer">
            <h2> Cosy room </h2>
            <a class="details" href="/offers/17">more</a>
            <span class="price">450 EUR</span>
            <span class="location">Vienna</span>
            <time>2026-08-20</time>
        </div>
    "#;

    let extraction = SelectorExtractor::new(&mapping(), BASE_URL)
        .unwrap()
        .extract(html)
        .unwrap();

    assert_eq!(extraction.skipped_rows, 0);
    assert_eq!(extraction.offers.len(), 1);
    let offer = &extraction.offers[0];
    assert_eq!(offer.title, "Cosy room");
    assert_eq!(offer.link, "https://example.test/offers/17");
    assert_eq!(offer.price.as_deref(), Some("450 EUR"));
    assert_eq!(offer.location.as_deref(), Some("Vienna"));
    assert_eq!(offer.posted_at.as_deref(), Some("2026-08-20"));
}

#[test]
fn rows_missing_required_fields_are_skipped_not_fatal() {
    let html = r#"
        <div class="offer"><h2>No link here</h2></div>
        <div class="offer"><a class="details" href="/x">untitled</a></div>
        <div class="offer">
            <h2>Valid</h2>
            <a class="details" href="/offers/1">more</a>
        </div>
    "#;

    let extraction = SelectorExtractor::new(&mapping(), BASE_URL)
        .unwrap()
        .extract(html)
        .unwrap();

    assert_eq!(extraction.skipped_rows, 2);
    assert_eq!(extraction.offers.len(), 1);
    assert_eq!(extraction.offers[0].title, "Valid");
}

#[test]
fn duplicate_ids_collapse_to_first_occurrence() {
    let html = r#"
        <div class="offer">
            <h2>Twin</h2>
            <a class="details" href="/offers/7">a</a>
            <span class="location">first</span>
        </div>
        <div class="offer">
            <h2>Twin</h2>
            <a class="details" href="/offers/7">b</a>
            <span class="location">second</span>
        </div>
    "#;

    let extraction = SelectorExtractor::new(&mapping(), BASE_URL)
        .unwrap()
        .extract(html)
        .unwrap();

    assert_eq!(extraction.offers.len(), 1);
    assert_eq!(extraction.offers[0].location.as_deref(), Some("first"));
    // Duplicates are deduplicated, not counted as skipped.
    assert_eq!(extraction.skipped_rows, 0);
}

#[test]
fn native_key_attribute_takes_precedence_over_derived_hash() {
    let mut with_key = mapping();
    with_key.id_attr = Some("data-id".to_owned());
    let html = r#"
        <div class="offer" data-id="site-key-42">
            <h2>Keyed</h2>
            <a class="details" href="/offers/42">more</a>
        </div>
    "#;

    let extraction = SelectorExtractor::new(&with_key, BASE_URL)
        .unwrap()
        .extract(html)
        .unwrap();

    assert_eq!(extraction.offers[0].id.as_str(), "site-key-42");
}

#[test]
fn configured_native_key_missing_on_row_skips_the_row() {
    let mut with_key = mapping();
    with_key.id_attr = Some("data-id".to_owned());
    let html = r#"
        <div class="offer">
            <h2>Keyless</h2>
            <a class="details" href="/offers/9">more</a>
        </div>
    "#;

    let extraction = SelectorExtractor::new(&with_key, BASE_URL)
        .unwrap()
        .extract(html)
        .unwrap();

    assert!(extraction.offers.is_empty());
    assert_eq!(extraction.skipped_rows, 1);
}

#[test]
fn derived_id_is_stable_across_extractions() {
    let html = r#"
        <div class="offer">
            <h2>Stable</h2>
            <a class="details" href="/offers/5">more</a>
            <span class="price">300</span>
        </div>
    "#;
    let extractor = SelectorExtractor::new(&mapping(), BASE_URL).unwrap();

    let first = extractor.extract(html).unwrap();
    let second = extractor.extract(html).unwrap();
    assert_eq!(first.offers[0].id, second.offers[0].id);
}

#[test]
fn absolute_links_pass_through_unchanged() {
    let html = r#"
        <div class="offer">
            <h2>Elsewhere</h2>
            <a class="details" href="https://other.test/offer">more</a>
        </div>
    "#;

    let extraction = SelectorExtractor::new(&mapping(), BASE_URL)
        .unwrap()
        .extract(html)
        .unwrap();

    assert_eq!(extraction.offers[0].link, "https://other.test/offer");
}

#[test]
fn empty_page_yields_zero_offers_without_error() {
    let extraction = SelectorExtractor::new(&mapping(), BASE_URL)
        .unwrap()
        .extract("<html><body></body></html>")
        .unwrap();
    assert!(extraction.offers.is_empty());
    assert_eq!(extraction.skipped_rows, 0);
}

#[test]
fn invalid_selector_fails_at_construction() {
    let mut broken = mapping();
    broken.row = "div..[".to_owned();
    let err = SelectorExtractor::new(&broken, BASE_URL).unwrap_err();
    assert!(matches!(err, ExtractError::BadSelector { field: "row", .. }));
}
