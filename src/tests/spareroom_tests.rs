// src/tests/spareroom_tests.rs
use crate::domain::{normalize, Source};
use crate::scraper::{ListingSource, ScraperError, SearchCriteria, SpareRoom};
use crate::tests::utils::{test_config, StubFetch};
use chrono::NaiveDate;
use serde_json::json;
use std::collections::BTreeMap;
use std::time::Duration;

fn criteria() -> SearchCriteria {
    SearchCriteria::from_config(&test_config(), NaiveDate::from_ymd_opt(2024, 3, 10).unwrap())
}

fn page(page: u32, pages: u32, ids: &[&str]) -> String {
    let results: Vec<_> = ids
        .iter()
        .map(|id| json!({"advert_id": id, "min_rent": "250", "per": "pw", "ad_title": format!("Room {id}")}))
        .collect();
    json!({"page": page, "pages": pages, "results": results}).to_string()
}

fn spareroom(fetch: &StubFetch) -> SpareRoom<'_> {
    SpareRoom::new(fetch, criteria(), BTreeMap::new(), Duration::ZERO)
}

#[test]
fn walks_every_page_until_none_left() {
    let fetch = StubFetch::new()
        .with("page=1", page(1, 3, &["1", "2"]))
        .with("page=2", page(2, 3, &["3"]))
        .with("page=3", page(3, 3, &["4"]));

    let found = spareroom(&fetch).list_current("Old Street").unwrap();
    let ids: Vec<&str> = found.iter().map(|d| d.id.as_str()).collect();

    assert_eq!(ids, vec!["1", "2", "3", "4"]);
    assert_eq!(fetch.request_count(), 3);
}

#[test]
fn single_page_search_makes_one_request() {
    let fetch = StubFetch::new().with("page=1", page(1, 1, &["9"]));
    let found = spareroom(&fetch).list_current("Old Street").unwrap();

    assert_eq!(found.len(), 1);
    assert_eq!(fetch.request_count(), 1);
}

#[test]
fn stops_at_page_count_even_if_page_number_never_moves() {
    let stuck = page(1, 3, &["1"]);
    let fetch = StubFetch::new()
        .with("page=1", stuck.clone())
        .with("page=2", stuck.clone())
        .with("page=3", stuck);

    let found = spareroom(&fetch).list_current("Old Street").unwrap();

    assert_eq!(found.len(), 3);
    assert_eq!(fetch.request_count(), 3);
    assert!(!fetch.requested("page=4"));
}

#[test]
fn failed_page_discards_the_whole_search() {
    let fetch = StubFetch::new()
        .with("page=1", page(1, 3, &["1", "2"]))
        .with_status("page=2", 500);

    let err = spareroom(&fetch).list_current("Old Street").unwrap_err();

    assert!(matches!(err, ScraperError::Status { status: 500, .. }));
    // nothing after the failure is requested
    assert_eq!(fetch.request_count(), 2);
}

#[test]
fn malformed_page_is_an_error() {
    let fetch = StubFetch::new().with("page=1", "<html>maintenance</html>");
    let err = spareroom(&fetch).list_current("Old Street").unwrap_err();
    assert!(matches!(err, ScraperError::JsonParse(_)));
}

#[test]
fn requests_carry_query_and_app_headers() {
    let fetch = StubFetch::new().with("page=1", page(1, 1, &[]));
    spareroom(&fetch).list_current("Old Street").unwrap();

    let url = fetch.requests.borrow()[0].clone();
    assert!(url.starts_with("http://iphoneapp.spareroom.co.uk/flatshares?format=json"));
    assert!(url.contains("max_rent=1500"));
    assert!(url.contains("where=old+street"));
    assert!(url.contains("miles_from_max=20"));
    assert!(url.contains("available_from=2024-04-01"));

    let headers = fetch.headers_seen.borrow()[0].clone();
    assert!(headers.contains(&("User-Agent".to_string(), "SpareRoomUK 3.1".to_string())));
}

#[test]
fn saved_search_id_replaces_built_query() {
    let fetch = StubFetch::new().with("page=1", page(1, 1, &["5"]));
    let mut search_ids = BTreeMap::new();
    search_ids.insert("Old Street".to_string(), "abc123".to_string());
    let source = SpareRoom::new(&fetch, criteria(), search_ids, Duration::ZERO);

    source.list_current("Old Street").unwrap();

    let url = fetch.requests.borrow()[0].clone();
    assert!(url.contains("search_id=abc123"));
    assert!(!url.contains("max_rent"));
}

#[test]
fn summaries_normalize_without_another_request() {
    let fetch = StubFetch::new().with("page=1", page(1, 1, &["77"]));
    let source = spareroom(&fetch);
    let found = source.list_current("Old Street").unwrap();

    let raw = source.fetch_raw(&found[0]).unwrap();
    let listing = normalize(raw, NaiveDate::from_ymd_opt(2024, 3, 10).unwrap()).unwrap();

    assert_eq!(fetch.request_count(), 1);
    assert_eq!(listing.source, Source::SpareRoom);
    assert_eq!(listing.title, "Room 77");
    assert_eq!(format!("{:.2}", listing.price.unwrap()), "1083.33");
}
