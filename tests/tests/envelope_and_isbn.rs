//! Envelope round-tripping (§4.10, §8) and ISBN canonicalization (I-2,
//! §6 S-2), exercised against `biblio-gateway-core` in isolation.

use biblio_gateway_core::envelope::Envelope;
use biblio_gateway_core::isbn;
use biblio_gateway_core::models::edition::IsbnSet;
use biblio_gateway_core::validation::validate_isbn;
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct SearchPayload {
    works: Vec<String>,
    editions: Vec<String>,
    authors: Vec<String>,
}

/// §8 round-trip law: envelope parse ∘ envelope serialize is identity on
/// the semantic content.
#[test]
fn envelope_json_round_trips_identically() {
    let payload = SearchPayload { works: vec!["Dune".to_string()], editions: vec![], authors: vec!["Frank Herbert".to_string()] };
    let envelope = Envelope::success(payload).with_provider("open_library").with_cached(true);

    let serialized = serde_json::to_string(&envelope).unwrap();
    let parsed: Envelope<SearchPayload> = serde_json::from_str(&serialized).unwrap();

    assert_eq!(parsed.data, envelope.data);
    assert_eq!(parsed.metadata.provider, envelope.metadata.provider);
    assert!(parsed.error.is_none());
}

/// A successful search with zero hits still has `data = {...empty
/// arrays...}`, never an `error` field and never bare `null` (§4.10).
#[test]
fn empty_search_result_is_success_with_empty_arrays_not_an_error() {
    let envelope = Envelope::success(SearchPayload { works: vec![], editions: vec![], authors: vec![] });
    let value = serde_json::to_value(&envelope).unwrap();

    assert!(value.get("error").is_none());
    assert_eq!(value["data"], json!({"works": [], "editions": [], "authors": []}));
}

/// §6 S-2: a malformed ISBN fails validation before any provider is
/// consulted.
#[test]
fn malformed_isbn_fails_validation() {
    let result = validate_isbn("123");
    assert!(result.is_err());
}

/// A syntactically valid ISBN-13 and ISBN-10 both pass.
#[test]
fn well_formed_isbns_pass_validation() {
    assert!(validate_isbn("978-0-439-70818-0").is_ok());
    assert!(validate_isbn("0439708184").is_ok());
}

/// I-2: an Edition's ISBN set never contains two distinct canonical forms
/// of the same number — inserting the ISBN-10 and ISBN-13 forms of the
/// same book collapses to a single canonical entry.
#[test]
fn isbn_set_canonicalizes_isbn10_and_isbn13_of_the_same_book_into_one_entry() {
    let mut set = IsbnSet::new();
    set.insert_canonicalizing("0439708184");
    set.insert_canonicalizing("978-0-439-70818-0");

    assert_eq!(set.iter().count(), 1);
    assert!(set.contains_canonical("0439708184"));
    assert!(set.contains_canonical("9780439708180"));
}

/// Distinct books never collapse into the same set entry.
#[test]
fn isbn_set_keeps_distinct_books_separate() {
    let mut set = IsbnSet::new();
    set.insert_canonicalizing("9780439708180");
    set.insert_canonicalizing("9780441013593");
    assert_eq!(set.iter().count(), 2);
}

/// `isbn::normalize` strips hyphens/whitespace independent of the set
/// abstraction, matching the cache key factory's own hyphen-stripping.
#[test]
fn isbn_normalize_strips_hyphens_and_whitespace() {
    assert_eq!(isbn::normalize(" 978-0-439-70818-0 "), "9780439708180");
}
