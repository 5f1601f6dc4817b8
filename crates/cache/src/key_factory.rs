//! The cache key factory (§4.4) — the SOLE source of cache-key strings.
//! No caller composes a key any other way.

use biblio_gateway_core::types::EndpointKind;
use std::collections::BTreeMap;

/// Build a cache key for a free-text query: lowercased and trimmed, then
/// prefixed with the endpoint kind.
pub fn key_for_query(kind: EndpointKind, query: &str) -> String {
    format!("{}:{}", kind.key_prefix(), query.trim().to_lowercase())
}

/// Build a cache key for an ISBN lookup: hyphens stripped (ISBN
/// canonicalization at the key level, independent of [`IsbnSet`]'s own
/// canonicalization of stored values).
///
/// [`IsbnSet`]: biblio_gateway_core::models::edition::IsbnSet
pub fn key_for_isbn(isbn: &str) -> String {
    format!(
        "{}:{}",
        EndpointKind::IsbnLookup.key_prefix(),
        isbn.chars().filter(|c| *c != '-').collect::<String>().to_lowercase()
    )
}

/// Build a cache key from named parameters: alphabetically sorted by
/// parameter name, joined `k=v&k=v`, then prefixed with the endpoint kind.
pub fn key_for_params(kind: EndpointKind, params: &BTreeMap<&str, &str>) -> String {
    let joined = params
        .iter()
        .map(|(k, v)| format!("{}={}", k, v.trim().to_lowercase()))
        .collect::<Vec<_>>()
        .join("&");
    format!("{}:{}", kind.key_prefix(), joined)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_key_is_lowercased_and_trimmed() {
        assert_eq!(
            key_for_query(EndpointKind::TitleSearch, "  Dune  "),
            "search:title:dune"
        );
    }

    #[test]
    fn isbn_key_strips_hyphens() {
        assert_eq!(
            key_for_isbn("978-0-439-70818-0"),
            "search:isbn:9780439708180"
        );
    }

    #[test]
    fn params_key_sorts_alphabetically_regardless_of_insertion_order() {
        let mut params = BTreeMap::new();
        params.insert("title", "Dune");
        params.insert("author", "Herbert");

        let key = key_for_params(EndpointKind::TitleSearch, &params);
        assert_eq!(key, "search:title:author=herbert&title=dune");
    }

    #[test]
    fn same_params_different_insertion_order_produce_identical_keys() {
        let mut a = BTreeMap::new();
        a.insert("z", "1");
        a.insert("a", "2");
        let mut b = BTreeMap::new();
        b.insert("a", "2");
        b.insert("z", "1");
        assert_eq!(
            key_for_params(EndpointKind::AuthorSearch, &a),
            key_for_params(EndpointKind::AuthorSearch, &b)
        );
    }
}
