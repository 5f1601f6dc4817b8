//! Black-box tests of the aggregation engine (C5) wired to scripted
//! provider adapters — mirrors §6 scenarios S-1 and S-6 without a live
//! network.

mod support;

use biblio_gateway_aggregation::engine::{AggregationEngine, ResolveQuery};
use biblio_gateway_providers::adapter::ProviderError;
use biblio_gateway_core::types::ProviderId;
use std::sync::Arc;
use support::{fixture_record, ScriptedAdapter, ScriptedCulturalKb, ScriptedOutcome};

fn engine(
    isbn_primary: ScriptedAdapter,
    isbn_secondary: ScriptedAdapter,
    fulltext_primary: ScriptedAdapter,
    fulltext_secondary: ScriptedAdapter,
    kb: ScriptedCulturalKb,
) -> AggregationEngine {
    AggregationEngine::new(
        Arc::new(isbn_primary),
        Arc::new(isbn_secondary),
        Arc::new(fulltext_primary),
        Arc::new(fulltext_secondary),
        Arc::new(kb),
        0.85,
    )
}

/// S-1: the primary ISBN provider answers directly; the Edition carries
/// both the ISBN-13 and the canonicalized ISBN-10 the fixture inserted.
#[tokio::test]
async fn isbn_lookup_prefers_primary_provider_and_skips_secondary() {
    let record = fixture_record(
        ProviderId::Isbndb,
        "Harry Potter and the Sorcerer's Stone",
        &["9780439708180", "0439708184"],
        "J.K. Rowling",
    );
    let primary = ScriptedAdapter::new(ProviderId::Isbndb, ScriptedOutcome::Records(vec![record]));
    let secondary = ScriptedAdapter::new(ProviderId::OpenLibrary, ScriptedOutcome::Empty);
    let fulltext_primary = ScriptedAdapter::new(ProviderId::GoogleBooks, ScriptedOutcome::Empty);
    let fulltext_secondary = ScriptedAdapter::new(ProviderId::OpenLibrary, ScriptedOutcome::Empty);

    let engine = engine(primary, secondary, fulltext_primary, fulltext_secondary, ScriptedCulturalKb { fail_for: None });

    let resolved = engine
        .resolve_one(ResolveQuery { title: None, author: None, isbn: Some("9780439708180") })
        .await
        .unwrap()
        .expect("expected a resolved work");

    assert_eq!(resolved.work.title, "Harry Potter and the Sorcerer's Stone");
    assert_eq!(resolved.authors[0].name, "J.K. Rowling");
    assert!(resolved.editions[0].isbn_set.iter().any(|i| i == "9780439708180"));
    assert!(resolved.work.satisfies_provenance_invariant());
}

/// S-6: the primary full-text provider times out (retryable), the
/// aggregator falls through to the secondary, and the secondary's result
/// is returned without surfacing an error.
#[tokio::test]
async fn text_search_falls_through_to_secondary_on_retryable_timeout() {
    let isbn_primary = ScriptedAdapter::new(ProviderId::Isbndb, ScriptedOutcome::Empty);
    let isbn_secondary = ScriptedAdapter::new(ProviderId::OpenLibrary, ScriptedOutcome::Empty);
    let fulltext_primary = ScriptedAdapter::new(
        ProviderId::GoogleBooks,
        ScriptedOutcome::Fail(|provider| ProviderError::Timeout { provider }),
    );
    let record = fixture_record(ProviderId::OpenLibrary, "Dune", &["9780441013593"], "Frank Herbert");
    let fulltext_secondary = ScriptedAdapter::new(ProviderId::OpenLibrary, ScriptedOutcome::Records(vec![record]));

    let engine = engine(isbn_primary, isbn_secondary, fulltext_primary, fulltext_secondary, ScriptedCulturalKb { fail_for: None });

    let resolved = engine
        .resolve_one(ResolveQuery { title: Some("Dune"), author: None, isbn: None })
        .await
        .unwrap()
        .expect("secondary should have produced a result");

    assert_eq!(resolved.work.title, "Dune");
    assert_eq!(resolved.work.provenance.primary_provider, "open_library");
}

/// A non-retryable failure anywhere in the ISBN chain is surfaced as
/// `provider-error` rather than silently treated as not-found (§4.5).
#[tokio::test]
async fn auth_failure_on_isbn_lookup_surfaces_as_provider_error() {
    let isbn_primary = ScriptedAdapter::new(
        ProviderId::Isbndb,
        ScriptedOutcome::Fail(|provider| ProviderError::AuthFailed { provider }),
    );
    let isbn_secondary = ScriptedAdapter::new(ProviderId::OpenLibrary, ScriptedOutcome::Empty);
    let fulltext_primary = ScriptedAdapter::new(ProviderId::GoogleBooks, ScriptedOutcome::Empty);
    let fulltext_secondary = ScriptedAdapter::new(ProviderId::OpenLibrary, ScriptedOutcome::Empty);

    let engine = engine(isbn_primary, isbn_secondary, fulltext_primary, fulltext_secondary, ScriptedCulturalKb { fail_for: None });

    let result = engine
        .resolve_one(ResolveQuery { title: None, author: None, isbn: Some("9780439708180") })
        .await;

    assert!(result.is_err());
}

/// `resolveMany` dedupes authors by exact name across multiple returned
/// works, and a C3 failure for one author never blocks enrichment of the
/// others (§4.5).
#[tokio::test]
async fn resolve_many_dedupes_authors_and_isolates_a_single_enrichment_failure() {
    let shared_author = "Ursula K. Le Guin";
    let record_a = fixture_record(ProviderId::GoogleBooks, "The Left Hand of Darkness", &["9780441478125"], shared_author);
    let record_b = fixture_record(ProviderId::GoogleBooks, "The Dispossessed", &["9780061054884"], shared_author);
    let record_c = fixture_record(ProviderId::GoogleBooks, "Parable of the Sower", &["9780446675505"], "Octavia E. Butler");

    let isbn_primary = ScriptedAdapter::new(ProviderId::Isbndb, ScriptedOutcome::Empty);
    let isbn_secondary = ScriptedAdapter::new(ProviderId::OpenLibrary, ScriptedOutcome::Empty);
    let fulltext_primary = ScriptedAdapter::new(
        ProviderId::GoogleBooks,
        ScriptedOutcome::Records(vec![record_a, record_b, record_c]),
    );
    let fulltext_secondary = ScriptedAdapter::new(ProviderId::OpenLibrary, ScriptedOutcome::Empty);

    let engine = engine(
        isbn_primary,
        isbn_secondary,
        fulltext_primary,
        fulltext_secondary,
        ScriptedCulturalKb { fail_for: Some("Octavia E. Butler") },
    );

    let many = engine.resolve_many("speculative fiction", 10).await.unwrap();

    assert_eq!(many.works.len(), 3);
    assert_eq!(many.authors.len(), 2, "authors must be deduped by exact name across works");

    let butler = many.authors.iter().find(|a| a.name == "Octavia E. Butler").unwrap();
    assert_eq!(butler.cultural_region, None, "failed enrichment leaves gender/region unset, never an error");

    let le_guin = many.authors.iter().find(|a| a.name == shared_author).unwrap();
    assert!(le_guin.cultural_region.is_some(), "unaffected author is still enriched");
}

/// §4.5: when an adapter returns more than one match for a single
/// `resolveOne` lookup, the first is the primary and the rest are merged
/// into it rather than discarded — editions accumulate, co-authors are
/// added, and genres are re-normalized over the union of raw inputs.
#[tokio::test]
async fn resolve_one_merges_secondary_matches_from_the_same_adapter_response() {
    let mut primary_record = fixture_record(ProviderId::Isbndb, "Dune", &["9780441013593"], "Frank Herbert");
    primary_record.work.genres = ["Sci-Fi".to_string()].into_iter().collect();

    let mut contributing_record = fixture_record(ProviderId::Isbndb, "Dune (Movie Tie-In)", &["9780593098233"], "Frank Herbert");
    contributing_record.work.genres = ["Science Fiction".to_string()].into_iter().collect();
    contributing_record.authors = vec![biblio_gateway_core::models::author::Author::new("Co-Author")];

    let isbn_primary = ScriptedAdapter::new(
        ProviderId::Isbndb,
        ScriptedOutcome::Records(vec![primary_record, contributing_record]),
    );
    let isbn_secondary = ScriptedAdapter::new(ProviderId::OpenLibrary, ScriptedOutcome::Empty);
    let fulltext_primary = ScriptedAdapter::new(ProviderId::GoogleBooks, ScriptedOutcome::Empty);
    let fulltext_secondary = ScriptedAdapter::new(ProviderId::OpenLibrary, ScriptedOutcome::Empty);

    let engine = engine(isbn_primary, isbn_secondary, fulltext_primary, fulltext_secondary, ScriptedCulturalKb { fail_for: None });

    let resolved = engine
        .resolve_one(ResolveQuery { title: None, author: None, isbn: Some("9780441013593") })
        .await
        .unwrap()
        .expect("expected a resolved work");

    assert_eq!(resolved.work.title, "Dune");
    assert_eq!(resolved.editions.len(), 2, "the contributing record's edition is merged in, not dropped");
    assert!(resolved.work.genres.contains("science_fiction"));
    assert_eq!(resolved.authors.len(), 2, "the contributing record's co-author is added");
    assert!(resolved.authors.iter().any(|a| a.name == "Co-Author"));
}
