//! Edition ranking for a named Work (§6): hardcover → paperback → e-book
//! → audiobook, newest first within a format. Not cached — there is no
//! dedicated edition-search cache key (§4.4 lists only title/isbn/author).

use crate::state::AppState;
use actix_web::{web, HttpResponse};
use biblio_gateway_aggregation::engine::ResolveQuery;
use biblio_gateway_core::envelope::Envelope;
use biblio_gateway_core::models::edition::{Edition, PublicationDate};
use biblio_gateway_core::sanitization::sanitize_search_query;
use biblio_gateway_core::validation;
use biblio_gateway_core::GatewayError;
use chrono::Datelike;
use serde::Deserialize;

#[derive(Deserialize)]
pub struct EditionsQuery {
    #[serde(rename = "workTitle")]
    pub work_title: Option<String>,
    pub author: Option<String>,
    pub limit: Option<u32>,
}

const DEFAULT_LIMIT: u32 = 20;

fn edition_sort_key(edition: &Edition) -> (u8, std::cmp::Reverse<i32>) {
    let year = match &edition.publication_date {
        Some(PublicationDate::Year(y)) => *y,
        Some(PublicationDate::Full(d)) => d.year(),
        None => i32::MIN,
    };
    (edition.format.rank(), std::cmp::Reverse(year))
}

pub async fn search_editions(state: web::Data<AppState>, query: web::Query<EditionsQuery>) -> Result<HttpResponse, GatewayError> {
    if query.work_title.is_none() && query.author.is_none() {
        return Err(GatewayError::InvalidRequest("workTitle or author is required".to_string()));
    }

    let limit = query.limit.unwrap_or(DEFAULT_LIMIT);
    validation::validate_page_size(limit)?;

    let title = query.work_title.as_deref().map(sanitize_search_query);
    let author = query.author.as_deref().map(sanitize_search_query);

    let resolved = state
        .engine
        .resolve_one(ResolveQuery { title: title.as_deref(), author: author.as_deref(), isbn: None })
        .await?;

    let mut editions = resolved.map(|r| r.editions).unwrap_or_default();
    editions.sort_by_key(edition_sort_key);
    editions.truncate(limit as usize);

    Ok(HttpResponse::Ok()
        .insert_header(("X-Cache-Status", "NONE"))
        .json(Envelope::success(serde_json::json!({ "editions": editions }))))
}
