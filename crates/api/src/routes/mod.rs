pub mod csv_import;
pub mod editions;
pub mod enrichment;
pub mod job_stream;
pub mod scan;
pub mod search;

use actix_web::web;

/// Wires every `/v1/*` route (§6). Health/readiness/metrics live directly
/// on the top-level `App` in `main.rs`, outside this scope.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/v1")
            .route("/search/isbn", web::get().to(search::search_by_isbn))
            .route("/search/title", web::get().to(search::search_by_title))
            .route("/search/advanced", web::get().to(search::search_advanced))
            .route("/editions/search", web::get().to(editions::search_editions))
            .route("/enrichment/batch", web::post().to(enrichment::submit_batch))
            .route("/enrichment/results/{jobId}", web::get().to(enrichment::get_batch_results))
            .route("/scan/bookshelf", web::post().to(scan::submit_scan))
            .route("/scan/results/{jobId}", web::get().to(scan::get_scan_results))
            .route("/csv/import", web::post().to(csv_import::submit_csv_import))
            .route("/csv/results/{jobId}", web::get().to(csv_import::get_csv_results))
            .route("/jobs/{jobId}/stream", web::get().to(job_stream::stream)),
    );
}
