use axum::{middleware::from_fn, routing::get, Router};
use tower_http::cors::{Any, CorsLayer};

use crate::api::handlers::{self, AppState};
use crate::api::middleware::log_requests;

/// Assemble the full route table. Every route is registered here,
/// statically, so the surface of the API is checked at compile time.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // API root document + health check
        .route("/", get(handlers::api_root))
        .route("/health", get(handlers::health_check))
        // Subjects
        .route("/api/v1/subject", get(handlers::list_subjects))
        .route("/api/v1/subject/summary", get(handlers::subject_summary))
        .route(
            "/api/v1/subject/by/:field/count",
            get(handlers::subjects_by_count),
        )
        .route(
            "/api/v1/subject/:organization/:namespace/:name",
            get(handlers::get_subject),
        )
        // Samples
        .route("/api/v1/sample", get(handlers::list_samples))
        .route("/api/v1/sample/summary", get(handlers::sample_summary))
        .route(
            "/api/v1/sample/by/:field/count",
            get(handlers::samples_by_count),
        )
        .route(
            "/api/v1/sample/:organization/:namespace/:name",
            get(handlers::get_sample),
        )
        // Files
        .route("/api/v1/file", get(handlers::list_files))
        .route("/api/v1/file/summary", get(handlers::file_summary))
        .route("/api/v1/file/by/:field/count", get(handlers::files_by_count))
        .route(
            "/api/v1/file/:organization/:namespace/:name",
            get(handlers::get_file),
        )
        // Namespaces + organizations
        .route("/api/v1/namespace", get(handlers::list_namespaces))
        .route(
            "/api/v1/namespace/:organization/:name",
            get(handlers::get_namespace),
        )
        .route("/api/v1/organization", get(handlers::list_organizations))
        .route("/api/v1/organization/:name", get(handlers::get_organization))
        // Metadata field descriptions
        .route(
            "/api/v1/metadata/fields/subject",
            get(handlers::subject_metadata_fields),
        )
        .route(
            "/api/v1/metadata/fields/sample",
            get(handlers::sample_metadata_fields),
        )
        .route(
            "/api/v1/metadata/fields/file",
            get(handlers::file_metadata_fields),
        )
        .layer(from_fn(log_requests))
        .layer(CorsLayer::new().allow_origin(Any))
        .with_state(state)
}
