use axum::extract::{Host, OriginalUri, Path, State};
use axum::http::{header, HeaderMap, HeaderValue};
use axum::response::Json;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

use crate::api::error::ApiError;
use crate::logic::{build_link_header, parse_query, ByCountResults, FilterSpec, PageWindow};
use crate::model::{File, Namespace, Organization, Sample, Subject};
use crate::store::{load_root_document, Page, Store};

/// Shared request state: the backend selected at startup plus the data
/// directory holding server-owned documents (the API root payload).
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub data_dir: PathBuf,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            store,
            data_dir: data_dir.into(),
        }
    }
}

/// Simple health check endpoint
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

#[derive(Debug, Serialize)]
pub struct Counts {
    pub current: usize,
    pub all: usize,
}

#[derive(Debug, Serialize)]
pub struct Summary {
    pub counts: Counts,
}

/// Collection response: window summary plus the windowed documents.
#[derive(Debug, Serialize)]
pub struct EntityPage<T> {
    pub summary: Summary,
    pub data: Vec<T>,
}

#[derive(Debug, Serialize)]
pub struct TotalCounts {
    pub total: usize,
}

/// The `/summary` payload for a collection.
#[derive(Debug, Serialize)]
pub struct CollectionSummary {
    pub counts: TotalCounts,
}

#[derive(Debug, Serialize)]
pub struct FieldDescription {
    pub harmonized: Option<bool>,
    pub path: Option<String>,
    pub wiki_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct FieldDescriptions {
    pub fields: Vec<FieldDescription>,
}

/// Everything a collection handler derives from the request line: the
/// deduplicated query pairs, the parsed filter spec and window, and the
/// base URL links are built against.
struct CollectionRequest {
    pairs: Vec<(String, String)>,
    filters: FilterSpec,
    window: PageWindow,
    base_url: String,
}

impl CollectionRequest {
    fn new(host: &str, uri: &axum::http::Uri) -> Self {
        let pairs = parse_query(uri.query());
        let filters = FilterSpec::from_query(&pairs);
        let window = PageWindow::from_query(&pairs);
        let base_url = format!("http://{}{}", host, uri.path());
        Self {
            pairs,
            filters,
            window,
            base_url,
        }
    }

    /// Assemble the response body and `Link` header for one page.
    fn respond<T>(&self, page: Page<T>) -> (HeaderMap, Json<EntityPage<T>>) {
        let link = build_link_header(&self.base_url, self.window, page.total, &self.pairs);
        let mut headers = HeaderMap::new();
        if let Ok(value) = HeaderValue::from_str(&link) {
            headers.insert(header::LINK, value);
        }
        let body = EntityPage {
            summary: Summary {
                counts: Counts {
                    current: page.items.len(),
                    all: page.total,
                },
            },
            data: page.items,
        };
        (headers, Json(body))
    }
}

// Root + documentation-adjacent endpoints

/// Serve the API root document from the data directory.
pub async fn api_root(State(state): State<AppState>) -> Result<Json<serde_json::Value>, ApiError> {
    let document = load_root_document(&state.data_dir).await?;
    Ok(Json(document))
}

// Subject endpoints

pub async fn list_subjects(
    State(state): State<AppState>,
    Host(host): Host,
    OriginalUri(uri): OriginalUri,
) -> Result<(HeaderMap, Json<EntityPage<Subject>>), ApiError> {
    let request = CollectionRequest::new(&host, &uri);
    let page = state
        .store
        .list_subjects(&request.filters, request.window)
        .await?;
    Ok(request.respond(page))
}

pub async fn subjects_by_count(
    State(state): State<AppState>,
    Path(field): Path<String>,
    OriginalUri(uri): OriginalUri,
) -> Result<Json<ByCountResults>, ApiError> {
    let filters = FilterSpec::from_query(&parse_query(uri.query()));
    Ok(Json(state.store.subjects_by_count(&field, &filters).await?))
}

pub async fn subject_summary(
    State(state): State<AppState>,
) -> Result<Json<CollectionSummary>, ApiError> {
    let total = state.store.count_subjects().await?;
    Ok(Json(CollectionSummary {
        counts: TotalCounts { total },
    }))
}

pub async fn get_subject(
    State(state): State<AppState>,
    Path((organization, namespace, name)): Path<(String, String, String)>,
) -> Result<Json<Subject>, ApiError> {
    state
        .store
        .get_subject(&organization, &namespace, &name)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Subject not found".to_string()))
}

// Sample endpoints

pub async fn list_samples(
    State(state): State<AppState>,
    Host(host): Host,
    OriginalUri(uri): OriginalUri,
) -> Result<(HeaderMap, Json<EntityPage<Sample>>), ApiError> {
    let request = CollectionRequest::new(&host, &uri);
    let page = state
        .store
        .list_samples(&request.filters, request.window)
        .await?;
    Ok(request.respond(page))
}

pub async fn samples_by_count(
    State(state): State<AppState>,
    Path(field): Path<String>,
    OriginalUri(uri): OriginalUri,
) -> Result<Json<ByCountResults>, ApiError> {
    let filters = FilterSpec::from_query(&parse_query(uri.query()));
    Ok(Json(state.store.samples_by_count(&field, &filters).await?))
}

pub async fn sample_summary(
    State(state): State<AppState>,
) -> Result<Json<CollectionSummary>, ApiError> {
    let total = state.store.count_samples().await?;
    Ok(Json(CollectionSummary {
        counts: TotalCounts { total },
    }))
}

pub async fn get_sample(
    State(state): State<AppState>,
    Path((organization, namespace, name)): Path<(String, String, String)>,
) -> Result<Json<Sample>, ApiError> {
    state
        .store
        .get_sample(&organization, &namespace, &name)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Sample not found".to_string()))
}

// File endpoints

pub async fn list_files(
    State(state): State<AppState>,
    Host(host): Host,
    OriginalUri(uri): OriginalUri,
) -> Result<(HeaderMap, Json<EntityPage<File>>), ApiError> {
    let request = CollectionRequest::new(&host, &uri);
    let page = state
        .store
        .list_files(&request.filters, request.window)
        .await?;
    Ok(request.respond(page))
}

pub async fn files_by_count(
    State(state): State<AppState>,
    Path(field): Path<String>,
    OriginalUri(uri): OriginalUri,
) -> Result<Json<ByCountResults>, ApiError> {
    let filters = FilterSpec::from_query(&parse_query(uri.query()));
    Ok(Json(state.store.files_by_count(&field, &filters).await?))
}

pub async fn file_summary(
    State(state): State<AppState>,
) -> Result<Json<CollectionSummary>, ApiError> {
    let total = state.store.count_files().await?;
    Ok(Json(CollectionSummary {
        counts: TotalCounts { total },
    }))
}

pub async fn get_file(
    State(state): State<AppState>,
    Path((organization, namespace, name)): Path<(String, String, String)>,
) -> Result<Json<File>, ApiError> {
    state
        .store
        .get_file(&organization, &namespace, &name)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("File not found".to_string()))
}

// Namespace + organization endpoints

pub async fn list_namespaces(
    State(state): State<AppState>,
) -> Result<Json<Vec<Namespace>>, ApiError> {
    Ok(Json(state.store.list_namespaces().await?))
}

pub async fn get_namespace(
    State(state): State<AppState>,
    Path((organization, name)): Path<(String, String)>,
) -> Result<Json<Namespace>, ApiError> {
    state
        .store
        .get_namespace(&organization, &name)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Namespace not found".to_string()))
}

pub async fn list_organizations(
    State(state): State<AppState>,
) -> Result<Json<Vec<Organization>>, ApiError> {
    Ok(Json(state.store.list_organizations().await?))
}

pub async fn get_organization(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<Organization>, ApiError> {
    state
        .store
        .get_organization(&name)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Organization not found".to_string()))
}

// Metadata field descriptions

fn harmonized_fields(names: &[&str]) -> FieldDescriptions {
    FieldDescriptions {
        fields: names
            .iter()
            .map(|name| FieldDescription {
                harmonized: Some(true),
                path: Some(format!("metadata.{}", name)),
                wiki_url: None,
            })
            .collect(),
    }
}

pub async fn subject_metadata_fields() -> Json<FieldDescriptions> {
    Json(harmonized_fields(&["sex", "race", "ethnicity", "vital_status"]))
}

pub async fn sample_metadata_fields() -> Json<FieldDescriptions> {
    Json(harmonized_fields(&["diagnosis", "disease_phase", "tissue_type"]))
}

pub async fn file_metadata_fields() -> Json<FieldDescriptions> {
    Json(harmonized_fields(&["type", "size"]))
}
