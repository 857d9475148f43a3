use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use biofed_rust::api::handlers::AppState;
use biofed_rust::api::routes::create_router;
use biofed_rust::store::JsonFileStore;

// The router under test runs against the JSON document store bundled in
// data/, the same fixtures the server ships with.
fn app() -> axum::Router {
    let store = Arc::new(JsonFileStore::new("data"));
    create_router(AppState::new(store, "data"))
}

async fn get(path: &str) -> (StatusCode, HeaderMap, Value) {
    let request = Request::builder()
        .uri(path)
        .header("host", "localhost")
        .header("origin", "https://portal.example-org.test")
        .body(Body::empty())
        .unwrap();
    let response = app().oneshot(request).await.unwrap();

    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, headers, body)
}

#[tokio::test]
async fn test_subject_collection_shape_and_link_header() {
    let (status, headers, body) = get("/api/v1/subject").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["summary"]["counts"]["all"], json!(5));
    assert_eq!(body["summary"]["counts"]["current"], json!(5));
    assert_eq!(body["data"].as_array().unwrap().len(), 5);

    let link = headers.get("link").unwrap().to_str().unwrap();
    assert_eq!(
        link,
        "<http://localhost/api/v1/subject?page=1&per_page=100>; rel=\"first\", \
         <http://localhost/api/v1/subject?page=1&per_page=100>; rel=\"last\""
    );
}

#[tokio::test]
async fn test_subject_pagination_window_and_relations() {
    let (status, headers, body) = get("/api/v1/subject?page=2&per_page=2").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["summary"]["counts"]["all"], json!(5));
    assert_eq!(body["summary"]["counts"]["current"], json!(2));
    assert_eq!(
        body["data"][0]["id"]["name"],
        json!("SUBJECT-003"),
        "window should start at the third document"
    );

    let link = headers.get("link").unwrap().to_str().unwrap();
    assert!(link.contains("page=1&per_page=2>; rel=\"first\""));
    assert!(link.contains("page=3&per_page=2>; rel=\"last\""));
    assert!(link.contains("page=1&per_page=2>; rel=\"prev\""));
    assert!(link.contains("page=3&per_page=2>; rel=\"next\""));
}

#[tokio::test]
async fn test_out_of_range_page_is_empty_not_an_error() {
    let (status, _, body) = get("/api/v1/subject?page=99&per_page=100").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["summary"]["counts"]["current"], json!(0));
    assert_eq!(body["summary"]["counts"]["all"], json!(5));
    assert_eq!(body["data"], json!([]));
}

#[tokio::test]
async fn test_harmonized_filter_narrows_collection() {
    let (status, _, body) = get("/api/v1/subject?sex=M").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["summary"]["counts"]["all"], json!(3));

    // The reserved search key is a no-op.
    let (_, _, with_search) = get("/api/v1/subject?sex=M&search=ignored").await;
    assert_eq!(with_search["summary"]["counts"]["all"], json!(3));
}

#[tokio::test]
async fn test_unharmonized_filter_narrows_collection() {
    let (status, _, body) = get("/api/v1/subject?metadata.unharmonized.site.code=A12").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["summary"]["counts"]["all"], json!(2));

    let (_, _, miss) = get("/api/v1/subject?metadata.unharmonized.site.code=Z99").await;
    assert_eq!(miss["summary"]["counts"]["all"], json!(0));
}

#[tokio::test]
async fn test_subject_by_race_count() {
    let (status, _, body) = get("/api/v1/subject/by/race/count").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "total": 5,
            "missing": 1,
            "values": [
                {"value": "Asian", "count": 2},
                {"value": "Black", "count": 1},
                {"value": "White", "count": 2}
            ]
        })
    );
}

#[tokio::test]
async fn test_by_count_composes_with_filters() {
    let (status, _, body) = get("/api/v1/subject/by/race/count?sex=M").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "total": 4,
            "missing": 0,
            "values": [
                {"value": "Asian", "count": 2},
                {"value": "White", "count": 2}
            ]
        })
    );
}

#[tokio::test]
async fn test_sample_by_diagnosis_count_counts_missing() {
    let (status, _, body) = get("/api/v1/sample/by/diagnosis/count").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], json!(3));
    assert_eq!(body["missing"], json!(1));
    assert_eq!(
        body["values"],
        json!([
            {"value": "Ewing Sarcoma", "count": 2},
            {"value": "Neuroblastoma", "count": 1}
        ])
    );
}

#[tokio::test]
async fn test_subject_detail_and_not_found_body() {
    let (status, _, body) = get("/api/v1/subject/example-org/ped-onc/SUBJECT-001").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"]["name"], json!("SUBJECT-001"));
    assert_eq!(body["kind"], json!("Participant"));

    let (status, _, body) = get("/api/v1/subject/example-org/ped-onc/NO-SUCH").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(
        body,
        json!({
            "errors": [
                {"message": "Subject not found", "code": "not_found", "status": 404}
            ]
        })
    );
}

#[tokio::test]
async fn test_collection_summaries() {
    let (_, _, subjects) = get("/api/v1/subject/summary").await;
    assert_eq!(subjects, json!({"counts": {"total": 5}}));

    let (_, _, samples) = get("/api/v1/sample/summary").await;
    assert_eq!(samples, json!({"counts": {"total": 4}}));

    let (_, _, files) = get("/api/v1/file/summary").await;
    assert_eq!(files, json!({"counts": {"total": 3}}));
}

#[tokio::test]
async fn test_file_collection_and_detail() {
    let (status, _, body) = get("/api/v1/file?type=BAM").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["summary"]["counts"]["all"], json!(1));
    assert_eq!(body["data"][0]["id"]["name"], json!("FILE-001.bam"));

    let (status, _, body) = get("/api/v1/file/example-org/ped-onc/FILE-002.vcf").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["samples"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_namespace_and_organization_endpoints() {
    let (status, _, body) = get("/api/v1/namespace").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);

    let (status, _, body) = get("/api/v1/namespace/example-org/ped-onc").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["contact_email"], json!("data@example-org.test"));

    let (status, _, body) = get("/api/v1/namespace/example-org/unknown").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["errors"][0]["code"], json!("not_found"));

    let (status, _, body) = get("/api/v1/organization/alliance-org").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], json!("Neuro-Oncology Research Alliance"));
}

#[tokio::test]
async fn test_api_root_document() {
    let (status, _, body) = get("/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["server"]["name"], json!("BioFed Federation Node"));
    assert_eq!(body["api"]["api_version"], json!("v1"));
}

#[tokio::test]
async fn test_missing_root_document_is_internal_error() {
    let store = Arc::new(JsonFileStore::new("data"));
    let router = create_router(AppState::new(store, "no-such-directory"));
    let request = Request::builder()
        .uri("/")
        .header("host", "localhost")
        .body(Body::empty())
        .unwrap();
    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["errors"][0]["status"], json!(500));
}

#[tokio::test]
async fn test_metadata_field_descriptions() {
    let (status, _, body) = get("/api/v1/metadata/fields/subject").await;
    assert_eq!(status, StatusCode::OK);
    let fields = body["fields"].as_array().unwrap();
    assert!(fields
        .iter()
        .any(|f| f["path"] == json!("metadata.sex") && f["harmonized"] == json!(true)));
}

#[tokio::test]
async fn test_health_and_cors() {
    let (status, headers, body) = get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], json!("healthy"));
    assert_eq!(
        headers
            .get("access-control-allow-origin")
            .map(|v| v.to_str().unwrap()),
        Some("*")
    );
}

#[tokio::test]
async fn test_entity_documents_round_trip_metadata_shapes() {
    // Wrapped values keep their provenance keys on the way back out.
    let (_, _, body) = get("/api/v1/subject/example-org/ped-onc/SUBJECT-001").await;
    assert_eq!(
        body["metadata"]["sex"],
        json!({"value": "M", "source": "registry"})
    );
    assert_eq!(
        body["metadata"]["race"],
        json!({"value": [{"value": "White"}]})
    );
}
