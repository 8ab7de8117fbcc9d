//! Integration tests over the admin context write-through and ingestion
//! endpoints (spec §4.8, §6.1).

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::harness::{test_router, TEST_INTERNAL_API_KEY};
use http_body_util::BodyExt;
use tower::ServiceExt;

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn admin_routes_require_api_key() {
    let router = test_router();
    let response = router
        .oneshot(
            Request::builder()
                .uri("/api/admin/companies/C1/context/faqs")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn set_all_then_get_all_round_trips_through_the_vector_store() {
    let router = test_router();

    let payload = serde_json::json!([
        {"text": "What are your hours?", "language": "en"},
        {"text": "Do you deliver?", "language": "en"},
    ]);

    let set_response = router
        .clone()
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/api/admin/companies/C1/context/faqs")
                .header("content-type", "application/json")
                .header("x-api-key", TEST_INTERNAL_API_KEY)
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(set_response.status(), StatusCode::OK);
    let set_body = body_json(set_response).await;
    assert_eq!(set_body["count"], 2);

    let get_response = router
        .oneshot(
            Request::builder()
                .uri("/api/admin/companies/C1/context/faqs")
                .header("x-api-key", TEST_INTERNAL_API_KEY)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(get_response.status(), StatusCode::OK);
    let items = body_json(get_response).await;
    assert_eq!(items.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn unknown_context_kind_is_rejected_before_touching_the_store() {
    let router = test_router();
    let response = router
        .oneshot(
            Request::builder()
                .uri("/api/admin/companies/C1/context/not-a-kind")
                .header("x-api-key", TEST_INTERNAL_API_KEY)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn deleting_a_file_twice_is_idempotent() {
    let router = test_router();

    for _ in 0..2 {
        let response = router
            .clone()
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/api/admin/companies/C1/files/f1")
                    .header("x-api-key", TEST_INTERNAL_API_KEY)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["deleted_points"], 0);
    }
}

// `extract_process_sync` fetches `file_url` over real HTTP (no injection
// point for a mock fetcher), so against an address this test environment
// cannot reach it surfaces as the worker's own fetch-failure mapping
// rather than a successful pipeline run.
#[tokio::test]
async fn sync_extract_against_an_unreachable_file_url_reports_a_bad_gateway() {
    let router = test_router();
    let payload = serde_json::json!({
        "companyId": "C1",
        "fileUrl": "https://files.invalid.example/menu.pdf",
        "industry": "restaurant",
        "dataType": "CATALOG",
        "fileMetadata": {"file_name": "menu.pdf", "content_type": "application/pdf", "size_bytes": 1024},
        "callbackUrl": "https://backend.example.com/callback",
    });

    let response = router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/extract/process")
                .header("content-type", "application/json")
                .header("x-api-key", TEST_INTERNAL_API_KEY)
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn async_extract_enqueues_and_status_is_queryable() {
    let router = test_router();
    let payload = serde_json::json!({
        "companyId": "C1",
        "fileUrl": "https://files.example.com/menu2.pdf",
        "industry": "restaurant",
        "dataType": "CATALOG",
        "fileMetadata": {"file_name": "menu2.pdf", "content_type": "application/pdf", "size_bytes": 1024},
        "callbackUrl": "https://backend.example.com/callback",
    });

    let enqueue_response = router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/extract/process-async")
                .header("content-type", "application/json")
                .header("x-api-key", TEST_INTERNAL_API_KEY)
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(enqueue_response.status(), StatusCode::OK);
    let enqueue_body = body_json(enqueue_response).await;
    let task_id = enqueue_body["taskId"].as_str().unwrap().to_string();

    let status_response = router
        .oneshot(
            Request::builder()
                .uri(format!("/api/admin/tasks/document/{task_id}/status"))
                .header("x-api-key", TEST_INTERNAL_API_KEY)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(status_response.status(), StatusCode::OK);
    let status_body = body_json(status_response).await;
    assert_eq!(status_body["status"], "pending");
}

#[tokio::test]
async fn task_status_for_an_unknown_id_is_not_found() {
    let router = test_router();
    let response = router
        .oneshot(
            Request::builder()
                .uri("/api/admin/tasks/document/does-not-exist/status")
                .header("x-api-key", TEST_INTERNAL_API_KEY)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
