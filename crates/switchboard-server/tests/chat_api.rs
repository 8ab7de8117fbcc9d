//! Integration tests over the full router (spec §6.1, §6.3), exercising
//! HTTP routing and auth without any real external dependency.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::harness::{test_router, TEST_INTERNAL_API_KEY};
use http_body_util::BodyExt;
use tower::ServiceExt;

#[tokio::test]
async fn health_and_healthz_both_report_ok() {
    for path in ["/health", "/healthz"] {
        let router = test_router();
        let response = router
            .oneshot(Request::builder().uri(path).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}

#[tokio::test]
async fn ready_reports_mock_mode_flag() {
    let router = test_router();
    let response = router
        .oneshot(Request::builder().uri("/ready").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "ready");
}

#[tokio::test]
async fn chatdemo_frontend_request_streams_an_sse_response() {
    let router = test_router();
    let payload = serde_json::json!({
        "channel": "chatdemo",
        "company_id": "C1",
        "message": "hello there",
        "session_id": "s1",
    });

    let response = router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/unified/chat-stream")
                .header("content-type", "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "text/event-stream"
    );
}

#[tokio::test]
async fn backend_channel_without_api_key_is_rejected() {
    let router = test_router();
    let payload = serde_json::json!({
        "channel": "messenger",
        "company_id": "C1",
        "message": "hello",
        "user_info": {"user_id": "u1"},
    });

    let response = router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/unified/chat-stream")
                .header("content-type", "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn backend_channel_with_api_key_is_buffered_not_streamed() {
    let router = test_router();
    let payload = serde_json::json!({
        "channel": "messenger",
        "company_id": "C1",
        "message": "hello",
        "user_info": {"user_id": "u1"},
    });

    let response = router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/unified/chat-stream")
                .header("content-type", "application/json")
                .header("x-api-key", TEST_INTERNAL_API_KEY)
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["type"], "backend_processed");
}

#[tokio::test]
async fn chat_plugin_from_an_unregistered_origin_is_forbidden() {
    let router = test_router();
    let payload = serde_json::json!({
        "channel": "chat-plugin",
        "company_id": "C1",
        "message": "hi",
        "plugin_id": "p1",
    });

    let response = router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/unified/chat-stream")
                .header("content-type", "application/json")
                .header("origin", "https://evil.example.com")
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert!(response.headers().get("access-control-allow-origin").is_none());
}

#[tokio::test]
async fn chat_plugin_from_a_registered_origin_gets_a_matched_allow_origin_header() {
    let router = test_router();
    let payload = serde_json::json!({
        "channel": "chat-plugin",
        "company_id": "C1",
        "message": "hi",
        "plugin_id": "p1",
    });

    let response = router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/unified/chat-stream")
                .header("content-type", "application/json")
                .header("origin", "https://widget.example.com")
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("access-control-allow-origin").unwrap(),
        "https://widget.example.com"
    );
}

#[tokio::test]
async fn chat_plugin_preflight_answers_with_the_matched_origin() {
    let router = test_router();

    let response = router
        .oneshot(
            Request::builder()
                .method("OPTIONS")
                .uri("/api/unified/chat-stream?pluginId=p1")
                .header("origin", "https://widget.example.com")
                .header("access-control-request-method", "POST")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(
        response.headers().get("access-control-allow-origin").unwrap(),
        "https://widget.example.com"
    );
    assert!(response.headers().get("access-control-allow-methods").is_some());
}

#[tokio::test]
async fn chat_plugin_preflight_without_a_known_origin_is_forbidden() {
    let router = test_router();

    let response = router
        .oneshot(
            Request::builder()
                .method("OPTIONS")
                .uri("/api/unified/chat-stream?pluginId=p1")
                .header("origin", "https://evil.example.com")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
