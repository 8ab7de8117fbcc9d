//! HTTP control plane: unified chat streaming, CORS, ingestion, and admin
//! context write-through.

pub mod admin;
pub mod auth;
pub mod chat;
pub mod cors;
pub mod error;
pub mod llm;
pub mod state;

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use switchboard_cors::DomainFetcher;
use switchboard_ingest::Extractor;
use switchboard_vectorstore::{Embedder, VectorStore};
use tower_http::trace::TraceLayer;

use crate::llm::LlmClient;
use crate::state::AppState;

const STATUS_HEADER: &str = "x-switchboard-status";

#[derive(serde::Serialize)]
struct HealthResponse {
    status: &'static str,
}

#[derive(serde::Serialize)]
struct ReadyResponse {
    status: &'static str,
    mock_mode: bool,
}

async fn health_handler() -> Response {
    let mut headers = HeaderMap::new();
    headers.insert(STATUS_HEADER, HeaderValue::from_static("healthy"));
    (StatusCode::OK, headers, Json(HealthResponse { status: "ok" })).into_response()
}

async fn ready_handler<V, E, X, F, L>(State(state): State<Arc<AppState<V, E, X, F, L>>>) -> Response
where
    V: VectorStore + Send + Sync + 'static,
    E: Embedder + Send + Sync + 'static,
    X: Extractor + Send + Sync + 'static,
    F: DomainFetcher + Send + Sync + 'static,
    L: LlmClient + Send + Sync + 'static,
{
    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
    (
        StatusCode::OK,
        headers,
        Json(ReadyResponse { status: "ready", mock_mode: state.mock_mode }),
    )
        .into_response()
}

/// Builds the full router over a generic [`AppState`] (spec §6.1 route
/// table). `V`/`E`/`X`/`F`/`L` are resolved to concrete collaborators at
/// the binary entrypoint; tests build this over mock collaborators.
pub fn create_router<V, E, X, F, L>(state: Arc<AppState<V, E, X, F, L>>) -> Router
where
    V: VectorStore + Clone + Send + Sync + 'static,
    E: Embedder + Clone + Send + Sync + 'static,
    X: Extractor + Clone + Send + Sync + 'static,
    F: DomainFetcher + Send + Sync + 'static,
    L: LlmClient + Send + Sync + 'static,
{
    Router::new()
        .route("/health", get(health_handler))
        .route("/healthz", get(health_handler))
        .route("/ready", get(ready_handler))
        .route(
            "/api/unified/chat-stream",
            post(chat::chat_stream_handler).options(chat::chat_stream_preflight),
        )
        .route("/api/extract/process", post(admin::extract_process_sync))
        .route("/api/extract/process-async", post(admin::extract_process_async))
        .route("/api/admin/tasks/document/{task_id}/status", get(admin::task_status))
        .route(
            "/api/admin/companies/{company_id}/context/{kind}",
            put(admin::context_set_all)
                .post(admin::context_add_one)
                .get(admin::context_get_all)
                .delete(admin::context_delete_all),
        )
        .route("/api/admin/companies/{company_id}/files/{file_id}", delete(admin::delete_file))
        .route(
            "/api/admin/companies/{company_id}/extractions/{file_id}",
            delete(admin::delete_file),
        )
        .route(
            "/api/admin/companies/{company_id}/products/{product_id}",
            delete(admin::delete_product),
        )
        .route(
            "/api/admin/companies/{company_id}/services/{service_id}",
            delete(admin::delete_service),
        )
        .route("/api/internal/cors/update-domains", post(cors::update_domains))
        .route("/api/internal/cors/clear-cache/{plugin_id}", delete(cors::clear_cache_one))
        .route("/api/internal/cors/clear-cache", delete(cors::clear_cache_all))
        .route("/api/internal/cors/status", get(cors::status))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
