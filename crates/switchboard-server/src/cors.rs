//! Internal CORS management endpoints (spec §4.6, §6.1 `/api/internal/cors/...`).
//! Authenticated with `X-Internal-Key` rather than `X-API-Key` — these are
//! server-to-server calls from the tenant backend, never from a browser.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use serde::{Deserialize, Serialize};
use switchboard_cors::DomainFetcher;
use switchboard_ingest::Extractor;
use switchboard_vectorstore::{Embedder, VectorStore};

use crate::auth::require_internal_key;
use crate::error::ApiError;
use crate::llm::LlmClient;
use crate::state::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDomainsRequest {
    plugin_id: String,
    company_id: String,
    allowed_domains: Vec<String>,
}

#[derive(Serialize)]
struct SuccessBody {
    success: bool,
}

/// `POST /api/internal/cors/update-domains`.
pub async fn update_domains<V, E, X, F, L>(
    State(state): State<Arc<AppState<V, E, X, F, L>>>,
    headers: HeaderMap,
    Json(req): Json<UpdateDomainsRequest>,
) -> Result<Json<SuccessBody>, ApiError>
where
    V: VectorStore + Send + Sync + 'static,
    E: Embedder + Send + Sync + 'static,
    X: Extractor + Send + Sync + 'static,
    F: DomainFetcher + Send + Sync + 'static,
    L: LlmClient + Send + Sync + 'static,
{
    require_internal_key(&headers, &state.config.internal_api_key)?;
    state.cors_cache.update_domains(&req.plugin_id, &req.company_id, req.allowed_domains);
    Ok(Json(SuccessBody { success: true }))
}

/// `DELETE /api/internal/cors/clear-cache/{plugin_id}`.
pub async fn clear_cache_one<V, E, X, F, L>(
    State(state): State<Arc<AppState<V, E, X, F, L>>>,
    headers: HeaderMap,
    Path(plugin_id): Path<String>,
) -> Result<Json<SuccessBody>, ApiError>
where
    V: VectorStore + Send + Sync + 'static,
    E: Embedder + Send + Sync + 'static,
    X: Extractor + Send + Sync + 'static,
    F: DomainFetcher + Send + Sync + 'static,
    L: LlmClient + Send + Sync + 'static,
{
    require_internal_key(&headers, &state.config.internal_api_key)?;
    state.cors_cache.clear_one(&plugin_id);
    Ok(Json(SuccessBody { success: true }))
}

/// `DELETE /api/internal/cors/clear-cache` — drops the whole cache.
pub async fn clear_cache_all<V, E, X, F, L>(
    State(state): State<Arc<AppState<V, E, X, F, L>>>,
    headers: HeaderMap,
) -> Result<Json<SuccessBody>, ApiError>
where
    V: VectorStore + Send + Sync + 'static,
    E: Embedder + Send + Sync + 'static,
    X: Extractor + Send + Sync + 'static,
    F: DomainFetcher + Send + Sync + 'static,
    L: LlmClient + Send + Sync + 'static,
{
    require_internal_key(&headers, &state.config.internal_api_key)?;
    state.cors_cache.clear_all();
    Ok(Json(SuccessBody { success: true }))
}

/// `GET /api/internal/cors/status`.
pub async fn status<V, E, X, F, L>(
    State(state): State<Arc<AppState<V, E, X, F, L>>>,
    headers: HeaderMap,
) -> Result<Json<switchboard_cors::CorsStatus>, ApiError>
where
    V: VectorStore + Send + Sync + 'static,
    E: Embedder + Send + Sync + 'static,
    X: Extractor + Send + Sync + 'static,
    F: DomainFetcher + Send + Sync + 'static,
    L: LlmClient + Send + Sync + 'static,
{
    require_internal_key(&headers, &state.config.internal_api_key)?;
    Ok(Json(state.cors_cache.status()))
}
