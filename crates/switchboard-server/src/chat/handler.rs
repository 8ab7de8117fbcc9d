//! HTTP entrypoint for the chat engine (spec §4.1, `/api/unified/chat-stream`).

use std::convert::Infallible;
use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use futures_util::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use switchboard_core::{Channel, ChannelRequest};
use switchboard_cors::DomainFetcher;
use switchboard_ingest::Extractor;
use switchboard_vectorstore::{Embedder, VectorStore};
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

use crate::auth::require_api_key;
use crate::chat::engine::{self, EngineOutcome, RequestAttrs};
use crate::chat::events::ChatEvent;
use crate::error::ApiError;
use crate::llm::LlmClient;
use crate::state::AppState;

#[derive(Serialize)]
struct BackendProcessedResponse {
    #[serde(rename = "type")]
    kind: &'static str,
    channel: String,
    success: bool,
}

/// `POST /api/unified/chat-stream`. Frontend channels (`chatdemo`,
/// `chat-plugin`) get a chunked SSE response; the four backend channels
/// get a single JSON ack once the structured response has been posted to
/// the tenant backend (spec §6 HTTP surface table).
pub async fn chat_stream_handler<V, E, X, F, L>(
    State(state): State<Arc<AppState<V, E, X, F, L>>>,
    headers: HeaderMap,
    Json(request): Json<ChannelRequest>,
) -> Result<Response, ApiError>
where
    V: VectorStore + Send + Sync + 'static,
    E: Embedder + Send + Sync + 'static,
    X: Extractor + Send + Sync + 'static,
    F: DomainFetcher + Send + Sync + 'static,
    L: LlmClient + Send + Sync + 'static,
{
    if Channel::parse(&request.channel).map(|c| c.is_backend()).unwrap_or(false) {
        require_api_key(&headers, &state.config.internal_api_key)?;
    }

    let attrs = RequestAttrs {
        user_agent: header_str(&headers, "user-agent"),
        accept_language: header_str(&headers, "accept-language"),
        platform: header_str(&headers, "x-platform"),
        origin: headers.get("origin").and_then(|v| v.to_str().ok()).map(str::to_string),
    };

    let channel = request.channel.clone();
    let is_chat_plugin = Channel::parse(&channel).map(|c| matches!(c, Channel::ChatPlugin)).unwrap_or(false);
    let origin = attrs.origin.clone();

    let mut response = match engine::handle_chat_request(state, request, attrs).await? {
        EngineOutcome::Streamed(rx) => sse_response(rx),
        EngineOutcome::Buffered { success } => Json(BackendProcessedResponse {
            kind: "backend_processed",
            channel,
            success,
        })
        .into_response(),
    };

    // §4.6 invariant: never a wildcard, and only once the origin has passed
    // the chat-plugin CORS check inside the engine.
    if is_chat_plugin {
        if let Some(origin) = origin.filter(|o| !o.is_empty()) {
            if let Ok(value) = HeaderValue::from_str(&origin) {
                response.headers_mut().insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, value);
                response.headers_mut().insert(header::VARY, HeaderValue::from_static("Origin"));
            }
        }
    }

    Ok(response)
}

fn header_str(headers: &HeaderMap, name: &str) -> String {
    headers.get(name).and_then(|v| v.to_str().ok()).unwrap_or_default().to_string()
}

#[derive(Deserialize)]
pub struct PreflightQuery {
    #[serde(alias = "pluginId")]
    plugin_id: Option<String>,
}

/// `OPTIONS /api/unified/chat-stream` — CORS preflight for the `chat-plugin`
/// channel (spec §4.6 point 4). The browser sends no body on a preflight, so
/// the plugin to check against is passed as a query parameter instead of the
/// JSON field the real request carries.
pub async fn chat_stream_preflight<V, E, X, F, L>(
    State(state): State<Arc<AppState<V, E, X, F, L>>>,
    Query(query): Query<PreflightQuery>,
    headers: HeaderMap,
) -> Response
where
    V: VectorStore + Send + Sync + 'static,
    E: Embedder + Send + Sync + 'static,
    X: Extractor + Send + Sync + 'static,
    F: DomainFetcher + Send + Sync + 'static,
    L: LlmClient + Send + Sync + 'static,
{
    let origin = header_str(&headers, "origin");
    let plugin_id = query.plugin_id.unwrap_or_default();

    if origin.is_empty() || plugin_id.is_empty() {
        return StatusCode::FORBIDDEN.into_response();
    }

    let domains = match state.cors_cache.domains_for(&plugin_id).await {
        Ok(domains) => domains,
        Err(_) => return StatusCode::FORBIDDEN.into_response(),
    };

    if !switchboard_cors::origin_is_allowed(&origin, &domains.allowed_domains) {
        return StatusCode::FORBIDDEN.into_response();
    }

    let requested_headers = header_str(&headers, "access-control-request-headers");
    let allow_headers = if requested_headers.is_empty() { "content-type".to_string() } else { requested_headers };

    let mut response_headers = HeaderMap::new();
    response_headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_str(&origin).unwrap_or_else(|_| HeaderValue::from_static("null")),
    );
    response_headers.insert(header::ACCESS_CONTROL_ALLOW_METHODS, HeaderValue::from_static("POST, OPTIONS"));
    response_headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_str(&allow_headers).unwrap_or_else(|_| HeaderValue::from_static("content-type")),
    );
    response_headers.insert(header::ACCESS_CONTROL_MAX_AGE, HeaderValue::from_static("300"));
    response_headers.insert(header::VARY, HeaderValue::from_static("Origin"));

    (StatusCode::NO_CONTENT, response_headers).into_response()
}

/// Renders a `ChatEvent` stream as `data: <json>\n\n` frames, followed by
/// the literal `data: [DONE]\n\n` terminator (spec §6.3) once the engine's
/// sender half is dropped.
fn sse_response(rx: mpsc::UnboundedReceiver<ChatEvent>) -> Response {
    let events = UnboundedReceiverStream::new(rx)
        .map(|event| Ok::<Event, Infallible>(Event::default().data(event.to_sse_data())));
    let terminator = stream::once(async { Ok::<Event, Infallible>(Event::default().data("[DONE]")) });

    Sse::new(events.chain(terminator))
        .keep_alive(KeepAlive::default())
        .into_response()
}
