//! The channel router and streaming chat engine (spec §4.1): normalizes a
//! request, assembles context, drives the LLM, and schedules the
//! post-response side effects. `handle_chat_request` is the single entry
//! point shared by both the SSE path (frontend channels) and the
//! buffer-then-post path (backend channels).

use std::sync::Arc;

use chrono::Utc;
use switchboard_core::{Channel, ChannelRequest, Intent, StructuredResponse, SwitchboardError};
use switchboard_cors::DomainFetcher;
use switchboard_ingest::Extractor;
use switchboard_orders::turn_is_complete;
use switchboard_scratch::key::{KeyAttributes, SessionKey};
use switchboard_scratch::{Role, Turn};
use switchboard_vectorstore::{DataType, Embedder, HybridSearchRequest, RagAssembler, VectorStore};
use switchboard_webhooks::{PendingWebhook, WebhookEnvelope, WebhookEvent};
use tokio::sync::mpsc;

use crate::chat::events::ChatEvent;
use crate::chat::orders;
use crate::llm::{prompt, FrameEvent, FrameExtractor, LlmClient, StreamEvent};
use crate::state::AppState;

/// Attributes pulled from request headers, used only to derive a stable
/// fallback `device_id` when the caller didn't send one (spec §4.7).
pub struct RequestAttrs {
    pub user_agent: String,
    pub accept_language: String,
    pub platform: String,
    pub origin: Option<String>,
}

/// What the caller-facing handler needs back: either a live event receiver
/// to turn into an SSE stream, or the already-buffered outcome for a
/// backend-channel response.
pub enum EngineOutcome {
    Streamed(mpsc::UnboundedReceiver<ChatEvent>),
    Buffered { success: bool },
}

const SCRATCH_PROMPT_TURNS: usize = 10;
const ORDER_EXTRACTION_TURNS: usize = 10;

/// Runs the full algorithm in spec §4.1 step 1-8 for one request. Returns
/// an [`EngineOutcome`] matching the channel's response shape.
pub async fn handle_chat_request<V, E, X, F, L>(
    state: Arc<AppState<V, E, X, F, L>>,
    mut request: ChannelRequest,
    attrs: RequestAttrs,
) -> Result<EngineOutcome, SwitchboardError>
where
    V: VectorStore + Send + Sync + 'static,
    E: Embedder + Send + Sync + 'static,
    X: Extractor + Send + Sync + 'static,
    F: DomainFetcher + Send + Sync + 'static,
    L: LlmClient + Send + Sync + 'static,
{
    let channel = request.normalize()?;

    if channel.requires_cors_check() {
        check_cors(&state, &request, &attrs).await?;
    }

    let key_attrs = KeyAttributes {
        user_agent: &attrs.user_agent,
        accept_language: &attrs.accept_language,
        platform: &attrs.platform,
    };
    let session_key = SessionKey::resolve(
        &request.company_id,
        request.user_info.user_id.as_deref(),
        request.user_info.device_id.as_deref(),
        request.session_id.as_deref(),
        &key_attrs,
    );

    let is_first_turn = state.scratch.turn_count(&session_key) == 0;

    let history = state.scratch.snapshot(&session_key, SCRATCH_PROMPT_TURNS);
    state.scratch.append(
        &session_key,
        Turn { role: Role::User, content: request.message.clone(), at: Utc::now() },
    );

    if is_first_turn {
        fan_out_conversation_created(&state, &request, channel);
    }
    fan_out_message_created(&state, &request, channel, Role::User, &request.message);

    let context = assemble_context(&state, &request).await?;
    let system_prompt = prompt::build_system_prompt(request.industry.as_deref(), &context);
    let user_message = prompt::build_user_message(&history, &request.message);

    let message_id = request.message_id.clone().unwrap_or_default();

    if channel.is_frontend() {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run_streaming_turn(
            state,
            request,
            channel,
            session_key,
            system_prompt,
            user_message,
            message_id,
            tx,
        ));
        Ok(EngineOutcome::Streamed(rx))
    } else {
        let success = run_backend_turn(
            &state,
            &request,
            channel,
            &session_key,
            system_prompt,
            user_message,
            message_id,
        )
        .await;
        Ok(EngineOutcome::Buffered { success })
    }
}

async fn check_cors<V, E, X, F, L>(
    state: &AppState<V, E, X, F, L>,
    request: &ChannelRequest,
    attrs: &RequestAttrs,
) -> Result<(), SwitchboardError>
where
    V: VectorStore + Send + Sync + 'static,
    E: Embedder + Send + Sync + 'static,
    X: Extractor + Send + Sync + 'static,
    F: DomainFetcher + Send + Sync + 'static,
    L: LlmClient + Send + Sync + 'static,
{
    let plugin_id = request.plugin_id.as_deref().unwrap_or_default();
    let origin = attrs.origin.as_deref().unwrap_or_default();

    let domains = state
        .cors_cache
        .domains_for(plugin_id)
        .await
        .map_err(|_| SwitchboardError::OriginNotAllowed { origin: origin.to_string() })?;

    if !switchboard_cors::origin_is_allowed(origin, &domains.allowed_domains) {
        return Err(SwitchboardError::OriginNotAllowed { origin: origin.to_string() });
    }
    Ok(())
}

async fn assemble_context<V, E, X, F, L>(
    state: &AppState<V, E, X, F, L>,
    request: &ChannelRequest,
) -> Result<String, SwitchboardError>
where
    V: VectorStore + Send + Sync + 'static,
    E: Embedder + Send + Sync + 'static,
    X: Extractor + Send + Sync + 'static,
    F: DomainFetcher + Send + Sync + 'static,
    L: LlmClient + Send + Sync + 'static,
{
    let data_types = [
        DataType::Products,
        DataType::Services,
        DataType::Faq,
        DataType::KnowledgeBase,
        DataType::CompanyInfo,
    ];
    let mut search_req = HybridSearchRequest::new(&request.company_id, &request.message);
    search_req.language = request.language.as_deref();
    search_req.data_types = &data_types;

    let hits = state.rag.search(&search_req).await?;
    Ok(RagAssembler::<V, E>::format_context(&hits))
}

/// Frontend-channel path: streams tokens to `tx` as they arrive, records
/// the final structured response, and runs the shared tail (scratch
/// append, webhook fan-out, order side effects).
#[allow(clippy::too_many_arguments)]
async fn run_streaming_turn<V, E, X, F, L>(
    state: Arc<AppState<V, E, X, F, L>>,
    request: ChannelRequest,
    channel: Channel,
    session_key: SessionKey,
    system_prompt: String,
    user_message: String,
    message_id: String,
    tx: mpsc::UnboundedSender<ChatEvent>,
) where
    V: VectorStore + Send + Sync + 'static,
    E: Embedder + Send + Sync + 'static,
    X: Extractor + Send + Sync + 'static,
    F: DomainFetcher + Send + Sync + 'static,
    L: LlmClient + Send + Sync + 'static,
{
    let mut extractor = FrameExtractor::new();

    let mut stream = match state.llm.stream_chat(system_prompt, user_message).await {
        Ok(stream) => stream,
        Err(err) => {
            emit_stream_failure(&tx, &err.to_string());
            return;
        }
    };

    use futures_util::StreamExt;

    let mut failed = false;
    while let Some(item) = stream.next().await {
        match item {
            Ok(StreamEvent::Start) => {}
            Ok(StreamEvent::Content(chunk)) => {
                for event in extractor.feed(&chunk) {
                    forward_frame_event(&tx, event);
                }
            }
            Ok(StreamEvent::End) => break,
            Err(err) => {
                failed = true;
                emit_stream_failure(&tx, &err.to_string());
                break;
            }
        }
    }

    if failed {
        return;
    }

    let structured: StructuredResponse = match serde_json::from_str(extractor.full_text()) {
        Ok(parsed) => parsed,
        Err(_) => {
            emit_stream_failure(&tx, "malformed model output");
            return;
        }
    };

    let _ = tx.send(ChatEvent::Done);
    drop(tx);

    finish_turn(
        &state,
        &request,
        channel,
        &session_key,
        &message_id,
        &structured,
        true,
    )
    .await;
}

fn forward_frame_event(tx: &mpsc::UnboundedSender<ChatEvent>, event: FrameEvent) {
    let mapped = match event {
        FrameEvent::Language(language) => ChatEvent::Language { language },
        FrameEvent::Intent(intent) => ChatEvent::Intent { intent, confidence: 1.0 },
        FrameEvent::ContentDelta(delta) => ChatEvent::content_delta(delta),
    };
    let _ = tx.send(mapped);
}

/// Injects the user-facing fallback content before `error`+terminator, per
/// spec §7 ("the UI never sees a naked stack trace").
fn emit_stream_failure(tx: &mpsc::UnboundedSender<ChatEvent>, message: &str) {
    let _ = tx.send(ChatEvent::content_replace("Sorry, something went wrong, please try again."));
    let _ = tx.send(ChatEvent::Error { error: message.to_string() });
}

/// Backend-channel path: runs the LLM synchronously to completion, POSTs
/// the result to the tenant backend, and returns whether that POST
/// succeeded (fed into `{type:"backend_processed", success}`).
async fn run_backend_turn<V, E, X, F, L>(
    state: &Arc<AppState<V, E, X, F, L>>,
    request: &ChannelRequest,
    channel: Channel,
    session_key: &SessionKey,
    system_prompt: String,
    user_message: String,
    message_id: String,
) -> bool
where
    V: VectorStore + Send + Sync + 'static,
    E: Embedder + Send + Sync + 'static,
    X: Extractor + Send + Sync + 'static,
    F: DomainFetcher + Send + Sync + 'static,
    L: LlmClient + Send + Sync + 'static,
{
    let raw = match state.llm.complete(system_prompt, user_message).await {
        Ok(raw) => raw,
        Err(err) => {
            tracing::error!(company_id = %request.company_id, error = %err, "backend-channel llm call failed");
            return false;
        }
    };

    let structured: StructuredResponse = match serde_json::from_str(&raw) {
        Ok(parsed) => parsed,
        Err(err) => {
            tracing::error!(company_id = %request.company_id, error = %err, "backend-channel model output malformed");
            return false;
        }
    };

    let success = dispatch_ai_response(state, request, channel, &message_id, &structured).await;

    finish_turn(state, request, channel, session_key, &message_id, &structured, false).await;

    success
}

/// `ai.response.completed` is the one webhook that must be awaited
/// synchronously: its outcome feeds the caller-visible `success` flag
/// (spec §4.5 table, §4.1 step 8).
async fn dispatch_ai_response<V, E, X, F, L>(
    state: &AppState<V, E, X, F, L>,
    request: &ChannelRequest,
    channel: Channel,
    message_id: &str,
    structured: &StructuredResponse,
) -> bool
where
    V: VectorStore + Send + Sync + 'static,
    E: Embedder + Send + Sync + 'static,
    X: Extractor + Send + Sync + 'static,
    F: DomainFetcher + Send + Sync + 'static,
    L: LlmClient + Send + Sync + 'static,
{
    let Some(path) = WebhookEvent::AiResponseCompleted.default_path() else {
        return false;
    };
    let url = format!("{}{}", state.config.backend_webhook_url.trim_end_matches('/'), path);

    let data = serde_json::json!({
        "messageId": message_id,
        "channel": channel,
        "userInfo": request.user_info,
        "structuredResponse": structured,
    });
    let envelope = WebhookEnvelope::new(WebhookEvent::AiResponseCompleted, &request.company_id, data);

    match state.webhook_dispatcher.dispatch(reqwest::Method::POST, &url, &envelope).await {
        Ok(()) => true,
        Err(err) => {
            tracing::error!(company_id = %request.company_id, error = %err, "ai.response.completed dispatch failed");
            false
        }
    }
}

/// The shared tail of both paths: append the assistant turn, fan out the
/// remaining webhooks, and trigger the order side-effect engine if the
/// completion heuristic fires (spec §4.1 step 8).
async fn finish_turn<V, E, X, F, L>(
    state: &Arc<AppState<V, E, X, F, L>>,
    request: &ChannelRequest,
    channel: Channel,
    session_key: &SessionKey,
    message_id: &str,
    structured: &StructuredResponse,
    is_frontend: bool,
) where
    V: VectorStore + Send + Sync + 'static,
    E: Embedder + Send + Sync + 'static,
    X: Extractor + Send + Sync + 'static,
    F: DomainFetcher + Send + Sync + 'static,
    L: LlmClient + Send + Sync + 'static,
{
    state.scratch.append(
        session_key,
        Turn { role: Role::Assistant, content: structured.final_answer.clone(), at: Utc::now() },
    );

    fan_out_message_created(state, request, channel, Role::Assistant, &structured.final_answer);
    fan_out_conversation_updated(state, request, channel, message_id, structured);

    if is_frontend {
        fan_out_plugin_completed(state, request, channel, &structured.final_answer);
    }

    if let Some(intent) = Intent::parse(&structured.intent) {
        if intent.is_order_related() && turn_is_complete(intent, &request.message, &structured.final_answer) {
            let history = state.scratch.snapshot(session_key, ORDER_EXTRACTION_TURNS);
            orders::extract_and_dispatch(state, intent, &request.company_id, channel_wire_name(channel), &history).await;
        }
    }
}

fn channel_wire_name(channel: Channel) -> &'static str {
    match channel {
        Channel::Messenger => "messenger",
        Channel::Instagram => "instagram",
        Channel::Whatsapp => "whatsapp",
        Channel::Zalo => "zalo",
        Channel::ChatPlugin => "chat-plugin",
        Channel::Chatdemo => "chatdemo",
    }
}

fn fan_out_conversation_created<V, E, X, F, L>(
    state: &AppState<V, E, X, F, L>,
    request: &ChannelRequest,
    channel: Channel,
) where
    V: VectorStore + Send + Sync + 'static,
    E: Embedder + Send + Sync + 'static,
    X: Extractor + Send + Sync + 'static,
    F: DomainFetcher + Send + Sync + 'static,
    L: LlmClient + Send + Sync + 'static,
{
    let Some(path) = WebhookEvent::ConversationCreated.default_path() else { return };
    let url = format!("{}{}", state.config.backend_webhook_url.trim_end_matches('/'), path);
    let data = serde_json::json!({
        "channel": channel,
        "userInfo": request.user_info,
        "sessionId": request.session_id,
    });
    let envelope = WebhookEnvelope::new(WebhookEvent::ConversationCreated, &request.company_id, data);
    spawn_webhook(state, url, envelope);
}

fn fan_out_message_created<V, E, X, F, L>(
    state: &AppState<V, E, X, F, L>,
    request: &ChannelRequest,
    channel: Channel,
    role: Role,
    content: &str,
) where
    V: VectorStore + Send + Sync + 'static,
    E: Embedder + Send + Sync + 'static,
    X: Extractor + Send + Sync + 'static,
    F: DomainFetcher + Send + Sync + 'static,
    L: LlmClient + Send + Sync + 'static,
{
    let Some(path) = WebhookEvent::MessageCreated.default_path() else { return };
    let url = format!("{}{}", state.config.backend_webhook_url.trim_end_matches('/'), path);
    let data = serde_json::json!({
        "channel": channel,
        "role": role,
        "content": content,
        "messageId": request.message_id,
    });
    let envelope = WebhookEnvelope::new(WebhookEvent::MessageCreated, &request.company_id, data);
    spawn_webhook(state, url, envelope);
}

fn fan_out_conversation_updated<V, E, X, F, L>(
    state: &AppState<V, E, X, F, L>,
    request: &ChannelRequest,
    channel: Channel,
    message_id: &str,
    structured: &StructuredResponse,
) where
    V: VectorStore + Send + Sync + 'static,
    E: Embedder + Send + Sync + 'static,
    X: Extractor + Send + Sync + 'static,
    F: DomainFetcher + Send + Sync + 'static,
    L: LlmClient + Send + Sync + 'static,
{
    let Some(path) = WebhookEvent::ConversationUpdated.default_path() else { return };
    let url = format!("{}{}", state.config.backend_webhook_url.trim_end_matches('/'), path);
    let data = serde_json::json!({
        "channel": channel,
        "messageId": message_id,
        "intent": structured.intent,
    });
    let envelope = WebhookEnvelope::new(WebhookEvent::ConversationUpdated, &request.company_id, data);
    spawn_webhook(state, url, envelope);
}

fn fan_out_plugin_completed<V, E, X, F, L>(
    state: &AppState<V, E, X, F, L>,
    request: &ChannelRequest,
    channel: Channel,
    final_answer: &str,
) where
    V: VectorStore + Send + Sync + 'static,
    E: Embedder + Send + Sync + 'static,
    X: Extractor + Send + Sync + 'static,
    F: DomainFetcher + Send + Sync + 'static,
    L: LlmClient + Send + Sync + 'static,
{
    let Some(path) = WebhookEvent::AiResponsePluginCompleted.default_path() else { return };
    let url = format!("{}{}", state.config.backend_webhook_url.trim_end_matches('/'), path);
    let data = serde_json::json!({
        "channel": channel,
        "userInfo": request.user_info,
        "userMessage": request.message,
        "aiResponse": final_answer,
    });
    let envelope = WebhookEnvelope::new(WebhookEvent::AiResponsePluginCompleted, &request.company_id, data);
    spawn_webhook(state, url, envelope);
}

fn spawn_webhook<V, E, X, F, L>(state: &AppState<V, E, X, F, L>, url: String, envelope: WebhookEnvelope)
where
    V: VectorStore + Send + Sync + 'static,
    E: Embedder + Send + Sync + 'static,
    X: Extractor + Send + Sync + 'static,
    F: DomainFetcher + Send + Sync + 'static,
    L: LlmClient + Send + Sync + 'static,
{
    switchboard_webhooks::fan_out(
        state.webhook_dispatcher.clone(),
        vec![PendingWebhook { method: reqwest::Method::POST, url, envelope }],
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_wire_name_round_trips_parse() {
        for raw in ["messenger", "instagram", "whatsapp", "zalo", "chat-plugin", "chatdemo"] {
            let channel = Channel::parse(raw).unwrap();
            assert_eq!(channel_wire_name(channel), raw);
        }
    }
}
