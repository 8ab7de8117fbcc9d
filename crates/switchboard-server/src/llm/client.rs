//! LLM backend abstraction: a swappable collaborator over `genai::Client`,
//! the same seam `VectorStore`/`Embedder` already draw around Qdrant and
//! the embedding provider.

use std::pin::Pin;
use std::time::{Duration, Instant};

use futures_util::{Stream, StreamExt};
use genai::chat::{ChatMessage, ChatRequest, ChatStreamEvent};
use tokio_stream::StreamExt as _;

use super::error::LlmError;

/// Total time budget for a streaming call and the maximum gap allowed
/// between successive tokens before the stream is considered stalled.
pub const LLM_TOTAL_TIMEOUT: Duration = Duration::from_secs(60);
pub const LLM_INTER_TOKEN_GAP: Duration = Duration::from_secs(15);

#[derive(Debug, Clone)]
pub enum StreamEvent {
    Start,
    Content(String),
    End,
}

pub type ChatStream = Pin<Box<dyn Stream<Item = Result<StreamEvent, LlmError>> + Send>>;

pub trait LlmClient: Send + Sync {
    fn stream_chat(
        &self,
        system_prompt: String,
        user_message: String,
    ) -> impl Future<Output = Result<ChatStream, LlmError>> + Send;

    fn complete(
        &self,
        system_prompt: String,
        user_message: String,
    ) -> impl Future<Output = Result<String, LlmError>> + Send;
}

#[derive(Clone)]
pub struct GenaiLlmClient {
    client: genai::Client,
    model: String,
}

impl GenaiLlmClient {
    pub fn new(model: String) -> Self {
        Self {
            client: genai::Client::default(),
            model,
        }
    }

    fn request(system_prompt: String, user_message: String) -> ChatRequest {
        ChatRequest::new(vec![
            ChatMessage::system(system_prompt),
            ChatMessage::user(user_message),
        ])
    }
}

impl LlmClient for GenaiLlmClient {
    async fn stream_chat(
        &self,
        system_prompt: String,
        user_message: String,
    ) -> Result<ChatStream, LlmError> {
        let req = Self::request(system_prompt, user_message);

        let chat_stream_resp = self
            .client
            .exec_chat_stream(&self.model, req, None)
            .await
            .map_err(|e| LlmError::CallFailed(e.to_string()))?;

        let deadline = Instant::now() + LLM_TOTAL_TIMEOUT;

        let stream = chat_stream_resp
            .stream
            .timeout(LLM_INTER_TOKEN_GAP)
            .map(move |timed| match timed {
                Err(_) => Err(LlmError::StreamStalled),
                Ok(Err(e)) => Err(LlmError::CallFailed(e.to_string())),
                Ok(Ok(event)) => {
                    if Instant::now() > deadline {
                        return Err(LlmError::Timeout);
                    }
                    match event {
                        ChatStreamEvent::Start => Ok(StreamEvent::Start),
                        ChatStreamEvent::Chunk(chunk) => Ok(StreamEvent::Content(chunk.content)),
                        ChatStreamEvent::End(_) => Ok(StreamEvent::End),
                        _ => Ok(StreamEvent::Content(String::new())),
                    }
                }
            });

        Ok(Box::pin(stream))
    }

    async fn complete(&self, system_prompt: String, user_message: String) -> Result<String, LlmError> {
        let req = Self::request(system_prompt, user_message);

        let resp = tokio::time::timeout(
            LLM_TOTAL_TIMEOUT,
            self.client.exec_chat(&self.model, req, None),
        )
        .await
        .map_err(|_| LlmError::Timeout)?
        .map_err(|e| LlmError::CallFailed(e.to_string()))?;

        resp.first_text()
            .map(|t| t.to_string())
            .filter(|t| !t.is_empty())
            .ok_or(LlmError::EmptyResponse)
    }
}

/// Deterministic canned responses for exercising the server without a
/// live provider key (see `SWITCHBOARD_MOCK_MODE`).
#[derive(Clone, Default)]
pub struct MockLlmClient;

impl LlmClient for MockLlmClient {
    async fn stream_chat(
        &self,
        _system_prompt: String,
        user_message: String,
    ) -> Result<ChatStream, LlmError> {
        let body = format!(
            "{{\"thinking\":{{\"intent\":\"GENERAL_CHAT\",\"language\":\"en\"}},\"intent\":\"GENERAL_CHAT\",\"language\":\"en\",\"final_answer\":\"Mock reply to: {}\"}}",
            user_message.replace('"', "'")
        );
        let events = vec![
            Ok(StreamEvent::Start),
            Ok(StreamEvent::Content(body)),
            Ok(StreamEvent::End),
        ];
        Ok(Box::pin(futures_util::stream::iter(events)))
    }

    async fn complete(&self, _system_prompt: String, user_message: String) -> Result<String, LlmError> {
        Ok(format!("Mock completion for: {user_message}"))
    }
}
