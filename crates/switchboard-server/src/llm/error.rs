use thiserror::Error;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("llm call failed: {0}")]
    CallFailed(String),

    #[error("llm call timed out")]
    Timeout,

    #[error("llm stream stalled for more than the inter-token gap")]
    StreamStalled,

    #[error("llm returned no text")]
    EmptyResponse,
}
