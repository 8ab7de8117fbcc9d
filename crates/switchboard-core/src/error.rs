//! Stable error taxonomy shared across the control plane.
//!
//! Every fallible boundary in the workspace resolves to one of these codes.
//! The code is what crosses process boundaries (HTTP body, webhook payload,
//! task status); the human message is for logs and debugging only.

use thiserror::Error;

/// A control-plane error carrying a stable machine-readable `code`.
#[derive(Debug, Error)]
pub enum SwitchboardError {
    #[error("missing required field: {0}")]
    MissingRequiredField(String),

    #[error("unknown channel: {0}")]
    InvalidChannel(String),

    #[error("unsupported file type: {0}")]
    UnsupportedFileType(String),

    #[error("file too large: {size_bytes} bytes (max {max_bytes})")]
    FileTooLarge { size_bytes: u64, max_bytes: u64 },

    #[error("origin not allowed: {origin}")]
    OriginNotAllowed { origin: String },

    #[error("invalid API key")]
    InvalidApiKey,

    #[error("invalid internal key")]
    InvalidInternalKey,

    #[error("invalid webhook secret")]
    InvalidWebhookSecret,

    #[error("company not found: {0}")]
    CompanyNotFound(String),

    #[error("task not found: {0}")]
    TaskNotFound(String),

    #[error("extraction data not found: {0}")]
    ExtractionDataNotFound(String),

    #[error("plugin not found: {0}")]
    PluginNotFound(String),

    #[error("llm call failed: {0}")]
    LlmFailed(String),

    #[error("embedding failed: {0}")]
    EmbeddingFailed(String),

    #[error("vector store failed: {0}")]
    VectorStoreFailed(String),

    #[error("extractor failed: {0}")]
    ExtractorFailed(String),

    #[error("backend post failed: {0}")]
    BackendPostFailed(String),

    #[error("queue unavailable: {0}")]
    QueueUnavailable(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl SwitchboardError {
    /// Stable machine-readable code, as it appears in `{success:false, error:<code>}`.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingRequiredField(_) => "MISSING_REQUIRED_FIELD",
            Self::InvalidChannel(_) => "INVALID_CHANNEL",
            Self::UnsupportedFileType(_) => "UNSUPPORTED_FILE_TYPE",
            Self::FileTooLarge { .. } => "FILE_TOO_LARGE",
            Self::OriginNotAllowed { .. } => "ORIGIN_NOT_ALLOWED",
            Self::InvalidApiKey => "INVALID_API_KEY",
            Self::InvalidInternalKey => "INVALID_INTERNAL_KEY",
            Self::InvalidWebhookSecret => "INVALID_WEBHOOK_SECRET",
            Self::CompanyNotFound(_) => "COMPANY_NOT_FOUND",
            Self::TaskNotFound(_) => "TASK_NOT_FOUND",
            Self::ExtractionDataNotFound(_) => "EXTRACTION_DATA_NOT_FOUND",
            Self::PluginNotFound(_) => "PLUGIN_NOT_FOUND",
            Self::LlmFailed(_) => "LLM_FAILED",
            Self::EmbeddingFailed(_) => "EMBEDDING_FAILED",
            Self::VectorStoreFailed(_) => "VECTOR_STORE_FAILED",
            Self::ExtractorFailed(_) => "EXTRACTOR_FAILED",
            Self::BackendPostFailed(_) => "BACKEND_POST_FAILED",
            Self::QueueUnavailable(_) => "QUEUE_UNAVAILABLE",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Whether this class of error is retryable per the component's retry policy.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::LlmFailed(_)
                | Self::EmbeddingFailed(_)
                | Self::VectorStoreFailed(_)
                | Self::ExtractorFailed(_)
                | Self::BackendPostFailed(_)
                | Self::QueueUnavailable(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(
            SwitchboardError::InvalidChannel("tiktok".into()).code(),
            "INVALID_CHANNEL"
        );
        assert_eq!(
            SwitchboardError::FileTooLarge {
                size_bytes: 1,
                max_bytes: 1
            }
            .code(),
            "FILE_TOO_LARGE"
        );
    }

    #[test]
    fn upstream_errors_are_transient() {
        assert!(SwitchboardError::LlmFailed("timeout".into()).is_transient());
        assert!(!SwitchboardError::InvalidApiKey.is_transient());
    }
}
