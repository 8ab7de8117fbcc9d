//! Error-to-HTTP mapping. Wraps every collaborator's error type and
//! derives an HTTP status and machine-readable code from it.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use switchboard_core::SwitchboardError;

use crate::llm::LlmError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Switchboard(#[from] SwitchboardError),

    #[error("llm error: {0}")]
    Llm(#[from] LlmError),

    #[error("vector store error: {0}")]
    VectorStore(#[from] switchboard_vectorstore::VectorStoreError),

    #[error("embedding error: {0}")]
    Embedding(#[from] switchboard_vectorstore::EmbeddingError),

    #[error("cors error: {0}")]
    Cors(#[from] switchboard_cors::CorsError),

    #[error("webhook error: {0}")]
    Webhook(#[from] switchboard_webhooks::WebhookError),

    #[error("ingestion error: {0}")]
    Ingest(#[from] switchboard_ingest::WorkerError),

    #[error("invalid request body: {0}")]
    InvalidBody(String),

    #[error("unauthorized: {0}")]
    Unauthorized(&'static str),
}

#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    error: &'static str,
    message: String,
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Switchboard(e) => (status_for_code(e.code()), e.code()),
            ApiError::Llm(_) => (StatusCode::BAD_GATEWAY, "LLM_FAILED"),
            ApiError::VectorStore(_) => (StatusCode::INTERNAL_SERVER_ERROR, "VECTOR_STORE_FAILED"),
            ApiError::Embedding(_) => (StatusCode::INTERNAL_SERVER_ERROR, "EMBEDDING_FAILED"),
            ApiError::Cors(switchboard_cors::CorsError::PluginNotFound(_)) => {
                (StatusCode::NOT_FOUND, "PLUGIN_NOT_FOUND")
            }
            ApiError::Cors(_) => (StatusCode::FORBIDDEN, "ORIGIN_NOT_ALLOWED"),
            ApiError::Webhook(_) => (StatusCode::INTERNAL_SERVER_ERROR, "BACKEND_POST_FAILED"),
            ApiError::Ingest(switchboard_ingest::WorkerError::FileNotFound(_)) => {
                (StatusCode::NOT_FOUND, "EXTRACTION_DATA_NOT_FOUND")
            }
            ApiError::Ingest(switchboard_ingest::WorkerError::UnsupportedContentType(_)) => {
                (StatusCode::BAD_REQUEST, "UNSUPPORTED_FILE_TYPE")
            }
            ApiError::Ingest(switchboard_ingest::WorkerError::FileTooLarge(_)) => {
                (StatusCode::PAYLOAD_TOO_LARGE, "FILE_TOO_LARGE")
            }
            ApiError::Ingest(_) => (StatusCode::BAD_GATEWAY, "EXTRACTOR_FAILED"),
            ApiError::InvalidBody(_) => (StatusCode::BAD_REQUEST, "MISSING_REQUIRED_FIELD"),
            ApiError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "INVALID_API_KEY"),
        }
    }
}

fn status_for_code(code: &str) -> StatusCode {
    match code {
        "MISSING_REQUIRED_FIELD" | "INVALID_CHANNEL" | "UNSUPPORTED_FILE_TYPE" => {
            StatusCode::BAD_REQUEST
        }
        "FILE_TOO_LARGE" => StatusCode::PAYLOAD_TOO_LARGE,
        "ORIGIN_NOT_ALLOWED" => StatusCode::FORBIDDEN,
        "INVALID_API_KEY" | "INVALID_INTERNAL_KEY" | "INVALID_WEBHOOK_SECRET" => {
            StatusCode::UNAUTHORIZED
        }
        "COMPANY_NOT_FOUND" | "TASK_NOT_FOUND" | "EXTRACTION_DATA_NOT_FOUND" | "PLUGIN_NOT_FOUND" => {
            StatusCode::NOT_FOUND
        }
        "LLM_FAILED" => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        if status.is_server_error() {
            tracing::error!(error = %self, code, "request failed");
        } else {
            tracing::warn!(error = %self, code, "request rejected");
        }

        let body = ErrorBody {
            success: false,
            error: code,
            message: self.to_string(),
        };

        (status, Json(body)).into_response()
    }
}
