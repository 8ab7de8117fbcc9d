//! External AI extraction client (spec §4.3 step 4), grounded in the
//! teacher's `HttpEmbedder`-style `reqwest::Client` wrapper.

use base64::Engine;
use serde_json::Value as Json;
use thiserror::Error;

use crate::model::ExtractionDataType;

#[derive(Debug, Error)]
pub enum ExtractorError {
    #[error("extraction request failed: {0}")]
    RequestFailed(String),
    #[error("extractor returned an unparseable result: {0}")]
    InvalidResult(String),
}

/// A single unit handed to the extraction provider: raw file bytes plus
/// enough context for it to pick a prompt template.
pub struct ExtractionInput<'a> {
    pub file_bytes: &'a [u8],
    pub content_type: &'a str,
    pub industry: &'a str,
    pub data_type: ExtractionDataType,
}

/// Converts raw file bytes into structured catalog items or knowledge-base
/// text. Implementations pick a model by content type: vision-capable for
/// images, a text model otherwise.
pub trait Extractor: Send + Sync {
    fn extract(
        &self,
        input: ExtractionInput<'_>,
    ) -> impl std::future::Future<Output = Result<Json, ExtractorError>> + Send;
}

/// Calls a configured HTTP extraction endpoint (e.g. a hosted vision/text
/// model gateway) with the raw file and an industry-specific prompt.
#[derive(Clone)]
pub struct HttpExtractor {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl HttpExtractor {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { http, endpoint: endpoint.into(), api_key: api_key.into() }
    }

    fn model_for(content_type: &str) -> &'static str {
        if content_type.starts_with("image/") {
            "vision"
        } else {
            "text"
        }
    }
}

impl Extractor for HttpExtractor {
    async fn extract(&self, input: ExtractionInput<'_>) -> Result<Json, ExtractorError> {
        let model = Self::model_for(input.content_type);

        tracing::debug!(model, industry = input.industry, "dispatching extraction request");

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .header("content-type", "application/json")
            .json(&serde_json::json!({
                "model": model,
                "industry": input.industry,
                "dataType": input.data_type,
                "fileContentType": input.content_type,
                "fileBase64": base64::engine::general_purpose::STANDARD.encode(input.file_bytes),
            }))
            .send()
            .await
            .map_err(|e| ExtractorError::RequestFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ExtractorError::RequestFailed(format!(
                "extractor responded with status {}",
                response.status()
            )));
        }

        response
            .json::<Json>()
            .await
            .map_err(|e| ExtractorError::InvalidResult(e.to_string()))
    }
}

/// Lets an extractor be shared between the admin sync-ingestion path and
/// the background worker pool by cloning the `Arc` instead of the
/// underlying client.
impl<T> Extractor for std::sync::Arc<T>
where
    T: Extractor + ?Sized,
{
    fn extract(&self, input: ExtractionInput<'_>) -> impl std::future::Future<Output = Result<Json, ExtractorError>> + Send {
        (**self).extract(input)
    }
}

/// Deterministic extractor for tests: echoes back a fixed structure based
/// on `data_type` without making any network call.
#[derive(Clone, Default)]
pub struct MockExtractor;

impl Extractor for MockExtractor {
    async fn extract(&self, input: ExtractionInput<'_>) -> Result<Json, ExtractorError> {
        match input.data_type {
            ExtractionDataType::Catalog => Ok(serde_json::json!({
                "items": [
                    {"id": "mock-1", "category": "mock", "name": "Mock Item", "price": 10},
                ],
            })),
            ExtractionDataType::KnowledgeBase => Ok(serde_json::json!({
                "text": "Mock extracted knowledge-base content.",
            })),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_selection_picks_vision_for_images() {
        assert_eq!(HttpExtractor::model_for("image/png"), "vision");
        assert_eq!(HttpExtractor::model_for("application/pdf"), "text");
    }

    #[tokio::test]
    async fn mock_extractor_returns_catalog_items() {
        let extractor = MockExtractor;
        let result = extractor
            .extract(ExtractionInput {
                file_bytes: b"irrelevant",
                content_type: "application/pdf",
                industry: "restaurant",
                data_type: ExtractionDataType::Catalog,
            })
            .await
            .unwrap();
        assert!(result["items"].is_array());
    }
}
