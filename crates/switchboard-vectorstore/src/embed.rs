//! Embedding client: turns text into vectors via an external provider, a
//! single `reqwest::Client` built once with a timeout and wrapped behind
//! a small async trait.

use std::future::Future;
use std::time::Duration;

use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};

use crate::error::EmbeddingError;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

/// Minimal seam so the RAG assembler and ingestion worker don't depend on a
/// concrete HTTP embedding provider.
pub trait Embedder: Send + Sync {
    fn embed(&self, texts: Vec<String>) -> impl Future<Output = Result<Vec<Vec<f32>>, EmbeddingError>> + Send;
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingDatum>,
}

#[derive(Deserialize)]
struct EmbeddingDatum {
    embedding: Vec<f32>,
}

/// HTTP client for an OpenAI-compatible embeddings endpoint.
pub struct HttpEmbedder {
    http: HttpClient,
    base_url: String,
    api_key: String,
    model: String,
}

impl HttpEmbedder {
    pub fn new(base_url: &str, api_key: &str, model: &str) -> Self {
        Self {
            http: HttpClient::builder()
                .timeout(DEFAULT_TIMEOUT)
                .build()
                .unwrap_or_else(|_| HttpClient::new()),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        }
    }
}

impl Embedder for HttpEmbedder {
    async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/embeddings", self.base_url);
        let body = EmbeddingRequest {
            model: &self.model,
            input: &texts,
        };

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| EmbeddingError::RequestFailed(e.to_string()))?;

        let response = response
            .error_for_status()
            .map_err(|e| EmbeddingError::RequestFailed(e.to_string()))?;

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| EmbeddingError::RequestFailed(e.to_string()))?;

        if parsed.data.len() != texts.len() {
            return Err(EmbeddingError::CountMismatch {
                count: parsed.data.len(),
                expected: texts.len(),
            });
        }

        for datum in &parsed.data {
            if datum.embedding.is_empty() {
                return Err(EmbeddingError::EmptyVector);
            }
        }

        Ok(parsed.data.into_iter().map(|d| d.embedding).collect())
    }
}

/// Lets an embedder be shared between the RAG assembler and the ingestion
/// worker by cloning the `Arc` instead of the underlying client.
impl<T> Embedder for std::sync::Arc<T>
where
    T: Embedder + ?Sized,
{
    fn embed(&self, texts: Vec<String>) -> impl Future<Output = Result<Vec<Vec<f32>>, EmbeddingError>> + Send {
        (**self).embed(texts)
    }
}

/// Fixed, non-random vectors for tests and local development — never used
/// to serve real retrieval.
pub struct MockEmbedder {
    pub dimension: usize,
}

impl Embedder for MockEmbedder {
    async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Ok(texts
            .iter()
            .map(|t| {
                let seed = switchboard_core::ids::hash_to_u64(t.as_bytes());
                (0..self.dimension)
                    .map(|i| {
                        let bit = (seed >> (i % 64)) & 1;
                        if bit == 1 { 0.1 } else { -0.1 }
                    })
                    .collect()
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_embedder_is_deterministic() {
        let embedder = MockEmbedder { dimension: 8 };
        let a = embedder.embed(vec!["hello".to_string()]).await.unwrap();
        let b = embedder.embed(vec!["hello".to_string()]).await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a[0].len(), 8);
    }

    #[tokio::test]
    async fn mock_embedder_empty_input_returns_empty() {
        let embedder = MockEmbedder { dimension: 8 };
        let out = embedder.embed(vec![]).await.unwrap();
        assert!(out.is_empty());
    }
}
