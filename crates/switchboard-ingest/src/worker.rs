//! Ingestion worker: claims a task, fetches the file, extracts, chunks,
//! embeds, upserts, and fires the callback webhook.

use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::Method;
use serde_json::json;
use switchboard_core::RetryPolicy;
use switchboard_vectorstore::{DataType, Embedder, VectorEntry, VectorStore, WriteConsistency};
use switchboard_webhooks::{WebhookDispatcher, WebhookEnvelope, WebhookEvent};
use thiserror::Error;

use crate::chunk::{chunk_catalog_items, chunk_knowledge_base_text, CatalogItem};
use crate::extractor::{ExtractionInput, Extractor, ExtractorError};
use crate::model::{ExtractionDataType, ExtractionTask, TaskSummary};
use crate::queue::TaskQueue;

const DEFAULT_MAX_FILE_SIZE_BYTES: u64 = 50 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("file not found: {0}")]
    FileNotFound(String),
    #[error("failed to fetch file: {0}")]
    FetchFailed(String),
    #[error("unsupported content type: {0}")]
    UnsupportedContentType(String),
    #[error("file exceeds the {0}-byte limit")]
    FileTooLarge(u64),
    #[error("extraction failed: {0}")]
    ExtractionFailed(#[from] ExtractorError),
    #[error("embedding failed: {0}")]
    EmbeddingFailed(String),
    #[error("vector store write failed: {0}")]
    UpsertFailed(String),
}

/// Network errors and non-404/415 failure statuses are treated as
/// transient and retried; everything else is a terminal validation
/// failure (spec §4.3 retry policy).
fn is_transient_fetch_error(err: &WorkerError) -> bool {
    matches!(err, WorkerError::FetchFailed(_))
}

/// Network errors and non-2xx extractor responses are transient (spec
/// §4.5: "5xx from extractor" is retried); a response that came back
/// 2xx but didn't parse as the expected JSON shape is a terminal
/// validation failure (spec §4.3 step 10: "malformed template output").
fn is_transient_extractor_error(err: &ExtractorError) -> bool {
    matches!(err, ExtractorError::RequestFailed(_))
}

/// Vector-store upserts have no validation-failure variant in this
/// client; every error surfaced by [`VectorStore::upsert`] is a transient
/// infrastructure failure (spec §4.5: "5xx from vector store").
fn is_transient_upsert_error(_err: &switchboard_vectorstore::VectorStoreError) -> bool {
    true
}

const SUPPORTED_CONTENT_TYPES: &[&str] = &[
    "application/pdf",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    "text/plain",
    "image/png",
    "image/jpeg",
];

pub struct IngestWorker<S, E, X> {
    queue: Arc<TaskQueue>,
    store: S,
    embedder: E,
    extractor: X,
    dispatcher: WebhookDispatcher,
    http: reqwest::Client,
    collection: String,
    max_file_size_bytes: u64,
    retry_policy: RetryPolicy,
    embedding_model: String,
}

impl<S, E, X> IngestWorker<S, E, X>
where
    S: VectorStore,
    E: Embedder,
    X: Extractor,
{
    pub fn new(
        queue: Arc<TaskQueue>,
        store: S,
        embedder: E,
        extractor: X,
        dispatcher: WebhookDispatcher,
        collection: impl Into<String>,
        embedding_model: impl Into<String>,
    ) -> Self {
        Self {
            queue,
            store,
            embedder,
            extractor,
            dispatcher,
            http: reqwest::Client::builder()
                .timeout(Duration::from_secs(120))
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            collection: collection.into(),
            max_file_size_bytes: DEFAULT_MAX_FILE_SIZE_BYTES,
            retry_policy: RetryPolicy::default(),
            embedding_model: embedding_model.into(),
        }
    }

    /// Claims at most one task and runs it to a terminal state, dispatching
    /// its callback. Returns `false` when the queue had nothing pending.
    #[tracing::instrument(skip(self))]
    pub async fn process_once(&self) -> bool {
        let Some(task) = self.queue.claim() else {
            return false;
        };

        let started = Instant::now();
        let task_id = task.task_id.clone();

        match self.run_task(&task).await {
            Ok(outcome) => {
                let summary = TaskSummary {
                    chunks_created: outcome.chunks_created,
                    processing_time_seconds: started.elapsed().as_secs_f64(),
                };
                self.queue.complete(&task_id, serde_json::to_value(&summary).unwrap_or(json!({})));
                self.dispatch_callback(&task, Ok((&summary, &outcome))).await;
            }
            Err(err) => {
                tracing::warn!(task_id = %task_id, error = %err, "ingestion task failed");
                self.queue.fail(&task_id, err.to_string());
                self.dispatch_callback(&task, Err(&err)).await;
            }
        }

        true
    }

    /// Runs one task to completion without touching the queue: fetch,
    /// extract, chunk, embed, upsert. Used both by [`Self::process_once`]
    /// (queue-driven) and by callers that want synchronous ingestion for
    /// a single file outside the worker pool.
    pub async fn run_task(&self, task: &ExtractionTask) -> Result<TaskOutcome, WorkerError> {
        let bytes = self.fetch_file(&task.file_url).await?;
        let extracted = self.extract_with_retry(task, &bytes).await?;
        self.run_task_from_extraction(task, extracted).await
    }

    /// Calls the extractor, retrying transient failures (network errors,
    /// non-2xx responses) with backoff. A response that parses as JSON but
    /// fails validation downstream is terminal and returned immediately
    /// (spec §4.3 retry policy / §4.5 transient-substep table).
    async fn extract_with_retry(&self, task: &ExtractionTask, bytes: &[u8]) -> Result<serde_json::Value, WorkerError> {
        let mut attempt = 0u32;
        loop {
            attempt += 1;

            let result = self
                .extractor
                .extract(ExtractionInput {
                    file_bytes: bytes,
                    content_type: &task.file_metadata.content_type,
                    industry: &task.industry,
                    data_type: task.data_type,
                })
                .await;

            match result {
                Ok(extracted) => return Ok(extracted),
                Err(err) if is_transient_extractor_error(&err) && self.retry_policy.should_retry(attempt) => {
                    tracing::warn!(task_id = %task.task_id, attempt, error = %err, "transient extractor failure, retrying");
                    tokio::time::sleep(self.retry_policy.delay_for_attempt(attempt)).await;
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// The chunk/embed/upsert tail of [`run_task`], split out so it can be
    /// exercised directly in tests without a real file fetch.
    async fn run_task_from_extraction(
        &self,
        task: &ExtractionTask,
        extracted: serde_json::Value,
    ) -> Result<TaskOutcome, WorkerError> {
        let content_chunks: Vec<String> = match task.data_type {
            ExtractionDataType::Catalog => {
                let items = parse_catalog_items(&extracted);
                chunk_catalog_items(items)
                    .into_iter()
                    .map(|chunk| {
                        chunk
                            .items
                            .iter()
                            .map(|i| i.content_for_embedding.as_str())
                            .collect::<Vec<_>>()
                            .join("\n")
                    })
                    .collect()
            }
            ExtractionDataType::KnowledgeBase => {
                let text = extracted.get("text").and_then(|v| v.as_str()).unwrap_or_default();
                chunk_knowledge_base_text(text, 4000)
            }
        };

        if content_chunks.is_empty() {
            return Ok(TaskOutcome { chunks_created: 0, vector_dimensions: 0 });
        }

        let vectors = self
            .embedder
            .embed(content_chunks.clone())
            .await
            .map_err(|e| WorkerError::EmbeddingFailed(e.to_string()))?;

        let data_type = match task.data_type {
            ExtractionDataType::Catalog => DataType::Products,
            ExtractionDataType::KnowledgeBase => DataType::KnowledgeBase,
        };
        let tenant_hash = switchboard_core::ids::hash_tenant_id(&task.company_id);

        let entries: Vec<VectorEntry> = content_chunks
            .iter()
            .zip(vectors.into_iter())
            .map(|(text, vector)| {
                let content_hash = switchboard_core::ids::hash_to_u64(text.as_bytes());
                VectorEntry {
                    point_id: switchboard_core::ids::generate_point_id(tenant_hash, content_hash),
                    company_id: task.company_id.clone(),
                    data_type,
                    language: "auto".to_string(),
                    industry: Some(task.industry.clone()),
                    file_id: Some(task.task_id.clone()),
                    product_id: None,
                    service_id: None,
                    tags: Vec::new(),
                    content_for_embedding: text.clone(),
                    structured_data: extracted.clone(),
                    vector,
                }
            })
            .collect();

        let chunks_created = entries.len();
        let vector_dimensions = entries.first().map(|e| e.vector.len()).unwrap_or(0);

        self.upsert_with_retry(entries).await?;

        Ok(TaskOutcome { chunks_created, vector_dimensions })
    }

    /// Upserts the chunk's vector entries, retrying transient vector-store
    /// failures with backoff (spec §4.5: "5xx from vector store").
    async fn upsert_with_retry(&self, entries: Vec<VectorEntry>) -> Result<(), WorkerError> {
        let mut attempt = 0u32;
        loop {
            attempt += 1;

            match self.store.upsert(&self.collection, entries.clone(), WriteConsistency::Strong).await {
                Ok(()) => return Ok(()),
                Err(err) if is_transient_upsert_error(&err) && self.retry_policy.should_retry(attempt) => {
                    tracing::warn!(attempt, error = %err, "transient vector store upsert failure, retrying");
                    tokio::time::sleep(self.retry_policy.delay_for_attempt(attempt)).await;
                }
                Err(err) => return Err(WorkerError::UpsertFailed(err.to_string())),
            }
        }
    }

    /// Fetches the file, retrying transient failures (network errors, 5xx)
    /// with backoff. 404, 415, and over-size are hard failures and return
    /// immediately without consuming a retry attempt.
    async fn fetch_file(&self, url: &str) -> Result<Vec<u8>, WorkerError> {
        let mut attempt = 0u32;
        loop {
            attempt += 1;

            match self.fetch_file_once(url).await {
                Ok(bytes) => return Ok(bytes),
                Err(err) if is_transient_fetch_error(&err) && self.retry_policy.should_retry(attempt) => {
                    tracing::warn!(url, attempt, error = %err, "transient file fetch failure, retrying");
                    tokio::time::sleep(self.retry_policy.delay_for_attempt(attempt)).await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn fetch_file_once(&self, url: &str) -> Result<Vec<u8>, WorkerError> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| WorkerError::FetchFailed(e.to_string()))?;

        let status = response.status();
        if status.as_u16() == 404 {
            return Err(WorkerError::FileNotFound(url.to_string()));
        }
        if status.as_u16() == 415 {
            return Err(WorkerError::UnsupportedContentType(url.to_string()));
        }
        if !status.is_success() {
            return Err(WorkerError::FetchFailed(format!("status {status}")));
        }

        if let Some(content_type) = response.headers().get(reqwest::header::CONTENT_TYPE) {
            if let Ok(content_type) = content_type.to_str() {
                let base = content_type.split(';').next().unwrap_or(content_type).trim();
                if !SUPPORTED_CONTENT_TYPES.contains(&base) {
                    return Err(WorkerError::UnsupportedContentType(base.to_string()));
                }
            }
        }

        if let Some(len) = response.content_length() {
            if len > self.max_file_size_bytes {
                return Err(WorkerError::FileTooLarge(self.max_file_size_bytes));
            }
        }

        let bytes = response.bytes().await.map_err(|e| WorkerError::FetchFailed(e.to_string()))?;
        if bytes.len() as u64 > self.max_file_size_bytes {
            return Err(WorkerError::FileTooLarge(self.max_file_size_bytes));
        }

        Ok(bytes.to_vec())
    }

    async fn dispatch_callback(
        &self,
        task: &ExtractionTask,
        outcome: Result<(&TaskSummary, &TaskOutcome), &WorkerError>,
    ) {
        let data = self.callback_payload(task, outcome);
        let envelope = WebhookEnvelope::new(WebhookEvent::FileUploaded, &task.company_id, data);
        if let Err(err) = self.dispatcher.dispatch(Method::POST, &task.callback_url, &envelope).await {
            tracing::error!(task_id = %task.task_id, error = %err, "ingestion callback delivery failed");
        }
    }

    /// Builds the callback body (spec §4.3 step 9/10): pulled out of
    /// [`Self::dispatch_callback`] so the payload shape can be asserted on
    /// without making a network call.
    fn callback_payload(
        &self,
        task: &ExtractionTask,
        outcome: Result<(&TaskSummary, &TaskOutcome), &WorkerError>,
    ) -> serde_json::Value {
        match outcome {
            Ok((summary, details)) => json!({
                "event": WebhookEvent::FileUploaded.name(),
                "fileId": task.task_id,
                "taskId": task.task_id,
                "status": "completed",
                "chunksCreated": summary.chunks_created,
                "processingTime": summary.processing_time_seconds,
                "qdrantCollection": self.collection,
                "vectorDimensions": details.vector_dimensions,
                "embeddingModel": self.embedding_model,
            }),
            Err(err) => json!({
                "event": WebhookEvent::FileUploaded.name(),
                "fileId": task.task_id,
                "taskId": task.task_id,
                "status": "failed",
                "error": err.to_string(),
            }),
        }
    }
}

pub struct TaskOutcome {
    pub chunks_created: usize,
    pub vector_dimensions: usize,
}

fn parse_catalog_items(extracted: &serde_json::Value) -> Vec<CatalogItem> {
    extracted
        .get("items")
        .and_then(|v| v.as_array())
        .map(|items| {
            items
                .iter()
                .enumerate()
                .map(|(idx, item)| {
                    let id = item
                        .get("id")
                        .and_then(|v| v.as_str())
                        .map(str::to_string)
                        .unwrap_or_else(|| format!("item-{idx}"));
                    let category = item.get("category").and_then(|v| v.as_str()).map(str::to_string);
                    let name = item.get("name").and_then(|v| v.as_str()).unwrap_or_default();
                    let price = item.get("price").and_then(|v| v.as_f64());
                    let content = match price {
                        Some(p) => format!("{name} ({}) - {p}", category.as_deref().unwrap_or("uncategorized")),
                        None => format!("{name} ({})", category.as_deref().unwrap_or("uncategorized")),
                    };
                    CatalogItem {
                        id,
                        category,
                        content_for_embedding: content,
                        payload: item.clone(),
                    }
                })
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::MockExtractor;
    use crate::model::FileMetadata;
    use std::sync::atomic::{AtomicU32, Ordering};
    use serde_json::Value as Json;
    use switchboard_vectorstore::{MockEmbedder, MockVectorStore};

    /// Fails with a transient (5xx-shaped) error the first `fail_times`
    /// calls, then delegates to [`MockExtractor`] — exercises the
    /// extraction retry loop the way spec §8 scenario 6 describes for the
    /// file-fetch substep.
    #[derive(Clone)]
    struct FlakyExtractor {
        fail_times: u32,
        calls: std::sync::Arc<AtomicU32>,
    }

    impl FlakyExtractor {
        fn new(fail_times: u32) -> Self {
            Self { fail_times, calls: std::sync::Arc::new(AtomicU32::new(0)) }
        }
    }

    impl Extractor for FlakyExtractor {
        async fn extract(&self, input: ExtractionInput<'_>) -> Result<Json, ExtractorError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if call <= self.fail_times {
                return Err(ExtractorError::RequestFailed("extractor responded with status 503".to_string()));
            }
            MockExtractor.extract(input).await
        }
    }

    fn new_worker() -> IngestWorker<MockVectorStore, MockEmbedder, MockExtractor> {
        IngestWorker::new(
            Arc::new(TaskQueue::new()),
            MockVectorStore::new(),
            MockEmbedder { dimension: 8 },
            MockExtractor,
            WebhookDispatcher::new("secret", "0.1.0", Default::default()),
            "switchboard_vectors",
            "mock-embedding-model",
        )
    }

    #[test]
    fn parse_catalog_items_falls_back_to_uncategorized() {
        let extracted = json!({"items": [{"id": "x1", "name": "Widget"}]});
        let items = parse_catalog_items(&extracted);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].category, None);
        assert!(items[0].content_for_embedding.contains("uncategorized"));
    }

    #[test]
    fn is_transient_fetch_error_excludes_terminal_failures() {
        assert!(is_transient_fetch_error(&WorkerError::FetchFailed("status 503".into())));
        assert!(!is_transient_fetch_error(&WorkerError::FileNotFound("x".into())));
        assert!(!is_transient_fetch_error(&WorkerError::UnsupportedContentType("x".into())));
        assert!(!is_transient_fetch_error(&WorkerError::FileTooLarge(1024)));
    }

    #[tokio::test]
    async fn run_task_chunks_embeds_and_upserts_catalog_extraction() {
        let worker = new_worker();
        let task = ExtractionTask::new(
            "t1".to_string(),
            "C1".to_string(),
            "https://files.example.com/menu.pdf".to_string(),
            "restaurant".to_string(),
            ExtractionDataType::Catalog,
            FileMetadata {
                file_name: "menu.pdf".into(),
                content_type: "application/pdf".into(),
                size_bytes: 10,
            },
            "https://backend.example.com/callback".to_string(),
        );

        // MockExtractor always returns one catalog item regardless of input,
        // so this exercises chunking + embedding + upsert without a real
        // file fetch or extractor call.
        let extracted = json!({
            "items": [{"id": "mock-1", "category": "mock", "name": "Mock Item", "price": 10}],
        });
        let items = parse_catalog_items(&extracted);
        let chunks = chunk_catalog_items(items);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].category, "uncategorized");

        let outcome = worker
            .run_task_from_extraction(&task, extracted)
            .await
            .unwrap();
        assert_eq!(outcome.chunks_created, 1);
        assert_eq!(outcome.vector_dimensions, 8);
        assert_eq!(worker.store.point_count("switchboard_vectors"), 1);
    }

    fn test_task() -> ExtractionTask {
        ExtractionTask::new(
            "t1".to_string(),
            "C1".to_string(),
            "https://files.example.com/menu.pdf".to_string(),
            "restaurant".to_string(),
            ExtractionDataType::Catalog,
            FileMetadata {
                file_name: "menu.pdf".into(),
                content_type: "application/pdf".into(),
                size_bytes: 10,
            },
            "https://backend.example.com/callback".to_string(),
        )
    }

    /// Spec §8 scenario 6: extractor returns 503 twice then succeeds —
    /// total attempts 3, task still reaches a successful outcome.
    #[tokio::test]
    async fn extract_with_retry_succeeds_after_two_transient_failures() {
        let extractor = FlakyExtractor::new(2);
        let worker = IngestWorker::new(
            Arc::new(TaskQueue::new()),
            MockVectorStore::new(),
            MockEmbedder { dimension: 8 },
            extractor.clone(),
            WebhookDispatcher::new("secret", "0.1.0", Default::default()),
            "switchboard_vectors",
            "mock-embedding-model",
        );

        let task = test_task();
        let extracted = worker.extract_with_retry(&task, b"irrelevant").await.unwrap();
        assert!(extracted["items"].is_array());
        assert_eq!(extractor.calls.load(Ordering::SeqCst), 3);
    }

    /// A permanently-failing extractor exhausts the policy's 3 attempts
    /// and surfaces the failure rather than retrying forever.
    #[tokio::test]
    async fn extract_with_retry_gives_up_after_max_attempts() {
        let extractor = FlakyExtractor::new(10);
        let worker = IngestWorker::new(
            Arc::new(TaskQueue::new()),
            MockVectorStore::new(),
            MockEmbedder { dimension: 8 },
            extractor.clone(),
            WebhookDispatcher::new("secret", "0.1.0", Default::default()),
            "switchboard_vectors",
            "mock-embedding-model",
        );

        let task = test_task();
        let err = worker.extract_with_retry(&task, b"irrelevant").await.unwrap_err();
        assert!(matches!(err, WorkerError::ExtractionFailed(_)));
        assert_eq!(extractor.calls.load(Ordering::SeqCst), 3);
    }

    /// spec §4.3 step 9: the success callback must include `embeddingModel`
    /// alongside the other fields.
    #[test]
    fn success_callback_payload_includes_embedding_model() {
        let worker = new_worker();
        let task = test_task();
        let summary = TaskSummary { chunks_created: 2, processing_time_seconds: 0.5 };
        let outcome = TaskOutcome { chunks_created: 2, vector_dimensions: 8 };

        let data = worker.callback_payload(&task, Ok((&summary, &outcome)));

        assert_eq!(data["embeddingModel"], "mock-embedding-model");
        assert_eq!(data["status"], "completed");
        assert_eq!(data["chunksCreated"], 2);
        assert_eq!(data["vectorDimensions"], 8);
    }

    #[test]
    fn failure_callback_payload_has_no_embedding_model_field() {
        let worker = new_worker();
        let task = test_task();
        let err = WorkerError::EmbeddingFailed("boom".to_string());

        let data = worker.callback_payload(&task, Err(&err));

        assert_eq!(data["status"], "failed");
        assert!(data.get("embeddingModel").is_none());
    }
}
