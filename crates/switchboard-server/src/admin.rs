//! Admin HTTP surface (spec §4.8 context write-through, §6.1 ingestion and
//! file/product/service lifecycle). All routes require `X-API-Key`.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use serde::{Deserialize, Serialize};
use switchboard_cors::DomainFetcher;
use switchboard_ingest::{ExtractionDataType, ExtractionTask, FileMetadata, IngestWorker};
use switchboard_vectorstore::{DataType, Embedder, VectorEntry, VectorStore, WriteConsistency};

use crate::auth::require_api_key;
use crate::error::ApiError;
use crate::llm::LlmClient;
use crate::state::AppState;

/// The three context record types (spec §4.8), mapped onto the same
/// `DataType` tags the RAG search path filters by.
#[derive(Debug, Clone, Copy)]
enum ContextKind {
    BasicInfo,
    Faqs,
    Scenarios,
}

impl ContextKind {
    fn parse(raw: &str) -> Result<Self, ApiError> {
        match raw {
            "basic-info" => Ok(Self::BasicInfo),
            "faqs" => Ok(Self::Faqs),
            "scenarios" => Ok(Self::Scenarios),
            other => Err(ApiError::InvalidBody(format!("unknown context type: {other}"))),
        }
    }

    fn data_type(self) -> DataType {
        match self {
            Self::BasicInfo => DataType::CompanyInfo,
            Self::Faqs => DataType::Faq,
            Self::Scenarios => DataType::KnowledgeBase,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ContextItemInput {
    id: Option<String>,
    text: String,
    #[serde(default)]
    language: Option<String>,
}

#[derive(Debug, Serialize)]
struct ContextItemOutput {
    id: String,
    text: String,
    language: String,
}

#[derive(Debug, Serialize)]
struct CountResponse {
    success: bool,
    count: usize,
}

#[derive(Debug, Serialize)]
struct DeletedPointsResponse {
    success: bool,
    deleted_points: u64,
}

fn point_id_for(company_id: &str, id: &str) -> u64 {
    let tenant_hash = switchboard_core::ids::hash_tenant_id(company_id);
    let content_hash = switchboard_core::ids::hash_to_u64(id.as_bytes());
    switchboard_core::ids::generate_point_id(tenant_hash, content_hash)
}

fn context_entry(company_id: &str, kind: ContextKind, id: String, text: String, language: String, vector: Vec<f32>) -> VectorEntry {
    VectorEntry {
        point_id: point_id_for(company_id, &id),
        company_id: company_id.to_string(),
        data_type: kind.data_type(),
        language: language.clone(),
        industry: None,
        file_id: None,
        product_id: None,
        service_id: None,
        tags: vec![],
        content_for_embedding: text.clone(),
        structured_data: serde_json::json!({ "id": id, "text": text, "language": language }),
        vector,
    }
}

/// `PUT /api/admin/companies/{company_id}/context/{type}` — set-all (replace).
pub async fn context_set_all<V, E, X, F, L>(
    State(state): State<Arc<AppState<V, E, X, F, L>>>,
    headers: HeaderMap,
    Path((company_id, kind)): Path<(String, String)>,
    Json(items): Json<Vec<ContextItemInput>>,
) -> Result<Json<CountResponse>, ApiError>
where
    V: VectorStore + Send + Sync + 'static,
    E: Embedder + Send + Sync + 'static,
    X: switchboard_ingest::Extractor + Send + Sync + 'static,
    F: DomainFetcher + Send + Sync + 'static,
    L: LlmClient + Send + Sync + 'static,
{
    require_api_key(&headers, &state.config.internal_api_key)?;
    let kind = ContextKind::parse(&kind)?;

    state
        .rag
        .store()
        .delete_by_data_type(&state.collection_name, &company_id, kind.data_type())
        .await
        .map_err(ApiError::from)?;

    let count = write_context_items(&state, &company_id, kind, items).await?;
    Ok(Json(CountResponse { success: true, count }))
}

/// `POST /api/admin/companies/{company_id}/context/{type}` — add-one.
pub async fn context_add_one<V, E, X, F, L>(
    State(state): State<Arc<AppState<V, E, X, F, L>>>,
    headers: HeaderMap,
    Path((company_id, kind)): Path<(String, String)>,
    Json(item): Json<ContextItemInput>,
) -> Result<Json<CountResponse>, ApiError>
where
    V: VectorStore + Send + Sync + 'static,
    E: Embedder + Send + Sync + 'static,
    X: switchboard_ingest::Extractor + Send + Sync + 'static,
    F: DomainFetcher + Send + Sync + 'static,
    L: LlmClient + Send + Sync + 'static,
{
    require_api_key(&headers, &state.config.internal_api_key)?;
    let kind = ContextKind::parse(&kind)?;
    let count = write_context_items(&state, &company_id, kind, vec![item]).await?;
    Ok(Json(CountResponse { success: true, count }))
}

async fn write_context_items<V, E, X, F, L>(
    state: &Arc<AppState<V, E, X, F, L>>,
    company_id: &str,
    kind: ContextKind,
    items: Vec<ContextItemInput>,
) -> Result<usize, ApiError>
where
    V: VectorStore + Send + Sync + 'static,
    E: Embedder + Send + Sync + 'static,
    X: switchboard_ingest::Extractor + Send + Sync + 'static,
    F: DomainFetcher + Send + Sync + 'static,
    L: LlmClient + Send + Sync + 'static,
{
    if items.is_empty() {
        return Ok(0);
    }

    let texts: Vec<String> = items.iter().map(|i| i.text.clone()).collect();
    let vectors = state.rag.embedder().embed(texts).await.map_err(ApiError::from)?;

    let entries: Vec<VectorEntry> = items
        .into_iter()
        .zip(vectors.into_iter())
        .map(|(item, vector)| {
            let id = item.id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
            let language = item.language.unwrap_or_else(|| "auto".to_string());
            context_entry(company_id, kind, id, item.text, language, vector)
        })
        .collect();

    let count = entries.len();
    state
        .rag
        .store()
        .upsert(&state.collection_name, entries, WriteConsistency::Strong)
        .await
        .map_err(ApiError::from)?;

    Ok(count)
}

/// `GET /api/admin/companies/{company_id}/context/{type}` — get-all.
pub async fn context_get_all<V, E, X, F, L>(
    State(state): State<Arc<AppState<V, E, X, F, L>>>,
    headers: HeaderMap,
    Path((company_id, kind)): Path<(String, String)>,
) -> Result<Json<Vec<ContextItemOutput>>, ApiError>
where
    V: VectorStore + Send + Sync + 'static,
    E: Embedder + Send + Sync + 'static,
    X: switchboard_ingest::Extractor + Send + Sync + 'static,
    F: DomainFetcher + Send + Sync + 'static,
    L: LlmClient + Send + Sync + 'static,
{
    require_api_key(&headers, &state.config.internal_api_key)?;
    let kind = ContextKind::parse(&kind)?;

    let hits = state
        .rag
        .store()
        .list_by_data_type(&state.collection_name, &company_id, kind.data_type())
        .await
        .map_err(ApiError::from)?;

    let items = hits
        .into_iter()
        .map(|hit| {
            let id = hit
                .structured_data
                .get("id")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string();
            ContextItemOutput {
                id,
                text: hit.content_for_embedding,
                language: hit.language,
            }
        })
        .collect();

    Ok(Json(items))
}

/// `DELETE /api/admin/companies/{company_id}/context/{type}` — delete-all.
pub async fn context_delete_all<V, E, X, F, L>(
    State(state): State<Arc<AppState<V, E, X, F, L>>>,
    headers: HeaderMap,
    Path((company_id, kind)): Path<(String, String)>,
) -> Result<Json<DeletedPointsResponse>, ApiError>
where
    V: VectorStore + Send + Sync + 'static,
    E: Embedder + Send + Sync + 'static,
    X: switchboard_ingest::Extractor + Send + Sync + 'static,
    F: DomainFetcher + Send + Sync + 'static,
    L: LlmClient + Send + Sync + 'static,
{
    require_api_key(&headers, &state.config.internal_api_key)?;
    let kind = ContextKind::parse(&kind)?;

    let deleted_points = state
        .rag
        .store()
        .delete_by_data_type(&state.collection_name, &company_id, kind.data_type())
        .await
        .map_err(ApiError::from)?;

    Ok(Json(DeletedPointsResponse { success: true, deleted_points }))
}

/// `DELETE /api/admin/companies/{company_id}/files/{file_id}` and
/// `/api/admin/companies/{company_id}/extractions/{file_id}` — both remove
/// every vector entry tagged with `file_id` (spec §6.1 file delete). A
/// repeat call is idempotent: `deleted_points` is 0 rather than an error.
pub async fn delete_file<V, E, X, F, L>(
    State(state): State<Arc<AppState<V, E, X, F, L>>>,
    headers: HeaderMap,
    Path((company_id, file_id)): Path<(String, String)>,
) -> Result<Json<DeletedPointsResponse>, ApiError>
where
    V: VectorStore + Send + Sync + 'static,
    E: Embedder + Send + Sync + 'static,
    X: switchboard_ingest::Extractor + Send + Sync + 'static,
    F: DomainFetcher + Send + Sync + 'static,
    L: LlmClient + Send + Sync + 'static,
{
    require_api_key(&headers, &state.config.internal_api_key)?;
    let deleted_points = state
        .rag
        .store()
        .delete_by_file_id(&state.collection_name, &company_id, &file_id)
        .await
        .map_err(ApiError::from)?;
    Ok(Json(DeletedPointsResponse { success: true, deleted_points }))
}

/// `DELETE /api/admin/companies/{company_id}/products/{product_id}` — the
/// vector-store half of product delete; the catalog record itself lives in
/// the tenant backend's own store, out of scope here.
pub async fn delete_product<V, E, X, F, L>(
    State(state): State<Arc<AppState<V, E, X, F, L>>>,
    headers: HeaderMap,
    Path((company_id, product_id)): Path<(String, String)>,
) -> Result<Json<DeletedPointsResponse>, ApiError>
where
    V: VectorStore + Send + Sync + 'static,
    E: Embedder + Send + Sync + 'static,
    X: switchboard_ingest::Extractor + Send + Sync + 'static,
    F: DomainFetcher + Send + Sync + 'static,
    L: LlmClient + Send + Sync + 'static,
{
    require_api_key(&headers, &state.config.internal_api_key)?;
    let deleted_points = state
        .rag
        .store()
        .delete_by_product_id(&state.collection_name, &company_id, &product_id)
        .await
        .map_err(ApiError::from)?;
    Ok(Json(DeletedPointsResponse { success: true, deleted_points }))
}

/// `DELETE /api/admin/companies/{company_id}/services/{service_id}`.
pub async fn delete_service<V, E, X, F, L>(
    State(state): State<Arc<AppState<V, E, X, F, L>>>,
    headers: HeaderMap,
    Path((company_id, service_id)): Path<(String, String)>,
) -> Result<Json<DeletedPointsResponse>, ApiError>
where
    V: VectorStore + Send + Sync + 'static,
    E: Embedder + Send + Sync + 'static,
    X: switchboard_ingest::Extractor + Send + Sync + 'static,
    F: DomainFetcher + Send + Sync + 'static,
    L: LlmClient + Send + Sync + 'static,
{
    require_api_key(&headers, &state.config.internal_api_key)?;
    let deleted_points = state
        .rag
        .store()
        .delete_by_service_id(&state.collection_name, &company_id, &service_id)
        .await
        .map_err(ApiError::from)?;
    Ok(Json(DeletedPointsResponse { success: true, deleted_points }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractRequest {
    company_id: String,
    file_url: String,
    industry: String,
    data_type: ExtractionDataType,
    file_metadata: FileMetadata,
    callback_url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TaskAccepted {
    success: bool,
    task_id: String,
    status: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TaskCompleted {
    success: bool,
    task_id: String,
    status: &'static str,
    chunks_created: usize,
}

fn generate_task_id() -> String {
    format!("task_{}", uuid::Uuid::new_v4())
}

fn build_task(req: ExtractRequest) -> ExtractionTask {
    ExtractionTask::new(
        generate_task_id(),
        req.company_id,
        req.file_url,
        req.industry,
        req.data_type,
        req.file_metadata,
        req.callback_url,
    )
}

/// `POST /api/extract/process-async` — enqueues and returns immediately
/// (spec §4.3 queue contract: same `file_url` while non-terminal dedups to
/// the first `task_id`).
pub async fn extract_process_async<V, E, X, F, L>(
    State(state): State<Arc<AppState<V, E, X, F, L>>>,
    headers: HeaderMap,
    Json(req): Json<ExtractRequest>,
) -> Result<Json<TaskAccepted>, ApiError>
where
    V: VectorStore + Send + Sync + 'static,
    E: Embedder + Send + Sync + 'static,
    X: switchboard_ingest::Extractor + Send + Sync + 'static,
    F: DomainFetcher + Send + Sync + 'static,
    L: LlmClient + Send + Sync + 'static,
{
    require_api_key(&headers, &state.config.internal_api_key)?;
    let task_id = state.ingest_queue.enqueue(build_task(req));
    Ok(Json(TaskAccepted { success: true, task_id, status: "pending" }))
}

/// `POST /api/extract/process` — runs the full ingestion pipeline inline
/// for small files and returns the result in the same response, bypassing
/// the shared queue entirely so it never races the background worker pool.
pub async fn extract_process_sync<V, E, X, F, L>(
    State(state): State<Arc<AppState<V, E, X, F, L>>>,
    headers: HeaderMap,
    Json(req): Json<ExtractRequest>,
) -> Result<Json<TaskCompleted>, ApiError>
where
    V: VectorStore + Clone + Send + Sync + 'static,
    E: Embedder + Clone + Send + Sync + 'static,
    X: switchboard_ingest::Extractor + Clone + Send + Sync + 'static,
    F: DomainFetcher + Send + Sync + 'static,
    L: LlmClient + Send + Sync + 'static,
{
    require_api_key(&headers, &state.config.internal_api_key)?;
    let task = build_task(req);

    let worker = IngestWorker::new(
        state.ingest_queue.clone(),
        state.rag.store().clone(),
        state.rag.embedder().clone(),
        (*state.extractor).clone(),
        (*state.webhook_dispatcher).clone(),
        state.collection_name.clone(),
        state.config.embedding_model.clone(),
    );

    let outcome = worker.run_task(&task).await.map_err(ApiError::from)?;

    Ok(Json(TaskCompleted {
        success: true,
        task_id: task.task_id,
        status: "completed",
        chunks_created: outcome.chunks_created,
    }))
}

/// `GET /api/admin/tasks/document/{taskId}/status`.
pub async fn task_status<V, E, X, F, L>(
    State(state): State<Arc<AppState<V, E, X, F, L>>>,
    headers: HeaderMap,
    Path(task_id): Path<String>,
) -> Result<Json<ExtractionTask>, ApiError>
where
    V: VectorStore + Send + Sync + 'static,
    E: Embedder + Send + Sync + 'static,
    X: switchboard_ingest::Extractor + Send + Sync + 'static,
    F: DomainFetcher + Send + Sync + 'static,
    L: LlmClient + Send + Sync + 'static,
{
    require_api_key(&headers, &state.config.internal_api_key)?;
    state
        .ingest_queue
        .get(&task_id)
        .map(Json)
        .ok_or_else(|| ApiError::from(switchboard_core::SwitchboardError::TaskNotFound(task_id)))
}
