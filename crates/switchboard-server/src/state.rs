//! Shared application state, generic over every swappable collaborator
//! (vector store, embedder, extractor, domain fetcher, LLM client) so
//! the router can be built once over mocks in tests and once over real
//! clients in `main`.

use std::sync::Arc;

use switchboard_cors::{CorsCache, DomainFetcher};
use switchboard_ingest::{Extractor, TaskQueue};
use switchboard_orders::{
    CheckQuantityPayload, PlaceOrderPayload, UpdateOrderPayload, dispatch_check_quantity,
    dispatch_place_order, dispatch_update_order,
};
use switchboard_scratch::ScratchStore;
use switchboard_vectorstore::{Embedder, RagAssembler, VectorStore};
use switchboard_webhooks::WebhookDispatcher;

use switchboard_core::Config;

use crate::llm::LlmClient;

pub struct AppState<V, E, X, F, L>
where
    V: VectorStore + Send + Sync + 'static,
    E: Embedder + Send + Sync + 'static,
    X: Extractor + Send + Sync + 'static,
    F: DomainFetcher + Send + Sync + 'static,
    L: LlmClient + Send + Sync + 'static,
{
    pub config: Arc<Config>,
    pub rag: Arc<RagAssembler<V, E>>,
    pub extractor: Arc<X>,
    pub scratch: Arc<ScratchStore>,
    pub cors_cache: Arc<CorsCache<F>>,
    pub webhook_dispatcher: Arc<WebhookDispatcher>,
    pub ingest_queue: Arc<TaskQueue>,
    pub llm: Arc<L>,
    pub collection_name: String,
    pub mock_mode: bool,
}

// Manual `Clone` impl: every field is an `Arc` (or a plain `Clone` value),
// so cloning never actually requires `V`/`E`/`X`/`F`/`L` themselves to be
// `Clone` the way a derive would demand.
impl<V, E, X, F, L> Clone for AppState<V, E, X, F, L>
where
    V: VectorStore + Send + Sync + 'static,
    E: Embedder + Send + Sync + 'static,
    X: Extractor + Send + Sync + 'static,
    F: DomainFetcher + Send + Sync + 'static,
    L: LlmClient + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            rag: self.rag.clone(),
            extractor: self.extractor.clone(),
            scratch: self.scratch.clone(),
            cors_cache: self.cors_cache.clone(),
            webhook_dispatcher: self.webhook_dispatcher.clone(),
            ingest_queue: self.ingest_queue.clone(),
            llm: self.llm.clone(),
            collection_name: self.collection_name.clone(),
            mock_mode: self.mock_mode,
        }
    }
}

impl<V, E, X, F, L> AppState<V, E, X, F, L>
where
    V: VectorStore + Send + Sync + 'static,
    E: Embedder + Send + Sync + 'static,
    X: Extractor + Send + Sync + 'static,
    F: DomainFetcher + Send + Sync + 'static,
    L: LlmClient + Send + Sync + 'static,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: Arc<Config>,
        rag: Arc<RagAssembler<V, E>>,
        extractor: Arc<X>,
        scratch: Arc<ScratchStore>,
        cors_cache: Arc<CorsCache<F>>,
        webhook_dispatcher: Arc<WebhookDispatcher>,
        ingest_queue: Arc<TaskQueue>,
        llm: Arc<L>,
        collection_name: String,
    ) -> Self {
        let mock_mode = std::env::var_os("SWITCHBOARD_MOCK_MODE").is_some_and(|v| !v.is_empty());
        Self {
            config,
            rag,
            extractor,
            scratch,
            cors_cache,
            webhook_dispatcher,
            ingest_queue,
            llm,
            collection_name,
            mock_mode,
        }
    }

    pub async fn dispatch_place_order(
        &self,
        company_id: &str,
        payload: &PlaceOrderPayload,
    ) -> Result<(), switchboard_webhooks::WebhookError> {
        dispatch_place_order(
            &self.webhook_dispatcher,
            &self.config.backend_webhook_url,
            company_id,
            payload,
        )
        .await
    }

    pub async fn dispatch_update_order(
        &self,
        company_id: &str,
        payload: &UpdateOrderPayload,
    ) -> Result<(), switchboard_webhooks::WebhookError> {
        dispatch_update_order(
            &self.webhook_dispatcher,
            &self.config.backend_webhook_url,
            company_id,
            payload,
        )
        .await
    }

    pub async fn dispatch_check_quantity(
        &self,
        company_id: &str,
        payload: &CheckQuantityPayload,
    ) -> Result<(), switchboard_webhooks::WebhookError> {
        dispatch_check_quantity(
            &self.webhook_dispatcher,
            &self.config.backend_webhook_url,
            company_id,
            payload,
        )
        .await
    }
}
