//! Builds a fully-mocked router for integration tests: no Qdrant, no LLM
//! provider, no outbound HTTP — every collaborator is the in-memory mock
//! behind the same trait the real collaborator implements.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use switchboard_core::{Config, RetryPolicy};
use switchboard_cors::{CorsCache, CorsError, DomainFetcher, PluginDomains};
use switchboard_ingest::{MockExtractor, TaskQueue};
use switchboard_scratch::ScratchStore;
use switchboard_server::llm::MockLlmClient;
use switchboard_server::state::AppState;
use switchboard_vectorstore::{MockEmbedder, MockVectorStore, RagAssembler};
use switchboard_webhooks::WebhookDispatcher;

pub const TEST_INTERNAL_API_KEY: &str = "test-internal-key";
pub const TEST_WEBHOOK_SECRET: &str = "test-webhook-secret";
pub const TEST_COLLECTION: &str = "test_collection";

/// A domain fetcher whose answer is fixed at construction time, standing
/// in for the tenant backend's `/api/cors/plugin-domains` endpoint.
pub struct StubDomainFetcher {
    pub allowed_domains: Vec<String>,
}

impl DomainFetcher for StubDomainFetcher {
    async fn fetch(&self, _plugin_id: &str) -> Result<PluginDomains, CorsError> {
        Ok(PluginDomains {
            company_id: "C1".to_string(),
            allowed_domains: self.allowed_domains.clone(),
        })
    }
}

pub type TestAppState =
    AppState<Arc<MockVectorStore>, Arc<MockEmbedder>, MockExtractor, StubDomainFetcher, MockLlmClient>;

/// Builds the full axum router over mock collaborators, with one chat-plugin
/// origin (`https://widget.example.com`) preregistered in the CORS cache.
pub fn test_router() -> Router {
    let mut config = Config::default();
    config.internal_api_key = TEST_INTERNAL_API_KEY.to_string();
    config.webhook_secret = TEST_WEBHOOK_SECRET.to_string();
    let config = Arc::new(config);

    let store = Arc::new(MockVectorStore::new());
    let embedder = Arc::new(MockEmbedder { dimension: 8 });
    let extractor = Arc::new(MockExtractor);
    let fetcher = StubDomainFetcher {
        allowed_domains: vec!["https://widget.example.com".to_string()],
    };
    let cors_cache = Arc::new(CorsCache::new(fetcher, Duration::from_secs(300)));
    // A single attempt, no backoff: the test harness never has a real
    // backend to retry against, and the default 1s/2s/4s schedule would
    // make every backend-channel test take seconds for no reason.
    let dispatcher = Arc::new(WebhookDispatcher::new(
        TEST_WEBHOOK_SECRET,
        "test",
        RetryPolicy::new(1, Duration::from_millis(0), 1.0),
    ));
    let queue = Arc::new(TaskQueue::new());
    let llm = Arc::new(MockLlmClient);
    let scratch = Arc::new(ScratchStore::new());
    let rag = Arc::new(RagAssembler::new(store.clone(), embedder.clone(), TEST_COLLECTION));

    let state: Arc<TestAppState> = Arc::new(AppState::new(
        config,
        rag,
        extractor,
        scratch,
        cors_cache,
        dispatcher,
        queue,
        llm,
        TEST_COLLECTION.to_string(),
    ));

    switchboard_server::create_router(state)
}
