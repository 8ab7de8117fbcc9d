//! Switchboard HTTP server entrypoint.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::signal;

use switchboard_core::{Config, RetryPolicy};
use switchboard_cors::{CorsCache, HttpDomainFetcher};
use switchboard_ingest::{HttpExtractor, TaskQueue};
use switchboard_scratch::ScratchStore;
use switchboard_server::llm::GenaiLlmClient;
use switchboard_server::state::AppState;
use switchboard_vectorstore::{DEFAULT_COLLECTION_NAME, HttpEmbedder, QdrantVectorStore, RagAssembler, VectorStore};
use switchboard_webhooks::WebhookDispatcher;

const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");
const INGEST_WORKER_POOL_SIZE: usize = 4;
const QUEUE_POLL_INTERVAL: Duration = Duration::from_millis(500);
const VISIBILITY_TIMEOUT: Duration = Duration::from_secs(5 * 60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = Config::from_env()?;
    config.validate()?;
    let addr: SocketAddr = config.socket_addr().parse()?;
    let config = Arc::new(config);

    tracing::info!(bind_addr = %config.bind_addr, port = config.port, "switchboard starting");

    let store = Arc::new(QdrantVectorStore::new(
        &config.vector_store_url,
        config.vector_store_api_key.as_deref(),
    )?);
    store.ensure_collection(DEFAULT_COLLECTION_NAME, config.vector_size).await?;

    let embedder = Arc::new(HttpEmbedder::new(
        &config.embedding_base_url,
        config.llm_provider_key.as_deref().unwrap_or_default(),
        &config.embedding_model,
    ));

    let extractor = Arc::new(HttpExtractor::new(
        &config.extractor_endpoint,
        config.llm_provider_key.as_deref().unwrap_or_default(),
    ));

    let domain_fetcher = HttpDomainFetcher::new(&config.backend_webhook_url);
    let cors_cache = Arc::new(CorsCache::new(
        domain_fetcher,
        Duration::from_secs(config.cors_cache_ttl_seconds),
    ));

    let webhook_retry = RetryPolicy::default();
    let webhook_dispatcher = Arc::new(WebhookDispatcher::new(
        config.webhook_secret.clone(),
        SERVICE_VERSION,
        webhook_retry,
    ));

    let ingest_queue = Arc::new(TaskQueue::new());
    let llm = Arc::new(GenaiLlmClient::new(config.llm_model.clone()));
    let scratch = Arc::new(ScratchStore::new());

    let rag = Arc::new(RagAssembler::new(store.clone(), embedder.clone(), DEFAULT_COLLECTION_NAME));

    let state = Arc::new(AppState::new(
        config.clone(),
        rag,
        extractor.clone(),
        scratch,
        cors_cache,
        webhook_dispatcher.clone(),
        ingest_queue.clone(),
        llm,
        DEFAULT_COLLECTION_NAME.to_string(),
    ));

    spawn_ingest_workers(
        ingest_queue,
        store,
        embedder,
        extractor,
        webhook_dispatcher,
        DEFAULT_COLLECTION_NAME.to_string(),
        config.embedding_model.clone(),
    );

    let app = switchboard_server::create_router(state);

    let listener = TcpListener::bind(addr).await?;
    tracing::info!(addr = %addr, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("switchboard shutdown complete");
    Ok(())
}

/// Starts a fixed pool of background workers that poll the shared queue
/// (spec §5: a small worker pool, default 4, claiming tasks one at a time)
/// and periodically reclaims tasks stuck past their visibility timeout.
fn spawn_ingest_workers(
    queue: Arc<TaskQueue>,
    store: Arc<QdrantVectorStore>,
    embedder: Arc<HttpEmbedder>,
    extractor: Arc<HttpExtractor>,
    dispatcher: Arc<WebhookDispatcher>,
    collection: String,
    embedding_model: String,
) {
    for worker_id in 0..INGEST_WORKER_POOL_SIZE {
        let worker = switchboard_ingest::IngestWorker::new(
            queue.clone(),
            store.clone(),
            embedder.clone(),
            extractor.clone(),
            (*dispatcher).clone(),
            collection.clone(),
            embedding_model.clone(),
        );

        tokio::spawn(async move {
            loop {
                if !worker.process_once().await {
                    tokio::time::sleep(QUEUE_POLL_INTERVAL).await;
                }
            }
        });
        tracing::debug!(worker_id, "ingest worker started");
    }

    let reaper_queue = queue.clone();
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(VISIBILITY_TIMEOUT).await;
            let reclaimed = reaper_queue.reclaim_expired(VISIBILITY_TIMEOUT);
            if !reclaimed.is_empty() {
                tracing::warn!(count = reclaimed.len(), "reclaimed stuck ingestion tasks");
            }
        }
    });
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("received SIGTERM, initiating graceful shutdown");
        }
    }
}
