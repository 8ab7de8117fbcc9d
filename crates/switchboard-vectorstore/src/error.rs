//! Errors from the vector store and embedding clients, grounded in the
//! teacher's `vectordb::error::VectorDbError`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum VectorStoreError {
    #[error("failed to connect to vector store at {url}: {message}")]
    ConnectionFailed { url: String, message: String },

    #[error("failed to create collection {collection}: {message}")]
    CreateCollectionFailed { collection: String, message: String },

    #[error("collection not found: {collection}")]
    CollectionNotFound { collection: String },

    #[error("upsert failed for {collection}: {message}")]
    UpsertFailed { collection: String, message: String },

    #[error("search failed for {collection}: {message}")]
    SearchFailed { collection: String, message: String },

    #[error("delete failed for {collection}: {message}")]
    DeleteFailed { collection: String, message: String },

    #[error("invalid embedding dimension: expected {expected}, got {actual}")]
    InvalidDimension { expected: u64, actual: usize },
}

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("embedding provider request failed: {0}")]
    RequestFailed(String),

    #[error("embedding provider returned {count} vectors for {expected} inputs")]
    CountMismatch { count: usize, expected: usize },

    #[error("embedding provider returned an empty vector")]
    EmptyVector,
}
