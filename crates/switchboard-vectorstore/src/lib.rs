//! Hybrid search, RAG context assembly, and vector storage for the
//! conversational control plane.

pub mod client;
pub mod embed;
pub mod error;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod model;
pub mod rag;

pub use client::{QdrantVectorStore, VectorStore};
pub use embed::{Embedder, HttpEmbedder, MockEmbedder};
pub use error::{EmbeddingError, VectorStoreError};
#[cfg(any(test, feature = "mock"))]
pub use mock::MockVectorStore;
pub use model::{DataType, SearchHit, VectorEntry, WriteConsistency};
pub use rag::{HybridSearchRequest, RagAssembler, DEFAULT_LIMIT, DEFAULT_SCORE_THRESHOLD};

pub const DEFAULT_COLLECTION_NAME: &str = "switchboard_vectors";
