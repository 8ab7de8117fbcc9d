//! Document ingestion pipeline: queueing, chunking, extraction, and the
//! worker that ties them together (spec §4.3).

pub mod chunk;
pub mod extractor;
pub mod model;
pub mod queue;
pub mod worker;

pub use chunk::{chunk_catalog_items, chunk_knowledge_base_text, CatalogChunk, CatalogItem, MIN_CHUNK_SIZE};
pub use extractor::{Extractor, ExtractorError, ExtractionInput, HttpExtractor, MockExtractor};
pub use model::{ExtractionDataType, ExtractionTask, FileMetadata, TaskStatus, TaskSummary};
pub use queue::TaskQueue;
pub use worker::{IngestWorker, TaskOutcome, WorkerError};
