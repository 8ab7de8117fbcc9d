//! The vector entry data model stored in and retrieved from Qdrant.

use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

/// `(point_id, company_id, data_type, language, industry, file_id?, product_id?,
/// service_id?, tags[], content_for_embedding, structured_data, vector[D])`.
///
/// `vector` is never derived from a hash of text, and `content_for_embedding`
/// must be the exact string that produced `vector` — both enforced by callers,
/// not by this type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorEntry {
    pub point_id: u64,
    pub company_id: String,
    pub data_type: DataType,
    pub language: String,
    pub industry: Option<String>,
    pub file_id: Option<String>,
    pub product_id: Option<String>,
    pub service_id: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub content_for_embedding: String,
    /// Never used for search; returned to callers verbatim.
    pub structured_data: Json,
    pub vector: Vec<f32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DataType {
    Products,
    Services,
    Faq,
    KnowledgeBase,
    CompanyInfo,
}

impl DataType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Products => "PRODUCTS",
            Self::Services => "SERVICES",
            Self::Faq => "FAQ",
            Self::KnowledgeBase => "KNOWLEDGE_BASE",
            Self::CompanyInfo => "COMPANY_INFO",
        }
    }
}

/// A scored hit returned by hybrid search, minus the raw vector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub point_id: u64,
    pub score: f32,
    pub company_id: String,
    pub data_type: DataType,
    pub language: String,
    pub file_id: Option<String>,
    pub product_id: Option<String>,
    pub service_id: Option<String>,
    pub content_for_embedding: String,
    pub structured_data: Json,
}

/// Write-acknowledgement semantics for an upsert, mirrored from the
/// teacher's `WriteConsistency`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteConsistency {
    /// Wait until the point is indexed and searchable. Maps to `wait=true`.
    Strong,
    /// Return once the server acknowledges receipt. Maps to `wait=false`.
    Eventual,
}

impl From<WriteConsistency> for bool {
    fn from(c: WriteConsistency) -> bool {
        matches!(c, WriteConsistency::Strong)
    }
}
