//! Extraction task (spec §3) and related wire types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ExtractionDataType {
    Catalog,
    KnowledgeBase,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileMetadata {
    pub file_name: String,
    pub content_type: String,
    pub size_bytes: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TaskSummary {
    pub chunks_created: usize,
    pub processing_time_seconds: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionTask {
    pub task_id: String,
    pub company_id: String,
    pub file_url: String,
    pub industry: String,
    pub data_type: ExtractionDataType,
    pub file_metadata: FileMetadata,
    pub callback_url: String,
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExtractionTask {
    pub fn new(
        task_id: String,
        company_id: String,
        file_url: String,
        industry: String,
        data_type: ExtractionDataType,
        file_metadata: FileMetadata,
        callback_url: String,
    ) -> Self {
        let now = Utc::now();
        Self {
            task_id,
            company_id,
            file_url,
            industry,
            data_type,
            file_metadata,
            callback_url,
            status: TaskStatus::Pending,
            created_at: now,
            updated_at: now,
            result: None,
            error: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.status, TaskStatus::Completed | TaskStatus::Failed)
    }
}
