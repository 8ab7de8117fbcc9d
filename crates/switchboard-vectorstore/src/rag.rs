//! RAG context assembly and hybrid search (spec §4.2).

use switchboard_core::SwitchboardError;

use crate::embed::Embedder;
use crate::model::{DataType, SearchHit};
use crate::client::VectorStore;

pub const DEFAULT_LIMIT: u64 = 5;
pub const DEFAULT_SCORE_THRESHOLD: f32 = 0.7;
const MAX_CONTEXT_BYTES: usize = 8 * 1024;

pub struct HybridSearchRequest<'a> {
    pub company_id: &'a str,
    pub query_text: &'a str,
    pub language: Option<&'a str>,
    pub data_types: &'a [DataType],
    pub limit: u64,
    pub score_threshold: f32,
}

impl<'a> HybridSearchRequest<'a> {
    pub fn new(company_id: &'a str, query_text: &'a str) -> Self {
        Self {
            company_id,
            query_text,
            language: None,
            data_types: &[],
            limit: DEFAULT_LIMIT,
            score_threshold: DEFAULT_SCORE_THRESHOLD,
        }
    }
}

/// Assembles ranked context for a query against one tenant's collection.
pub struct RagAssembler<S, E> {
    store: S,
    embedder: E,
    collection: String,
}

impl<S, E> RagAssembler<S, E>
where
    S: VectorStore,
    E: Embedder,
{
    pub fn new(store: S, embedder: E, collection: impl Into<String>) -> Self {
        Self {
            store,
            embedder,
            collection: collection.into(),
        }
    }

    /// Exposes the underlying store so callers outside retrieval (admin
    /// context writes, sync ingestion) can reuse the same client instead
    /// of standing up a second connection.
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn embedder(&self) -> &E {
        &self.embedder
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Runs the hybrid search contract and returns hits already filtered by
    /// `score_threshold`, ordered by score descending, capped at `limit`.
    #[tracing::instrument(skip(self, req), fields(company_id = %req.company_id, limit = req.limit))]
    pub async fn search(&self, req: &HybridSearchRequest<'_>) -> Result<Vec<SearchHit>, SwitchboardError> {
        let language = req.language.filter(|l| *l != "auto");

        let mut vectors = self
            .embedder
            .embed(vec![req.query_text.to_string()])
            .await
            .map_err(|e| SwitchboardError::EmbeddingFailed(e.to_string()))?;
        let query_vector = vectors
            .pop()
            .ok_or_else(|| SwitchboardError::EmbeddingFailed("embedder returned no vector".into()))?;

        let mut hits = self
            .store
            .search(
                &self.collection,
                query_vector,
                req.limit,
                req.company_id,
                language,
                req.data_types,
            )
            .await
            .map_err(|e| SwitchboardError::VectorStoreFailed(e.to_string()))?;

        hits.retain(|h| h.score >= req.score_threshold);
        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(req.limit as usize);

        tracing::debug!(hit_count = hits.len(), "hybrid search complete");
        Ok(hits)
    }

    /// Formats hits into a single context block: each entry's
    /// `content_for_embedding`, a blank-line separator, and a provenance
    /// marker. Stops adding entries once `MAX_CONTEXT_BYTES` would be
    /// exceeded; the entry that would overflow is truncated at a sentence
    /// boundary rather than dropped, unless no sentence boundary exists.
    pub fn format_context(hits: &[SearchHit]) -> String {
        let mut out = String::new();

        for hit in hits {
            let marker = provenance_marker(hit);
            let remaining = MAX_CONTEXT_BYTES.saturating_sub(out.len());
            if remaining == 0 {
                break;
            }

            let budget = remaining.saturating_sub(marker.len() + 2);
            if budget == 0 {
                break;
            }

            let body = if hit.content_for_embedding.len() > budget {
                truncate_at_sentence_boundary(&hit.content_for_embedding, budget)
            } else {
                hit.content_for_embedding.clone()
            };

            if !out.is_empty() {
                out.push_str("\n\n");
            }
            out.push_str(&body);
            out.push('\n');
            out.push_str(&marker);
        }

        out
    }
}

fn provenance_marker(hit: &SearchHit) -> String {
    let id = hit
        .product_id
        .as_deref()
        .or(hit.service_id.as_deref())
        .or(hit.file_id.as_deref())
        .unwrap_or("unknown");
    format!("[{} · {}]", hit.data_type.as_str(), id)
}

/// Truncates `text` to at most `max_bytes`, preferring the last sentence
/// boundary (`.`, `!`, `?`, or `。`) inside that window. Falls back to a
/// hard byte cut on a char boundary if no sentence end is found.
fn truncate_at_sentence_boundary(text: &str, max_bytes: usize) -> String {
    if text.len() <= max_bytes {
        return text.to_string();
    }

    let mut cut = max_bytes;
    while cut > 0 && !text.is_char_boundary(cut) {
        cut -= 1;
    }
    let window = &text[..cut];

    let boundary = window
        .rfind(['.', '!', '?', '。'])
        .map(|i| i + 1)
        .unwrap_or(cut);

    text[..boundary].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn hit(score: f32, content: &str) -> SearchHit {
        SearchHit {
            point_id: 1,
            score,
            company_id: "C1".into(),
            data_type: DataType::Faq,
            language: "vi".into(),
            file_id: Some("f1".into()),
            product_id: None,
            service_id: None,
            content_for_embedding: content.to_string(),
            structured_data: json!({}),
        }
    }

    #[test]
    fn truncation_prefers_sentence_boundary() {
        let text = "First sentence here. Second sentence continues further than the budget allows.";
        let truncated = truncate_at_sentence_boundary(text, 25);
        assert_eq!(truncated, "First sentence here.");
    }

    #[test]
    fn truncation_falls_back_to_hard_cut_without_terminator() {
        let text = "abcdefghijklmnopqrstuvwxyz";
        let truncated = truncate_at_sentence_boundary(text, 10);
        assert_eq!(truncated.len(), 10);
    }

    #[test]
    fn format_context_includes_provenance_marker() {
        let hits = vec![hit(0.9, "Some FAQ answer.")];
        let ctx = RagAssembler::<crate::mock::NoopStore, crate::embed::MockEmbedder>::format_context(&hits);
        assert!(ctx.contains("Some FAQ answer."));
        assert!(ctx.contains("[FAQ · f1]"));
    }

    #[test]
    fn format_context_never_exceeds_budget() {
        let long = "word ".repeat(5000);
        let hits = vec![hit(0.9, &long), hit(0.8, &long)];
        let ctx = RagAssembler::<crate::mock::NoopStore, crate::embed::MockEmbedder>::format_context(&hits);
        assert!(ctx.len() <= MAX_CONTEXT_BYTES);
    }
}
