//! In-memory vector store for tests: an `RwLock`-guarded `HashMap`
//! standing in for Qdrant.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::client::VectorStore;
use crate::error::VectorStoreError;
use crate::model::{DataType, SearchHit, VectorEntry, WriteConsistency};

#[derive(Default)]
pub struct MockVectorStore {
    collections: RwLock<HashMap<String, HashMap<u64, VectorEntry>>>,
}

impl MockVectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn point_count(&self, collection: &str) -> usize {
        self.collections
            .read()
            .unwrap()
            .get(collection)
            .map(|c| c.len())
            .unwrap_or(0)
    }
}

impl VectorStore for MockVectorStore {
    async fn ensure_collection(&self, name: &str, _vector_size: u64) -> Result<(), VectorStoreError> {
        self.collections
            .write()
            .unwrap()
            .entry(name.to_string())
            .or_default();
        Ok(())
    }

    async fn upsert(
        &self,
        collection: &str,
        entries: Vec<VectorEntry>,
        _consistency: WriteConsistency,
    ) -> Result<(), VectorStoreError> {
        let mut collections = self.collections.write().unwrap();
        let coll = collections.entry(collection.to_string()).or_default();
        for entry in entries {
            coll.insert(entry.point_id, entry);
        }
        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        query: Vec<f32>,
        limit: u64,
        must_company_id: &str,
        must_language: Option<&str>,
        should_data_types: &[DataType],
    ) -> Result<Vec<SearchHit>, VectorStoreError> {
        let collections = self.collections.read().unwrap();
        let coll = match collections.get(collection) {
            Some(c) => c,
            None => return Ok(Vec::new()),
        };

        let mut hits: Vec<SearchHit> = coll
            .values()
            .filter(|e| e.company_id == must_company_id)
            .filter(|e| must_language.map(|l| e.language == l).unwrap_or(true))
            .map(|e| {
                let mut score = cosine_similarity(&query, &e.vector);
                if !should_data_types.is_empty() && should_data_types.contains(&e.data_type) {
                    score += 0.05;
                }
                SearchHit {
                    point_id: e.point_id,
                    score,
                    company_id: e.company_id.clone(),
                    data_type: e.data_type,
                    language: e.language.clone(),
                    file_id: e.file_id.clone(),
                    product_id: e.product_id.clone(),
                    service_id: e.service_id.clone(),
                    content_for_embedding: e.content_for_embedding.clone(),
                    structured_data: e.structured_data.clone(),
                }
            })
            .collect();

        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(limit as usize);
        Ok(hits)
    }

    async fn list_by_data_type(
        &self,
        collection: &str,
        company_id: &str,
        data_type: DataType,
    ) -> Result<Vec<SearchHit>, VectorStoreError> {
        let collections = self.collections.read().unwrap();
        let Some(coll) = collections.get(collection) else {
            return Ok(Vec::new());
        };
        Ok(coll
            .values()
            .filter(|e| e.company_id == company_id && e.data_type == data_type)
            .map(|e| SearchHit {
                point_id: e.point_id,
                score: 0.0,
                company_id: e.company_id.clone(),
                data_type: e.data_type,
                language: e.language.clone(),
                file_id: e.file_id.clone(),
                product_id: e.product_id.clone(),
                service_id: e.service_id.clone(),
                content_for_embedding: e.content_for_embedding.clone(),
                structured_data: e.structured_data.clone(),
            })
            .collect())
    }

    async fn delete_by_file_id(
        &self,
        collection: &str,
        company_id: &str,
        file_id: &str,
    ) -> Result<u64, VectorStoreError> {
        self.delete_where(collection, |e| e.company_id == company_id && e.file_id.as_deref() == Some(file_id))
    }

    async fn delete_by_product_id(
        &self,
        collection: &str,
        company_id: &str,
        product_id: &str,
    ) -> Result<u64, VectorStoreError> {
        self.delete_where(collection, |e| {
            e.company_id == company_id && e.product_id.as_deref() == Some(product_id)
        })
    }

    async fn delete_by_service_id(
        &self,
        collection: &str,
        company_id: &str,
        service_id: &str,
    ) -> Result<u64, VectorStoreError> {
        self.delete_where(collection, |e| {
            e.company_id == company_id && e.service_id.as_deref() == Some(service_id)
        })
    }

    async fn delete_by_tag(&self, collection: &str, company_id: &str, tag: &str) -> Result<u64, VectorStoreError> {
        self.delete_where(collection, |e| {
            e.company_id == company_id && e.tags.iter().any(|t| t == tag)
        })
    }

    async fn delete_by_data_type(
        &self,
        collection: &str,
        company_id: &str,
        data_type: DataType,
    ) -> Result<u64, VectorStoreError> {
        self.delete_where(collection, |e| e.company_id == company_id && e.data_type == data_type)
    }

    async fn delete_by_company(&self, collection: &str, company_id: &str) -> Result<u64, VectorStoreError> {
        self.delete_where(collection, |e| e.company_id == company_id)
    }
}

impl MockVectorStore {
    fn delete_where(&self, collection: &str, pred: impl Fn(&VectorEntry) -> bool) -> Result<u64, VectorStoreError> {
        let mut collections = self.collections.write().unwrap();
        let Some(coll) = collections.get_mut(collection) else {
            return Ok(0);
        };
        let before = coll.len();
        coll.retain(|_, e| !pred(e));
        Ok((before - coll.len()) as u64)
    }
}

/// A store that never holds any points, used only to exercise
/// `RagAssembler::format_context` (a pure function) in isolation.
#[derive(Default)]
pub struct NoopStore;

impl VectorStore for NoopStore {
    async fn ensure_collection(&self, _name: &str, _vector_size: u64) -> Result<(), VectorStoreError> {
        Ok(())
    }

    async fn upsert(
        &self,
        _collection: &str,
        _entries: Vec<VectorEntry>,
        _consistency: WriteConsistency,
    ) -> Result<(), VectorStoreError> {
        Ok(())
    }

    async fn search(
        &self,
        _collection: &str,
        _query: Vec<f32>,
        _limit: u64,
        _must_company_id: &str,
        _must_language: Option<&str>,
        _should_data_types: &[DataType],
    ) -> Result<Vec<SearchHit>, VectorStoreError> {
        Ok(Vec::new())
    }

    async fn list_by_data_type(&self, _collection: &str, _company_id: &str, _data_type: DataType) -> Result<Vec<SearchHit>, VectorStoreError> {
        Ok(Vec::new())
    }

    async fn delete_by_file_id(&self, _collection: &str, _company_id: &str, _file_id: &str) -> Result<u64, VectorStoreError> {
        Ok(0)
    }

    async fn delete_by_product_id(&self, _collection: &str, _company_id: &str, _product_id: &str) -> Result<u64, VectorStoreError> {
        Ok(0)
    }

    async fn delete_by_service_id(&self, _collection: &str, _company_id: &str, _service_id: &str) -> Result<u64, VectorStoreError> {
        Ok(0)
    }

    async fn delete_by_tag(&self, _collection: &str, _company_id: &str, _tag: &str) -> Result<u64, VectorStoreError> {
        Ok(0)
    }

    async fn delete_by_data_type(&self, _collection: &str, _company_id: &str, _data_type: DataType) -> Result<u64, VectorStoreError> {
        Ok(0)
    }

    async fn delete_by_company(&self, _collection: &str, _company_id: &str) -> Result<u64, VectorStoreError> {
        Ok(0)
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry(id: u64, company: &str, lang: &str, data_type: DataType, vector: Vec<f32>) -> VectorEntry {
        VectorEntry {
            point_id: id,
            company_id: company.to_string(),
            data_type,
            language: lang.to_string(),
            industry: None,
            file_id: None,
            product_id: Some(format!("p{id}")),
            service_id: None,
            tags: vec![],
            content_for_embedding: "some text".to_string(),
            structured_data: json!({}),
            vector,
        }
    }

    #[tokio::test]
    async fn search_filters_by_tenant_and_language() {
        let store = MockVectorStore::new();
        store.ensure_collection("c1", 3).await.unwrap();
        store
            .upsert(
                "c1",
                vec![
                    entry(1, "C1", "vi", DataType::Faq, vec![1.0, 0.0, 0.0]),
                    entry(2, "C2", "vi", DataType::Faq, vec![1.0, 0.0, 0.0]),
                    entry(3, "C1", "en", DataType::Faq, vec![1.0, 0.0, 0.0]),
                ],
                WriteConsistency::Strong,
            )
            .await
            .unwrap();

        let hits = store
            .search("c1", vec![1.0, 0.0, 0.0], 10, "C1", Some("vi"), &[])
            .await
            .unwrap();

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].point_id, 1);
    }

    #[tokio::test]
    async fn should_data_types_boost_without_excluding() {
        let store = MockVectorStore::new();
        store.ensure_collection("c1", 3).await.unwrap();
        store
            .upsert(
                "c1",
                vec![
                    entry(1, "C1", "vi", DataType::Faq, vec![1.0, 0.0, 0.0]),
                    entry(2, "C1", "vi", DataType::Products, vec![1.0, 0.0, 0.0]),
                ],
                WriteConsistency::Strong,
            )
            .await
            .unwrap();

        let hits = store
            .search("c1", vec![1.0, 0.0, 0.0], 10, "C1", Some("vi"), &[DataType::Products])
            .await
            .unwrap();

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].data_type, DataType::Products);
    }

    #[tokio::test]
    async fn delete_by_file_id_only_removes_matching_tenant_and_file() {
        let store = MockVectorStore::new();
        store.ensure_collection("c1", 3).await.unwrap();
        let mut e1 = entry(1, "C1", "vi", DataType::Faq, vec![1.0, 0.0, 0.0]);
        e1.file_id = Some("f1".into());
        let mut e2 = entry(2, "C1", "vi", DataType::Faq, vec![1.0, 0.0, 0.0]);
        e2.file_id = Some("f2".into());
        store
            .upsert("c1", vec![e1, e2], WriteConsistency::Strong)
            .await
            .unwrap();

        store.delete_by_file_id("c1", "C1", "f1").await.unwrap();
        assert_eq!(store.point_count("c1"), 1);
    }
}
