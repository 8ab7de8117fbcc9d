//! Qdrant-backed vector store client.

use std::collections::HashMap;
use std::future::Future;

use qdrant_client::Qdrant;
use qdrant_client::qdrant::{
    Condition, CountPointsBuilder, CreateCollectionBuilder, DeletePointsBuilder, Distance, Filter,
    PointStruct, ScrollPointsBuilder, SearchPointsBuilder, UpsertPointsBuilder, VectorParamsBuilder,
};

use crate::error::VectorStoreError;
use crate::model::{DataType, SearchHit, VectorEntry, WriteConsistency};

/// Minimal async vector store interface. Lets the RAG assembler and the
/// ingestion worker depend on a trait instead of a concrete Qdrant client.
pub trait VectorStore: Send + Sync {
    fn ensure_collection(
        &self,
        name: &str,
        vector_size: u64,
    ) -> impl Future<Output = Result<(), VectorStoreError>> + Send;

    fn upsert(
        &self,
        collection: &str,
        entries: Vec<VectorEntry>,
        consistency: WriteConsistency,
    ) -> impl Future<Output = Result<(), VectorStoreError>> + Send;

    fn search(
        &self,
        collection: &str,
        query: Vec<f32>,
        limit: u64,
        must_company_id: &str,
        must_language: Option<&str>,
        should_data_types: &[DataType],
    ) -> impl Future<Output = Result<Vec<SearchHit>, VectorStoreError>> + Send;

    /// Lists every entry of `data_type` for `company_id`, unranked — the
    /// full-listing counterpart to `search` used by admin context
    /// "get-all" reads (§4.8), which need the whole record set rather
    /// than a nearest-neighbor query.
    fn list_by_data_type(
        &self,
        collection: &str,
        company_id: &str,
        data_type: DataType,
    ) -> impl Future<Output = Result<Vec<SearchHit>, VectorStoreError>> + Send;

    /// Deletes every entry tagged with `file_id` for `company_id` (spec §3
    /// Vector Entry lifecycle, §6.1 file delete). Returns the number of
    /// points removed so callers can report `deleted_points`; a second call
    /// against an already-deleted file returns 0 rather than erroring
    /// (spec §8 idempotence).
    fn delete_by_file_id(
        &self,
        collection: &str,
        company_id: &str,
        file_id: &str,
    ) -> impl Future<Output = Result<u64, VectorStoreError>> + Send;

    /// Deletes every entry tagged with `product_id` for `company_id` (§6.1
    /// product delete).
    fn delete_by_product_id(
        &self,
        collection: &str,
        company_id: &str,
        product_id: &str,
    ) -> impl Future<Output = Result<u64, VectorStoreError>> + Send;

    /// Deletes every entry tagged with `service_id` for `company_id` (§6.1
    /// service delete).
    fn delete_by_service_id(
        &self,
        collection: &str,
        company_id: &str,
        service_id: &str,
    ) -> impl Future<Output = Result<u64, VectorStoreError>> + Send;

    /// Deletes every entry carrying `tag` among `tags[]` for `company_id`.
    fn delete_by_tag(
        &self,
        collection: &str,
        company_id: &str,
        tag: &str,
    ) -> impl Future<Output = Result<u64, VectorStoreError>> + Send;

    /// Deletes every entry of `data_type` for `company_id` (§4.8 context
    /// delete-all: propagates to vector-store removal by
    /// `(company_id, data_type)` filter).
    fn delete_by_data_type(
        &self,
        collection: &str,
        company_id: &str,
        data_type: DataType,
    ) -> impl Future<Output = Result<u64, VectorStoreError>> + Send;

    /// Drops every entry for `company_id`, regardless of `data_type` (spec
    /// §3 Tenant lifecycle: "destroyed by admin delete — must drop all
    /// vector entries ... for that tenant").
    fn delete_by_company(
        &self,
        collection: &str,
        company_id: &str,
    ) -> impl Future<Output = Result<u64, VectorStoreError>> + Send;
}

#[derive(Clone)]
pub struct QdrantVectorStore {
    client: Qdrant,
    url: String,
}

impl QdrantVectorStore {
    pub fn new(url: &str, api_key: Option<&str>) -> Result<Self, VectorStoreError> {
        let mut builder = Qdrant::from_url(url);
        if let Some(key) = api_key {
            builder = builder.api_key(key.to_string());
        }
        let client = builder
            .build()
            .map_err(|e| VectorStoreError::ConnectionFailed {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        Ok(Self {
            client,
            url: url.to_string(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub async fn health_check(&self) -> Result<(), VectorStoreError> {
        self.client
            .health_check()
            .await
            .map_err(|e| VectorStoreError::ConnectionFailed {
                url: self.url.clone(),
                message: e.to_string(),
            })?;
        Ok(())
    }

    /// Counts points matching `filter` before deleting them, so callers get
    /// back how many points were actually removed (`deleted_points` in the
    /// admin delete responses) — Qdrant's delete call itself only
    /// acknowledges the operation, it doesn't report a count.
    async fn delete_by_filter(&self, collection: &str, filter: Filter) -> Result<u64, VectorStoreError> {
        let counted = self
            .client
            .count(CountPointsBuilder::new(collection).filter(filter.clone()).exact(true))
            .await
            .map_err(|e| VectorStoreError::DeleteFailed {
                collection: collection.to_string(),
                message: e.to_string(),
            })?;
        let deleted = counted.result.map(|r| r.count).unwrap_or(0);

        self.client
            .delete_points(
                DeletePointsBuilder::new(collection)
                    .points(filter)
                    .wait(true),
            )
            .await
            .map_err(|e| VectorStoreError::DeleteFailed {
                collection: collection.to_string(),
                message: e.to_string(),
            })?;

        Ok(deleted)
    }

    fn entry_to_point(entry: VectorEntry) -> PointStruct {
        let mut payload: HashMap<String, qdrant_client::qdrant::Value> = HashMap::new();
        payload.insert("company_id".to_string(), entry.company_id.into());
        payload.insert(
            "data_type".to_string(),
            entry.data_type.as_str().to_string().into(),
        );
        payload.insert("language".to_string(), entry.language.into());
        if let Some(industry) = entry.industry {
            payload.insert("industry".to_string(), industry.into());
        }
        if let Some(file_id) = entry.file_id {
            payload.insert("file_id".to_string(), file_id.into());
        }
        if let Some(product_id) = entry.product_id {
            payload.insert("product_id".to_string(), product_id.into());
        }
        if let Some(service_id) = entry.service_id {
            payload.insert("service_id".to_string(), service_id.into());
        }
        // Stored as a native Qdrant list so `Condition::matches("tags", tag)`
        // matches any point whose tags array contains `tag`, not just a
        // point whose whole comma-joined string equals it.
        payload.insert("tags".to_string(), entry.tags.clone().into());
        payload.insert(
            "content_for_embedding".to_string(),
            entry.content_for_embedding.into(),
        );
        payload.insert(
            "structured_data".to_string(),
            entry.structured_data.to_string().into(),
        );

        PointStruct::new(entry.point_id, entry.vector, payload)
    }

    fn point_to_hit(point: qdrant_client::qdrant::ScoredPoint) -> Option<SearchHit> {
        Self::hit_from_parts(point.id, point.payload, point.score)
    }

    fn retrieved_to_hit(point: qdrant_client::qdrant::RetrievedPoint) -> Option<SearchHit> {
        Self::hit_from_parts(point.id, point.payload, 0.0)
    }

    fn hit_from_parts(
        id: Option<qdrant_client::qdrant::PointId>,
        payload: HashMap<String, qdrant_client::qdrant::Value>,
        score: f32,
    ) -> Option<SearchHit> {
        use qdrant_client::qdrant::point_id::PointIdOptions;

        let point_id = match id.and_then(|id| id.point_id_options) {
            Some(PointIdOptions::Num(n)) => n,
            _ => return None,
        };

        let get_str = |key: &str| -> Option<String> {
            payload.get(key).and_then(|v| v.as_str()).map(str::to_string)
        };

        let data_type_raw = get_str("data_type")?;
        let data_type = match data_type_raw.as_str() {
            "PRODUCTS" => DataType::Products,
            "SERVICES" => DataType::Services,
            "FAQ" => DataType::Faq,
            "KNOWLEDGE_BASE" => DataType::KnowledgeBase,
            "COMPANY_INFO" => DataType::CompanyInfo,
            _ => return None,
        };

        let structured_data = get_str("structured_data")
            .and_then(|s| serde_json::from_str(&s).ok())
            .unwrap_or(serde_json::Value::Null);

        Some(SearchHit {
            point_id,
            score,
            company_id: get_str("company_id").unwrap_or_default(),
            data_type,
            language: get_str("language").unwrap_or_default(),
            file_id: get_str("file_id"),
            product_id: get_str("product_id"),
            service_id: get_str("service_id"),
            content_for_embedding: get_str("content_for_embedding").unwrap_or_default(),
            structured_data,
        })
    }
}

impl VectorStore for QdrantVectorStore {
    async fn ensure_collection(&self, name: &str, vector_size: u64) -> Result<(), VectorStoreError> {
        let exists = self.client.collection_exists(name).await.map_err(|e| {
            VectorStoreError::CreateCollectionFailed {
                collection: name.to_string(),
                message: e.to_string(),
            }
        })?;

        if exists {
            return Ok(());
        }

        let vectors_config = VectorParamsBuilder::new(vector_size, Distance::Cosine);
        self.client
            .create_collection(
                CreateCollectionBuilder::new(name)
                    .vectors_config(vectors_config)
                    .on_disk_payload(true),
            )
            .await
            .map_err(|e| VectorStoreError::CreateCollectionFailed {
                collection: name.to_string(),
                message: e.to_string(),
            })?;

        Ok(())
    }

    async fn upsert(
        &self,
        collection: &str,
        entries: Vec<VectorEntry>,
        consistency: WriteConsistency,
    ) -> Result<(), VectorStoreError> {
        if entries.is_empty() {
            return Ok(());
        }

        let points: Vec<PointStruct> = entries.into_iter().map(Self::entry_to_point).collect();

        self.client
            .upsert_points(UpsertPointsBuilder::new(collection, points).wait(consistency.into()))
            .await
            .map_err(|e| VectorStoreError::UpsertFailed {
                collection: collection.to_string(),
                message: e.to_string(),
            })?;

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
        let mut must = vec![Condition::matches("company_id", must_company_id.to_string())];
        if let Some(lang) = must_language {
            must.push(Condition::matches("language", lang.to_string()));
        }

        let mut filter = Filter::must(must);
        if !should_data_types.is_empty() {
            filter.should = should_data_types
                .iter()
                .map(|dt| Condition::matches("data_type", dt.as_str().to_string()))
                .collect();
        }

        let search_builder = SearchPointsBuilder::new(collection, query, limit)
            .with_payload(true)
            .filter(filter);

        let result = self
            .client
            .search_points(search_builder)
            .await
            .map_err(|e| VectorStoreError::SearchFailed {
                collection: collection.to_string(),
                message: e.to_string(),
            })?;

        Ok(result
            .result
            .into_iter()
            .filter_map(Self::point_to_hit)
            .collect())
    }

    async fn list_by_data_type(
        &self,
        collection: &str,
        company_id: &str,
        data_type: DataType,
    ) -> Result<Vec<SearchHit>, VectorStoreError> {
        let filter = Filter::must([
            Condition::matches("company_id", company_id.to_string()),
            Condition::matches("data_type", data_type.as_str().to_string()),
        ]);

        let result = self
            .client
            .scroll(
                ScrollPointsBuilder::new(collection)
                    .filter(filter)
                    .with_payload(true)
                    .limit(1000),
            )
            .await
            .map_err(|e| VectorStoreError::SearchFailed {
                collection: collection.to_string(),
                message: e.to_string(),
            })?;

        Ok(result
            .result
            .into_iter()
            .filter_map(Self::retrieved_to_hit)
            .collect())
    }

    async fn delete_by_file_id(
        &self,
        collection: &str,
        company_id: &str,
        file_id: &str,
    ) -> Result<u64, VectorStoreError> {
        let filter = Filter::must([
            Condition::matches("company_id", company_id.to_string()),
            Condition::matches("file_id", file_id.to_string()),
        ]);
        self.delete_by_filter(collection, filter).await
    }

    async fn delete_by_product_id(
        &self,
        collection: &str,
        company_id: &str,
        product_id: &str,
    ) -> Result<u64, VectorStoreError> {
        let filter = Filter::must([
            Condition::matches("company_id", company_id.to_string()),
            Condition::matches("product_id", product_id.to_string()),
        ]);
        self.delete_by_filter(collection, filter).await
    }

    async fn delete_by_service_id(
        &self,
        collection: &str,
        company_id: &str,
        service_id: &str,
    ) -> Result<u64, VectorStoreError> {
        let filter = Filter::must([
            Condition::matches("company_id", company_id.to_string()),
            Condition::matches("service_id", service_id.to_string()),
        ]);
        self.delete_by_filter(collection, filter).await
    }

    async fn delete_by_tag(
        &self,
        collection: &str,
        company_id: &str,
        tag: &str,
    ) -> Result<u64, VectorStoreError> {
        let filter = Filter::must([
            Condition::matches("company_id", company_id.to_string()),
            Condition::matches("tags", tag.to_string()),
        ]);
        self.delete_by_filter(collection, filter).await
    }

    async fn delete_by_data_type(
        &self,
        collection: &str,
        company_id: &str,
        data_type: DataType,
    ) -> Result<u64, VectorStoreError> {
        let filter = Filter::must([
            Condition::matches("company_id", company_id.to_string()),
            Condition::matches("data_type", data_type.as_str().to_string()),
        ]);
        self.delete_by_filter(collection, filter).await
    }

    async fn delete_by_company(&self, collection: &str, company_id: &str) -> Result<u64, VectorStoreError> {
        let filter = Filter::must([Condition::matches("company_id", company_id.to_string())]);
        self.delete_by_filter(collection, filter).await
    }
}

/// Lets a store be shared between the RAG assembler and the ingestion
/// worker (both generic over `VectorStore`) by cloning the `Arc` instead
/// of the underlying client.
impl<T> VectorStore for std::sync::Arc<T>
where
    T: VectorStore + ?Sized,
{
    fn ensure_collection(&self, name: &str, vector_size: u64) -> impl Future<Output = Result<(), VectorStoreError>> + Send {
        (**self).ensure_collection(name, vector_size)
    }

    fn upsert(
        &self,
        collection: &str,
        entries: Vec<VectorEntry>,
        consistency: WriteConsistency,
    ) -> impl Future<Output = Result<(), VectorStoreError>> + Send {
        (**self).upsert(collection, entries, consistency)
    }

    fn search(
        &self,
        collection: &str,
        query: Vec<f32>,
        limit: u64,
        must_company_id: &str,
        must_language: Option<&str>,
        should_data_types: &[DataType],
    ) -> impl Future<Output = Result<Vec<SearchHit>, VectorStoreError>> + Send {
        (**self).search(collection, query, limit, must_company_id, must_language, should_data_types)
    }

    fn list_by_data_type(&self, collection: &str, company_id: &str, data_type: DataType) -> impl Future<Output = Result<Vec<SearchHit>, VectorStoreError>> + Send {
        (**self).list_by_data_type(collection, company_id, data_type)
    }

    fn delete_by_file_id(&self, collection: &str, company_id: &str, file_id: &str) -> impl Future<Output = Result<u64, VectorStoreError>> + Send {
        (**self).delete_by_file_id(collection, company_id, file_id)
    }

    fn delete_by_product_id(&self, collection: &str, company_id: &str, product_id: &str) -> impl Future<Output = Result<u64, VectorStoreError>> + Send {
        (**self).delete_by_product_id(collection, company_id, product_id)
    }

    fn delete_by_service_id(&self, collection: &str, company_id: &str, service_id: &str) -> impl Future<Output = Result<u64, VectorStoreError>> + Send {
        (**self).delete_by_service_id(collection, company_id, service_id)
    }

    fn delete_by_tag(&self, collection: &str, company_id: &str, tag: &str) -> impl Future<Output = Result<u64, VectorStoreError>> + Send {
        (**self).delete_by_tag(collection, company_id, tag)
    }

    fn delete_by_data_type(&self, collection: &str, company_id: &str, data_type: DataType) -> impl Future<Output = Result<u64, VectorStoreError>> + Send {
        (**self).delete_by_data_type(collection, company_id, data_type)
    }

    fn delete_by_company(&self, collection: &str, company_id: &str) -> impl Future<Output = Result<u64, VectorStoreError>> + Send {
        (**self).delete_by_company(collection, company_id)
    }
}
