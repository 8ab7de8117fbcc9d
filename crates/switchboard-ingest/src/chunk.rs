//! Chunking rules for extracted content (spec §4.3 step 6).
//!
//! Catalog items are grouped by category; a category with enough items to
//! embed usefully on its own becomes one chunk, while small categories are
//! pooled together so no chunk is too small to carry meaningful context.
//! Knowledge-base text is split on paragraph boundaries instead, since it
//! has no category field to group by.

use std::collections::HashMap;

use serde::Serialize;
use serde_json::Value as Json;

/// Below this many items, a category is too small to stand as its own
/// chunk and is pooled into `UNCATEGORIZED_LABEL` instead.
pub const MIN_CHUNK_SIZE: usize = 20;

pub const UNCATEGORIZED_LABEL: &str = "uncategorized";

#[derive(Debug, Clone, Serialize)]
pub struct CatalogItem {
    pub id: String,
    pub category: Option<String>,
    pub content_for_embedding: String,
    pub payload: Json,
}

#[derive(Debug, Clone, Serialize)]
pub struct CatalogChunk {
    pub category: String,
    pub items: Vec<CatalogItem>,
}

/// Groups `items` by category. Categories with at least [`MIN_CHUNK_SIZE`]
/// items each become a single chunk named after the category. Everything
/// else is pooled into one `uncategorized` bucket and rebatched into chunks
/// of at least [`MIN_CHUNK_SIZE`] (the final batch may be smaller, since
/// there is nothing left to pool it with).
pub fn chunk_catalog_items(items: Vec<CatalogItem>) -> Vec<CatalogChunk> {
    let mut by_category: HashMap<String, Vec<CatalogItem>> = HashMap::new();
    for item in items {
        let category = item
            .category
            .clone()
            .unwrap_or_else(|| UNCATEGORIZED_LABEL.to_string());
        by_category.entry(category).or_default().push(item);
    }

    let mut chunks = Vec::new();
    let mut pooled = Vec::new();

    for (category, group) in by_category {
        if group.len() >= MIN_CHUNK_SIZE {
            chunks.push(CatalogChunk { category, items: group });
        } else {
            pooled.extend(group);
        }
    }

    for batch in pooled.chunks(MIN_CHUNK_SIZE) {
        chunks.push(CatalogChunk {
            category: UNCATEGORIZED_LABEL.to_string(),
            items: batch.to_vec(),
        });
    }

    chunks
}

/// Splits knowledge-base text into chunks on blank-line (paragraph)
/// boundaries, merging consecutive paragraphs until `max_chars` would be
/// exceeded. A single paragraph longer than `max_chars` is kept whole
/// rather than split mid-sentence.
pub fn chunk_knowledge_base_text(text: &str, max_chars: usize) -> Vec<String> {
    let paragraphs: Vec<&str> = text
        .split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();

    let mut chunks = Vec::new();
    let mut current = String::new();

    for paragraph in paragraphs {
        if !current.is_empty() && current.len() + 2 + paragraph.len() > max_chars {
            chunks.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push_str("\n\n");
        }
        current.push_str(paragraph);
    }
    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str, category: Option<&str>) -> CatalogItem {
        CatalogItem {
            id: id.to_string(),
            category: category.map(str::to_string),
            content_for_embedding: format!("item {id}"),
            payload: Json::Null,
        }
    }

    #[test]
    fn large_category_becomes_its_own_chunk() {
        let items: Vec<CatalogItem> = (0..25).map(|i| item(&i.to_string(), Some("drinks"))).collect();
        let chunks = chunk_catalog_items(items);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].category, "drinks");
        assert_eq!(chunks[0].items.len(), 25);
    }

    #[test]
    fn small_categories_pool_into_uncategorized_batches() {
        let mut items = Vec::new();
        for i in 0..5 {
            items.push(item(&format!("a{i}"), Some("appetizers")));
        }
        for i in 0..5 {
            items.push(item(&format!("b{i}"), Some("sides")));
        }
        for i in 0..30 {
            items.push(item(&format!("c{i}"), None));
        }

        let chunks = chunk_catalog_items(items);
        let total_items: usize = chunks.iter().map(|c| c.items.len()).sum();
        assert_eq!(total_items, 40);
        assert!(chunks.iter().all(|c| c.category == UNCATEGORIZED_LABEL));
        assert!(chunks.iter().all(|c| c.items.len() >= MIN_CHUNK_SIZE || chunks.len() == 1));
    }

    #[test]
    fn mixed_large_and_small_categories() {
        let mut items: Vec<CatalogItem> =
            (0..22).map(|i| item(&format!("m{i}"), Some("mains"))).collect();
        items.extend((0..3).map(|i| item(&format!("d{i}"), Some("desserts"))));

        let chunks = chunk_catalog_items(items);
        assert!(chunks.iter().any(|c| c.category == "mains" && c.items.len() == 22));
        assert!(chunks.iter().any(|c| c.category == UNCATEGORIZED_LABEL));
    }

    #[test]
    fn knowledge_base_text_splits_on_paragraphs_respecting_max_chars() {
        let text = "Para one.\n\nPara two is a bit longer.\n\nPara three.";
        let chunks = chunk_knowledge_base_text(text, 30);
        assert!(chunks.len() >= 2);
        assert!(chunks.iter().all(|c| !c.is_empty()));
    }

    #[test]
    fn oversized_single_paragraph_is_kept_whole() {
        let long_paragraph = "x".repeat(500);
        let chunks = chunk_knowledge_base_text(&long_paragraph, 100);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].len(), 500);
    }
}
