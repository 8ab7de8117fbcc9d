//! In-memory plugin domain cache with request-time lazy fetch and the four
//! internal admin operations (spec §4.6).

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use moka::sync::Cache;

use crate::error::CorsError;
use crate::fetch::{DomainFetcher, PluginDomains};

#[derive(Debug, Default, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CorsStatus {
    pub cached_plugins: u64,
    pub hits: u64,
    pub misses: u64,
}

pub struct CorsCache<F> {
    entries: Cache<String, PluginDomains>,
    fetcher: F,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<F: DomainFetcher> CorsCache<F> {
    pub fn new(fetcher: F, ttl: Duration) -> Self {
        Self {
            entries: Cache::builder().time_to_live(ttl).build(),
            fetcher,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Looks up a plugin's allowed domains, fetching and caching on miss.
    pub async fn domains_for(&self, plugin_id: &str) -> Result<PluginDomains, CorsError> {
        if let Some(cached) = self.entries.get(plugin_id) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(cached);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let fetched = self.fetcher.fetch(plugin_id).await?;
        self.entries.insert(plugin_id.to_string(), fetched.clone());
        Ok(fetched)
    }

    /// `POST /api/internal/cors/update-domains` — replaces the entry.
    pub fn update_domains(&self, plugin_id: &str, company_id: &str, allowed_domains: Vec<String>) {
        self.entries.insert(
            plugin_id.to_string(),
            PluginDomains {
                company_id: company_id.to_string(),
                allowed_domains,
            },
        );
    }

    /// `DELETE /api/internal/cors/clear-cache/{plugin_id}`.
    pub fn clear_one(&self, plugin_id: &str) {
        self.entries.invalidate(plugin_id);
    }

    /// `DELETE /api/internal/cors/clear-cache` (emergency, drops everything).
    pub fn clear_all(&self) {
        self.entries.invalidate_all();
    }

    /// `GET /api/internal/cors/status`.
    pub fn status(&self) -> CorsStatus {
        self.entries.run_pending_tasks();
        CorsStatus {
            cached_plugins: self.entries.entry_count(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct StubFetcher {
        calls: Mutex<u32>,
    }

    impl DomainFetcher for StubFetcher {
        async fn fetch(&self, plugin_id: &str) -> Result<PluginDomains, CorsError> {
            *self.calls.lock().unwrap() += 1;
            Ok(PluginDomains {
                company_id: "C1".to_string(),
                allowed_domains: vec![format!("https://{plugin_id}.example.com")],
            })
        }
    }

    #[tokio::test]
    async fn miss_then_hit_fetches_exactly_once() {
        let cache = CorsCache::new(StubFetcher { calls: Mutex::new(0) }, Duration::from_secs(300));

        cache.domains_for("p1").await.unwrap();
        cache.domains_for("p1").await.unwrap();

        assert_eq!(*cache.fetcher.calls.lock().unwrap(), 1);
        let status = cache.status();
        assert_eq!(status.hits, 1);
        assert_eq!(status.misses, 1);
    }

    #[tokio::test]
    async fn clear_one_forces_refetch() {
        let cache = CorsCache::new(StubFetcher { calls: Mutex::new(0) }, Duration::from_secs(300));
        cache.domains_for("p1").await.unwrap();
        cache.clear_one("p1");
        cache.domains_for("p1").await.unwrap();
        assert_eq!(*cache.fetcher.calls.lock().unwrap(), 2);
    }

    #[tokio::test]
    async fn update_domains_overrides_cache_without_a_fetch() {
        let cache = CorsCache::new(StubFetcher { calls: Mutex::new(0) }, Duration::from_secs(300));
        cache.update_domains("p1", "C1", vec!["https://custom.example.com".to_string()]);
        let domains = cache.domains_for("p1").await.unwrap();
        assert_eq!(domains.allowed_domains, vec!["https://custom.example.com"]);
        assert_eq!(*cache.fetcher.calls.lock().unwrap(), 0);
    }
}
