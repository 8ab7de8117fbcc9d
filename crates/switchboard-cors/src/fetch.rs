//! Fetches a plugin's allowed domains from the tenant backend over HTTP.

use std::future::Future;
use std::time::Duration;

use reqwest::Client as HttpClient;
use serde::Deserialize;

use crate::error::CorsError;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct PluginDomains {
    pub company_id: String,
    pub allowed_domains: Vec<String>,
}

pub trait DomainFetcher: Send + Sync {
    fn fetch(&self, plugin_id: &str) -> impl Future<Output = Result<PluginDomains, CorsError>> + Send;
}

#[derive(Deserialize)]
struct PluginDomainsResponse {
    #[serde(rename = "companyId")]
    company_id: String,
    #[serde(rename = "allowedDomains")]
    allowed_domains: Vec<String>,
}

pub struct HttpDomainFetcher {
    http: HttpClient,
    backend_base_url: String,
}

impl HttpDomainFetcher {
    pub fn new(backend_base_url: &str) -> Self {
        Self {
            http: HttpClient::builder()
                .timeout(DEFAULT_TIMEOUT)
                .build()
                .unwrap_or_else(|_| HttpClient::new()),
            backend_base_url: backend_base_url.trim_end_matches('/').to_string(),
        }
    }
}

impl DomainFetcher for HttpDomainFetcher {
    async fn fetch(&self, plugin_id: &str) -> Result<PluginDomains, CorsError> {
        let url = format!(
            "{}/api/cors/plugin-domains?pluginId={}",
            self.backend_base_url, plugin_id
        );

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| CorsError::FetchFailed {
                plugin_id: plugin_id.to_string(),
                message: e.to_string(),
            })?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(CorsError::PluginNotFound(plugin_id.to_string()));
        }

        let response = response.error_for_status().map_err(|e| CorsError::FetchFailed {
            plugin_id: plugin_id.to_string(),
            message: e.to_string(),
        })?;

        let body: PluginDomainsResponse = response.json().await.map_err(|e| CorsError::FetchFailed {
            plugin_id: plugin_id.to_string(),
            message: e.to_string(),
        })?;

        Ok(PluginDomains {
            company_id: body.company_id,
            allowed_domains: body.allowed_domains,
        })
    }
}
