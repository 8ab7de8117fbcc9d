//! Environment-backed configuration: `Config::from_env()` reads every
//! setting, `Config::validate()` checks the result is usable.

use std::env;
use std::net::IpAddr;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse port '{value}': {source}")]
    PortParseError {
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },

    #[error("failed to parse bind address '{value}': {source}")]
    InvalidBindAddr {
        value: String,
        #[source]
        source: std::net::AddrParseError,
    },

    #[error("missing required environment variable: {name}")]
    MissingEnvVar { name: &'static str },

    #[error("invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub bind_addr: IpAddr,

    pub internal_api_key: String,
    pub webhook_secret: String,
    pub backend_webhook_url: String,

    pub llm_provider_key: Option<String>,
    pub llm_model: String,
    pub embedding_model: String,
    pub embedding_base_url: String,
    pub vector_size: u64,

    pub vector_store_url: String,
    pub vector_store_api_key: Option<String>,

    pub extractor_endpoint: String,

    pub queue_url: String,

    pub cors_cache_ttl_seconds: u64,
    pub webhook_timeout_seconds: u64,
    pub webhook_max_attempts: u32,
    pub max_file_size_mb: u64,

    /// Per-tenant order tax rate, e.g. 0.10 for 10%. Spec §9 flags the
    /// 10% figure as illustrative in the source; this makes it a
    /// deployment knob instead of a hardcoded constant.
    pub order_tax_rate: f64,
    pub order_currency: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            bind_addr: IpAddr::V4(std::net::Ipv4Addr::new(0, 0, 0, 0)),
            internal_api_key: String::new(),
            webhook_secret: String::new(),
            backend_webhook_url: String::new(),
            llm_provider_key: None,
            llm_model: "gpt-4o-mini".to_string(),
            embedding_model: "text-embedding-3-small".to_string(),
            embedding_base_url: "https://api.openai.com/v1".to_string(),
            vector_size: 1536,
            vector_store_url: "http://localhost:6334".to_string(),
            vector_store_api_key: None,
            extractor_endpoint: String::new(),
            queue_url: "redis://localhost:6379".to_string(),
            cors_cache_ttl_seconds: 300,
            webhook_timeout_seconds: 30,
            webhook_max_attempts: 3,
            max_file_size_mb: 50,
            order_tax_rate: 0.10,
            order_currency: "VND".to_string(),
        }
    }
}

impl Config {
    const ENV_PORT: &'static str = "SWITCHBOARD_PORT";
    const ENV_BIND_ADDR: &'static str = "SWITCHBOARD_BIND_ADDR";
    const ENV_INTERNAL_API_KEY: &'static str = "INTERNAL_API_KEY";
    const ENV_WEBHOOK_SECRET: &'static str = "WEBHOOK_SECRET";
    const ENV_BACKEND_WEBHOOK_URL: &'static str = "BACKEND_WEBHOOK_URL";
    const ENV_LLM_PROVIDER_KEY: &'static str = "LLM_PROVIDER_KEY";
    const ENV_LLM_MODEL: &'static str = "LLM_MODEL";
    const ENV_EMBEDDING_MODEL: &'static str = "EMBEDDING_MODEL";
    const ENV_EMBEDDING_BASE_URL: &'static str = "EMBEDDING_BASE_URL";
    const ENV_VECTOR_SIZE: &'static str = "VECTOR_SIZE";
    const ENV_VECTOR_STORE_URL: &'static str = "VECTOR_STORE_URL";
    const ENV_VECTOR_STORE_API_KEY: &'static str = "VECTOR_STORE_API_KEY";
    const ENV_EXTRACTOR_ENDPOINT: &'static str = "EXTRACTOR_ENDPOINT";
    const ENV_QUEUE_URL: &'static str = "QUEUE_URL";
    const ENV_CORS_CACHE_TTL_SECONDS: &'static str = "CORS_CACHE_TTL_SECONDS";
    const ENV_WEBHOOK_TIMEOUT_SECONDS: &'static str = "WEBHOOK_TIMEOUT_SECONDS";
    const ENV_WEBHOOK_MAX_ATTEMPTS: &'static str = "WEBHOOK_MAX_ATTEMPTS";
    const ENV_MAX_FILE_SIZE_MB: &'static str = "MAX_FILE_SIZE_MB";
    const ENV_ORDER_TAX_RATE: &'static str = "ORDER_TAX_RATE";
    const ENV_ORDER_CURRENCY: &'static str = "ORDER_CURRENCY";

    /// Loads configuration from the environment, falling back to defaults
    /// for everything except the two shared secrets, which are required.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let port = Self::parse_port_from_env(defaults.port)?;
        let bind_addr = Self::parse_bind_addr_from_env(defaults.bind_addr)?;

        let internal_api_key = Self::require_env(Self::ENV_INTERNAL_API_KEY)?;
        let webhook_secret = Self::require_env(Self::ENV_WEBHOOK_SECRET)?;
        let backend_webhook_url =
            Self::parse_string_from_env(Self::ENV_BACKEND_WEBHOOK_URL, defaults.backend_webhook_url);

        let llm_provider_key = env::var(Self::ENV_LLM_PROVIDER_KEY).ok();
        let llm_model = Self::parse_string_from_env(Self::ENV_LLM_MODEL, defaults.llm_model);
        let embedding_model =
            Self::parse_string_from_env(Self::ENV_EMBEDDING_MODEL, defaults.embedding_model);
        let embedding_base_url =
            Self::parse_string_from_env(Self::ENV_EMBEDDING_BASE_URL, defaults.embedding_base_url);
        let vector_size = Self::parse_u64_from_env(Self::ENV_VECTOR_SIZE, defaults.vector_size);

        let vector_store_url =
            Self::parse_string_from_env(Self::ENV_VECTOR_STORE_URL, defaults.vector_store_url);
        let vector_store_api_key = env::var(Self::ENV_VECTOR_STORE_API_KEY).ok();

        let extractor_endpoint =
            Self::parse_string_from_env(Self::ENV_EXTRACTOR_ENDPOINT, defaults.extractor_endpoint);

        let queue_url = Self::parse_string_from_env(Self::ENV_QUEUE_URL, defaults.queue_url);

        let cors_cache_ttl_seconds = Self::parse_u64_from_env(
            Self::ENV_CORS_CACHE_TTL_SECONDS,
            defaults.cors_cache_ttl_seconds,
        );
        let webhook_timeout_seconds = Self::parse_u64_from_env(
            Self::ENV_WEBHOOK_TIMEOUT_SECONDS,
            defaults.webhook_timeout_seconds,
        );
        let webhook_max_attempts = Self::parse_u64_from_env(
            Self::ENV_WEBHOOK_MAX_ATTEMPTS,
            defaults.webhook_max_attempts as u64,
        ) as u32;
        let max_file_size_mb =
            Self::parse_u64_from_env(Self::ENV_MAX_FILE_SIZE_MB, defaults.max_file_size_mb);

        let order_tax_rate = env::var(Self::ENV_ORDER_TAX_RATE)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.order_tax_rate);
        let order_currency =
            Self::parse_string_from_env(Self::ENV_ORDER_CURRENCY, defaults.order_currency);

        Ok(Self {
            port,
            bind_addr,
            internal_api_key,
            webhook_secret,
            backend_webhook_url,
            llm_provider_key,
            llm_model,
            embedding_model,
            embedding_base_url,
            vector_size,
            vector_store_url,
            vector_store_api_key,
            extractor_endpoint,
            queue_url,
            cors_cache_ttl_seconds,
            webhook_timeout_seconds,
            webhook_max_attempts,
            max_file_size_mb,
            order_tax_rate,
            order_currency,
        })
    }

    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }

    pub fn max_file_size_bytes(&self) -> u64 {
        self.max_file_size_mb * 1024 * 1024
    }

    /// Checks invariants `from_env` doesn't enforce on its own: the two
    /// shared secrets must be non-empty even when present, and the
    /// numeric knobs must be usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.internal_api_key.trim().is_empty() {
            return Err(ConfigError::MissingEnvVar {
                name: Self::ENV_INTERNAL_API_KEY,
            });
        }
        if self.webhook_secret.trim().is_empty() {
            return Err(ConfigError::MissingEnvVar {
                name: Self::ENV_WEBHOOK_SECRET,
            });
        }
        if self.webhook_max_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                name: Self::ENV_WEBHOOK_MAX_ATTEMPTS,
                value: self.webhook_max_attempts.to_string(),
            });
        }
        if self.max_file_size_mb == 0 {
            return Err(ConfigError::InvalidValue {
                name: Self::ENV_MAX_FILE_SIZE_MB,
                value: self.max_file_size_mb.to_string(),
            });
        }
        if self.vector_size == 0 {
            return Err(ConfigError::InvalidValue {
                name: Self::ENV_VECTOR_SIZE,
                value: self.vector_size.to_string(),
            });
        }
        if !(0.0..=1.0).contains(&self.order_tax_rate) {
            return Err(ConfigError::InvalidValue {
                name: Self::ENV_ORDER_TAX_RATE,
                value: self.order_tax_rate.to_string(),
            });
        }
        Ok(())
    }

    fn parse_port_from_env(default: u16) -> Result<u16, ConfigError> {
        match env::var(Self::ENV_PORT) {
            Ok(value) => value
                .parse()
                .map_err(|e| ConfigError::PortParseError { value, source: e }),
            Err(_) => Ok(default),
        }
    }

    fn parse_bind_addr_from_env(default: IpAddr) -> Result<IpAddr, ConfigError> {
        match env::var(Self::ENV_BIND_ADDR) {
            Ok(value) => value
                .parse()
                .map_err(|e| ConfigError::InvalidBindAddr { value, source: e }),
            Err(_) => Ok(default),
        }
    }

    fn require_env(name: &'static str) -> Result<String, ConfigError> {
        env::var(name).map_err(|_| ConfigError::MissingEnvVar { name })
    }

    fn parse_string_from_env(var_name: &str, default: String) -> String {
        env::var(var_name).unwrap_or(default)
    }

    fn parse_u64_from_env(var_name: &str, default: u64) -> u64 {
        env::var(var_name)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec_table() {
        let c = Config::default();
        assert_eq!(c.cors_cache_ttl_seconds, 300);
        assert_eq!(c.webhook_timeout_seconds, 30);
        assert_eq!(c.webhook_max_attempts, 3);
        assert_eq!(c.max_file_size_mb, 50);
        assert_eq!(c.vector_size, 1536);
    }

    #[test]
    fn max_file_size_bytes_converts_from_mb() {
        let c = Config::default();
        assert_eq!(c.max_file_size_bytes(), 50 * 1024 * 1024);
    }

    #[test]
    fn validate_rejects_empty_secrets() {
        let c = Config::default();
        assert!(c.validate().is_err());
    }

    #[test]
    fn validate_accepts_populated_secrets() {
        let mut c = Config::default();
        c.internal_api_key = "key".to_string();
        c.webhook_secret = "secret".to_string();
        assert!(c.validate().is_ok());
    }
}
