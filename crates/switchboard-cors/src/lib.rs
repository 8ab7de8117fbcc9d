//! Dynamic per-plugin CORS origin cache for the `chat-plugin` channel
//! (spec §4.6). The four platform backend channels never go through this.

pub mod cache;
pub mod error;
pub mod fetch;
pub mod origin;

pub use cache::{CorsCache, CorsStatus};
pub use error::CorsError;
pub use fetch::{DomainFetcher, HttpDomainFetcher, PluginDomains};
pub use origin::origin_is_allowed;
