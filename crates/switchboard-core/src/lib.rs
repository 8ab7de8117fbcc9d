//! Shared types, configuration, error taxonomy, id generation, and retry
//! policy for the switchboard control plane.

pub mod auth;
pub mod channel;
pub mod config;
pub mod error;
pub mod ids;
pub mod intent;
pub mod retry;

pub use auth::secrets_match;
pub use channel::{Channel, ChannelRequest, UserInfo};
pub use config::{Config, ConfigError};
pub use error::SwitchboardError;
pub use intent::{Intent, StructuredResponse, Thinking};
pub use retry::RetryPolicy;
