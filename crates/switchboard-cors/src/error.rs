use thiserror::Error;

#[derive(Debug, Error)]
pub enum CorsError {
    #[error("failed to fetch plugin domains for {plugin_id}: {message}")]
    FetchFailed { plugin_id: String, message: String },

    #[error("plugin not found: {0}")]
    PluginNotFound(String),
}
