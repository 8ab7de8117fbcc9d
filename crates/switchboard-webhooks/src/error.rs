use thiserror::Error;

#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("webhook to {url} failed after {attempts} attempt(s): {message}")]
    DeliveryFailed {
        url: String,
        attempts: u32,
        message: String,
    },

    #[error("webhook to {url} rejected with status {status}: {body}")]
    Rejected { url: String, status: u16, body: String },
}
