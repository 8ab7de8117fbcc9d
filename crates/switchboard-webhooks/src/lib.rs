//! Outbound webhook envelope, fan-out, and retry dispatch (spec §4.5, §6.2).

pub mod dispatcher;
pub mod envelope;
pub mod error;
pub mod fan_out;

pub use dispatcher::WebhookDispatcher;
pub use envelope::{WebhookEnvelope, WebhookEvent};
pub use error::WebhookError;
pub use fan_out::{fan_out, PendingWebhook};
