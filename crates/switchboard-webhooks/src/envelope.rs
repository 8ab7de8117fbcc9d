//! The outbound webhook envelope (spec §6.2).

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value as Json;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WebhookEvent {
    ConversationCreated,
    MessageCreated,
    ConversationUpdated,
    AiResponseCompleted,
    AiResponsePluginCompleted,
    FileUploaded,
    OrderCreated,
    OrderUpdated,
    OrderCheckQuantity,
}

impl WebhookEvent {
    pub fn name(self) -> &'static str {
        match self {
            Self::ConversationCreated => "conversation.created",
            Self::MessageCreated => "message.created",
            Self::ConversationUpdated => "conversation.updated",
            Self::AiResponseCompleted => "ai.response.completed",
            Self::AiResponsePluginCompleted => "ai.response.plugin.completed",
            Self::FileUploaded => "file.uploaded",
            Self::OrderCreated => "order.created",
            Self::OrderUpdated => "order.updated",
            Self::OrderCheckQuantity => "order.check-quantity",
        }
    }

    /// The fixed destination path, for events that don't target a caller
    /// supplied URL (`file.uploaded` targets its task's `callback_url`
    /// instead, and order events target a per-intent path built by the
    /// caller — see spec §4.4 — so both are handled outside this table).
    pub fn default_path(self) -> Option<&'static str> {
        match self {
            Self::ConversationCreated
            | Self::MessageCreated
            | Self::ConversationUpdated
            | Self::AiResponsePluginCompleted => Some("/api/webhooks/ai/conversation"),
            Self::AiResponseCompleted => Some("/api/ai/response"),
            Self::FileUploaded | Self::OrderCreated | Self::OrderUpdated | Self::OrderCheckQuantity => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct WebhookEnvelope {
    pub event: String,
    #[serde(rename = "companyId")]
    pub company_id: String,
    pub timestamp: DateTime<Utc>,
    pub data: Json,
    pub metadata: Json,
}

impl WebhookEnvelope {
    pub fn new(event: WebhookEvent, company_id: impl Into<String>, data: Json) -> Self {
        Self {
            event: event.name().to_string(),
            company_id: company_id.into(),
            timestamp: Utc::now(),
            data,
            metadata: Json::Object(Default::default()),
        }
    }

    pub fn with_metadata(mut self, metadata: Json) -> Self {
        self.metadata = metadata;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn envelope_serializes_with_expected_field_names() {
        let envelope = WebhookEnvelope::new(WebhookEvent::ConversationCreated, "C1", json!({"a": 1}));
        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(value["event"], "conversation.created");
        assert_eq!(value["companyId"], "C1");
        assert!(value["timestamp"].is_string());
    }

    #[test]
    fn fixed_paths_match_the_event_table() {
        assert_eq!(
            WebhookEvent::ConversationCreated.default_path(),
            Some("/api/webhooks/ai/conversation")
        );
        assert_eq!(WebhookEvent::AiResponseCompleted.default_path(), Some("/api/ai/response"));
        assert_eq!(WebhookEvent::FileUploaded.default_path(), None);
    }
}
