//! The SSE event grammar for frontend channels (spec §6.3).

use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ChatEvent {
    Language { language: String },
    Intent { intent: String, confidence: f64 },
    Content {
        #[serde(skip_serializing_if = "Option::is_none")]
        content: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        delta: Option<String>,
    },
    Done,
    Error { error: String },
}

impl ChatEvent {
    pub fn content_delta(delta: impl Into<String>) -> Self {
        Self::Content {
            content: None,
            delta: Some(delta.into()),
        }
    }

    pub fn content_replace(content: impl Into<String>) -> Self {
        Self::Content {
            content: Some(content.into()),
            delta: None,
        }
    }

    /// Renders one `data: <json>\n\n` line.
    pub fn to_sse_data(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| r#"{"type":"error","error":"serialization failed"}"#.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_delta_serializes_without_the_content_key() {
        let event = ChatEvent::content_delta("hi");
        let json = event.to_sse_data();
        assert!(json.contains(r#""delta":"hi""#));
        assert!(!json.contains("\"content\""));
    }

    #[test]
    fn language_event_matches_the_wire_shape() {
        let event = ChatEvent::Language { language: "en".to_string() };
        assert_eq!(event.to_sse_data(), r#"{"type":"language","language":"en"}"#);
    }

    #[test]
    fn done_event_has_no_extra_fields() {
        assert_eq!(ChatEvent::Done.to_sse_data(), r#"{"type":"done"}"#);
    }
}
