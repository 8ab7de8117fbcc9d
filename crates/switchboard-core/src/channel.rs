//! Channel identity and the inbound chat request shape (spec §3 Channel Request).

use serde::{Deserialize, Serialize};

use crate::error::SwitchboardError;
use crate::ids::generate_message_id;

/// The six delivery channels a chat turn can arrive on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Channel {
    Messenger,
    Instagram,
    Whatsapp,
    Zalo,
    ChatPlugin,
    Chatdemo,
}

impl Channel {
    pub fn parse(raw: &str) -> Result<Self, SwitchboardError> {
        match raw {
            "messenger" => Ok(Self::Messenger),
            "instagram" => Ok(Self::Instagram),
            "whatsapp" => Ok(Self::Whatsapp),
            "zalo" => Ok(Self::Zalo),
            "chat-plugin" => Ok(Self::ChatPlugin),
            "chatdemo" => Ok(Self::Chatdemo),
            other => Err(SwitchboardError::InvalidChannel(other.to_string())),
        }
    }

    /// `user_info.source` is always overwritten from the channel (spec §3 Derived).
    pub fn source(self) -> &'static str {
        match self {
            Self::Messenger => "facebook_messenger",
            Self::Instagram => "instagram",
            Self::Whatsapp => "whatsapp",
            Self::Zalo => "zalo",
            Self::ChatPlugin => "chat_plugin",
            Self::Chatdemo => "web_device",
        }
    }

    /// Backend channels buffer the full response and POST it to the tenant backend.
    pub fn is_backend(self) -> bool {
        matches!(
            self,
            Self::Messenger | Self::Instagram | Self::Whatsapp | Self::Zalo
        )
    }

    /// Frontend channels stream tokens directly to the caller.
    pub fn is_frontend(self) -> bool {
        !self.is_backend()
    }

    /// Only `chat-plugin` is subject to the dynamic CORS check (§4.6).
    pub fn requires_cors_check(self) -> bool {
        matches!(self, Self::ChatPlugin)
    }
}

/// End-user identity attached to a chat request. `source` is always derived
/// from `channel`; whatever the caller sent there is discarded.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserInfo {
    pub user_id: Option<String>,
    pub device_id: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
}

/// Inbound request to the chat engine (spec §3 Channel Request).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelRequest {
    pub message: String,
    pub company_id: String,
    pub channel: String,
    pub message_id: Option<String>,
    pub session_id: Option<String>,
    #[serde(default)]
    pub user_info: UserInfo,
    pub lead_source: Option<String>,
    pub plugin_id: Option<String>,
    pub customer_domain: Option<String>,
    pub language: Option<String>,
    pub industry: Option<String>,
}

impl ChannelRequest {
    /// Normalizes the request per spec §4.1 steps 1–3: generates `message_id`
    /// if absent, resolves `Channel`, and overwrites `user_info.source`.
    /// Does not enforce the per-channel required-field / CORS checks —
    /// those depend on state the caller must supply (the `Origin` header,
    /// the plugin's allowed domains) and live in the gateway layer.
    pub fn normalize(&mut self) -> Result<Channel, SwitchboardError> {
        let channel = Channel::parse(&self.channel)?;

        if self.message_id.as_deref().map(str::is_empty).unwrap_or(true) {
            self.message_id = Some(generate_message_id());
        }

        self.user_info.source = Some(channel.source().to_string());

        if channel.is_backend() && self.user_info.user_id.as_deref().unwrap_or("").is_empty() {
            return Err(SwitchboardError::MissingRequiredField(
                "user_info.user_id".to_string(),
            ));
        }

        if channel.requires_cors_check() && self.plugin_id.as_deref().unwrap_or("").is_empty() {
            return Err(SwitchboardError::MissingRequiredField("plugin_id".to_string()));
        }

        Ok(channel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_request(channel: &str) -> ChannelRequest {
        ChannelRequest {
            message: "hi".into(),
            company_id: "C1".into(),
            channel: channel.into(),
            message_id: None,
            session_id: None,
            user_info: UserInfo::default(),
            lead_source: None,
            plugin_id: None,
            customer_domain: None,
            language: None,
            industry: None,
        }
    }

    #[test]
    fn unknown_channel_is_rejected() {
        let mut req = base_request("tiktok");
        let err = req.normalize().unwrap_err();
        assert_eq!(err.code(), "INVALID_CHANNEL");
    }

    #[test]
    fn message_id_is_generated_when_absent() {
        let mut req = base_request("chatdemo");
        req.normalize().unwrap();
        let id = req.message_id.unwrap();
        assert!(id.starts_with("msg_"));
        let parts: Vec<&str> = id.trim_start_matches("msg_").splitn(2, '_').collect();
        assert_eq!(parts.len(), 2);
        assert!(parts[0].chars().all(|c| c.is_ascii_digit()));
        assert_eq!(parts[1].len(), 8);
    }

    #[test]
    fn source_is_always_overwritten_from_channel() {
        let mut req = base_request("chatdemo");
        req.user_info.source = Some("whatever-the-caller-sent".into());
        req.normalize().unwrap();
        assert_eq!(req.user_info.source.as_deref(), Some("web_device"));
    }

    #[test]
    fn backend_channel_requires_user_id() {
        let mut req = base_request("messenger");
        let err = req.normalize().unwrap_err();
        assert_eq!(err.code(), "MISSING_REQUIRED_FIELD");

        let mut req2 = base_request("messenger");
        req2.user_info.user_id = Some("FB1".into());
        let channel = req2.normalize().unwrap();
        assert_eq!(channel, Channel::Messenger);
        assert_eq!(req2.user_info.source.as_deref(), Some("facebook_messenger"));
    }

    #[test]
    fn chat_plugin_requires_plugin_id() {
        let mut req = base_request("chat-plugin");
        let err = req.normalize().unwrap_err();
        assert_eq!(err.code(), "MISSING_REQUIRED_FIELD");
    }
}
