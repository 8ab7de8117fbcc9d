//! Composite session key canonicalization (spec §4.7).

use serde::{Deserialize, Serialize};
use switchboard_core::ids::{fallback_device_id, fallback_session_id, fallback_user_id};

/// Raw request attributes used to derive fallback key components.
#[derive(Debug, Clone, Default)]
pub struct KeyAttributes<'a> {
    pub user_agent: &'a str,
    pub accept_language: &'a str,
    pub platform: &'a str,
}

/// Canonical, stable identity of a conversation, after fallback resolution.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionKey {
    pub company_id: String,
    pub user_id: String,
    pub device_id: String,
    pub session_id: String,
}

impl SessionKey {
    /// Resolves a composite key, substituting deterministic fallbacks for
    /// any absent component: user_id ← `anon_<device_id[:8]>`, device_id ←
    /// hash of (user-agent, accept-language, platform), session_id ←
    /// `chat_session_<company_id>_<device_id>`.
    pub fn resolve(
        company_id: &str,
        user_id: Option<&str>,
        device_id: Option<&str>,
        session_id: Option<&str>,
        attrs: &KeyAttributes<'_>,
    ) -> Self {
        let device_id = match device_id {
            Some(d) if !d.is_empty() => d.to_string(),
            _ => fallback_device_id(attrs.user_agent, attrs.accept_language, attrs.platform),
        };

        let user_id = match user_id {
            Some(u) if !u.is_empty() => u.to_string(),
            _ => fallback_user_id(&device_id),
        };

        let session_id = match session_id {
            Some(s) if !s.is_empty() => s.to_string(),
            _ => fallback_session_id(company_id, &device_id),
        };

        Self {
            company_id: company_id.to_string(),
            user_id,
            device_id,
            session_id,
        }
    }

    /// A single string suitable as a cache key.
    pub fn as_cache_key(&self) -> String {
        format!(
            "{}::{}::{}::{}",
            self.company_id, self.user_id, self.device_id, self.session_id
        )
    }
}
