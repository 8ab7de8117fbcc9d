//! Id generation and stable hashing: blake3-based content hashing,
//! truncated to 64 bits for indexing.

use rand::Rng;
use std::time::{SystemTime, UNIX_EPOCH};

const RAND_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Generates `msg_<unix_ms>_<rand8>` (spec §3 Channel Request, §8 boundary test).
pub fn generate_message_id() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    format!("msg_{}_{}", millis, random_alnum(8))
}

/// Generates an 8-character alphanumeric suffix.
pub fn random_alnum(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| RAND_ALPHABET[rng.gen_range(0..RAND_ALPHABET.len())] as char)
        .collect()
}

/// Truncates a BLAKE3 digest to 64 bits: adequate collision resistance for
/// indexing/dedup keys, never for security.
#[inline]
pub fn hash_to_u64(data: &[u8]) -> u64 {
    let hash = blake3::hash(data);
    let bytes: [u8; 8] = hash.as_bytes()[0..8]
        .try_into()
        .expect("BLAKE3 always produces at least 8 bytes");
    u64::from_le_bytes(bytes)
}

/// Stable 64-bit tenant hash used to scope cache/session keys without
/// leaking the raw `company_id` into logs or storage keys.
#[inline]
pub fn hash_tenant_id(company_id: &str) -> u64 {
    hash_to_u64(company_id.as_bytes())
}

/// Deterministic point id for a vector-store upsert, derived from the
/// tenant and a content fingerprint.
pub fn generate_point_id(tenant_hash: u64, content_hash: u64) -> u64 {
    tenant_hash
        .wrapping_mul(0x517cc1b727220a95)
        .wrapping_add(content_hash)
}

/// Canonical session key fallbacks (spec §4.7).
pub fn fallback_user_id(device_id: &str) -> String {
    let truncated: String = device_id.chars().take(8).collect();
    format!("anon_{}", truncated)
}

pub fn fallback_device_id(user_agent: &str, accept_language: &str, platform: &str) -> String {
    let mut buf = String::with_capacity(user_agent.len() + accept_language.len() + platform.len() + 2);
    buf.push_str(user_agent);
    buf.push('|');
    buf.push_str(accept_language);
    buf.push('|');
    buf.push_str(platform);
    format!("dev_{:016x}", hash_to_u64(buf.as_bytes()))
}

pub fn fallback_session_id(company_id: &str, device_id: &str) -> String {
    format!("chat_session_{}_{}", company_id, device_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_id_matches_expected_pattern() {
        let id = generate_message_id();
        assert!(id.starts_with("msg_"));
        let rest = id.trim_start_matches("msg_");
        let mut parts = rest.splitn(2, '_');
        let millis = parts.next().unwrap();
        let rand_part = parts.next().unwrap();
        assert!(millis.chars().all(|c| c.is_ascii_digit()));
        assert_eq!(rand_part.len(), 8);
        assert!(rand_part.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn hash_to_u64_is_deterministic() {
        assert_eq!(hash_to_u64(b"company-1"), hash_to_u64(b"company-1"));
        assert_ne!(hash_to_u64(b"company-1"), hash_to_u64(b"company-2"));
    }

    #[test]
    fn point_id_is_deterministic_and_tenant_sensitive() {
        let a = generate_point_id(1, 100);
        let b = generate_point_id(1, 100);
        let c = generate_point_id(2, 100);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn fallback_user_id_uses_first_eight_chars_of_device() {
        assert_eq!(fallback_user_id("abcdefghijkl"), "anon_abcdefgh");
        assert_eq!(fallback_user_id("abc"), "anon_abc");
    }

    #[test]
    fn fallback_session_id_is_stable_per_company_and_device() {
        let s1 = fallback_session_id("C1", "dev_abc");
        let s2 = fallback_session_id("C1", "dev_abc");
        assert_eq!(s1, s2);
        assert_eq!(s1, "chat_session_C1_dev_abc");
    }
}
