//! Constant-time shared-secret comparison for internal/service-to-service
//! auth (`X-Internal-Key`, `X-Webhook-Secret`). Timing-safe comparison
//! matters here because these are bearer-style shared secrets checked on
//! every request, not a one-off password hash.

use subtle::ConstantTimeEq;

/// Returns `true` iff `provided` equals `expected`, in constant time with
/// respect to the byte content (length is still observable, which is fine:
/// secret lengths are not secret).
pub fn secrets_match(provided: &str, expected: &str) -> bool {
    if provided.len() != expected.len() {
        return false;
    }
    provided.as_bytes().ct_eq(expected.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_secrets_match() {
        assert!(secrets_match("shh-its-a-secret", "shh-its-a-secret"));
    }

    #[test]
    fn differing_secrets_do_not_match() {
        assert!(!secrets_match("shh-its-a-secret", "not-the-secret"));
    }

    #[test]
    fn differing_lengths_do_not_match() {
        assert!(!secrets_match("short", "a-much-longer-value"));
    }
}
