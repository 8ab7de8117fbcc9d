//! Origin matching: case-insensitive host, exact scheme, no wildcard.

/// Checks `origin` (e.g. `https://Shop.Example.com`) against `allowed_domains`
/// (e.g. `["https://shop.example.com"]`). Matching is scheme-exact and
/// host-case-insensitive; port, if present, must match exactly too.
pub fn origin_is_allowed(origin: &str, allowed_domains: &[String]) -> bool {
    let Some(parsed) = split_origin(origin) else {
        return false;
    };

    allowed_domains.iter().any(|candidate| {
        split_origin(candidate)
            .map(|allowed| allowed.scheme == parsed.scheme && allowed.host.eq_ignore_ascii_case(&parsed.host) && allowed.port == parsed.port)
            .unwrap_or(false)
    })
}

struct ParsedOrigin<'a> {
    scheme: &'a str,
    host: String,
    port: Option<&'a str>,
}

fn split_origin(origin: &str) -> Option<ParsedOrigin<'_>> {
    let (scheme, rest) = origin.split_once("://")?;
    if rest.is_empty() {
        return None;
    }
    let (host_port, _path) = rest.split_once('/').unwrap_or((rest, ""));
    let (host, port) = match host_port.rsplit_once(':') {
        Some((h, p)) if p.chars().all(|c| c.is_ascii_digit()) && !p.is_empty() => (h, Some(p)),
        _ => (host_port, None),
    };

    Some(ParsedOrigin {
        scheme,
        host: host.to_string(),
        port,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_match_is_allowed() {
        let allowed = vec!["https://shop.example.com".to_string()];
        assert!(origin_is_allowed("https://shop.example.com", &allowed));
    }

    #[test]
    fn host_comparison_is_case_insensitive() {
        let allowed = vec!["https://shop.example.com".to_string()];
        assert!(origin_is_allowed("https://Shop.Example.COM", &allowed));
    }

    #[test]
    fn scheme_mismatch_is_rejected() {
        let allowed = vec!["https://shop.example.com".to_string()];
        assert!(!origin_is_allowed("http://shop.example.com", &allowed));
    }

    #[test]
    fn non_member_origin_is_rejected() {
        let allowed = vec!["https://shop.example.com".to_string()];
        assert!(!origin_is_allowed("https://evil.example.com", &allowed));
    }

    #[test]
    fn port_must_match_when_present() {
        let allowed = vec!["https://shop.example.com:8443".to_string()];
        assert!(origin_is_allowed("https://shop.example.com:8443", &allowed));
        assert!(!origin_is_allowed("https://shop.example.com", &allowed));
    }

    #[test]
    fn malformed_origin_is_rejected() {
        let allowed = vec!["https://shop.example.com".to_string()];
        assert!(!origin_is_allowed("not-a-url", &allowed));
    }
}
