//! Client address resolution behind reverse proxies.

use std::net::IpAddr;

use http::HeaderMap;

const FORWARDED_FOR: &str = "x-forwarded-for";
const REAL_IP: &str = "x-real-ip";

/// Best-effort client IP: first `X-Forwarded-For` hop, then `X-Real-IP`,
/// then the socket peer.
///
/// Only meaningful for logging. Headers are client-controlled.
pub fn extract_client_ip(headers: &HeaderMap, peer: Option<IpAddr>) -> Option<IpAddr> {
    let header_ip = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .and_then(|v| v.trim().parse::<IpAddr>().ok())
    };

    header_ip(FORWARDED_FOR)
        .or_else(|| header_ip(REAL_IP))
        .or(peer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    #[test]
    fn test_prefers_first_forwarded_hop() {
        let mut headers = HeaderMap::new();
        headers.insert(FORWARDED_FOR, HeaderValue::from_static("203.0.113.7, 10.0.0.1"));
        headers.insert(REAL_IP, HeaderValue::from_static("198.51.100.2"));
        assert_eq!(
            extract_client_ip(&headers, None),
            Some("203.0.113.7".parse().unwrap())
        );
    }

    #[test]
    fn test_falls_back_to_real_ip() {
        let mut headers = HeaderMap::new();
        headers.insert(FORWARDED_FOR, HeaderValue::from_static("garbage"));
        headers.insert(REAL_IP, HeaderValue::from_static("198.51.100.2"));
        assert_eq!(
            extract_client_ip(&headers, None),
            Some("198.51.100.2".parse().unwrap())
        );
    }

    #[test]
    fn test_falls_back_to_peer() {
        let peer: IpAddr = "127.0.0.1".parse().unwrap();
        assert_eq!(extract_client_ip(&HeaderMap::new(), Some(peer)), Some(peer));
        assert_eq!(extract_client_ip(&HeaderMap::new(), None), None);
    }
}
