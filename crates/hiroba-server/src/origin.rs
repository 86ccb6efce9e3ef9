//! Resolves the client address of a request into an [`OriginToken`].

use std::net::{IpAddr, SocketAddr};

use axum::http::HeaderMap;
use hiroba_core::origin::OriginToken;

const FORWARDED_FOR: &str = "x-forwarded-for";

/// The client address: the first `X-Forwarded-For` hop when the proxy is
/// trusted, otherwise the peer socket address.
pub fn client_ip(
  headers:             &HeaderMap,
  peer:                Option<SocketAddr>,
  trust_forwarded_for: bool,
) -> Option<IpAddr> {
  let forwarded = trust_forwarded_for
    .then(|| headers.get(FORWARDED_FOR))
    .flatten()
    .and_then(|v| v.to_str().ok())
    .and_then(|v| v.split(',').next())
    .and_then(|first| first.trim().parse::<IpAddr>().ok());

  forwarded
    .or_else(|| peer.map(|p| p.ip()))
    .map(|ip| ip.to_canonical())
}

pub fn resolve(
  headers:             &HeaderMap,
  peer:                Option<SocketAddr>,
  trust_forwarded_for: bool,
) -> OriginToken {
  match client_ip(headers, peer, trust_forwarded_for) {
    Some(ip) => OriginToken::anonymize(&ip.to_string()),
    None => OriginToken::unknown(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use axum::http::HeaderValue;

  fn forwarded(value: &'static str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(FORWARDED_FOR, HeaderValue::from_static(value));
    headers
  }

  fn peer(addr: &str) -> Option<SocketAddr> { Some(addr.parse().unwrap()) }

  #[test]
  fn peer_address_is_used_by_default() {
    let token = resolve(&forwarded("198.51.100.7"), peer("192.0.2.10:5123"), false);
    assert_eq!(token.as_str(), "2.10");
  }

  #[test]
  fn trusted_proxy_uses_first_hop() {
    let token = resolve(
      &forwarded("198.51.100.7, 10.0.0.1"),
      peer("10.0.0.1:443"),
      true,
    );
    assert_eq!(token.as_str(), "100.7");
  }

  #[test]
  fn trusted_proxy_without_header_falls_back_to_peer() {
    let token = resolve(&HeaderMap::new(), peer("192.0.2.10:5123"), true);
    assert_eq!(token.as_str(), "2.10");
  }

  #[test]
  fn mapped_ipv6_is_canonicalised() {
    let token = resolve(&HeaderMap::new(), peer("[::ffff:203.0.113.45]:80"), false);
    assert_eq!(token.as_str(), "113.45");
  }

  #[test]
  fn plain_ipv6_and_missing_peer_are_unknown() {
    assert_eq!(resolve(&HeaderMap::new(), peer("[2001:db8::1]:80"), false).as_str(), "XX.XX");
    assert_eq!(resolve(&HeaderMap::new(), None, false).as_str(), "XX.XX");
  }
}
