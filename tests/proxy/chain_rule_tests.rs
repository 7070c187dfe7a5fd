//! Tests for chain-rule encoding and decoding

use proxylink::core::proxy::chain_rule::{decode, encode, ChainRuleError, DIRECT_RULE};
use proxylink::{ChainConfig, ProxyEndpoint, ProxyProtocol};

fn local() -> ProxyEndpoint {
    ProxyEndpoint::new("127.0.0.1", 7890, ProxyProtocol::Http)
}

fn chained() -> ProxyEndpoint {
    ProxyEndpoint::new("proxy.example.com", 1080, ProxyProtocol::Socks5)
}

#[test]
fn encode_joins_two_hops_with_semicolon() {
    assert_eq!(
        encode(&local(), Some(&chained())),
        "http://127.0.0.1:7890;socks5://proxy.example.com:1080"
    );
}

#[test]
fn encode_returns_local_url_when_chained_absent_or_incomplete() {
    assert_eq!(encode(&local(), None), "http://127.0.0.1:7890");

    let incomplete = ProxyEndpoint::new("proxy.example.com", 0, ProxyProtocol::Socks5);
    assert_eq!(encode(&local(), Some(&incomplete)), "http://127.0.0.1:7890");
}

#[test]
fn encode_returns_direct_for_invalid_local() {
    let incomplete = ProxyEndpoint::new("", 7890, ProxyProtocol::Http);
    assert_eq!(encode(&incomplete, None), DIRECT_RULE);
    assert_eq!(encode(&incomplete, Some(&chained())), DIRECT_RULE);

    let no_port = ProxyEndpoint::new("127.0.0.1", 0, ProxyProtocol::Http);
    assert_eq!(encode(&no_port, Some(&chained())), DIRECT_RULE);
}

#[test]
fn decode_direct_yields_no_endpoints() {
    for rule in ["direct", "DIRECT", " direct ", ""] {
        let decoded = decode(rule).expect("direct must decode");
        assert!(decoded.local.is_none());
        assert!(decoded.chained.is_none());
    }
}

#[test]
fn decode_single_url_yields_local_only() {
    let decoded = decode("http://127.0.0.1:7890").unwrap();
    assert_eq!(decoded.local, Some(local()));
    assert!(decoded.chained.is_none());
}

#[test]
fn round_trip_recovers_both_hops_field_for_field() {
    let rule = encode(&local(), Some(&chained()));
    let decoded = decode(&rule).unwrap();
    assert_eq!(decoded.local, Some(local()));
    assert_eq!(decoded.chained, Some(chained()));
}

#[test]
fn round_trip_preserves_percent_encoded_credentials() {
    let with_creds = ProxyEndpoint::new("127.0.0.1", 7890, ProxyProtocol::Http)
        .with_credentials("user@name", "p:ss w0rd");
    let upstream = ProxyEndpoint::new("up.example.net", 8443, ProxyProtocol::Https)
        .with_credentials("up", "secret");

    let rule = encode(&with_creds, Some(&upstream));
    let decoded = decode(&rule).unwrap();
    assert_eq!(decoded.local, Some(with_creds));
    assert_eq!(decoded.chained, Some(upstream));
}

#[test]
fn round_trip_survives_scheme_default_ports() {
    let https_default = ProxyEndpoint::new("up.example.net", 443, ProxyProtocol::Https);
    let rule = encode(&local(), Some(&https_default));
    let decoded = decode(&rule).unwrap();
    assert_eq!(decoded.chained, Some(https_default));
}

#[test]
fn decode_rejects_unsupported_schemes() {
    assert!(matches!(
        decode("ftp://127.0.0.1:21"),
        Err(ChainRuleError::UnsupportedScheme(_))
    ));
}

#[test]
fn decode_rejects_socks_url_without_port() {
    assert!(matches!(
        decode("socks5://proxy.example.com"),
        Err(ChainRuleError::MissingPort)
    ));
}

#[test]
fn chain_config_rule_matches_encode() {
    let config = ChainConfig {
        local: local(),
        chained: Some(chained()),
    };
    assert_eq!(config.rule(), encode(&local(), Some(&chained())));

    let single = ChainConfig {
        local: local(),
        chained: None,
    };
    assert_eq!(single.rule(), "http://127.0.0.1:7890");
}
