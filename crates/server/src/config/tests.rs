use axum::http::StatusCode;
use chrono::TimeDelta;

use super::*;

#[test]
fn empty_config_uses_defaults() {
    let config: WicketConfig = toml::from_str("").unwrap();
    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.server.port, 8080);
    assert_eq!(config.server.shutdown_timeout_seconds, 30);
    assert_eq!(config.tokens.ttl_seconds, 300);
    assert!(config.tokens.signing_secret.is_none());
    assert!(config.tokens.signing_keys.is_none());
    assert_eq!(config.download.missing_blob_id_status, 400);
    assert_eq!(config.sessions.backend, "static");
    assert!(config.sessions.credentials.is_empty());
    assert!(config.blobs.directory.is_none());
}

#[test]
fn full_config() {
    let toml = r#"
        [server]
        host = "0.0.0.0"
        port = 9000

        [tokens]
        ttl_seconds = 60

        [[tokens.signing_keys]]
        id = "k2"
        secret = "2222222222222222222222222222222222222222222222222222222222222222"

        [[tokens.signing_keys]]
        id = "k1"
        secret = "1111111111111111111111111111111111111111111111111111111111111111"

        [download]
        missing_blob_id_status = 404

        [sessions]
        backend = "static"

        [[sessions.credentials]]
        user = "alice@example.com"
        credential_hash = "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"

        [blobs]
        directory = "/var/lib/wicket/blobs"
    "#;

    let config: WicketConfig = toml::from_str(toml).unwrap();
    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.server.port, 9000);
    assert_eq!(config.tokens.ttl().unwrap(), TimeDelta::seconds(60));
    assert_eq!(
        config.download.missing_blob_id_status().unwrap(),
        StatusCode::NOT_FOUND
    );
    assert_eq!(config.sessions.credentials.len(), 1);
    assert_eq!(config.sessions.credentials[0].user, "alice@example.com");
    assert_eq!(
        config.blobs.directory.as_deref(),
        Some("/var/lib/wicket/blobs")
    );

    let (keys, generated) = config.tokens.key_set(None).unwrap();
    assert!(!generated);
    assert_eq!(keys.current().kid(), "k2");
    assert!(keys.all().iter().any(|k| k.kid() == "k1"));
}

#[test]
fn missing_blob_id_status_is_validated() {
    let config: DownloadConfig = toml::from_str("missing_blob_id_status = 500").unwrap();
    assert!(config.missing_blob_id_status().is_err());
    let config: DownloadConfig = toml::from_str("").unwrap();
    assert_eq!(
        config.missing_blob_id_status().unwrap(),
        StatusCode::BAD_REQUEST
    );
}

#[test]
fn signing_key_precedence() {
    let toml = r#"
        signing_secret = "00112233445566778899aabbccddeeff"

        [[signing_keys]]
        id = "k1"
        secret = "ffeeddccbbaa99887766554433221100"
    "#;
    let config: TokensConfig = toml::from_str(toml).unwrap();

    let (keys, _) = config.key_set(None).unwrap();
    assert_eq!(keys.current().kid(), "k1");

    let (keys, generated) = config
        .key_set(Some("0123456789abcdef0123456789abcdef"))
        .unwrap();
    assert!(!generated);
    assert_eq!(keys.current().kid(), "env");
    assert_eq!(keys.all().len(), 1);
}

#[test]
fn single_secret_uses_k0() {
    let config: TokensConfig =
        toml::from_str(r#"signing_secret = "00112233445566778899aabbccddeeff""#).unwrap();
    let (keys, generated) = config.key_set(None).unwrap();
    assert!(!generated);
    assert_eq!(keys.current().kid(), "k0");
}

#[test]
fn no_secret_generates_key() {
    let config = TokensConfig::default();
    let (keys, generated) = config.key_set(None).unwrap();
    assert!(generated);
    assert_eq!(keys.all().len(), 1);
}

#[test]
fn invalid_secret_rejected() {
    let config: TokensConfig = toml::from_str(r#"signing_secret = "short""#).unwrap();
    assert!(config.key_set(None).is_err());
}

#[test]
fn ttl_out_of_range_rejected() {
    let config: TokensConfig = toml::from_str("ttl_seconds = 0").unwrap();
    assert!(config.codec(None).is_err());

    let config: TokensConfig = toml::from_str("ttl_seconds = 604800").unwrap();
    assert!(config.codec(None).is_err());

    let config = TokensConfig {
        ttl_seconds: u64::MAX,
        ..TokensConfig::default()
    };
    assert!(config.ttl().is_err());
}

#[test]
fn jwt_sessions() {
    let toml = r#"
        backend = "jwt"
        jwt_secret = "session-secret"
    "#;
    let config: SessionsConfig = toml::from_str(toml).unwrap();
    assert_eq!(config.backend, "jwt");
    assert_eq!(config.jwt_secret.as_deref(), Some("session-secret"));
}
