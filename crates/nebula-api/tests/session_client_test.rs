#![allow(clippy::unwrap_used)]
// Integration tests for `SessionClient` using wiremock.

use bytes::Bytes;
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_json, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use nebula_api::{Error, ErrorKind, GravitySelector, ImportSelector, SessionClient, USER_AGENT};

// ── Helpers ─────────────────────────────────────────────────────────

const PASSWORD: &str = "test";
const SID: &str = "n9n9f6c3umrumfq2ese1lvu2pg";

async fn setup() -> (MockServer, SessionClient) {
    let server = MockServer::start().await;
    let appliance = format!("{}|{PASSWORD}", server.uri()).parse().unwrap();
    let client = SessionClient::with_client(reqwest::Client::new(), appliance);
    (server, client)
}

fn auth_body(valid: bool) -> serde_json::Value {
    json!({
        "session": {
            "valid": valid,
            "totp": false,
            "sid": if valid { json!(SID) } else { json!(null) },
            "csrf": if valid { json!("Ux87YTIiMOf/GKCefVIOMw=") } else { json!(null) },
            "validity": if valid { 300 } else { -1 },
            "message": if valid { "correct password" } else { "password incorrect" }
        }
    })
}

async fn mount_login(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/api/auth"))
        .and(body_json(json!({ "password": PASSWORD })))
        .and(header("user-agent", USER_AGENT))
        .respond_with(ResponseTemplate::new(200).set_body_json(auth_body(true)))
        .mount(server)
        .await;
}

async fn authenticated() -> (MockServer, SessionClient) {
    let (server, client) = setup().await;
    mount_login(&server).await;
    client.authenticate().await.unwrap();
    (server, client)
}

// ── Authentication ──────────────────────────────────────────────────

#[tokio::test]
async fn test_authenticate_success() {
    let (_server, client) = authenticated().await;

    assert!(client.is_authenticated());
    assert_eq!(client.session_validity(), Some(300));
    assert_eq!(client.csrf_token().as_deref(), Some("Ux87YTIiMOf/GKCefVIOMw="));
}

#[tokio::test]
async fn test_authenticate_invalid_session() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/auth"))
        .respond_with(ResponseTemplate::new(200).set_body_json(auth_body(false)))
        .mount(&server)
        .await;

    let result = client.authenticate().await;

    match result {
        Err(Error::Authentication { ref message, .. }) => {
            assert!(message.contains("password incorrect"), "got: {message}");
        }
        other => panic!("expected Authentication error, got: {other:?}"),
    }
    assert!(!client.is_authenticated());
}

#[tokio::test]
async fn test_authenticate_http_error() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/auth"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = client.authenticate().await.unwrap_err();

    assert!(matches!(err, Error::Status { status: 401, .. }), "got: {err:?}");
    assert!(err.to_string().contains(&server.uri()));
    assert!(!client.is_authenticated());
}

#[tokio::test]
async fn test_authenticate_malformed_body() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/auth"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&server)
        .await;

    let err = client.authenticate().await.unwrap_err();

    assert!(matches!(err, Error::Deserialization { .. }), "got: {err:?}");
    assert_eq!(err.kind(), ErrorKind::Protocol);
}

#[tokio::test]
async fn test_failed_reauth_drops_previous_session() {
    let (server, client) = authenticated().await;
    server.reset().await;

    Mock::given(method("POST"))
        .and(path("/api/auth"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    assert!(client.authenticate().await.is_err());
    assert!(!client.is_authenticated());
}

#[tokio::test]
async fn test_transport_error() {
    let client = SessionClient::with_client(
        reqwest::Client::new(),
        "http://127.0.0.1:9|pw".parse().unwrap(),
    );

    let err = client.authenticate().await.unwrap_err();

    assert!(matches!(err, Error::Transport { .. }), "got: {err:?}");
    assert!(err.is_retryable());
}

// ── Session guard ───────────────────────────────────────────────────

#[tokio::test]
async fn test_operations_require_session() {
    let (server, client) = setup().await;

    // Any request reaching the server fails the test on drop.
    Mock::given(wiremock::matchers::any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let bundle = Bytes::from_static(b"zip");
    let errors = vec![
        client.export_bundle().await.unwrap_err(),
        client.import_bundle(&bundle, None).await.unwrap_err(),
        client.read_config().await.unwrap_err(),
        client.patch_config(&serde_json::Map::new()).await.unwrap_err(),
        client.trigger_rebuild().await.unwrap_err(),
    ];

    for err in errors {
        assert!(matches!(err, Error::NoSession { .. }), "got: {err:?}");
        assert!(!err.is_retryable());
    }
}

// ── Delete session ──────────────────────────────────────────────────

#[tokio::test]
async fn test_delete_session_without_login_is_noop() {
    let (server, client) = setup().await;

    Mock::given(wiremock::matchers::any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    client.delete_session().await.unwrap();
}

#[tokio::test]
async fn test_delete_session() {
    let (server, client) = authenticated().await;

    Mock::given(method("DELETE"))
        .and(path("/api/auth"))
        .and(header("sid", SID))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client.delete_session().await.unwrap();
    assert!(!client.is_authenticated());

    // Second teardown has nothing left to delete.
    client.delete_session().await.unwrap();
}

#[tokio::test]
async fn test_delete_session_failure_propagates() {
    let (server, client) = authenticated().await;

    Mock::given(method("DELETE"))
        .and(path("/api/auth"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = client.delete_session().await.unwrap_err();
    assert!(matches!(err, Error::Status { status: 500, .. }), "got: {err:?}");
}

// ── Teleporter ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_export_bundle() {
    let (server, client) = authenticated().await;

    Mock::given(method("GET"))
        .and(path("/api/teleporter"))
        .and(header("sid", SID))
        .and(header("user-agent", USER_AGENT))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"PK\x03\x04bundle".to_vec()))
        .mount(&server)
        .await;

    let bundle = client.export_bundle().await.unwrap();
    assert_eq!(&bundle[..], b"PK\x03\x04bundle");
}

#[tokio::test]
async fn test_import_bundle_with_selector() {
    let (server, client) = authenticated().await;

    Mock::given(method("POST"))
        .and(path("/api/teleporter"))
        .and(header("sid", SID))
        .and(body_string_contains("filename=\"config.zip\""))
        .and(body_string_contains("name=\"import\""))
        .and(body_string_contains("\"dhcp_leases\":true"))
        .and(body_string_contains("\"adlist\":true"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let selector = ImportSelector {
        config: false,
        dhcp_leases: true,
        gravity: GravitySelector {
            adlist: true,
            ..GravitySelector::default()
        },
    };
    client
        .import_bundle(&Bytes::from_static(b"PK\x03\x04bundle"), Some(&selector))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_import_bundle_rejected() {
    let (server, client) = authenticated().await;

    Mock::given(method("POST"))
        .and(path("/api/teleporter"))
        .respond_with(ResponseTemplate::new(400))
        .mount(&server)
        .await;

    let err = client
        .import_bundle(&Bytes::from_static(b"bogus"), None)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Status { status: 400, .. }), "got: {err:?}");
    assert!(err.to_string().contains("/api/teleporter"));
}

// ── Config ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_read_config() {
    let (server, client) = authenticated().await;

    Mock::given(method("GET"))
        .and(path("/api/config"))
        .and(header("sid", SID))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "config": {
                "dns": { "cache": { "size": 10000 }, "interface": "eth0" },
                "ntp": { "ipv4": { "active": true } }
            },
            "took": 0.003
        })))
        .mount(&server)
        .await;

    let config = client.read_config().await.unwrap();

    assert_eq!(config.len(), 2);
    assert_eq!(config["dns"]["interface"], json!("eth0"));
    assert_eq!(config["ntp"]["ipv4"]["active"], json!(true));
}

#[tokio::test]
async fn test_patch_config() {
    let (server, client) = authenticated().await;

    Mock::given(method("PATCH"))
        .and(path("/api/config"))
        .and(header("sid", SID))
        .and(body_json(json!({ "config": { "dns": { "interface": "eth0" } } })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "config": {} })))
        .expect(1)
        .mount(&server)
        .await;

    let partial = json!({ "dns": { "interface": "eth0" } });
    client
        .patch_config(partial.as_object().unwrap())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_trigger_rebuild() {
    let (server, client) = authenticated().await;

    Mock::given(method("POST"))
        .and(path("/api/action/gravity"))
        .and(header("sid", SID))
        .respond_with(ResponseTemplate::new(200).set_body_string("gravity output"))
        .expect(1)
        .mount(&server)
        .await;

    client.trigger_rebuild().await.unwrap();
}
