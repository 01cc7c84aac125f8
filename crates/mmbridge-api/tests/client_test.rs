// Integration tests for `MirrorClient` using wiremock.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use pretty_assertions::assert_eq;
use secrecy::SecretString;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

use mmbridge_api::{Alert, Connection, Error, MirrorClient, SystemAction, TransportConfig};

// ── Helpers ─────────────────────────────────────────────────────────

const API_KEY: &str = "s3cret-key";

fn connection_for(server: &MockServer) -> Connection {
    let addr = server.address();
    Connection::new(
        addr.ip().to_string(),
        addr.port(),
        SecretString::from(API_KEY.to_string()),
    )
}

async fn setup() -> (MockServer, MirrorClient) {
    let server = MockServer::start().await;
    let client = MirrorClient::with_client(connection_for(&server), reqwest::Client::new()).unwrap();
    (server, client)
}

// ── Happy-path tests ────────────────────────────────────────────────

#[tokio::test]
async fn test_monitor_status_sends_bearer_token() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/monitor/status"))
        .and(header("authorization", "Bearer s3cret-key"))
        .and(header("accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "monitor": "on"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let resp = client.monitor_status().await.unwrap();
    assert!(resp.success);
    assert!(resp.is_on());
}

#[tokio::test]
async fn test_brightness_as_string() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/brightness"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "result": "45"
        })))
        .mount(&server)
        .await;

    let resp = client.brightness().await.unwrap();
    assert!(resp.success);
    assert_eq!(resp.result, 45);
}

#[tokio::test]
async fn test_set_brightness_path() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/brightness/80"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(1)
        .mount(&server)
        .await;

    assert!(client.set_brightness(80).await.unwrap().success);
}

#[tokio::test]
async fn test_list_modules() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/module"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": [
                { "name": "clock", "identifier": "module_0_clock", "hidden": false, "position": "top_left" },
                { "name": "weather", "identifier": "module_1_weather", "hidden": true },
            ]
        })))
        .mount(&server)
        .await;

    let resp = client.modules().await.unwrap();
    assert!(resp.success);
    assert_eq!(resp.data.len(), 2);
    assert_eq!(resp.data[0].name, "clock");
    assert_eq!(resp.data[0].position.as_deref(), Some("top_left"));
    assert!(!resp.data[0].hidden);
    assert!(resp.data[1].hidden);
}

#[tokio::test]
async fn test_update_available() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/updateAvailable"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "result": [
                { "module": "MMM-Remote-Control", "result": true, "remote": "https://github.com/Jopyth/MMM-Remote-Control" },
                { "module": "MMM-Weather", "result": false }
            ]
        })))
        .mount(&server)
        .await;

    let resp = client.update_available().await.unwrap();
    assert_eq!(resp.result.len(), 2);
    assert!(resp.result[0].result);
    assert_eq!(
        resp.result[0].remote.as_deref(),
        Some("https://github.com/Jopyth/MMM-Remote-Control")
    );
    assert!(resp.result[1].remote.is_none());
}

#[tokio::test]
async fn test_show_module_encodes_name() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/module/MMM-My%20Module/show"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(1)
        .mount(&server)
        .await;

    assert!(client.show_module("MMM-My Module").await.unwrap().success);
}

#[tokio::test]
async fn test_alert_query_parameters() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/module/alert/showalert"))
        .and(query_param("title", "Door & window"))
        .and(query_param("message", "Front door open"))
        .and(query_param("timer", "10"))
        .and(query_param("type", "notification"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(1)
        .mount(&server)
        .await;

    let alert = Alert::new("Door & window", "Front door open")
        .with_timer(Duration::from_secs(10))
        .as_notification(true);
    assert!(client.alert(&alert).await.unwrap().success);
}

#[tokio::test]
async fn test_alert_without_notification_omits_type() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/module/alert/showalert"))
        .and(query_param_is_missing("type"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(1)
        .mount(&server)
        .await;

    let alert = Alert::new("Hi", "there");
    assert!(client.alert(&alert).await.unwrap().success);
}

#[tokio::test]
async fn test_install_module_posts_url() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/install"))
        .and(body_json(json!({ "url": "https://github.com/example/MMM-Test" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "status": "installed"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let resp = client
        .install_module("https://github.com/example/MMM-Test")
        .await
        .unwrap();
    assert!(resp.success);
    assert_eq!(resp.extra.get("status"), Some(&json!("installed")));
}

#[tokio::test]
async fn test_system_action_fires_once() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/togglefullscreen"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(1)
        .mount(&server)
        .await;

    client.system(SystemAction::ToggleFullscreen).await;
}

// ── Status handling ─────────────────────────────────────────────────

#[tokio::test]
async fn test_forbidden_is_an_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/test"))
        .respond_with(ResponseTemplate::new(403))
        .expect(1)
        .mount(&server)
        .await;

    let err = client.api_test().await.unwrap_err();
    assert!(err.is_auth_failure());
    assert!(matches!(&err, Error::Forbidden { url } if url.ends_with("/api/test")));
}

#[tokio::test]
async fn test_non_200_is_absent_body() {
    for status in [204, 401, 404, 500, 503] {
        let (server, client) = setup().await;

        Mock::given(method("GET"))
            .and(path("/api/monitor/status"))
            .respond_with(ResponseTemplate::new(status))
            .mount(&server)
            .await;

        assert!(
            client.fetch("api/monitor/status").await.unwrap().is_none(),
            "status {status} should yield no body"
        );

        let resp = client.monitor_status().await.unwrap();
        assert!(!resp.success, "status {status}");
        assert!(resp.monitor.is_none());
    }
}

#[tokio::test]
async fn test_absent_body_defaults_for_every_typed_accessor() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    assert!(!client.api_test().await.unwrap().success);
    assert!(!client.brightness().await.unwrap().success);
    assert!(!client.mm_update_available().await.unwrap().success);

    let modules = client.modules().await.unwrap();
    assert!(!modules.success);
    assert!(modules.data.is_empty());

    let updates = client.update_available().await.unwrap();
    assert!(!updates.success);
    assert!(updates.result.is_empty());
}

#[tokio::test]
async fn test_malformed_json_is_a_decode_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/module"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let result = client.modules().await;
    match result {
        Err(Error::Deserialization { body, .. }) => assert!(body.contains("oops")),
        other => panic!("expected Deserialization, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_connection_refused_is_transport_error() {
    // Bind then drop a listener so the port is known to be closed.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let connection = Connection::new("127.0.0.1", port, SecretString::from(API_KEY.to_string()));
    let client = MirrorClient::with_client(connection, reqwest::Client::new()).unwrap();

    let err = client.fetch("api/test").await.unwrap_err();
    assert!(matches!(err, Error::Transport(_)), "got {err:?}");
    assert!(err.is_transient());
    assert!(!err.is_auth_failure());

    assert!(matches!(
        client.monitor_status().await,
        Err(Error::Transport(_))
    ));
    assert!(matches!(
        client.install_module("https://github.com/Jopyth/MMM-Remote-Control").await,
        Err(Error::Transport(_))
    ));

    // Fire-and-forget calls still swallow the failure.
    client.system(SystemAction::Refresh).await;
}

#[tokio::test]
async fn test_request_timeout_is_transport_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/monitor/status"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "success": true, "monitor": "on" }))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let transport = TransportConfig::default().with_timeout(Duration::from_millis(200));
    let client = MirrorClient::new(connection_for(&server), &transport).unwrap();

    let err = client.monitor_status().await.unwrap_err();
    match &err {
        Error::Transport(e) => assert!(e.is_timeout(), "got {e:?}"),
        other => panic!("expected Transport, got: {other:?}"),
    }
    assert!(err.is_transient());
}
