// Integration tests for `Coordinator` against a wiremock mirror.

#![allow(clippy::unwrap_used)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use pretty_assertions::assert_eq;
use secrecy::SecretString;
use serde_json::{Value, json};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use mmbridge_core::{
    Connection, Coordinator, CoordinatorConfig, CoordinatorUpdate, CoreError, EntityKey,
    EntityState, MonitorStatus, ProbeFailure, probe,
};

// ── Helpers ─────────────────────────────────────────────────────────

fn config_for(server: &MockServer) -> CoordinatorConfig {
    let addr = server.address();
    let connection = Connection::new(
        addr.ip().to_string(),
        addr.port(),
        SecretString::from("test-key".to_string()),
    );
    CoordinatorConfig::new(connection).with_refresh_timeout(Duration::from_secs(5))
}

async fn mount_json(server: &MockServer, route: &str, body: Value, delay: Duration) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(body)
                .set_delay(delay),
        )
        .mount(server)
        .await;
}

/// Mount every endpoint a refresh cycle reads.
async fn mount_status(server: &MockServer, monitor: &str, delay: Duration) {
    mount_json(
        server,
        "/api/monitor/status",
        json!({ "success": true, "monitor": monitor }),
        delay,
    )
    .await;
    mount_json(
        server,
        "/api/brightness",
        json!({ "success": true, "result": "70" }),
        Duration::ZERO,
    )
    .await;
    mount_json(
        server,
        "/api/module",
        json!({
            "success": true,
            "data": [
                { "name": "clock", "identifier": "module_0_clock", "hidden": false },
                { "name": "MMM-Remote-Control", "identifier": "module_1_MMM-Remote-Control", "hidden": true },
            ]
        }),
        Duration::ZERO,
    )
    .await;
    mount_json(
        server,
        "/api/updateAvailable",
        json!({
            "success": true,
            "result": [
                { "module": "MMM-Remote-Control", "result": true, "remote": "https://github.com/Jopyth/MMM-Remote-Control" }
            ]
        }),
        Duration::ZERO,
    )
    .await;
    mount_json(
        server,
        "/api/mmUpdateAvailable",
        json!({ "success": true, "result": false }),
        Duration::ZERO,
    )
    .await;
}

async fn requests_to(server: &MockServer, route: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.url.path() == route)
        .count()
}

fn recorder(coordinator: &Coordinator) -> Arc<Mutex<Vec<CoordinatorUpdate>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    coordinator.subscribe(move |update| sink.lock().unwrap().push(update.clone()));
    seen
}

// ── Refresh cycles ──────────────────────────────────────────────────

#[tokio::test]
async fn test_first_refresh_publishes_snapshot() {
    let server = MockServer::start().await;
    mount_status(&server, "on", Duration::ZERO).await;

    let coordinator = Coordinator::new(config_for(&server)).unwrap();
    assert!(coordinator.snapshot().is_none());

    let snapshot = coordinator.first_refresh().await.unwrap();
    assert_eq!(snapshot.monitor, MonitorStatus::On);
    assert_eq!(snapshot.brightness, Some(70));
    assert_eq!(snapshot.modules.len(), 2);
    assert!(!snapshot.update_available);
    assert!(Arc::ptr_eq(&snapshot, &coordinator.snapshot().unwrap()));

    let state = coordinator.refresh_state();
    assert!(state.is_available());
    assert_eq!(state.completed_cycles, 1);

    // monitor, brightness, update indicator, mirror update,
    // two module switches and one correlated module update
    assert_eq!(coordinator.entities().len(), 7);
    assert_eq!(
        coordinator.entity_state(&EntityKey::Module("MMM-Remote-Control".into())),
        Some(EntityState::Switch(false))
    );
}

#[tokio::test]
async fn test_module_lookup_uses_snapshot() {
    let server = MockServer::start().await;
    mount_status(&server, "on", Duration::ZERO).await;

    let coordinator = Coordinator::new(config_for(&server)).unwrap();
    assert_eq!(
        coordinator.module("clock"),
        Err(CoreError::ModuleNotFound {
            name: "clock".into()
        })
    );

    coordinator.first_refresh().await.unwrap();
    assert_eq!(coordinator.module("clock").unwrap().identifier, "module_0_clock");
    assert!(matches!(
        coordinator.module("MMM-Absent"),
        Err(CoreError::ModuleNotFound { .. })
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_requests_share_one_follow_up_cycle() {
    let server = MockServer::start().await;
    mount_status(&server, "on", Duration::from_millis(400)).await;

    let coordinator = Coordinator::new(config_for(&server)).unwrap();

    let in_flight = {
        let c = coordinator.clone();
        tokio::spawn(async move { c.request_refresh().await })
    };
    tokio::time::sleep(Duration::from_millis(100)).await;

    let waiters: Vec<_> = (0..5)
        .map(|_| {
            let c = coordinator.clone();
            tokio::spawn(async move { c.request_refresh().await })
        })
        .collect();

    assert!(in_flight.await.unwrap().is_ok());
    for waiter in waiters {
        assert!(waiter.await.unwrap().is_ok());
    }

    assert_eq!(requests_to(&server, "/api/monitor/status").await, 2);
    assert_eq!(coordinator.refresh_state().completed_cycles, 2);
}

#[tokio::test]
async fn test_deadline_keeps_previous_snapshot() {
    let server = MockServer::start().await;
    mount_status(&server, "on", Duration::ZERO).await;

    let config = config_for(&server).with_refresh_timeout(Duration::from_millis(300));
    let coordinator = Coordinator::new(config).unwrap();
    let before = coordinator.first_refresh().await.unwrap();

    server.reset().await;
    mount_status(&server, "off", Duration::from_secs(2)).await;
    let seen = recorder(&coordinator);

    let err = coordinator.request_refresh().await.unwrap_err();
    assert_eq!(
        err,
        CoreError::Timeout {
            after: Some(Duration::from_millis(300))
        }
    );

    let after = coordinator.snapshot().unwrap();
    assert!(Arc::ptr_eq(&before, &after));
    assert_eq!(after.monitor, MonitorStatus::On);

    let state = coordinator.refresh_state();
    assert_eq!(state.consecutive_failures, 1);
    assert!(!state.is_available());

    let seen = seen.lock().unwrap();
    assert!(matches!(
        seen.as_slice(),
        [CoordinatorUpdate::Failed(CoreError::Timeout { .. })]
    ));
}

#[tokio::test]
async fn test_short_request_timeout_still_fails_hung_cycle() {
    let server = MockServer::start().await;
    mount_status(&server, "off", Duration::ZERO).await;

    let config = config_for(&server)
        .with_request_timeout(Duration::from_millis(200))
        .with_refresh_timeout(Duration::from_millis(400));
    let coordinator = Coordinator::new(config).unwrap();
    let before = coordinator.first_refresh().await.unwrap();
    assert_eq!(before.monitor, MonitorStatus::Off);

    server.reset().await;
    for route in [
        "/api/monitor/status",
        "/api/brightness",
        "/api/module",
        "/api/updateAvailable",
        "/api/mmUpdateAvailable",
    ] {
        mount_json(&server, route, json!({ "success": true }), Duration::from_secs(3)).await;
    }
    let seen = recorder(&coordinator);

    let err = coordinator.request_refresh().await.unwrap_err();
    assert!(matches!(err, CoreError::Timeout { .. }), "got {err:?}");

    let after = coordinator.snapshot().unwrap();
    assert!(Arc::ptr_eq(&before, &after));
    assert_eq!(after.monitor, MonitorStatus::Off);
    assert!(!coordinator.refresh_state().is_available());
    assert!(matches!(
        seen.lock().unwrap().as_slice(),
        [CoordinatorUpdate::Failed(CoreError::Timeout { .. })]
    ));
}

#[tokio::test]
async fn test_refused_connection_keeps_previous_snapshot() {
    let server = MockServer::builder().start().await;
    mount_status(&server, "on", Duration::ZERO).await;

    let coordinator = Coordinator::new(config_for(&server)).unwrap();
    let before = coordinator.first_refresh().await.unwrap();
    assert!(coordinator.refresh_state().is_available());

    drop(server);
    tokio::time::sleep(Duration::from_millis(100)).await;
    let seen = recorder(&coordinator);

    let err = coordinator.request_refresh().await.unwrap_err();
    assert!(
        matches!(err, CoreError::ConnectionFailed { .. }),
        "got {err:?}"
    );

    let after = coordinator.snapshot().unwrap();
    assert!(Arc::ptr_eq(&before, &after));
    assert_eq!(after.monitor, MonitorStatus::On);
    assert_eq!(after.brightness, Some(70));

    let state = coordinator.refresh_state();
    assert!(!state.is_available());
    assert_eq!(state.consecutive_failures, 1);
    assert!(!state.reauth_required);
    assert!(matches!(
        seen.lock().unwrap().as_slice(),
        [CoordinatorUpdate::Failed(CoreError::ConnectionFailed { .. })]
    ));
}

#[tokio::test]
async fn test_unreachable_mirror_fails_first_refresh() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let connection = Connection::new(
        "127.0.0.1",
        port,
        SecretString::from("test-key".to_string()),
    );
    let coordinator = Coordinator::new(CoordinatorConfig::new(connection)).unwrap();

    let err = coordinator.first_refresh().await.unwrap_err();
    assert!(
        matches!(err, CoreError::ConnectionFailed { .. }),
        "got {err:?}"
    );
    assert!(coordinator.snapshot().is_none());
    assert!(!coordinator.refresh_state().is_available());
}

#[tokio::test]
async fn test_unsuccessful_field_degrades_without_failing() {
    let server = MockServer::start().await;
    mount_json(
        &server,
        "/api/monitor/status",
        json!({ "success": false }),
        Duration::ZERO,
    )
    .await;
    mount_status(&server, "on", Duration::ZERO).await;

    let coordinator = Coordinator::new(config_for(&server)).unwrap();
    let snapshot = coordinator.first_refresh().await.unwrap();

    assert_eq!(snapshot.monitor, MonitorStatus::Unknown);
    assert_eq!(coordinator.entity_state(&EntityKey::MonitorPower), None);
    assert_eq!(snapshot.brightness, Some(70));
}

#[tokio::test]
async fn test_forbidden_sets_reauth_until_success() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let coordinator = Coordinator::new(config_for(&server)).unwrap();
    let err = coordinator.first_refresh().await.unwrap_err();
    assert!(err.is_auth_failure());
    assert!(coordinator.snapshot().is_none());
    assert!(coordinator.refresh_state().reauth_required);

    server.reset().await;
    mount_status(&server, "on", Duration::ZERO).await;

    coordinator.request_refresh().await.unwrap();
    let state = coordinator.refresh_state();
    assert!(!state.reauth_required);
    assert_eq!(state.consecutive_failures, 0);
}

// ── Commands ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_failed_command_still_overrides_then_refreshes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/module/clock/hide"))
        .respond_with(ResponseTemplate::new(403))
        .expect(1)
        .mount(&server)
        .await;
    mount_status(&server, "on", Duration::ZERO).await;

    let coordinator = Coordinator::new(config_for(&server)).unwrap();
    coordinator.first_refresh().await.unwrap();
    let seen = recorder(&coordinator);

    let err = coordinator.hide_module("clock").await.unwrap_err();
    assert!(err.is_auth_failure());

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 2);
    assert!(matches!(
        &seen[0],
        CoordinatorUpdate::Override { key: EntityKey::Module(name), state: EntityState::Switch(false) }
            if name == "clock"
    ));
    assert!(matches!(&seen[1], CoordinatorUpdate::Refreshed(_)));

    // The refresh that followed the override reconciled it with the mirror.
    assert_eq!(
        coordinator.entity_state(&EntityKey::Module("clock".into())),
        Some(EntityState::Switch(true))
    );
    assert_eq!(requests_to(&server, "/api/monitor/status").await, 2);
}

#[tokio::test]
async fn test_override_survives_failed_refresh() {
    let server = MockServer::start().await;
    mount_status(&server, "off", Duration::ZERO).await;

    let coordinator = Coordinator::new(config_for(&server)).unwrap();
    coordinator.first_refresh().await.unwrap();

    server.reset().await;
    mount_json(
        &server,
        "/api/monitor/on",
        json!({ "success": true, "monitor": "on" }),
        Duration::ZERO,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/api/module"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;
    mount_status(&server, "off", Duration::ZERO).await;

    coordinator.turn_monitor_on().await.unwrap();

    assert!(matches!(
        coordinator.refresh_state().last_error,
        Some(CoreError::Decode { .. })
    ));
    assert_eq!(
        coordinator.entity_state(&EntityKey::MonitorPower),
        Some(EntityState::Switch(true))
    );
    assert_eq!(coordinator.snapshot().unwrap().monitor, MonitorStatus::Off);
}

#[tokio::test]
async fn test_install_module_update_marks_latest() {
    let server = MockServer::start().await;
    mount_json(
        &server,
        "/api/update/MMM-Remote-Control",
        json!({ "success": true }),
        Duration::ZERO,
    )
    .await;
    mount_status(&server, "on", Duration::ZERO).await;

    let coordinator = Coordinator::new(config_for(&server)).unwrap();
    coordinator.first_refresh().await.unwrap();
    let seen = recorder(&coordinator);

    coordinator
        .install_module_update("MMM-Remote-Control")
        .await
        .unwrap();

    let seen = seen.lock().unwrap();
    let Some(CoordinatorUpdate::Override {
        state: EntityState::Update(update),
        ..
    }) = seen.first()
    else {
        panic!("expected an update override, got: {seen:?}");
    };
    assert!(!update.update_available());
    assert_eq!(
        update.release_url.as_deref(),
        Some("https://github.com/Jopyth/MMM-Remote-Control")
    );
}

#[tokio::test]
async fn test_brightness_out_of_range_sends_nothing() {
    let server = MockServer::start().await;
    mount_status(&server, "on", Duration::ZERO).await;

    let coordinator = Coordinator::new(config_for(&server)).unwrap();
    let err = coordinator.set_brightness(150).await.unwrap_err();

    assert!(matches!(err, CoreError::ValidationFailed { .. }));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_unacknowledged_command_is_rejected() {
    let server = MockServer::start().await;
    mount_json(
        &server,
        "/api/brightness/40",
        json!({ "success": false }),
        Duration::ZERO,
    )
    .await;
    mount_status(&server, "on", Duration::ZERO).await;

    let coordinator = Coordinator::new(config_for(&server)).unwrap();
    let err = coordinator.set_brightness(40).await.unwrap_err();
    assert!(matches!(err, CoreError::Rejected { .. }));
}

// ── Lifecycle ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_periodic_task_stops_on_shutdown() {
    let server = MockServer::start().await;
    mount_status(&server, "on", Duration::ZERO).await;

    let config = config_for(&server).with_update_interval(Duration::from_millis(100));
    let coordinator = Coordinator::new(config).unwrap();
    coordinator.start().await;
    tokio::time::sleep(Duration::from_millis(350)).await;
    coordinator.shutdown().await;

    let polled = requests_to(&server, "/api/monitor/status").await;
    assert!(polled >= 2, "expected periodic polls, got {polled}");

    tokio::time::sleep(Duration::from_millis(250)).await;
    assert_eq!(requests_to(&server, "/api/monitor/status").await, polled);
}

#[tokio::test]
async fn test_unsubscribe_stops_callbacks() {
    let server = MockServer::start().await;
    mount_status(&server, "on", Duration::ZERO).await;

    let coordinator = Coordinator::new(config_for(&server)).unwrap();
    let seen = Arc::new(Mutex::new(0_u32));
    let sink = Arc::clone(&seen);
    let id = coordinator.subscribe(move |_| *sink.lock().unwrap() += 1);

    coordinator.request_refresh().await.unwrap();
    assert!(coordinator.unsubscribe(id));
    coordinator.request_refresh().await.unwrap();

    assert_eq!(*seen.lock().unwrap(), 1);
}

// ── Setup probe ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_probe_classifies_failures() {
    let server = MockServer::start().await;
    let coordinator = Coordinator::new(config_for(&server)).unwrap();

    mount_json(&server, "/api/test", json!({ "success": true }), Duration::ZERO).await;
    let outcome = probe(coordinator.client()).await;
    assert!(outcome.reachable);
    assert_eq!(outcome.reason, None);

    server.reset().await;
    Mock::given(method("GET"))
        .and(path("/api/test"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;
    let outcome = probe(coordinator.client()).await;
    assert_eq!(outcome.reason, Some(ProbeFailure::InvalidAuth));

    server.reset().await;
    Mock::given(method("GET"))
        .and(path("/api/test"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    let outcome = probe(coordinator.client()).await;
    assert!(!outcome.reachable);
    assert_eq!(outcome.reason, Some(ProbeFailure::CannotConnect));
}
