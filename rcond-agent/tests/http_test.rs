use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use base64::Engine;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use http_body_util::BodyExt;
use rcond::memory::{Calls, MemoryStore};
use rcond::{NetworkManager, WifiCredentials};
use rcond_agent::cluster::{ClusterAgent, LocalAgent};
use rcond_agent::config::ClusterConfig;
use rcond_agent::http::{AppState, TOKEN_HEADER, router};
use rcond_agent::system::{DryRun, PowerRequest};
use rcond_agent::users::AuthorizedKeys;
use serde_json::{Value, json};
use tower::ServiceExt;

const TOKEN: &str = "s3cret";

struct Harness {
    store: MemoryStore,
    system: Arc<DryRun>,
    state: AppState,
    home: tempfile::TempDir,
}

impl Harness {
    fn new() -> Self {
        let store = MemoryStore::new();
        let system = Arc::new(DryRun::new("node-1"));
        let home = tempfile::tempdir().unwrap();
        let state = AppState {
            network: NetworkManager::with_connector(store.clone()),
            system: system.clone(),
            keys: Arc::new(AuthorizedKeys::new(home.path())),
            cluster: None,
            defaults: WifiCredentials::default(),
            api_token: Arc::from(TOKEN),
        };
        Self {
            store,
            system,
            state,
            home,
        }
    }

    fn with_cluster(mut self) -> Self {
        let (agent, _dispatcher) =
            LocalAgent::start(&ClusterConfig::default(), "node-1", self.system.clone());
        let agent: Arc<dyn ClusterAgent> = Arc::new(agent);
        self.state.cluster = Some(agent);
        self
    }

    fn app(&self) -> Router {
        router(self.state.clone())
    }
}

async fn send(app: Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    send_with_token(app, method, uri, body, Some(TOKEN)).await
}

async fn send_with_token(
    app: Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
    token: Option<&str>,
) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        request = request.header(TOKEN_HEADER, token);
    }
    let request = match body {
        Some(body) => request
            .header("content-type", "application/json")
            .body(Body::from(body.to_string())),
        None => request.body(Body::empty()),
    }
    .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn ed25519_line(seed: u8, comment: &str) -> String {
    let mut blob = Vec::new();
    blob.extend_from_slice(&11u32.to_be_bytes());
    blob.extend_from_slice(b"ssh-ed25519");
    blob.extend_from_slice(&32u32.to_be_bytes());
    blob.extend_from_slice(&[seed; 32]);
    format!("ssh-ed25519 {} {comment}", STANDARD.encode(blob))
}

#[tokio::test]
async fn test_health_needs_no_token() {
    let h = Harness::new();
    let (status, body) = send_with_token(h.app(), "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "healthy"}));
}

#[tokio::test]
async fn test_missing_or_wrong_token_is_rejected() {
    let h = Harness::new();
    let body = json!({"interface": "wlan0", "ssid": "Lab", "password": "secret123"});

    for token in [None, Some("wrong"), Some("s3cret ")] {
        let (status, reply) =
            send_with_token(h.app(), "POST", "/network/ap", Some(body.clone()), token).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(reply, json!({"error": "unauthorized"}));
    }

    assert_eq!(h.store.calls(), Calls::default());
    assert_eq!(h.store.profile_count(), 0);
}

#[tokio::test]
async fn test_configure_ap_returns_fresh_uuid() {
    let h = Harness::new();
    let body = json!({"interface": "wlan0", "ssid": "Lab", "password": "secret123", "autoconnect": true});

    let (status, first) = send(h.app(), "POST", "/network/ap", Some(body.clone())).await;
    assert_eq!(status, StatusCode::OK);
    let (_, second) = send(h.app(), "POST", "/network/ap", Some(body)).await;

    let first = first["uuid"].as_str().unwrap();
    let second = second["uuid"].as_str().unwrap();
    assert!(uuid::Uuid::parse_str(first).is_ok());
    assert_ne!(first, second);
    assert_eq!(h.store.uuids(), vec![first.to_string(), second.to_string()]);
}

#[tokio::test]
async fn test_configure_sta_uses_defaults() {
    let h = Harness::new();
    let (status, body) = send(
        h.app(),
        "POST",
        "/network/sta",
        Some(json!({"interface": "wlan0"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["uuid"].is_string());
    assert_eq!(h.store.profile_count(), 1);
}

#[tokio::test]
async fn test_configure_with_invalid_password_fails() {
    let h = Harness::new();
    let (status, body) = send(
        h.app(),
        "POST",
        "/network/ap",
        Some(json!({"interface": "wlan0", "ssid": "Lab", "password": "short"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
    assert_eq!(h.store.profile_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_interface_up_waits_for_activation() {
    let h = Harness::new();
    let (_, body) = send(
        h.app(),
        "POST",
        "/network/sta",
        Some(json!({"interface": "wlan0", "ssid": "Home", "password": "secret123"})),
    )
    .await;
    let uuid = body["uuid"].as_str().unwrap().to_string();

    h.store.set_activation_states([1, 1, 2]);
    let started = tokio::time::Instant::now();
    let (status, body) = send(
        h.app(),
        "PUT",
        "/network/interface/wlan0",
        Some(json!({"uuid": uuid})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "success"}));
    assert_eq!(started.elapsed(), Duration::from_secs(2));
    assert_eq!(h.store.calls().state_reads, 3);
    assert_eq!(h.store.active_uuid("wlan0"), Some(uuid));

    let (status, _) = send(h.app(), "DELETE", "/network/interface/wlan0", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(h.store.active_uuid("wlan0"), None);
}

#[tokio::test]
async fn test_interface_up_unknown_uuid() {
    let h = Harness::new();
    let (status, body) = send(
        h.app(),
        "PUT",
        "/network/interface/wlan0",
        Some(json!({"uuid": "missing"})),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"error": "connection with UUID missing not found"}));
}

#[tokio::test]
async fn test_remove_connection_twice() {
    let h = Harness::new();
    let (_, body) = send(
        h.app(),
        "POST",
        "/network/ap",
        Some(json!({"interface": "wlan0"})),
    )
    .await;
    let uri = format!("/network/connection/{}", body["uuid"].as_str().unwrap());

    let (first, _) = send(h.app(), "DELETE", &uri, None).await;
    let (second, _) = send(h.app(), "DELETE", &uri, None).await;

    assert_eq!(first, StatusCode::OK);
    assert_eq!(second, StatusCode::OK);
    assert_eq!(h.store.profile_count(), 0);
    assert_eq!(h.store.calls().delete, 1);
}

#[tokio::test]
async fn test_invalid_json_is_bad_request() {
    let h = Harness::new();
    let request = Request::builder()
        .method("POST")
        .uri("/network/ap")
        .header(TOKEN_HEADER, TOKEN)
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let response = h.app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_hostname_round_trip() {
    let h = Harness::new();
    let (status, _) = send(
        h.app(),
        "POST",
        "/hostname",
        Some(json!({"hostname": "node-9"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(h.app(), "GET", "/hostname", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"hostname": "node-9"}));
}

#[tokio::test]
async fn test_invalid_hostname_is_bad_request() {
    let h = Harness::new();
    let (status, body) = send(
        h.app(),
        "POST",
        "/hostname",
        Some(json!({"hostname": "bad_name"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "invalid hostname: bad_name"}));

    let (_, body) = send(h.app(), "GET", "/hostname", None).await;
    assert_eq!(body, json!({"hostname": "node-1"}));
}

#[tokio::test]
async fn test_power_requests() {
    let h = Harness::new();
    let (restart, _) = send(h.app(), "POST", "/system/restart", None).await;
    let (shutdown, _) = send(h.app(), "POST", "/system/shutdown", None).await;

    assert_eq!(restart, StatusCode::OK);
    assert_eq!(shutdown, StatusCode::OK);
    assert_eq!(
        h.system.power_requests(),
        vec![PowerRequest::Restart, PowerRequest::Shutdown]
    );
}

#[tokio::test]
async fn test_file_upload() {
    let h = Harness::new();
    let path = h.home.path().join("etc/motd");
    let body = json!({"path": path, "content": STANDARD.encode("hello\n")});

    let (status, _) = send(h.app(), "POST", "/system/file", Some(body)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "hello\n");
}

#[tokio::test]
async fn test_file_upload_rejects_bad_content() {
    let h = Harness::new();
    let path = h.home.path().join("motd");
    let body = json!({"path": path, "content": "%%%"});

    let (status, _) = send(h.app(), "POST", "/system/file", Some(body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(!path.exists());
}

#[tokio::test]
async fn test_authorized_keys_add_and_remove() {
    let h = Harness::new();
    let line = ed25519_line(3, "ops@laptop");

    let (status, first) = send(
        h.app(),
        "POST",
        "/users/pi/keys",
        Some(json!({"pubkey": line})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (_, second) = send(
        h.app(),
        "POST",
        "/users/pi/keys",
        Some(json!({"pubkey": line})),
    )
    .await;
    assert_eq!(first, second);
    assert!(first["fingerprint"].as_str().unwrap().starts_with("SHA256:"));

    let file = h.home.path().join("pi/.ssh/authorized_keys");
    assert_eq!(std::fs::read_to_string(&file).unwrap(), format!("{line}\n"));

    let uri = format!("/users/pi/keys/{}", URL_SAFE_NO_PAD.encode(&line));
    let (status, _) = send(h.app(), "DELETE", &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(std::fs::read_to_string(&file).unwrap(), "");

    // removing an absent key is a no-op
    let (status, _) = send(h.app(), "DELETE", &uri, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_invalid_key_is_rejected() {
    let h = Harness::new();
    let (status, body) = send(
        h.app(),
        "POST",
        "/users/pi/keys",
        Some(json!({"pubkey": "ssh-ed25519 AAAA"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("invalid SSH public key"));
    assert!(!h.home.path().join("pi").exists());
}

#[tokio::test]
async fn test_cluster_routes_without_agent() {
    let h = Harness::new();
    let expected = json!({"error": "cluster agent is not initialized"});

    for (method, uri, body) in [
        ("GET", "/cluster/members", None),
        ("POST", "/cluster/join", Some(json!({"join": ["10.0.0.2"]}))),
        ("POST", "/cluster/leave", None),
        ("POST", "/cluster/event", Some(json!({"name": "restart"}))),
    ] {
        let (status, reply) = send(h.app(), method, uri, body).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{method} {uri}");
        assert_eq!(reply, expected);
    }
    assert!(h.system.power_requests().is_empty());
}

#[tokio::test]
async fn test_cluster_members_and_events() {
    let h = Harness::new().with_cluster();

    let (status, members) = send(h.app(), "GET", "/cluster/members", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(members[0]["name"], "node-1");
    assert_eq!(members[0]["status"], "alive");

    let (status, _) = send(
        h.app(),
        "POST",
        "/cluster/event",
        Some(json!({"name": "shutdown", "payload": "now"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // the dispatch loop runs on its own task
    for _ in 0..100 {
        if !h.system.power_requests().is_empty() {
            break;
        }
        tokio::task::yield_now().await;
    }
    assert_eq!(h.system.power_requests(), vec![PowerRequest::Shutdown]);
}

#[tokio::test]
async fn test_cluster_unknown_event_is_bad_request() {
    let h = Harness::new().with_cluster();
    let (status, body) = send(
        h.app(),
        "POST",
        "/cluster/event",
        Some(json!({"name": "selfDestruct"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("selfDestruct"));
}

#[tokio::test]
async fn test_cluster_join_validation() {
    let h = Harness::new().with_cluster();

    let (status, body) = send(
        h.app(),
        "POST",
        "/cluster/join",
        Some(json!({"join": [" , "]})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "no join addresses provided"}));

    let (status, _) = send(
        h.app(),
        "POST",
        "/cluster/join",
        Some(json!({"join": ["10.0.0.2:7946,10.0.0.3:7946"]})),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}
