// HTTP API tests: requests go through the router with `oneshot`

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::{RecordingHistory, ScriptedConnector, StaticGate};
use serde_json::{json, Value};
use snowbrain_voice::{create_router, AppState, EngineEvent, Role, StaticIdentity};
use std::sync::Arc;
use tower::ServiceExt;

struct Harness {
    state: AppState,
    connector: Arc<ScriptedConnector>,
    history: Arc<RecordingHistory>,
}

fn harness(gate: Arc<StaticGate>) -> Harness {
    let connector = Arc::new(ScriptedConnector::default());
    let history = RecordingHistory::new();
    let state = AppState::new(
        connector.clone(),
        gate,
        history.clone(),
        Arc::new(StaticIdentity::signed_in("user_123", "Sam")),
    );
    Harness {
        state,
        connector,
        history,
    }
}

async fn send(state: &AppState, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let body = match body {
        Some(json) => Body::from(json.to_string()),
        None => Body::empty(),
    };
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(body)
        .unwrap();

    let response = create_router(state.clone()).oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

fn start_request(call_id: &str) -> Value {
    json!({
        "call_id": call_id,
        "brain_id": "brain-1",
        "name": "Neura the Brainy Explorer",
        "subject": "science",
        "topic": "Cell biology",
        "voice": "female",
        "style": "casual",
    })
}

#[tokio::test]
async fn test_health_check() {
    let h = harness(StaticGate::granting());
    let response = create_router(h.state.clone())
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_start_call_mounts_and_connects() {
    let h = harness(StaticGate::granting());

    let (status, body) = send(&h.state, "POST", "/calls", Some(start_request("call-1"))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["call_id"], "call-1");
    assert_eq!(body["snapshot"]["status"], "CONNECTING");
    assert_eq!(h.connector.engine("call-1").unwrap().start_count(), 1);

    let (status, _) = send(&h.state, "POST", "/calls", Some(start_request("call-1"))).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_start_call_permission_denied() {
    let h = harness(StaticGate::denying());

    let (status, body) = send(&h.state, "POST", "/calls", Some(start_request("call-1"))).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["snapshot"]["status"], "FINISHED");
    assert!(body["snapshot"]["last_error"]
        .as_str()
        .unwrap()
        .contains("microphone permission denied"));
    assert_eq!(h.connector.engine("call-1").unwrap().start_count(), 0);
}

#[tokio::test]
async fn test_unknown_call_returns_not_found() {
    let h = harness(StaticGate::granting());

    for (method, uri) in [
        ("GET", "/calls/missing"),
        ("GET", "/calls/missing/transcript"),
        ("POST", "/calls/missing/mute"),
        ("POST", "/calls/missing/disconnect"),
        ("POST", "/calls/missing/start"),
        ("DELETE", "/calls/missing"),
    ] {
        let (status, body) = send(&h.state, method, uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{} {}", method, uri);
        assert_eq!(body["error"], "Call missing not found");
    }
}

#[tokio::test]
async fn test_transcript_mute_and_disconnect() {
    let h = harness(StaticGate::granting());
    send(&h.state, "POST", "/calls", Some(start_request("call-1"))).await;

    let controller = h.state.calls.read().await.get("call-1").cloned().unwrap();
    let engine = h.connector.engine("call-1").unwrap();
    engine.emit(EngineEvent::CallStart).await;
    engine
        .emit(EngineEvent::final_transcript(Role::User, "Hello"))
        .await;
    engine
        .emit(EngineEvent::final_transcript(Role::Assistant, "Hi there"))
        .await;

    let (status, body) = send(&h.state, "GET", "/calls/call-1/transcript", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["turns"].as_array().unwrap().len(), 2);
    assert_eq!(body["lines"], json!(["Sam:Hello", "Neura: Hi there"]));

    let (status, body) = send(&h.state, "POST", "/calls/call-1/mute", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_muted"], true);

    let (status, body) = send(&h.state, "POST", "/calls/call-1/disconnect", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["snapshot"]["status"], "FINISHED");
    assert_eq!(body["snapshot"]["is_speaking"], false);
    assert_eq!(engine.stop_count(), 1);

    controller.wait_for_history().await;
    engine.emit(EngineEvent::CallEnd).await;
    assert_eq!(h.history.writes().len(), 1);
    assert_eq!(h.history.writes()[0].user_text, "Hello");
}

#[tokio::test]
async fn test_remove_call_saves_transcript() {
    let h = harness(StaticGate::granting());
    send(&h.state, "POST", "/calls", Some(start_request("call-1"))).await;

    let engine = h.connector.engine("call-1").unwrap();
    engine.emit(EngineEvent::CallStart).await;
    engine
        .emit(EngineEvent::final_transcript(Role::User, "What is mitosis?"))
        .await;

    let (status, _) = send(&h.state, "DELETE", "/calls/call-1", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    assert_eq!(engine.stop_count(), 1);
    assert!(engine.subscription_released());
    let writes = h.history.writes();
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0].brain_id, "brain-1");
    assert_eq!(writes[0].user_text, "What is mitosis?");
}

#[tokio::test]
async fn test_concurrent_mounts_of_same_call_id() {
    let h = harness(StaticGate::granting());

    let (first, second) = tokio::join!(
        send(&h.state, "POST", "/calls", Some(start_request("call-1"))),
        send(&h.state, "POST", "/calls", Some(start_request("call-1"))),
    );

    let mut statuses = vec![first.0, second.0];
    statuses.sort();
    assert_eq!(statuses, vec![StatusCode::OK, StatusCode::CONFLICT]);
    assert_eq!(h.state.calls.read().await.len(), 1);
}

#[tokio::test]
async fn test_restart_and_remove_call() {
    let h = harness(StaticGate::granting());
    send(&h.state, "POST", "/calls", Some(start_request("call-1"))).await;
    send(&h.state, "POST", "/calls/call-1/disconnect", None).await;

    let (status, body) = send(&h.state, "POST", "/calls/call-1/start", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["snapshot"]["status"], "CONNECTING");

    let engine = h.connector.engine("call-1").unwrap();
    assert_eq!(engine.start_count(), 2);

    let (status, _) = send(&h.state, "DELETE", "/calls/call-1", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(engine.subscription_released());

    let (status, _) = send(&h.state, "GET", "/calls/call-1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
