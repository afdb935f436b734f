//! Runs `ReqwestWebhookClient` against a local axum stub of the webhook.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{Value, json};
use supportchat_core::{ChatRequest, EscalationRequest, WebhookConfig, WidgetError};
use supportchat_interaction::{ReqwestWebhookClient, WebhookTransport};
use tokio::net::TcpListener;

#[derive(Clone)]
struct Stub {
    status: StatusCode,
    body: String,
    delay: Duration,
    received: Arc<Mutex<Vec<Value>>>,
}

async fn handle(State(stub): State<Stub>, Json(body): Json<Value>) -> (StatusCode, String) {
    stub.received.lock().unwrap().push(body);
    if !stub.delay.is_zero() {
        tokio::time::sleep(stub.delay).await;
    }
    (stub.status, stub.body.clone())
}

/// Starts a stub webhook and returns its config plus the recorded bodies.
async fn spawn_stub(
    status: StatusCode,
    body: &str,
    delay: Duration,
) -> (WebhookConfig, Arc<Mutex<Vec<Value>>>) {
    let received = Arc::new(Mutex::new(Vec::new()));
    let stub = Stub {
        status,
        body: body.to_string(),
        delay,
        received: received.clone(),
    };

    let app = Router::new()
        .route("/webhook/chat", post(handle))
        .with_state(stub);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let config = WebhookConfig {
        url: format!("http://{}/webhook/chat", addr),
        timeout_ms: 2000,
    };
    (config, received)
}

#[tokio::test]
async fn test_turn_with_single_object() {
    let (config, received) = spawn_stub(
        StatusCode::OK,
        r#"{"sessionId":"s2","message":"hi","options":["a","b"]}"#,
        Duration::ZERO,
    )
    .await;
    let client = ReqwestWebhookClient::new();

    let response = client
        .send_turn(&config, &ChatRequest::new("s1", "hello"))
        .await
        .expect("Should get a response")
        .expect("Should have a first element");

    assert_eq!(response.message, "hi");
    assert_eq!(response.options, vec!["a".to_string(), "b".to_string()]);
    assert_eq!(response.session_id.as_deref(), Some("s2"));

    let bodies = received.lock().unwrap();
    assert_eq!(bodies[0], json!({ "sessionId": "s1", "message": "hello" }));
}

#[tokio::test]
async fn test_turn_with_array_uses_first_element() {
    let (config, received) = spawn_stub(
        StatusCode::OK,
        r#"[{"message":"first"},{"message":"second"}]"#,
        Duration::ZERO,
    )
    .await;
    let client = ReqwestWebhookClient::new();

    let response = client
        .send_turn(&config, &ChatRequest::new("s1", ""))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(response.message, "first");

    // greeting carries no message field
    let bodies = received.lock().unwrap();
    assert_eq!(bodies[0], json!({ "sessionId": "s1" }));
}

#[tokio::test]
async fn test_turn_with_empty_array() {
    let (config, _) = spawn_stub(StatusCode::OK, "[]", Duration::ZERO).await;
    let client = ReqwestWebhookClient::new();

    let response = client
        .send_turn(&config, &ChatRequest::new("s1", "hello"))
        .await
        .unwrap();
    assert!(response.is_none());
}

#[tokio::test]
async fn test_non_success_status() {
    let (config, _) = spawn_stub(StatusCode::BAD_GATEWAY, "upstream down", Duration::ZERO).await;
    let client = ReqwestWebhookClient::new();

    let err = client
        .send_turn(&config, &ChatRequest::new("s1", "hello"))
        .await
        .unwrap_err();
    assert_eq!(err, WidgetError::status(502, "upstream down"));
}

#[tokio::test]
async fn test_malformed_body() {
    let (config, _) = spawn_stub(StatusCode::OK, "<html>oops</html>", Duration::ZERO).await;
    let client = ReqwestWebhookClient::new();

    let err = client
        .send_turn(&config, &ChatRequest::new("s1", "hello"))
        .await
        .unwrap_err();
    assert!(err.is_decode(), "unexpected error: {err}");
}

#[tokio::test]
async fn test_turn_with_null_fields() {
    let (config, _) = spawn_stub(
        StatusCode::OK,
        r#"{"message":"hi","options":null,"endSession":null}"#,
        Duration::ZERO,
    )
    .await;
    let client = ReqwestWebhookClient::new();

    let response = client
        .send_turn(&config, &ChatRequest::new("s1", "hello"))
        .await
        .expect("null fields should decode as missing")
        .unwrap();
    assert_eq!(response.message, "hi");
    assert!(response.options.is_empty());
    assert!(!response.end_session);
}

#[tokio::test]
async fn test_bad_array_element_keeps_decode_detail() {
    let (config, _) = spawn_stub(
        StatusCode::OK,
        r#"[{"message":"hi","options":[1,2]}]"#,
        Duration::ZERO,
    )
    .await;
    let client = ReqwestWebhookClient::new();

    let err = client
        .send_turn(&config, &ChatRequest::new("s1", "hello"))
        .await
        .unwrap_err();
    assert!(err.is_decode(), "unexpected error: {err}");
    assert!(err.to_string().contains("invalid type"), "{err}");
}

#[tokio::test]
async fn test_timeout() {
    let (mut config, _) = spawn_stub(
        StatusCode::OK,
        r#"{"message":"late"}"#,
        Duration::from_millis(1500),
    )
    .await;
    config.timeout_ms = 100;
    let client = ReqwestWebhookClient::new();

    let err = client
        .send_turn(&config, &ChatRequest::new("s1", "hello"))
        .await
        .unwrap_err();
    assert_eq!(err, WidgetError::Timeout(Duration::from_millis(100)));
}

#[tokio::test]
async fn test_connection_refused_is_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let config = WebhookConfig {
        url: format!("http://{}/webhook/chat", addr),
        timeout_ms: 2000,
    };
    let client = ReqwestWebhookClient::new();

    let err = client
        .send_turn(&config, &ChatRequest::new("s1", "hello"))
        .await
        .unwrap_err();
    assert!(matches!(err, WidgetError::Transport(_)), "unexpected error: {err}");
}

#[tokio::test]
async fn test_escalation_posts_full_body() {
    let (config, received) = spawn_stub(
        StatusCode::OK,
        r#"{"message":"An agent has joined","options":[],"sessionId":"agent-s1"}"#,
        Duration::ZERO,
    )
    .await;
    let client = ReqwestWebhookClient::new();

    let request = EscalationRequest {
        session_id: "s1".into(),
        escalated: true,
        escalation_reason: Some("billing".into()),
        customer_path: Some(vec!["menu".into(), "billing".into()]),
        escalation_attempt: 1,
        conversation_history: Vec::new(),
    };
    let response = client.escalate(&config, &request).await.unwrap();

    assert_eq!(response.message, "An agent has joined");
    assert_eq!(response.session_id.as_deref(), Some("agent-s1"));

    let bodies = received.lock().unwrap();
    assert_eq!(bodies[0]["escalated"], true);
    assert_eq!(bodies[0]["customerPath"], json!(["menu", "billing"]));
}
