#![cfg(feature = "api")]

mod common;

use std::sync::Arc;
use std::time::Duration;

use aria::api::{Ack, ChatReply, ErrorBody, ModelsResponse, Server, SessionRegistry, StatusResponse};
use aria::backends::demo::Demo;
use aria::chat::ChatRole;
use aria::error::{ErrorKind, LLMError};
use aria::memory::SharedMemory;
use aria::persona::PersonaConfig;
use aria::session::SessionFactory;
use aria::LLMProvider;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tower::ServiceExt;

fn server_with(provider: Arc<dyn LLMProvider>) -> Server {
    let factory = SessionFactory::new(provider, PersonaConfig::default(), SharedMemory::default());
    Server::new(SessionRegistry::new(factory))
}

fn demo_server() -> Server {
    server_with(Arc::new(Demo::new()))
}

fn post(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn send<T: DeserializeOwned>(server: &Server, req: Request<Body>) -> (StatusCode, T) {
    let resp = server.router().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn chat_starts_and_continues_a_conversation() {
    let server = demo_server();
    let (status, first): (_, ChatReply) =
        send(&server, post("/api/chat", json!({"message": "I love tea"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(first.success);
    assert_eq!(first.model, "demo");
    assert_eq!(first.learned, 1);

    let (status, second): (_, ChatReply) = send(
        &server,
        post(
            "/api/chat",
            json!({"message": "and coffee?", "conversation_id": first.conversation_id}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second.conversation_id, first.conversation_id);

    assert_eq!(server.sessions().len().await, 1);
    let session = server.sessions().get(&first.conversation_id).await.unwrap();
    assert_eq!(session.lock().await.transcript().len(), 4);
}

#[tokio::test]
async fn missing_or_blank_message_is_bad_request() {
    let server = demo_server();
    let (status, body): (_, ErrorBody) = send(&server, post("/api/chat", json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body.error, "Message is required");

    let (status, _): (_, ErrorBody) =
        send(&server, post("/api/chat", json!({"message": "   "}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn provider_failures_carry_kind_and_hint() {
    let provider = common::Scripted::new();
    provider.push(Err(LLMError::QuotaExceeded("You exceeded your current quota".into())));
    let server = server_with(provider);

    let (status, body): (_, ErrorBody) =
        send(&server, post("/api/chat", json!({"message": "hello"}))).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body.kind, Some(ErrorKind::QuotaExceeded));
    assert!(body.hint.is_some());
}

#[tokio::test]
async fn auth_key_is_enforced() {
    let server = demo_server().with_auth_key("secret");
    let resp = server.router().oneshot(get("/api/status")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = Request::builder()
        .uri("/api/status")
        .header("Authorization", "Bearer secret")
        .body(Body::empty())
        .unwrap();
    let resp = server.router().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn clear_keeps_memory_and_reset_forgets_it() {
    let server = demo_server();
    let (_, reply): (_, ChatReply) =
        send(&server, post("/api/chat", json!({"message": "my goal is to learn Rust"}))).await;
    let id = reply.conversation_id;

    let (status, ack): (_, Ack) =
        send(&server, post("/api/clear", json!({"conversation_id": id}))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(ack.success);
    let session = server.sessions().get(&id).await.unwrap();
    assert!(session.lock().await.transcript().is_empty());

    let (_, status_body): (_, StatusResponse) = send(&server, get("/api/status")).await;
    assert_eq!(status_body.memory.goal, 1);
    assert_eq!(status_body.conversations_active, 1);

    let (status, _): (_, Ack) = send(&server, post("/api/reset", json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    let (_, status_body): (_, StatusResponse) = send(&server, get("/api/status")).await;
    assert_eq!(status_body.memory.goal, 0);
}

#[tokio::test]
async fn models_lists_current_model() {
    let server = demo_server();
    let (status, models): (_, ModelsResponse) = send(&server, get("/api/models")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(models.current, "demo");
    assert!(models.models.iter().any(|m| m.id == "gpt-4o-mini"));
}

#[tokio::test]
async fn requests_to_one_conversation_are_queued() {
    let server = server_with(Arc::new(Demo::new().with_delay(Duration::from_millis(50))));
    let first = post("/api/chat", json!({"message": "first question", "conversation_id": "shared"}));
    let second = post("/api/chat", json!({"message": "second question", "conversation_id": "shared"}));

    let (a, b) = tokio::join!(
        send::<ChatReply>(&server, first),
        send::<ChatReply>(&server, second)
    );
    assert_eq!(a.0, StatusCode::OK);
    assert_eq!(b.0, StatusCode::OK);

    let session = server.sessions().get("shared").await.unwrap();
    let turns = session.lock().await.transcript().messages();
    let roles: Vec<_> = turns.iter().map(|m| m.role).collect();
    assert_eq!(
        roles,
        [ChatRole::User, ChatRole::Assistant, ChatRole::User, ChatRole::Assistant]
    );
    let mut asked = vec![turns[0].content.as_str(), turns[2].content.as_str()];
    asked.sort();
    assert_eq!(asked, ["first question", "second question"]);
}
