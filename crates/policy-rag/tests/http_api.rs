//! HTTP surface tests driven through the router without binding a socket

mod common;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

use common::{EchoLlm, WordEmbedder};
use policy_rag::config::RagConfig;
use policy_rag::index::VectorIndex;
use policy_rag::server::{state::AppState, RagServer};
use policy_rag::types::Chunk;

fn router() -> Router {
    let texts = [
        ("policies/extras.pdf", "Extras cover includes dental, optical, and physio."),
        ("policies/claims.pdf", "Claims can be submitted online or through the mobile app."),
    ];
    let chunks: Vec<Chunk> = texts
        .iter()
        .enumerate()
        .map(|(i, (source, text))| {
            Chunk::new(text.to_string(), source.to_string(), i as u32, 0, text.len())
        })
        .collect();
    let vectors = chunks.iter().map(|c| WordEmbedder::vector(&c.text)).collect();
    let index = VectorIndex::from_parts(chunks, vectors, "word-embed").unwrap();

    let mut config = RagConfig::default();
    config.retrieval.top_k = 1;

    let state = AppState::with_index(
        config,
        index,
        Arc::new(WordEmbedder::default()),
        Arc::new(EchoLlm::default()),
    )
    .unwrap();
    RagServer::from_state(state).router()
}

async fn send(router: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(match body {
            Some(v) => Body::from(v.to_string()),
            None => Body::empty(),
        })
        .unwrap();

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

#[tokio::test]
async fn session_lifecycle() {
    let router = router();

    let (status, created) = send(&router, "POST", "/api/sessions", None).await;
    assert_eq!(status, StatusCode::CREATED);
    let id = created["session_id"].as_str().unwrap().to_string();

    let (status, answer) = send(
        &router,
        "POST",
        &format!("/api/sessions/{}/ask", id),
        Some(serde_json::json!({"question": "What does extras cover include?"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(answer["answer"], "- Extras cover includes dental, optical, and physio.");
    assert_eq!(answer["sources"], serde_json::json!(["extras.pdf"]));

    let (_, history) = send(&router, "GET", &format!("/api/sessions/{}/history", id), None).await;
    assert_eq!(history["turns"].as_array().unwrap().len(), 1);

    let (status, cleared) =
        send(&router, "DELETE", &format!("/api/sessions/{}/history", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cleared, serde_json::json!({"cleared": true, "turns": 0}));

    let (_, history) = send(&router, "GET", &format!("/api/sessions/{}/history", id), None).await;
    assert!(history["turns"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn unknown_session_is_not_found() {
    let router = router();
    let (status, body) = send(
        &router,
        "POST",
        "/api/sessions/6f1c1b7e-2a46-4a8e-9d5f-4f4b8a6f7c11/ask",
        Some(serde_json::json!({"question": "Hello?"})),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["type"], "not_found");
    assert_eq!(body["error"]["retryable"], false);
}

#[tokio::test]
async fn retrieve_endpoint_respects_k() {
    let router = router();
    let (status, body) = send(
        &router,
        "POST",
        "/api/retrieve",
        Some(serde_json::json!({"query": "How are claims submitted online?", "k": 2})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["chunk"]["source"], "policies/claims.pdf");
}

#[tokio::test]
async fn health_and_info() {
    let router = router();

    let response = router
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let (status, ready) = send(&router, "GET", "/ready", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ready["index_chunks"], 2);

    let (_, info) = send(&router, "GET", "/api/info", None).await;
    assert_eq!(info["name"], "policy-rag");
    assert_eq!(info["index"]["chunks"], 2);
    assert_eq!(info["retrieval"]["top_k"], 1);
}
