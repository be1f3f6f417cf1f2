//! API routes for the policy RAG server

pub mod retrieve;
pub mod sessions;

use axum::{
    extract::State,
    routing::{delete, get, post},
    Json, Router,
};

use crate::server::state::AppState;

/// Build all API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Conversations
        .route("/sessions", post(sessions::create_session))
        .route("/sessions/:id", delete(sessions::delete_session))
        .route("/sessions/:id/ask", post(sessions::ask))
        .route(
            "/sessions/:id/history",
            get(sessions::get_history).delete(sessions::clear_history),
        )
        // Retrieval only
        .route("/retrieve", post(retrieve::retrieve))
        // Info
        .route("/info", get(info))
}

/// API info endpoint
async fn info(State(state): State<AppState>) -> Json<serde_json::Value> {
    let config = state.config();
    let index = state.index();

    Json(serde_json::json!({
        "name": "policy-rag",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Conversational answers over health insurance policy documents",
        "backend": config.backend,
        "models": {
            "embedding": state.embedding_provider().model(),
            "generation": state.llm_provider().model(),
        },
        "index": index.as_ref().map(|i| serde_json::json!({
            "chunks": i.len(),
            "dimensions": i.meta().dimensions,
            "embed_model": i.meta().embed_model,
            "created_at": i.meta().created_at,
        })),
        "retrieval": {
            "top_k": state.engine().top_k(),
        },
        "sessions": state.sessions().len(),
        "endpoints": {
            "POST /api/sessions": "Start a conversation",
            "POST /api/sessions/:id/ask": "Ask a question within a conversation",
            "GET /api/sessions/:id/history": "List the conversation's turns",
            "DELETE /api/sessions/:id/history": "Clear the conversation",
            "DELETE /api/sessions/:id": "End the conversation",
            "POST /api/retrieve": "Retrieve matching policy text without answering"
        }
    }))
}
