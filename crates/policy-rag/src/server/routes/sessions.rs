//! Conversation session endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::server::state::AppState;
use crate::types::{AskRequest, ChatResponse, ClearResponse, HistoryResponse, SessionCreated};

/// POST /api/sessions - Start a conversation
pub async fn create_session(State(state): State<AppState>) -> (StatusCode, Json<SessionCreated>) {
    let session_id = state.sessions().create();
    (StatusCode::CREATED, Json(SessionCreated { session_id }))
}

/// POST /api/sessions/:id/ask - Answer a question within a conversation
///
/// The session stays locked for the whole turn, so a second question in the
/// same session waits for the first to finish.
pub async fn ask(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<AskRequest>,
) -> Result<Json<ChatResponse>> {
    tracing::info!(session = %id, "Question: \"{}\"", request.question);

    let session = state.sessions().get(&id)?;
    let mut conversation = session.lock().await;
    let response = state.engine().ask(&mut conversation, &request.question).await?;

    Ok(Json(response))
}

/// GET /api/sessions/:id/history - Turns so far, oldest first
pub async fn get_history(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<HistoryResponse>> {
    let session = state.sessions().get(&id)?;
    let conversation = session.lock().await;

    Ok(Json(HistoryResponse {
        session_id: id,
        turns: conversation.turns().to_vec(),
    }))
}

/// DELETE /api/sessions/:id/history - Clear the conversation
pub async fn clear_history(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ClearResponse>> {
    let session = state.sessions().get(&id)?;
    let mut conversation = session.lock().await;
    conversation.clear();

    tracing::info!(session = %id, "Conversation cleared");
    Ok(Json(ClearResponse::cleared()))
}

/// DELETE /api/sessions/:id - End a conversation
pub async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    if state.sessions().remove(&id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(Error::SessionNotFound(id.to_string()))
    }
}
