//! Bare retrieval endpoint

use axum::{extract::State, Json};
use std::time::Instant;

use crate::error::Result;
use crate::server::state::AppState;
use crate::types::{RetrieveRequest, RetrieveResponse};

/// POST /api/retrieve - Top-k chunks for a query, no answer generation
pub async fn retrieve(
    State(state): State<AppState>,
    Json(request): Json<RetrieveRequest>,
) -> Result<Json<RetrieveResponse>> {
    let start = Instant::now();
    let results = state.engine().retrieve(&request.query, request.k).await?;

    Ok(Json(RetrieveResponse {
        results,
        processing_time_ms: start.elapsed().as_millis() as u64,
    }))
}
