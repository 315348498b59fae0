//! Submission and episode handlers

use axum::{
    Json,
    extract::{Path, State},
};
use shared::supply::{EpisodeState, SubmitOrderRequest, SubmitOutcome};

use crate::api::{AuditedJson, RequestActor, run_blocking};
use crate::core::ServerState;
use crate::utils::{ApiResponse, AppResult, ok};

/// POST /api/submissions - create or merge an episode
pub async fn submit(
    State(state): State<ServerState>,
    RequestActor(actor): RequestActor,
    AuditedJson(payload): AuditedJson<SubmitOrderRequest>,
) -> AppResult<Json<ApiResponse<SubmitOutcome>>> {
    let outcome = run_blocking(&state, move |m| m.submit_order(payload, &actor)).await?;
    Ok(ok(outcome))
}

/// GET /api/episodes/{id} - episode with all its lines
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<u64>,
) -> AppResult<Json<ApiResponse<EpisodeState>>> {
    let episode = run_blocking(&state, move |m| m.get_episode(id)).await?;
    Ok(ok(episode))
}
