//! Quantity ledger handlers

use axum::{
    Json,
    extract::{Path, State},
};
use shared::supply::{
    OrderLine, RecordReturnedRequest, RecordUsedRequest, ReturnOutcome, ReturnRecord,
};

use crate::api::{AuditedJson, RequestActor, run_blocking};
use crate::core::ServerState;
use crate::utils::{ApiResponse, AppResult, ok};

/// POST /api/lines/{id}/used
pub async fn record_used(
    State(state): State<ServerState>,
    Path(id): Path<u64>,
    RequestActor(actor): RequestActor,
    AuditedJson(payload): AuditedJson<RecordUsedRequest>,
) -> AppResult<Json<ApiResponse<OrderLine>>> {
    let line = run_blocking(&state, move |m| m.record_used(id, payload, &actor)).await?;
    Ok(ok(line))
}

/// POST /api/lines/{id}/returned
pub async fn record_returned(
    State(state): State<ServerState>,
    Path(id): Path<u64>,
    RequestActor(actor): RequestActor,
    AuditedJson(payload): AuditedJson<RecordReturnedRequest>,
) -> AppResult<Json<ApiResponse<ReturnOutcome>>> {
    let outcome = run_blocking(&state, move |m| m.record_returned(id, payload, &actor)).await?;
    Ok(ok(outcome))
}

/// GET /api/lines/{id}/returns - return records of one line, oldest first
pub async fn list_returns(
    State(state): State<ServerState>,
    Path(id): Path<u64>,
) -> AppResult<Json<ApiResponse<Vec<ReturnRecord>>>> {
    let records = run_blocking(&state, move |m| m.returns_for_line(id)).await?;
    Ok(ok(records))
}
