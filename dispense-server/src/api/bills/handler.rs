use axum::{Json, extract::State};
use shared::supply::{CancelBillOutcome, CancelBillRequest};

use crate::api::{AuditedJson, RequestActor, run_blocking};
use crate::core::ServerState;
use crate::utils::{ApiResponse, AppResult, ok};

/// POST /api/bills/cancel - cancel targeted lines, optionally rebill
pub async fn cancel(
    State(state): State<ServerState>,
    RequestActor(actor): RequestActor,
    AuditedJson(payload): AuditedJson<CancelBillRequest>,
) -> AppResult<Json<ApiResponse<CancelBillOutcome>>> {
    let outcome = run_blocking(&state, move |m| m.cancel_bill(payload, &actor)).await?;
    Ok(ok(outcome))
}
