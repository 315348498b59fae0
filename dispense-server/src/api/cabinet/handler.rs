//! Cabinet stock handlers

use axum::{
    Json,
    extract::{Path, State},
};
use shared::supply::{CabinetStockUnit, RegisterUnitRequest};

use crate::api::{AuditedJson, RequestActor, run_blocking};
use crate::core::ServerState;
use crate::utils::{ApiResponse, AppResult, ok};

/// POST /api/cabinet/units - register a unit (initially in the cabinet)
pub async fn register(
    State(state): State<ServerState>,
    RequestActor(actor): RequestActor,
    AuditedJson(payload): AuditedJson<RegisterUnitRequest>,
) -> AppResult<Json<ApiResponse<CabinetStockUnit>>> {
    let unit = run_blocking(&state, move |m| m.register_unit(payload, &actor)).await?;
    Ok(ok(unit))
}

/// POST /api/cabinet/units/{rfid}/dispense
pub async fn dispense(
    State(state): State<ServerState>,
    Path(rfid): Path<String>,
    RequestActor(actor): RequestActor,
) -> AppResult<Json<ApiResponse<CabinetStockUnit>>> {
    let unit = run_blocking(&state, move |m| m.dispense_unit(&rfid, &actor)).await?;
    Ok(ok(unit))
}

/// POST /api/cabinet/units/{rfid}/return
pub async fn return_unit(
    State(state): State<ServerState>,
    Path(rfid): Path<String>,
    RequestActor(actor): RequestActor,
) -> AppResult<Json<ApiResponse<CabinetStockUnit>>> {
    let unit = run_blocking(&state, move |m| m.return_unit(&rfid, &actor)).await?;
    Ok(ok(unit))
}
