//! Audit journal API
//!
//! | Path | Method | Meaning |
//! |------|--------|---------|
//! | /api/audit/verify | GET | re-hash the chain and report breaks |
//! | /api/audit/operations/{operation_id} | GET | entries of one operation |
//! | /api/audit/recent | GET | newest entries (`limit`, default 50, max 500) |

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use serde::Deserialize;
use shared::supply::{AuditChainVerification, AuditEntry};

use crate::api::run_blocking;
use crate::core::ServerState;
use crate::utils::{ApiResponse, AppResult, ok};

const DEFAULT_RECENT: usize = 50;
const MAX_RECENT: usize = 500;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/audit/verify", get(verify))
        .route("/api/audit/operations/{operation_id}", get(by_operation))
        .route("/api/audit/recent", get(recent))
}

#[derive(Debug, Deserialize)]
pub struct RecentQuery {
    pub limit: Option<usize>,
}

/// GET /api/audit/verify
pub async fn verify(
    State(state): State<ServerState>,
) -> AppResult<Json<ApiResponse<AuditChainVerification>>> {
    let report = run_blocking(&state, |m| m.verify_audit_chain()).await?;
    if !report.chain_intact {
        tracing::error!(breaks = report.breaks.len(), "Audit chain verification failed");
    }
    Ok(ok(report))
}

/// GET /api/audit/operations/{operation_id}
pub async fn by_operation(
    State(state): State<ServerState>,
    Path(operation_id): Path<String>,
) -> AppResult<Json<ApiResponse<Vec<AuditEntry>>>> {
    let entries = run_blocking(&state, move |m| m.audit_entries(&operation_id)).await?;
    Ok(ok(entries))
}

/// GET /api/audit/recent?limit=
pub async fn recent(
    State(state): State<ServerState>,
    Query(query): Query<RecentQuery>,
) -> AppResult<Json<ApiResponse<Vec<AuditEntry>>>> {
    let limit = query.limit.unwrap_or(DEFAULT_RECENT).min(MAX_RECENT);
    let entries = run_blocking(&state, move |m| m.recent_audit(limit)).await?;
    Ok(ok(entries))
}
