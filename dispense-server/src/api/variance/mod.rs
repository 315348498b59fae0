//! Variance report API
//!
//! | Path | Method | Query |
//! |------|--------|-------|
//! | /api/variance | GET | item_code?, from?, to? (Unix millis, inclusive) |

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use shared::supply::{VarianceQuery, VarianceRow};

use crate::api::run_blocking;
use crate::core::ServerState;
use crate::utils::{ApiResponse, AppError, AppResult, ok};

pub fn router() -> Router<ServerState> {
    Router::new().route("/api/variance", get(report))
}

/// GET /api/variance
pub async fn report(
    State(state): State<ServerState>,
    Query(query): Query<VarianceQuery>,
) -> AppResult<Json<ApiResponse<Vec<VarianceRow>>>> {
    if let (Some(from), Some(to)) = (query.from, query.to)
        && from > to
    {
        return Err(AppError::validation(format!(
            "Invalid range: from {from} is after to {to}"
        )));
    }
    let rows = run_blocking(&state, move |m| m.get_variance(&query)).await?;
    Ok(ok(rows))
}
