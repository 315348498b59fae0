//! Unified error handling
//!
//! Handlers return [`AppResult<Json<ApiResponse<T>>>`]. Engine errors arrive as
//! [`ManagerError`](crate::reconcile::ManagerError) and convert into
//! [`AppError`], which renders as:
//!
//! ```json
//! {
//!   "code": 6001,
//!   "message": "Item codes not found in catalog: [\"X9\"]",
//!   "details": { "invalid_codes": ["X9"] }
//! }
//! ```

use axum::Json;
use serde::Serialize;

pub use shared::error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};

/// Wrap data in a success envelope
pub fn ok<T: Serialize>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse::success(data))
}
