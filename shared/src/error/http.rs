//! HTTP status code mapping for error codes

use super::codes::ErrorCode;
use http::StatusCode;

impl ErrorCode {
    /// Get the appropriate HTTP status code for this error code
    pub fn http_status(&self) -> StatusCode {
        match self {
            // Success
            Self::Success => StatusCode::OK,

            // 404 Not Found
            Self::EpisodeNotFound | Self::LineNotFound | Self::StockUnitNotFound => {
                StatusCode::NOT_FOUND
            }

            // 409 Conflict
            Self::LineVersionConflict | Self::StockUnitExists => StatusCode::CONFLICT,

            // 422 Unprocessable: the request is well-formed but breaks the ledger
            Self::QuantityExceedsOrdered => StatusCode::UNPROCESSABLE_ENTITY,

            // 503 Service Unavailable (transient errors, client can retry)
            Self::SystemBusy => StatusCode::SERVICE_UNAVAILABLE,

            // 500 Internal Server Error
            Self::InternalError | Self::DatabaseError | Self::StorageCorrupted => {
                StatusCode::INTERNAL_SERVER_ERROR
            }

            // 400 Bad Request (default for validation errors)
            _ => StatusCode::BAD_REQUEST,
        }
    }
}
