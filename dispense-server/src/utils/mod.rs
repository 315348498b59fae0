//! Utilities
//!
//! - [`AppError`] / [`ApiResponse`] - unified error types (from shared::error)
//! - [`logger`] - tracing subscriber setup

pub mod error;
pub mod logger;

pub use error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode, ok};
