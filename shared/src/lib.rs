//! Shared types for the dispensing reconciliation workspace
//!
//! Domain records, request/response payloads and the unified error system
//! used by the server and by any client talking to it.

pub mod error;
pub mod supply;
pub mod util;

// Re-exports
pub use axum::Json;
pub use http;
pub use serde::{Deserialize, Serialize};
