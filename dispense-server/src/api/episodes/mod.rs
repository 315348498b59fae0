//! Submission and episode API

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/submissions", post(handler::submit))
        .route("/api/episodes/{id}", get(handler::get_by_id))
}
