//! Cancel-bill API

mod handler;

use axum::{Router, routing::post};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().route("/api/bills/cancel", post(handler::cancel))
}
