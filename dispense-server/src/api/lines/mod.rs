//! Quantity ledger API

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/lines", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/{id}/used", post(handler::record_used))
        .route("/{id}/returned", post(handler::record_returned))
        .route("/{id}/returns", get(handler::list_returns))
}
