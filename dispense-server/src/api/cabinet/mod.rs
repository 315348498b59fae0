//! Cabinet stock API

mod handler;

use axum::{Router, routing::post};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/cabinet/units", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", post(handler::register))
        .route("/{rfid}/dispense", post(handler::dispense))
        .route("/{rfid}/return", post(handler::return_unit))
}
