//! HTTP API
//!
//! # Structure
//!
//! - [`health`] - liveness
//! - [`episodes`] - submissions and episode reads
//! - [`lines`] - quantity ledger (use / return)
//! - [`bills`] - cancel-bill and rebill
//! - [`variance`] - dispensed vs. used report
//! - [`cabinet`] - RFID stock flags
//! - [`audit`] - journal verification and lookups
//!
//! Every engine call runs on the blocking pool: redb transactions are
//! synchronous and a write transaction holds the single-writer lock.
//!
//! The request timeout only stops waiting. A write that was already handed
//! to the blocking pool still runs to commit after the caller got its 408,
//! and its outcome is visible in the audit journal.

pub mod audit;
pub mod bills;
pub mod cabinet;
pub mod episodes;
pub mod extract;
pub mod health;
pub mod lines;
pub mod variance;

use std::time::Duration;

use axum::{Router, middleware};
use http::StatusCode;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;

use crate::core::ServerState;
use crate::reconcile::{ManagerResult, ReconciliationManager};
use crate::utils::{AppError, AppResult};

pub use extract::{ACTOR_HEADER, AuditedJson, AuditedPayload, RequestActor};

/// HTTP access log
async fn log_request(
    request: http::Request<axum::body::Body>,
    next: middleware::Next,
) -> http::Response<axum::body::Body> {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let started = std::time::Instant::now();

    let response = next.run(request).await;

    tracing::info!(
        target: "http_access",
        "{} {} {} {}ms",
        method,
        uri,
        response.status(),
        started.elapsed().as_millis()
    );

    response
}

/// Build the Axum router (without state)
pub fn routes() -> Router<ServerState> {
    Router::<ServerState>::new()
        .merge(health::router())
        .merge(episodes::router())
        .merge(lines::router())
        .merge(bills::router())
        .merge(variance::router())
        .merge(cabinet::router())
        .merge(audit::router())
}

/// Answers 408 once `timeout` elapses
pub fn request_timeout(timeout: Duration) -> TimeoutLayer {
    TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, timeout)
}

/// Full application: routes, state and tower middleware
pub fn build_app(state: ServerState) -> Router {
    let timeout = Duration::from_millis(state.config.request_timeout_ms);
    routes()
        .with_state(state)
        .layer(request_timeout(timeout))
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
        .layer(middleware::from_fn(log_request))
}

/// Run an engine call on the blocking pool
pub(crate) async fn run_blocking<T, F>(state: &ServerState, f: F) -> AppResult<T>
where
    F: FnOnce(&ReconciliationManager) -> ManagerResult<T> + Send + 'static,
    T: Send + 'static,
{
    let manager = state.manager.clone();
    tokio::task::spawn_blocking(move || f(&manager))
        .await
        .map_err(|e| AppError::internal(format!("Blocking task failed: {e}")))?
        .map_err(AppError::from)
}
