//! Request extractors

use axum::Json;
use axum::extract::{FromRequest, FromRequestParts, Request};
use http::HeaderMap;
use http::request::Parts;
use serde::de::DeserializeOwned;
use serde_json::json;
use shared::supply::{
    Actor, AuditKind, CancelBillRequest, RecordReturnedRequest, RecordUsedRequest,
    RegisterUnitRequest, SubmitOrderRequest,
};
use std::convert::Infallible;

use crate::core::ServerState;
use crate::reconcile::ManagerError;
use crate::utils::AppError;

/// Header carrying the opaque actor tag
pub const ACTOR_HEADER: &str = "x-actor";

/// Actor of the current request; `system` when the header is absent or blank
#[derive(Debug, Clone)]
pub struct RequestActor(pub Actor);

impl<S> FromRequestParts<S> for RequestActor
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(actor_from(&parts.headers)))
    }
}

fn actor_from(headers: &HeaderMap) -> Actor {
    headers
        .get(ACTOR_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(Actor::new)
        .unwrap_or_default()
}

/// Request body of a journaled operation
pub trait AuditedPayload: DeserializeOwned + Send + 'static {
    /// Kind recorded when the body cannot be decoded
    const KIND: AuditKind;
}

impl AuditedPayload for SubmitOrderRequest {
    const KIND: AuditKind = AuditKind::Update;
}

impl AuditedPayload for RecordUsedRequest {
    const KIND: AuditKind = AuditKind::RecordUsed;
}

impl AuditedPayload for RecordReturnedRequest {
    const KIND: AuditKind = AuditKind::RecordReturn;
}

impl AuditedPayload for CancelBillRequest {
    const KIND: AuditKind = AuditKind::Discontinue;
}

impl AuditedPayload for RegisterUnitRequest {
    const KIND: AuditKind = AuditKind::Create;
}

/// JSON body that answers decode failures with the error envelope
///
/// A body that does not decode is rejected with `InvalidRequest` and leaves
/// one ERROR entry in the audit journal, like any other rejected operation.
#[derive(Debug, Clone)]
pub struct AuditedJson<T>(pub T);

impl<T: AuditedPayload> FromRequest<ServerState> for AuditedJson<T> {
    type Rejection = AppError;

    async fn from_request(req: Request, state: &ServerState) -> Result<Self, Self::Rejection> {
        let actor = actor_from(req.headers());
        let subject = json!({
            "method": req.method().as_str(),
            "path": req.uri().path(),
        });

        let rejection = match Json::<T>::from_request(req, state).await {
            Ok(Json(payload)) => return Ok(Self(payload)),
            Err(rejection) => rejection,
        };

        let err = ManagerError::MalformedRequest(rejection.body_text());
        let manager = state.manager.clone();
        let err = tokio::task::spawn_blocking(move || {
            manager.record_rejected(T::KIND, &actor, subject, err)
        })
        .await
        .map_err(|e| AppError::internal(format!("Blocking task failed: {e}")))?;
        Err(AppError::from(err))
    }
}
