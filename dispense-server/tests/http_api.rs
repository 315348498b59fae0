//! HTTP surface driven through `tower::ServiceExt::oneshot`

mod common;

use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::routing::get as get_route;
use dispense_server::api::{ACTOR_HEADER, build_app, request_timeout};
use dispense_server::{Config, ServerState};
use http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

fn app() -> (Router, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::with_overrides(dir.path().to_string_lossy(), 0);
    let state = ServerState::new(config, common::in_memory_manager());
    (build_app(state), dir)
}

async fn call(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn post(uri: &str, body: Value) -> Request<Body> {
    Request::post(uri)
        .header("content-type", "application/json")
        .header(ACTOR_HEADER, "staff:7")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

fn first_submission() -> Value {
    json!({
        "episode_number": "EZ5-1",
        "patient_id": "20-01",
        "first_name": "Somchai",
        "last_name": "Jaidee",
        "department_hint": "Emergency",
        "order_lines": [
            {"item_code": "X1", "billing_line_id": "A1", "quantity": 10, "status": "Verified"}
        ]
    })
}

#[tokio::test]
async fn test_health() {
    let (app, _dir) = app();

    let (status, body) = call(&app, get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_submit_then_read_episode() {
    let (app, _dir) = app();

    let (status, body) = call(&app, post("/api/submissions", first_submission())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["code"], 0);
    assert_eq!(body["data"]["created"], true);
    let episode_id = body["data"]["episode"]["id"].as_u64().unwrap();
    assert_eq!(body["data"]["lines"][0]["lifecycle"], "PENDING");

    let (status, body) = call(&app, get(&format!("/api/episodes/{episode_id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["episode"]["episode_number"], "EZ5-1");
    assert_eq!(body["data"]["lines"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_invalid_codes_are_400_with_details() {
    let (app, _dir) = app();
    let mut payload = first_submission();
    payload["order_lines"] = json!([
        {"item_code": "X1", "billing_line_id": "A1", "quantity": 1},
        {"item_code": "NOPE", "billing_line_id": "A2", "quantity": 1}
    ]);

    let (status, body) = call(&app, post("/api/submissions", payload)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"]["invalid_codes"], json!(["NOPE"]));
}

#[tokio::test]
async fn test_ledger_status_codes() {
    let (app, _dir) = app();
    let (_, body) = call(&app, post("/api/submissions", first_submission())).await;
    let line_id = body["data"]["lines"][0]["id"].as_u64().unwrap();

    let (status, body) = call(
        &app,
        post(&format!("/api/lines/{line_id}/used"), json!({"quantity": 4})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["pending_qty"], 6);

    let (status, body) = call(
        &app,
        post(&format!("/api/lines/{line_id}/used"), json!({"quantity": 10})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["details"]["pending"], 6);

    let (status, _) = call(
        &app,
        post(
            &format!("/api/lines/{line_id}/used"),
            json!({"quantity": 1, "expected_version": 0}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = call(&app, post("/api/lines/999/used", json!({"quantity": 1}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = call(
        &app,
        post(
            &format!("/api/lines/{line_id}/returned"),
            json!({"quantity": 2, "reason": "UNUSED", "note": "sealed"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["return_record"]["actor"], "staff:7");

    let (_, body) = call(&app, get(&format!("/api/lines/{line_id}/returns"))).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_cancel_bill_route() {
    let (app, _dir) = app();
    let (_, body) = call(&app, post("/api/submissions", first_submission())).await;
    let episode_id = body["data"]["episode"]["id"].as_u64().unwrap();

    let (status, body) = call(
        &app,
        post(
            "/api/bills/cancel",
            json!({
                "episode_id": episode_id,
                "old_print_date": "2026-10-01",
                "new_print_date": "2026-10-01",
                "replacement_lines": [{"item_code": "X2", "billing_line_id": "R1", "quantity": 1}]
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["same_day"], true);
    assert_eq!(
        body["data"]["cancelled_episode"]["episode"]["billing_status"],
        "CANCELLED"
    );
    assert_eq!(body["data"]["new_episode"]["lines"][0]["status"], "Verified");
}

#[tokio::test]
async fn test_cabinet_and_variance_routes() {
    let (app, _dir) = app();
    let (status, _) = call(
        &app,
        post("/api/cabinet/units", json!({"rfid": "R1", "item_code": "X1"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = call(&app, post("/api/cabinet/units/R1/dispense", json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["state"], "DISPENSED");

    let (status, _) = call(&app, post("/api/cabinet/units/R1/dispense", json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = call(&app, get("/api/variance?item_code=X1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["dispensed"], 1);
    assert_eq!(body["data"][0]["class"], "DISPENSED_NOT_USED");

    let (status, _) = call(&app, get("/api/variance?from=10&to=5")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_audit_routes() {
    let (app, _dir) = app();
    call(&app, post("/api/submissions", first_submission())).await;

    let (status, body) = call(&app, get("/api/audit/verify")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["chain_intact"], true);

    let (_, body) = call(&app, get("/api/audit/recent?limit=5")).await;
    let entries = body["data"].as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["actor"], "staff:7");
    assert_eq!(entries[0]["outcome"]["type"], "CREATE");
    assert_eq!(entries[0]["outcome"]["status"], "SUCCESS");

    let operation_id = entries[0]["operation_id"].as_str().unwrap();
    let (_, body) = call(&app, get(&format!("/api/audit/operations/{operation_id}"))).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_undecodable_body_gets_envelope_and_journal_entry() {
    let (app, _dir) = app();

    let (status, body) = call(
        &app,
        post("/api/submissions", json!({"order_lines": [{"quantity": -1}]})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 5);
    assert!(!body["details"]["reason"].as_str().unwrap().is_empty());

    let (_, body) = call(&app, get("/api/audit/recent")).await;
    let entries = body["data"].as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["actor"], "staff:7");
    assert_eq!(entries[0]["outcome"]["status"], "ERROR");
    assert_eq!(entries[0]["outcome"]["type"], "UPDATE");
    assert_eq!(entries[0]["outcome"]["detail"]["code"], 5);
    assert_eq!(
        entries[0]["outcome"]["detail"]["request"]["path"],
        "/api/submissions"
    );
}

#[tokio::test]
async fn test_undecodable_ledger_body_is_journaled_under_its_kind() {
    let (app, _dir) = app();
    let (_, body) = call(&app, post("/api/submissions", first_submission())).await;
    let line_id = body["data"]["lines"][0]["id"].as_u64().unwrap();

    let (status, body) = call(
        &app,
        post(&format!("/api/lines/{line_id}/used"), json!({"quantity": "two"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 5);

    let (_, body) = call(&app, get("/api/audit/recent")).await;
    let last = body["data"].as_array().unwrap().last().cloned().unwrap();
    assert_eq!(last["outcome"]["type"], "RECORD_USED");
    assert_eq!(last["outcome"]["status"], "ERROR");

    let (_, body) = call(&app, get("/api/audit/verify")).await;
    assert_eq!(body["data"]["chain_intact"], true);
}

#[tokio::test]
async fn test_returns_of_unknown_line_is_404() {
    let (app, _dir) = app();

    let (status, body) = call(&app, get("/api/lines/404/returns")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], 5001);
    assert_eq!(body["details"]["line_id"], 404);
}

#[tokio::test]
async fn test_slow_request_times_out_with_408() {
    let app = Router::new()
        .route(
            "/slow",
            get_route(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                "done"
            }),
        )
        .layer(request_timeout(Duration::from_millis(20)));

    let response = app.oneshot(get("/slow")).await.unwrap();

    assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
}
