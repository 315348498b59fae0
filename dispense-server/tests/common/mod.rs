//! Shared fixtures for integration tests

#![allow(dead_code)]

use dispense_server::catalog::{InMemoryCatalog, InMemoryDepartments};
use dispense_server::{ReconciliationManager, SupplyStorage};
use shared::supply::{EpisodeKey, OrderLineInput, SubmitOrderRequest};
use std::path::Path;
use std::sync::Arc;

pub fn catalog() -> Arc<InMemoryCatalog> {
    Arc::new(InMemoryCatalog::new(["X1", "X2", "X3", "X4"]))
}

pub fn departments() -> Arc<InMemoryDepartments> {
    Arc::new(InMemoryDepartments::new([("Emergency", "ER")]))
}

pub fn open_manager(db_path: &Path) -> ReconciliationManager {
    ReconciliationManager::new(db_path, catalog(), departments()).unwrap()
}

pub fn in_memory_manager() -> ReconciliationManager {
    let storage = SupplyStorage::open_in_memory().unwrap();
    ReconciliationManager::with_storage(storage, catalog(), departments())
}

pub fn line(identity: &str, item: &str, qty: Option<u32>, status: Option<&str>) -> OrderLineInput {
    OrderLineInput {
        item_code: item.to_string(),
        item_description: String::new(),
        billing_line_id: Some(identity.to_string()),
        status: status.map(str::to_string),
        quantity: qty,
        unit: Some("EA".to_string()),
    }
}

pub fn submission(episode_number: &str, lines: Vec<OrderLineInput>) -> SubmitOrderRequest {
    let mut request =
        SubmitOrderRequest::new(EpisodeKey::new(episode_number, "20-01", "Somchai", "Jaidee"));
    request.department_hint = Some("Emergency".to_string());
    request.order_lines = lines;
    request
}
