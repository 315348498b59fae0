use super::*;
use crate::catalog::{InMemoryCatalog, InMemoryDepartments};
use shared::supply::{
    AuditStatus, EpisodeKey, LifecycleStatus, OrderLineInput, StockState, SupplyItemInput,
    VarianceClass,
};

const CATALOG: [&str; 12] = [
    "X1", "X2", "X3", "X4", "X5", "X6", "X7", "X8", "X9", "X10", "X11", "X12",
];

fn create_test_manager() -> ReconciliationManager {
    let storage = SupplyStorage::open_in_memory().unwrap();
    let catalog = Arc::new(InMemoryCatalog::new(CATALOG));
    let departments = Arc::new(InMemoryDepartments::new([
        ("Emergency", "ER"),
        ("Operating Room", "OR"),
    ]));
    ReconciliationManager::with_storage(storage, catalog, departments)
}

fn nurse() -> Actor {
    Actor::new("staff:7")
}

fn key(episode_number: &str) -> EpisodeKey {
    EpisodeKey::new(episode_number, "20-01", "Somchai", "Jaidee")
}

fn order_line(identity: &str, item: &str, qty: Option<u32>, status: Option<&str>) -> OrderLineInput {
    OrderLineInput {
        item_code: item.to_string(),
        item_description: format!("Item {item}"),
        billing_line_id: Some(identity.to_string()),
        status: status.map(str::to_string),
        quantity: qty,
        unit: Some("EA".to_string()),
    }
}

fn verified(identity: &str, item: &str, qty: u32) -> OrderLineInput {
    order_line(identity, item, Some(qty), Some("Verified"))
}

fn discontinue(identity: &str, item: &str) -> OrderLineInput {
    order_line(identity, item, None, Some("Discontinue"))
}

fn submission(episode_number: &str, lines: Vec<OrderLineInput>) -> SubmitOrderRequest {
    let mut request = SubmitOrderRequest::new(key(episode_number));
    request.department_hint = Some("Emergency".to_string());
    request.order_lines = lines;
    request
}

fn submit(
    manager: &ReconciliationManager,
    episode_number: &str,
    lines: Vec<OrderLineInput>,
) -> SubmitOutcome {
    manager
        .submit_order(submission(episode_number, lines), &nurse())
        .unwrap()
}

fn used(qty: u32) -> RecordUsedRequest {
    RecordUsedRequest {
        quantity: qty,
        expected_version: None,
    }
}

fn returned(qty: u32, reason: &str) -> RecordReturnedRequest {
    RecordReturnedRequest {
        quantity: qty,
        reason: reason.to_string(),
        note: None,
        expected_version: None,
    }
}

fn line_of(state: &EpisodeState, identity: &str, item: &str) -> OrderLine {
    state
        .lines
        .iter()
        .find(|l| l.billing_line_id.as_deref() == Some(identity) && l.item_code == item)
        .cloned()
        .unwrap()
}

/// Operation-level journal entries, oldest first
fn operation_entries(manager: &ReconciliationManager) -> Vec<AuditEntry> {
    manager
        .recent_audit(usize::MAX)
        .unwrap()
        .into_iter()
        .filter(|e| e.is_operation_level())
        .collect()
}

fn last_operation(manager: &ReconciliationManager) -> AuditEntry {
    operation_entries(manager).pop().unwrap()
}

mod test_audit;
