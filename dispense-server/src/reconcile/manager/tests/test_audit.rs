use super::*;

#[test]
fn test_every_operation_writes_exactly_one_entry() {
    let manager = create_test_manager();

    let first = submit(&manager, "EZ5-1", vec![verified("A1", "X1", 10)]);
    let line_id = first.state.lines[0].id;
    manager.record_used(line_id, used(2), &nurse()).unwrap();
    let _ = manager.record_used(line_id, used(50), &nurse());
    manager
        .record_returned(line_id, returned(1, "UNUSED"), &nurse())
        .unwrap();
    let _ = manager.submit_order(submission("EZ5-2", vec![verified("B1", "NOPE", 1)]), &nurse());
    submit(&manager, "EZ5-2", vec![discontinue("Z9", "X1")]);
    let _ = manager.record_used(9999, used(1), &nurse());
    manager
        .cancel_bill(
            CancelBillRequest {
                episode_id: Some(first.state.episode.id),
                replacement_lines: vec![verified("R1", "X2", 1)],
                ..Default::default()
            },
            &nurse(),
        )
        .unwrap();

    let entries = operation_entries(&manager);
    assert_eq!(entries.len(), 8);
    let statuses: Vec<AuditStatus> = entries.iter().map(|e| e.outcome.status).collect();
    assert_eq!(
        statuses,
        vec![
            AuditStatus::Success,
            AuditStatus::Success,
            AuditStatus::Error,
            AuditStatus::Success,
            AuditStatus::Error,
            AuditStatus::Success,
            AuditStatus::Error,
            AuditStatus::Success,
        ]
    );
    let kinds: Vec<AuditKind> = entries.iter().map(|e| e.outcome.kind).collect();
    assert_eq!(
        kinds,
        vec![
            AuditKind::Create,
            AuditKind::RecordUsed,
            AuditKind::RecordUsed,
            AuditKind::RecordReturn,
            AuditKind::Create,
            AuditKind::Create,
            AuditKind::RecordUsed,
            AuditKind::Discontinue,
        ]
    );
}

#[test]
fn test_failure_entry_carries_structured_detail() {
    let manager = create_test_manager();
    let lines = vec![verified("A1", "X1", 1), verified("A2", "BAD", 1)];

    let _ = manager.submit_order(submission("EZ5-1", lines), &Actor::new("admin:42"));

    let entry = last_operation(&manager);
    assert!(!entry.outcome.is_success());
    assert_eq!(entry.outcome.kind, AuditKind::Create);
    assert_eq!(entry.actor.as_str(), "admin:42");
    assert_eq!(entry.episode_id, None);
    assert_eq!(
        entry.outcome.detail["error"]["invalid_codes"],
        serde_json::json!(["BAD"])
    );
    assert_eq!(
        entry.outcome.detail["code"],
        serde_json::json!(shared::error::ErrorCode::InvalidItemCodes.code())
    );
    assert_eq!(entry.outcome.detail["request"]["episode_number"], "EZ5-1");
}

#[test]
fn test_rejected_ledger_call_records_episode() {
    let manager = create_test_manager();
    let first = submit(&manager, "EZ5-1", vec![verified("A1", "X1", 2)]);

    let _ = manager.record_used(first.state.lines[0].id, used(3), &nurse());

    let entry = last_operation(&manager);
    assert_eq!(entry.outcome.status, AuditStatus::Error);
    assert_eq!(entry.episode_id, Some(first.state.episode.id));
    assert_eq!(entry.outcome.detail["error"]["pending"], 2);
}

#[test]
fn test_merge_entries_share_operation_id() {
    let manager = create_test_manager();
    submit(&manager, "EZ5-1", vec![verified("A1", "X1", 1), verified("A2", "X2", 1)]);

    submit(
        &manager,
        "EZ5-1",
        vec![
            order_line("A1", "X1", None, Some("Dispatched")),
            order_line("A2", "X2", None, Some("Dispatched")),
            verified("A3", "X3", 1),
        ],
    );

    let operation = last_operation(&manager);
    let entries = manager.audit_entries(&operation.operation_id).unwrap();
    assert_eq!(entries.len(), 3);
    let updates = entries
        .iter()
        .filter(|e| e.line_id.is_some() && e.outcome.kind == AuditKind::Update)
        .count();
    assert_eq!(updates, 2);
    assert_eq!(operation.outcome.detail["appended_line_ids"].as_array().unwrap().len(), 1);
}

#[test]
fn test_chain_intact_after_mixed_operations() {
    let manager = create_test_manager();
    let first = submit(&manager, "EZ5-1", vec![verified("A1", "X1", 3)]);
    let _ = manager.record_used(first.state.lines[0].id, used(9), &nurse());
    submit(&manager, "EZ5-2", vec![discontinue("A1", "X1")]);

    let report = manager.verify_audit_chain().unwrap();

    assert!(report.chain_intact);
    assert!(report.breaks.is_empty());
    assert_eq!(report.total_entries, manager.recent_audit(usize::MAX).unwrap().len() as u64);
}

#[test]
fn test_reads_are_not_journaled() {
    let manager = create_test_manager();
    let first = submit(&manager, "EZ5-1", vec![verified("A1", "X1", 3)]);
    let before = manager.recent_audit(usize::MAX).unwrap().len();

    manager.get_episode(first.state.episode.id).unwrap();
    manager.get_variance(&Default::default()).unwrap();
    manager.verify_audit_chain().unwrap();

    assert_eq!(manager.recent_audit(usize::MAX).unwrap().len(), before);
}

#[test]
fn test_rejected_request_is_journaled_once() {
    let manager = create_test_manager();

    let err = manager.record_rejected(
        AuditKind::RecordReturn,
        &nurse(),
        serde_json::json!({"method": "POST", "path": "/api/lines/3/returned"}),
        ManagerError::MalformedRequest("missing field `reason`".to_string()),
    );

    assert!(matches!(err, ManagerError::MalformedRequest(_)));
    let entries = operation_entries(&manager);
    assert_eq!(entries.len(), 1);
    let entry = &entries[0];
    assert_eq!(entry.outcome.status, AuditStatus::Error);
    assert_eq!(entry.outcome.kind, AuditKind::RecordReturn);
    assert_eq!(entry.actor, nurse());
    assert!(entry.line_id.is_none());
    assert!(manager.verify_audit_chain().unwrap().chain_intact);
}
