//! ReconciliationManager - boundary operations of the reconciliation engine
//!
//! This module handles:
//! - Submission merge (create or merge an episode, cascade cancellations)
//! - Quantity ledger operations (use / return)
//! - Cancel-bill with optional rebill
//! - Cabinet stock flags
//! - Read paths (episode state, variance, audit journal)
//!
//! # Operation Flow
//!
//! ```text
//! operation(request, actor)
//!     ├─ 1. Begin write transaction (redb: single writer)
//!     ├─ 2. Validate against current committed state
//!     ├─ 3. Apply writes
//!     ├─ 4. Append success audit entries (same transaction)
//!     ├─ 5. Commit
//!     └─ on any error: abort, then append one ERROR entry in its own transaction
//! ```
//!
//! Submission order inside step 3: discontinue cascade → matched status
//! updates → new lines → episode metadata.

mod error;
pub use error::*;

use super::adapter::{self, CanonicalLine};
use super::storage::{StorageError, SupplyStorage};
use super::{cascade, ledger, merge, resolver, variance};
use crate::audit::{AuditJournal, AuditRecord};
use crate::cabinet;
use crate::catalog::{CatalogValidator, DepartmentDirectory};
use redb::WriteTransaction;
use serde_json::json;
use shared::supply::{
    Actor, AuditChainVerification, AuditEntry, AuditKind, AuditOutcome, BILLING_STATUS_CANCELLED,
    CabinetStockUnit, CancelBillOutcome, CancelBillRequest, CancelTarget, Episode, EpisodeState,
    LineStatus, OrderLine, RecordReturnedRequest, RecordUsedRequest, RegisterUnitRequest,
    ReturnOutcome, ReturnRecord, SubmitOrderRequest, SubmitOutcome, VarianceQuery, VarianceRow,
};
use shared::util::{now_millis, operation_id};
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

/// Hospital id stamped on new episodes when neither request nor config names one
pub const DEFAULT_HOSPITAL_ID: &str = "default";

/// Per-operation state shared by the success and failure audit paths
struct OperationContext {
    operation_id: String,
    actor: Actor,
    kind: AuditKind,
    episode_id: Option<u64>,
    /// Request summary recorded on failure
    subject: serde_json::Value,
    now: i64,
}

impl OperationContext {
    fn new(kind: AuditKind, actor: &Actor, subject: serde_json::Value) -> Self {
        Self {
            operation_id: operation_id(),
            actor: actor.clone(),
            kind,
            episode_id: None,
            subject,
            now: now_millis(),
        }
    }

    fn record(&self, episode_id: Option<u64>, line_id: Option<u64>, outcome: AuditOutcome) -> AuditRecord {
        AuditRecord {
            operation_id: self.operation_id.clone(),
            episode_id,
            line_id,
            actor: self.actor.clone(),
            outcome,
        }
    }
}

/// What applying a merge plan wrote
#[derive(Debug, Default)]
struct AppliedPlan {
    cascaded: Vec<OrderLine>,
    matched: Vec<u64>,
    appended: Vec<u64>,
}

/// ReconciliationManager
///
/// Synchronous: every operation runs to completion inside one redb write
/// transaction. Async callers should use `spawn_blocking`.
pub struct ReconciliationManager {
    storage: SupplyStorage,
    journal: AuditJournal,
    catalog: Arc<dyn CatalogValidator>,
    departments: Arc<dyn DepartmentDirectory>,
    default_hospital_id: String,
}

impl std::fmt::Debug for ReconciliationManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReconciliationManager")
            .field("storage", &"<SupplyStorage>")
            .field("default_hospital_id", &self.default_hospital_id)
            .finish()
    }
}

impl ReconciliationManager {
    /// Create a manager over the database at `db_path`
    pub fn new(
        db_path: impl AsRef<Path>,
        catalog: Arc<dyn CatalogValidator>,
        departments: Arc<dyn DepartmentDirectory>,
    ) -> ManagerResult<Self> {
        let storage = SupplyStorage::open(db_path)?;
        tracing::info!("ReconciliationManager opened storage");
        Ok(Self::with_storage(storage, catalog, departments))
    }

    /// Create a manager with existing storage
    pub fn with_storage(
        storage: SupplyStorage,
        catalog: Arc<dyn CatalogValidator>,
        departments: Arc<dyn DepartmentDirectory>,
    ) -> Self {
        Self {
            storage,
            journal: AuditJournal,
            catalog,
            departments,
            default_hospital_id: DEFAULT_HOSPITAL_ID.to_string(),
        }
    }

    pub fn with_default_hospital(mut self, hospital_id: impl Into<String>) -> Self {
        self.default_hospital_id = hospital_id.into();
        self
    }

    pub fn storage(&self) -> &SupplyStorage {
        &self.storage
    }

    // ========== Submission ==========

    /// Create or merge the episode a submission is about
    pub fn submit_order(
        &self,
        request: SubmitOrderRequest,
        actor: &Actor,
    ) -> ManagerResult<SubmitOutcome> {
        let subject = json!({
            "episode_number": request.key.episode_number,
            "patient_id": request.key.patient_id,
            "line_count": request.line_count(),
        });
        let ctx = OperationContext::new(AuditKind::Update, actor, subject);
        self.execute(ctx, |txn, ctx| {
            match resolver::resolve(&self.storage, txn, &request.key)? {
                Some(episode) => {
                    ctx.episode_id = Some(episode.id);
                    self.merge_into(txn, ctx, episode, &request)
                }
                None => {
                    ctx.kind = AuditKind::Create;
                    self.create_episode(txn, ctx, &request)
                }
            }
        })
    }

    fn create_episode(
        &self,
        txn: &WriteTransaction,
        ctx: &mut OperationContext,
        request: &SubmitOrderRequest,
    ) -> ManagerResult<SubmitOutcome> {
        if request.line_count() == 0 {
            return Err(ManagerError::EmptySubmission);
        }
        let incoming = adapter::canonicalize(request);
        self.validate_codes(incoming.iter().map(|l| l.item_code.as_str()))?;

        let department_code = request
            .department_hint
            .as_deref()
            .and_then(|hint| self.departments.resolve(hint))
            .ok_or_else(|| ManagerError::DepartmentUnresolved(request.department_hint.clone()))?;

        let plan = merge::plan(&[], incoming);
        require_quantities(plan.new_lines_missing_quantity())?;

        let id = self.storage.next_episode_id(txn)?;
        let mut episode = Episode {
            id,
            hospital_id: request
                .hospital_id
                .clone()
                .unwrap_or_else(|| self.default_hospital_id.clone()),
            key: request.key.clone(),
            department_code,
            usage_type: request.usage_type.unwrap_or_default(),
            billing_status: None,
            total_amount: None,
            paid_amount: None,
            print_date: None,
            print_time: None,
            created_at: ctx.now,
            updated_at: ctx.now,
            version: 0,
        };
        episode.apply_metadata(&request.metadata);
        self.storage.insert_episode(txn, &episode)?;
        ctx.episode_id = Some(id);

        let applied = self.apply_plan(txn, ctx, id, &plan)?;
        let state = self.load_state(txn, id)?;

        self.audit(
            txn,
            ctx,
            Some(id),
            None,
            AuditOutcome::success(
                AuditKind::Create,
                "Episode created",
                json!({
                    "episode_number": state.episode.key.episode_number,
                    "department_code": state.episode.department_code,
                    "line_ids": applied.appended,
                    "cascaded_line_ids": line_ids(&applied.cascaded),
                }),
            ),
        )?;

        tracing::info!(
            operation_id = %ctx.operation_id,
            episode_id = id,
            lines = applied.appended.len(),
            cascaded = applied.cascaded.len(),
            "Episode created"
        );

        Ok(SubmitOutcome {
            created: true,
            cascaded_line_ids: line_ids(&applied.cascaded),
            state,
        })
    }

    fn merge_into(
        &self,
        txn: &WriteTransaction,
        ctx: &mut OperationContext,
        episode: Episode,
        request: &SubmitOrderRequest,
    ) -> ManagerResult<SubmitOutcome> {
        let incoming = adapter::canonicalize(request);
        let existing = self.storage.lines_for_episode(txn, episode.id)?;
        let plan = merge::plan(&existing, incoming);

        self.validate_codes(plan.new_item_codes())?;
        require_quantities(plan.new_lines_missing_quantity())?;

        let applied = self.apply_plan(txn, ctx, episode.id, &plan)?;

        // The cascade may have rewritten this episode; continue from storage
        let mut episode = self
            .storage
            .get_episode(txn, episode.id)?
            .ok_or_else(|| ManagerError::EpisodeNotFound(episode.id.to_string()))?;
        let metadata_changed = episode.apply_metadata(&request.metadata);
        if !metadata_changed.is_empty() || !applied.matched.is_empty() || !applied.appended.is_empty()
        {
            episode.touch(ctx.now);
            self.storage.put_episode(txn, &episode)?;
        }

        self.audit(
            txn,
            ctx,
            Some(episode.id),
            None,
            AuditOutcome::success(
                AuditKind::Update,
                "Episode merged",
                json!({
                    "matched_line_ids": applied.matched,
                    "appended_line_ids": applied.appended,
                    "cascaded_line_ids": line_ids(&applied.cascaded),
                    "metadata_changed": metadata_changed,
                }),
            ),
        )?;

        tracing::info!(
            operation_id = %ctx.operation_id,
            episode_id = episode.id,
            matched = applied.matched.len(),
            appended = applied.appended.len(),
            cascaded = applied.cascaded.len(),
            metadata_changed = metadata_changed.len(),
            "Episode merged"
        );

        let state = self.load_state(txn, episode.id)?;
        Ok(SubmitOutcome {
            created: false,
            cascaded_line_ids: line_ids(&applied.cascaded),
            state,
        })
    }

    /// Apply a validated plan: discontinue → matched → new
    fn apply_plan(
        &self,
        txn: &WriteTransaction,
        ctx: &OperationContext,
        episode_id: u64,
        plan: &merge::MergePlan,
    ) -> ManagerResult<AppliedPlan> {
        let mut applied = AppliedPlan::default();

        for identity in plan.cascade_identities() {
            let cancelled = cascade::cascade_by_identity(&self.storage, txn, identity, ctx.now)?;
            for line in cancelled {
                self.audit(
                    txn,
                    ctx,
                    Some(line.episode_id),
                    Some(line.id),
                    AuditOutcome::success(
                        AuditKind::Discontinue,
                        "Line cancelled by billing identity",
                        json!({ "billing_line_id": identity, "item_code": line.item_code }),
                    ),
                )?;
                applied.cascaded.push(line);
            }
        }
        for incoming in &plan.discontinue {
            applied
                .appended
                .push(self.append_line(txn, episode_id, incoming, ctx.now)?);
        }

        for (line_id, incoming) in &plan.matched {
            let mut line = self
                .storage
                .get_line(txn, *line_id)?
                .ok_or(ManagerError::LineNotFound(*line_id))?;
            let previous = line.status.clone();
            line.status = merge::matched_status(&line.status, incoming);
            line.touch(ctx.now);
            self.storage.put_line(txn, &line)?;
            self.audit(
                txn,
                ctx,
                Some(episode_id),
                Some(line.id),
                AuditOutcome::success(
                    AuditKind::Update,
                    "Line status updated",
                    json!({ "previous_status": previous, "status": line.status }),
                ),
            )?;
            applied.matched.push(line.id);
        }

        for incoming in &plan.new {
            applied
                .appended
                .push(self.append_line(txn, episode_id, incoming, ctx.now)?);
        }

        Ok(applied)
    }

    fn append_line(
        &self,
        txn: &WriteTransaction,
        episode_id: u64,
        incoming: &CanonicalLine,
        now: i64,
    ) -> ManagerResult<u64> {
        let id = self.storage.next_line_id(txn)?;
        let line = merge::build_line(id, episode_id, incoming, now);
        self.storage.insert_line(txn, &line)?;
        Ok(id)
    }

    fn validate_codes<'a>(&self, codes: impl IntoIterator<Item = &'a str>) -> ManagerResult<()> {
        let codes: Vec<&str> = codes.into_iter().collect();
        if codes.is_empty() {
            return Ok(());
        }
        let missing = self.catalog.missing(&codes);
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ManagerError::InvalidItemCodes(missing))
        }
    }

    // ========== Quantity Ledger ==========

    /// Record clinical use against one line
    pub fn record_used(
        &self,
        line_id: u64,
        request: RecordUsedRequest,
        actor: &Actor,
    ) -> ManagerResult<OrderLine> {
        let subject = json!({ "line_id": line_id, "quantity": request.quantity });
        let ctx = OperationContext::new(AuditKind::RecordUsed, actor, subject);
        self.execute(ctx, |txn, ctx| {
            let mut line = self.load_line(txn, line_id, request.expected_version)?;
            ctx.episode_id = Some(line.episode_id);

            ledger::apply_used(&mut line, request.quantity, ctx.now)?;
            self.storage.put_line(txn, &line)?;

            self.audit(
                txn,
                ctx,
                Some(line.episode_id),
                None,
                AuditOutcome::success(
                    AuditKind::RecordUsed,
                    "Usage recorded",
                    json!({
                        "line_id": line.id,
                        "quantity": request.quantity,
                        "qty_used_with_patient": line.qty_used_with_patient,
                        "pending_qty": line.pending_qty,
                    }),
                ),
            )?;
            tracing::info!(
                operation_id = %ctx.operation_id,
                line_id = line.id,
                quantity = request.quantity,
                pending = line.pending_qty,
                "Usage recorded"
            );
            Ok(line)
        })
    }

    /// Record a return to the cabinet against one line
    pub fn record_returned(
        &self,
        line_id: u64,
        request: RecordReturnedRequest,
        actor: &Actor,
    ) -> ManagerResult<ReturnOutcome> {
        let subject = json!({
            "line_id": line_id,
            "quantity": request.quantity,
            "reason": request.reason,
        });
        let ctx = OperationContext::new(AuditKind::RecordReturn, actor, subject);
        self.execute(ctx, |txn, ctx| {
            if request.reason.trim().is_empty() {
                return Err(ManagerError::RequiredField { field: "reason" });
            }
            let mut line = self.load_line(txn, line_id, request.expected_version)?;
            ctx.episode_id = Some(line.episode_id);

            ledger::apply_returned(&mut line, request.quantity, ctx.now)?;
            self.storage.put_line(txn, &line)?;

            let return_record = ReturnRecord {
                id: self.storage.next_return_id(txn)?,
                line_id: line.id,
                episode_id: line.episode_id,
                item_code: line.item_code.clone(),
                quantity: request.quantity,
                reason: request.reason.clone(),
                actor: ctx.actor.clone(),
                note: request.note.clone(),
                created_at: ctx.now,
            };
            self.storage.insert_return(txn, &return_record)?;

            self.audit(
                txn,
                ctx,
                Some(line.episode_id),
                None,
                AuditOutcome::success(
                    AuditKind::RecordReturn,
                    "Return recorded",
                    json!({
                        "line_id": line.id,
                        "return_id": return_record.id,
                        "quantity": request.quantity,
                        "reason": request.reason,
                        "pending_qty": line.pending_qty,
                    }),
                ),
            )?;
            tracing::info!(
                operation_id = %ctx.operation_id,
                line_id = line.id,
                return_id = return_record.id,
                quantity = request.quantity,
                "Return recorded"
            );
            Ok(ReturnOutcome {
                line,
                return_record,
            })
        })
    }

    fn load_line(
        &self,
        txn: &WriteTransaction,
        line_id: u64,
        expected_version: Option<u64>,
    ) -> ManagerResult<OrderLine> {
        let line = self
            .storage
            .get_line(txn, line_id)?
            .ok_or(ManagerError::LineNotFound(line_id))?;
        if let Some(expected) = expected_version
            && expected != line.version
        {
            return Err(ManagerError::VersionConflict {
                line_id,
                expected,
                actual: line.version,
            });
        }
        Ok(line)
    }

    // ========== Cancel Bill ==========

    /// Cancel the targeted lines of one episode and optionally rebill
    pub fn cancel_bill(
        &self,
        request: CancelBillRequest,
        actor: &Actor,
    ) -> ManagerResult<CancelBillOutcome> {
        let subject = serde_json::to_value(&request).unwrap_or_default();
        let ctx = OperationContext::new(AuditKind::Discontinue, actor, subject);
        self.execute(ctx, |txn, ctx| {
            let replacement = adapter::canonicalize_lines(&request.replacement_lines);
            self.validate_codes(replacement.iter().map(|l| l.item_code.as_str()))?;
            require_quantities(replacement.iter().filter(|l| l.quantity.unwrap_or(0) == 0))?;

            let (episode_id, target_ids) = self.resolve_cancel_targets(txn, &request)?;
            ctx.episode_id = Some(episode_id);
            if target_ids.is_empty() {
                return Err(ManagerError::NoEligibleLines);
            }

            let cancelled = cascade::cancel_lines(&self.storage, txn, &target_ids, ctx.now)?;
            if cancelled.is_empty() {
                return Err(ManagerError::NoEligibleLines);
            }
            for line in &cancelled {
                self.audit(
                    txn,
                    ctx,
                    Some(line.episode_id),
                    Some(line.id),
                    AuditOutcome::success(
                        AuditKind::Discontinue,
                        "Line cancelled by bill cancellation",
                        json!({ "billing_line_id": line.billing_line_id, "item_code": line.item_code }),
                    ),
                )?;
            }

            let mut episode = self
                .storage
                .get_episode(txn, episode_id)?
                .ok_or_else(|| ManagerError::EpisodeNotFound(episode_id.to_string()))?;
            episode.billing_status = Some(BILLING_STATUS_CANCELLED.to_string());
            episode.touch(ctx.now);
            self.storage.put_episode(txn, &episode)?;

            let new_episode = if replacement.is_empty() {
                None
            } else {
                Some(self.rebill(txn, ctx, &episode, &replacement, &request)?)
            };

            let same_day = matches!(
                (&request.old_print_date, &request.new_print_date),
                (Some(old), Some(new)) if old == new
            );
            let cancelled_line_ids = line_ids(&cancelled);

            self.audit(
                txn,
                ctx,
                Some(episode_id),
                None,
                AuditOutcome::success(
                    AuditKind::Discontinue,
                    "Bill cancelled",
                    json!({
                        "cancelled_line_ids": cancelled_line_ids,
                        "new_episode_id": new_episode.as_ref().map(|s| s.episode.id),
                        "old_print_date": request.old_print_date,
                        "new_print_date": request.new_print_date,
                        "same_day": same_day,
                    }),
                ),
            )?;
            tracing::info!(
                operation_id = %ctx.operation_id,
                episode_id,
                cancelled = cancelled_line_ids.len(),
                rebilled = new_episode.is_some(),
                same_day,
                "Bill cancelled"
            );

            Ok(CancelBillOutcome {
                cancelled_episode: self.load_state(txn, episode_id)?,
                cancelled_line_ids,
                new_episode,
                same_day,
            })
        })
    }

    /// Resolve cancel targets to one owning episode and its eligible line ids
    fn resolve_cancel_targets(
        &self,
        txn: &WriteTransaction,
        request: &CancelBillRequest,
    ) -> ManagerResult<(u64, Vec<u64>)> {
        if let Some(id) = request.episode_id
            && self.storage.get_episode(txn, id)?.is_none()
        {
            return Err(ManagerError::EpisodeNotFound(id.to_string()));
        }

        if request.targets.is_empty() {
            let id = request.episode_id.ok_or(ManagerError::RequiredField {
                field: "episode_id or targets",
            })?;
            let ids = self
                .storage
                .lines_for_episode(txn, id)?
                .iter()
                .filter(|l| !l.is_cancelled())
                .map(|l| l.id)
                .collect();
            return Ok((id, ids));
        }

        let mut owners: BTreeSet<u64> = request.episode_id.into_iter().collect();
        let mut ids = Vec::new();
        for target in &request.targets {
            match target {
                CancelTarget::Line {
                    episode_id,
                    line_id,
                } => {
                    let line = self
                        .storage
                        .get_line(txn, *line_id)?
                        .filter(|l| l.episode_id == *episode_id)
                        .ok_or(ManagerError::LineNotFound(*line_id))?;
                    owners.insert(line.episode_id);
                    if !line.is_cancelled() {
                        ids.push(line.id);
                    }
                }
                CancelTarget::Identity {
                    billing_line_id,
                    item_code,
                    quantity,
                } => {
                    let candidates: Vec<OrderLine> = self
                        .storage
                        .lines_for_identity(txn, billing_line_id)?
                        .into_iter()
                        .filter(|l| !l.is_cancelled() && l.item_code == *item_code)
                        .filter(|l| quantity.is_none_or(|q| l.ordered_qty == q))
                        .collect();
                    let scope = request
                        .episode_id
                        .or_else(|| candidates.iter().map(|l| l.episode_id).max());
                    if let Some(scope) = scope {
                        for line in candidates.iter().filter(|l| l.episode_id == scope) {
                            owners.insert(scope);
                            ids.push(line.id);
                        }
                    }
                }
            }
        }

        let mut owners = owners.into_iter();
        match (owners.next(), owners.next()) {
            (Some(id), None) => Ok((id, ids)),
            (None, _) => Err(ManagerError::EpisodeNotFound(
                "no target episode could be resolved".to_string(),
            )),
            (Some(first), Some(second)) => {
                let mut all = vec![first, second];
                all.extend(owners);
                Err(ManagerError::TargetsSpanEpisodes(all))
            }
        }
    }

    /// New episode with the same natural key carrying the replacement lines
    fn rebill(
        &self,
        txn: &WriteTransaction,
        ctx: &OperationContext,
        cancelled: &Episode,
        replacement: &[CanonicalLine],
        request: &CancelBillRequest,
    ) -> ManagerResult<EpisodeState> {
        let id = self.storage.next_episode_id(txn)?;
        let episode = Episode {
            id,
            hospital_id: cancelled.hospital_id.clone(),
            key: cancelled.key.clone(),
            department_code: cancelled.department_code.clone(),
            usage_type: cancelled.usage_type,
            billing_status: None,
            total_amount: None,
            paid_amount: None,
            print_date: request.new_print_date.clone(),
            print_time: None,
            created_at: ctx.now,
            updated_at: ctx.now,
            version: 0,
        };
        self.storage.insert_episode(txn, &episode)?;

        for incoming in replacement {
            let line_id = self.storage.next_line_id(txn)?;
            let mut line = merge::build_line(line_id, id, incoming, ctx.now);
            line.status = LineStatus::Verified;
            self.storage.insert_line(txn, &line)?;
        }

        self.load_state(txn, id)
    }

    // ========== Cabinet ==========

    pub fn register_unit(
        &self,
        request: RegisterUnitRequest,
        actor: &Actor,
    ) -> ManagerResult<CabinetStockUnit> {
        let subject = json!({ "rfid": request.rfid, "item_code": request.item_code });
        let ctx = OperationContext::new(AuditKind::Create, actor, subject);
        self.execute(ctx, |txn, ctx| {
            let unit = cabinet::register(
                &self.storage,
                txn,
                &request.rfid,
                &request.item_code,
                &ctx.actor,
                ctx.now,
            )?;
            self.audit_unit(txn, ctx, &unit, "Stock unit registered")?;
            Ok(unit)
        })
    }

    pub fn dispense_unit(&self, rfid: &str, actor: &Actor) -> ManagerResult<CabinetStockUnit> {
        let ctx = OperationContext::new(AuditKind::Update, actor, json!({ "rfid": rfid }));
        self.execute(ctx, |txn, ctx| {
            let unit = cabinet::dispense(&self.storage, txn, rfid, &ctx.actor, ctx.now)?;
            self.audit_unit(txn, ctx, &unit, "Stock unit dispensed")?;
            Ok(unit)
        })
    }

    pub fn return_unit(&self, rfid: &str, actor: &Actor) -> ManagerResult<CabinetStockUnit> {
        let ctx = OperationContext::new(AuditKind::Update, actor, json!({ "rfid": rfid }));
        self.execute(ctx, |txn, ctx| {
            let unit = cabinet::return_unit(&self.storage, txn, rfid, &ctx.actor, ctx.now)?;
            self.audit_unit(txn, ctx, &unit, "Stock unit returned")?;
            Ok(unit)
        })
    }

    fn audit_unit(
        &self,
        txn: &WriteTransaction,
        ctx: &OperationContext,
        unit: &CabinetStockUnit,
        message: &str,
    ) -> ManagerResult<()> {
        self.audit(
            txn,
            ctx,
            None,
            None,
            AuditOutcome::success(
                ctx.kind,
                message,
                json!({ "rfid": unit.rfid, "item_code": unit.item_code, "state": unit.state }),
            ),
        )?;
        tracing::info!(
            operation_id = %ctx.operation_id,
            rfid = %unit.rfid,
            state = ?unit.state,
            "{message}"
        );
        Ok(())
    }

    /// Journal a request rejected before it reached an operation
    ///
    /// Writes one ERROR entry of `kind` and hands `err` back for rendering.
    pub fn record_rejected(
        &self,
        kind: AuditKind,
        actor: &Actor,
        subject: serde_json::Value,
        err: ManagerError,
    ) -> ManagerError {
        let ctx = OperationContext::new(kind, actor, subject);
        self.record_failure(&ctx, &err);
        err
    }

    // ========== Read Paths ==========

    pub fn get_episode(&self, episode_id: u64) -> ManagerResult<EpisodeState> {
        self.storage
            .read_episode_state(episode_id)?
            .ok_or_else(|| ManagerError::EpisodeNotFound(episode_id.to_string()))
    }

    pub fn get_variance(&self, query: &VarianceQuery) -> ManagerResult<Vec<VarianceRow>> {
        Ok(variance::report(&self.storage, query)?)
    }

    pub fn returns_for_line(&self, line_id: u64) -> ManagerResult<Vec<ReturnRecord>> {
        self.storage
            .read_returns_for_line(line_id)?
            .ok_or(ManagerError::LineNotFound(line_id))
    }

    pub fn verify_audit_chain(&self) -> ManagerResult<AuditChainVerification> {
        let txn = self.storage.begin_read()?;
        Ok(self.journal.verify_chain(&txn)?)
    }

    pub fn audit_entries(&self, operation_id: &str) -> ManagerResult<Vec<AuditEntry>> {
        let txn = self.storage.begin_read()?;
        Ok(self.journal.entries_for_operation(&txn, operation_id)?)
    }

    pub fn recent_audit(&self, limit: usize) -> ManagerResult<Vec<AuditEntry>> {
        let txn = self.storage.begin_read()?;
        Ok(self.journal.recent(&txn, limit)?)
    }

    // ========== Transaction & Audit Plumbing ==========

    /// Run `op` in one write transaction; journal the failure if it fails
    fn execute<T>(
        &self,
        mut ctx: OperationContext,
        op: impl FnOnce(&WriteTransaction, &mut OperationContext) -> ManagerResult<T>,
    ) -> ManagerResult<T> {
        let result = self
            .storage
            .begin_write()
            .map_err(ManagerError::from)
            .and_then(|txn| match op(&txn, &mut ctx) {
                Ok(value) => {
                    txn.commit().map_err(StorageError::from)?;
                    Ok(value)
                }
                Err(err) => {
                    if let Err(e) = txn.abort() {
                        tracing::warn!(error = %e, "Failed to abort transaction");
                    }
                    Err(err)
                }
            });

        if let Err(err) = &result {
            self.record_failure(&ctx, err);
        }
        result
    }

    fn audit(
        &self,
        txn: &WriteTransaction,
        ctx: &OperationContext,
        episode_id: Option<u64>,
        line_id: Option<u64>,
        outcome: AuditOutcome,
    ) -> ManagerResult<AuditEntry> {
        let record = ctx.record(episode_id, line_id, outcome);
        Ok(self.journal.append(txn, record, ctx.now)?)
    }

    /// One ERROR entry in its own transaction
    fn record_failure(&self, ctx: &OperationContext, err: &ManagerError) {
        tracing::warn!(
            operation_id = %ctx.operation_id,
            kind = %ctx.kind,
            actor = %ctx.actor,
            error = %err,
            "Operation rejected"
        );

        let outcome = AuditOutcome::error(
            ctx.kind,
            err.to_string(),
            json!({
                "code": err.code().code(),
                "error": err.detail(),
                "request": ctx.subject,
            }),
        );
        let record = ctx.record(ctx.episode_id, None, outcome);

        let written = self.storage.begin_write().and_then(|txn| {
            self.journal.append(&txn, record, now_millis())?;
            txn.commit()?;
            Ok(())
        });
        if let Err(e) = written {
            tracing::error!(
                operation_id = %ctx.operation_id,
                error = %e,
                "Failed to journal rejected operation"
            );
        }
    }

    fn load_state(&self, txn: &WriteTransaction, episode_id: u64) -> ManagerResult<EpisodeState> {
        self.storage
            .episode_state(txn, episode_id)?
            .ok_or_else(|| ManagerError::EpisodeNotFound(episode_id.to_string()))
    }
}

/// Reject lines that were about to be appended without a positive quantity
fn require_quantities<'a>(
    offending: impl IntoIterator<Item = &'a CanonicalLine>,
) -> ManagerResult<()> {
    let missing: Vec<String> = offending
        .into_iter()
        .map(|l| l.item_code.clone())
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(ManagerError::QuantityRequired(missing))
    }
}

fn line_ids(lines: &[OrderLine]) -> Vec<u64> {
    lines.iter().map(|l| l.id).collect()
}

#[cfg(test)]
mod tests;
