//! Supply reconciliation domain
//!
//! This module provides the types exchanged with the reconciliation engine:
//! - Episodes and their natural key
//! - Order lines with quantity bookkeeping and derived lifecycle
//! - Submission, use/return and cancel-bill payloads
//! - Return records, cabinet stock units and variance rows
//! - Audit journal records

pub mod actor;
pub mod audit;
pub mod cabinet;
pub mod episode;
pub mod input;
pub mod line;
pub mod returns;
pub mod variance;

// Re-exports
pub use actor::Actor;
pub use audit::{
    AuditChainBreak, AuditChainVerification, AuditEntry, AuditKind, AuditOutcome, AuditStatus,
    ChainBreakKind,
};
pub use cabinet::{CabinetStockUnit, RegisterUnitRequest, StockState};
pub use episode::{
    BILLING_STATUS_CANCELLED, Episode, EpisodeKey, EpisodeMetadata, EpisodeState, UsageType,
};
pub use input::{
    CancelBillOutcome, CancelBillRequest, CancelTarget, OrderLineInput, RecordReturnedRequest,
    RecordUsedRequest, ReturnOutcome, SubmitOrderRequest, SubmitOutcome, SupplyItemInput,
};
pub use line::{DISCONTINUE, LifecycleStatus, LineStatus, OrderLine, VERIFIED};
pub use returns::ReturnRecord;
pub use variance::{VarianceClass, VarianceQuery, VarianceRow};
