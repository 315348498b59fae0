//! Audit journal - tamper-evident record of every operation
//!
//! # Architecture
//!
//! ```text
//! operation succeeds ── entries appended inside the operation's write txn
//! operation fails    ── txn aborted ── one ERROR entry in its own write txn
//!
//! SHA256 hash chain: genesis → entry₁ → entry₂ → ... → entryₙ
//! ```
//!
//! # Guarantees
//!
//! - **One operation-level entry per operation** (`line_id = None`), success
//!   or failure
//! - **Per-line entries** (cascade cancellations, status updates) share the
//!   operation's `operation_id`
//! - **Append-only**: no update or delete path
//! - **Chain verification** available at any time

pub mod storage;

pub use storage::{AuditJournal, AuditRecord, GENESIS_HASH};
