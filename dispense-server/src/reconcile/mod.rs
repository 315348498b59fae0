//! Reconciliation engine
//!
//! ```text
//! submission ─► adapter ─► resolver ─► merge ─► cascade ─► storage
//!                                                  │
//! use/return ─► ledger ────────────────────────────┤
//!                                                  ▼
//!                                            audit journal
//! ```
//!
//! Everything is driven through [`ReconciliationManager`]; the other modules
//! are pure functions over a redb transaction.

pub mod adapter;
pub mod cascade;
pub mod ledger;
pub mod manager;
pub mod merge;
pub mod resolver;
pub mod storage;
pub mod variance;

pub use manager::{ErrorKind, ManagerError, ManagerResult, ReconciliationManager};
pub use storage::{StorageError, StorageResult, SupplyStorage};
