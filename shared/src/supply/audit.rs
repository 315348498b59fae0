//! Audit journal records
//!
//! The serialized `outcome` is the one persisted format external tooling
//! reads: a tagged record whose `type` is one of
//! `CREATE | QUERY | UPDATE | DISCONTINUE | RECORD_USED | RECORD_RETURN | DELETE`
//! and whose `status` is `SUCCESS | ERROR`.

use super::actor::Actor;
use serde::{Deserialize, Serialize};

/// Operation kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditKind {
    Create,
    Query,
    Update,
    Discontinue,
    RecordUsed,
    RecordReturn,
    Delete,
}

impl std::fmt::Display for AuditKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Create => "CREATE",
            Self::Query => "QUERY",
            Self::Update => "UPDATE",
            Self::Discontinue => "DISCONTINUE",
            Self::RecordUsed => "RECORD_USED",
            Self::RecordReturn => "RECORD_RETURN",
            Self::Delete => "DELETE",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditStatus {
    Success,
    Error,
}

/// Structured outcome of one operation (or of one line touched by it)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuditOutcome {
    #[serde(rename = "type")]
    pub kind: AuditKind,
    pub status: AuditStatus,
    pub message: String,
    /// Operation-specific detail
    #[serde(default)]
    pub detail: serde_json::Value,
}

impl AuditOutcome {
    pub fn success(kind: AuditKind, message: impl Into<String>, detail: serde_json::Value) -> Self {
        Self {
            kind,
            status: AuditStatus::Success,
            message: message.into(),
            detail,
        }
    }

    pub fn error(kind: AuditKind, message: impl Into<String>, detail: serde_json::Value) -> Self {
        Self {
            kind,
            status: AuditStatus::Error,
            message: message.into(),
            detail,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == AuditStatus::Success
    }
}

/// Audit journal entry (immutable)
///
/// Entries form a SHA-256 chain: `curr_hash` covers `prev_hash` and every
/// other field, so any edit or deletion breaks verification.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuditEntry {
    /// Global sequence number, starting at 1
    pub sequence: u64,
    /// Shared by every entry one operation writes
    pub operation_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub episode_id: Option<u64>,
    /// `None` on the operation-level entry
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_id: Option<u64>,
    pub actor: Actor,
    pub outcome: AuditOutcome,
    /// Unix millis
    pub timestamp: i64,
    pub prev_hash: String,
    pub curr_hash: String,
}

impl AuditEntry {
    pub fn is_operation_level(&self) -> bool {
        self.line_id.is_none()
    }
}

/// Chain verification result
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuditChainVerification {
    pub total_entries: u64,
    pub chain_intact: bool,
    pub breaks: Vec<AuditChainBreak>,
}

/// Which link of the chain failed
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChainBreakKind {
    /// `prev_hash` does not equal the previous entry's `curr_hash`
    PrevHashMismatch,
    /// Stored `curr_hash` does not match the entry's recomputed hash
    HashMismatch,
}

/// One broken link
///
/// For `PREV_HASH_MISMATCH` the hashes compare `prev_hash`; for
/// `HASH_MISMATCH`, `expected_hash` is the recomputed hash and `actual_hash`
/// the stored `curr_hash`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuditChainBreak {
    pub sequence: u64,
    pub kind: ChainBreakKind,
    pub expected_hash: String,
    pub actual_hash: String,
}
