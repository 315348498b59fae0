//! Audit journal redb storage
//!
//! Append-only: there is no update or delete path. Entries are linked by a
//! SHA256 hash chain so tampering is detectable.

use crate::reconcile::storage::{StorageError, StorageResult};
use redb::{ReadTransaction, ReadableTable, TableDefinition, WriteTransaction};
use sha2::{Digest, Sha256};
use shared::supply::{
    Actor, AuditChainBreak, AuditChainVerification, AuditEntry, AuditOutcome, ChainBreakKind,
};

/// Journal: key = sequence, value = JSON-serialized AuditEntry
const AUDIT_TABLE: TableDefinition<u64, &[u8]> = TableDefinition::new("audit_journal");

/// Entries per operation: key = (operation_id, sequence)
const AUDIT_OPERATIONS_TABLE: TableDefinition<(&str, u64), ()> =
    TableDefinition::new("audit_operations");

/// `prev_hash` of the first entry
pub const GENESIS_HASH: &str = "genesis";

/// Everything an entry carries before it is sequenced and hashed
#[derive(Debug, Clone)]
pub struct AuditRecord {
    pub operation_id: String,
    pub episode_id: Option<u64>,
    pub line_id: Option<u64>,
    pub actor: Actor,
    pub outcome: AuditOutcome,
}

/// Append-only journal over the shared redb database
#[derive(Debug, Clone, Copy, Default)]
pub struct AuditJournal;

impl AuditJournal {
    /// Create journal tables (called once when the database opens)
    pub fn init_tables(txn: &WriteTransaction) -> StorageResult<()> {
        let _ = txn.open_table(AUDIT_TABLE)?;
        let _ = txn.open_table(AUDIT_OPERATIONS_TABLE)?;
        Ok(())
    }

    /// Append one entry inside the caller's transaction
    ///
    /// The entry commits or vanishes together with the transaction. redb's
    /// single writer serializes appends, so reading the tail here is race-free.
    pub fn append(
        &self,
        txn: &WriteTransaction,
        record: AuditRecord,
        timestamp: i64,
    ) -> StorageResult<AuditEntry> {
        let mut table = txn.open_table(AUDIT_TABLE)?;

        let (sequence, prev_hash) = match table.last()? {
            Some((key, value)) => {
                let last: AuditEntry = serde_json::from_slice(value.value())?;
                (key.value() + 1, last.curr_hash)
            }
            None => (1, GENESIS_HASH.to_string()),
        };

        let mut entry = AuditEntry {
            sequence,
            operation_id: record.operation_id,
            episode_id: record.episode_id,
            line_id: record.line_id,
            actor: record.actor,
            outcome: record.outcome,
            timestamp,
            prev_hash,
            curr_hash: String::new(),
        };
        entry.curr_hash = compute_audit_hash(&entry)?;

        let value = serde_json::to_vec(&entry)?;
        table.insert(sequence, value.as_slice())?;

        let mut index = txn.open_table(AUDIT_OPERATIONS_TABLE)?;
        index.insert((entry.operation_id.as_str(), sequence), ())?;

        Ok(entry)
    }

    /// Re-hash the whole journal and report every break
    pub fn verify_chain(&self, txn: &ReadTransaction) -> StorageResult<AuditChainVerification> {
        let table = txn.open_table(AUDIT_TABLE)?;

        let mut total_entries = 0u64;
        let mut breaks = Vec::new();
        let mut expected_prev = GENESIS_HASH.to_string();

        for result in table.iter()? {
            let (_key, value) = result?;
            let entry: AuditEntry = serde_json::from_slice(value.value())?;
            total_entries += 1;

            if entry.prev_hash != expected_prev {
                breaks.push(AuditChainBreak {
                    sequence: entry.sequence,
                    kind: ChainBreakKind::PrevHashMismatch,
                    expected_hash: expected_prev.clone(),
                    actual_hash: entry.prev_hash.clone(),
                });
            }

            let recomputed = compute_audit_hash(&entry)?;
            if recomputed != entry.curr_hash {
                breaks.push(AuditChainBreak {
                    sequence: entry.sequence,
                    kind: ChainBreakKind::HashMismatch,
                    expected_hash: recomputed,
                    actual_hash: entry.curr_hash.clone(),
                });
            }

            expected_prev = entry.curr_hash;
        }

        Ok(AuditChainVerification {
            total_entries,
            chain_intact: breaks.is_empty(),
            breaks,
        })
    }

    /// Every entry written by one operation, in sequence order
    pub fn entries_for_operation(
        &self,
        txn: &ReadTransaction,
        operation_id: &str,
    ) -> StorageResult<Vec<AuditEntry>> {
        let index = txn.open_table(AUDIT_OPERATIONS_TABLE)?;
        let table = txn.open_table(AUDIT_TABLE)?;

        let mut entries = Vec::new();
        for result in index.range((operation_id, 0u64)..=(operation_id, u64::MAX))? {
            let (key, _value) = result?;
            let sequence = key.value().1;
            let guard = table.get(sequence)?.ok_or(StorageError::DanglingIndex {
                table: "audit_operations",
                id: sequence,
            })?;
            entries.push(serde_json::from_slice(guard.value())?);
        }
        Ok(entries)
    }

    /// The most recent `limit` entries, oldest first
    pub fn recent(&self, txn: &ReadTransaction, limit: usize) -> StorageResult<Vec<AuditEntry>> {
        let table = txn.open_table(AUDIT_TABLE)?;
        let mut entries = Vec::new();
        for result in table.iter()?.rev().take(limit) {
            let (_key, value) = result?;
            entries.push(serde_json::from_slice(value.value())?);
        }
        entries.reverse();
        Ok(entries)
    }
}

/// SHA256 over every stored field except `curr_hash`
///
/// - Variable-length fields are `\x00`-terminated so `("ab","cd")` and
///   `("abc","d")` hash differently
/// - Fixed-width integers are little-endian
/// - Optional fields carry a tag byte (`\x00` = None, `\x01` = Some)
fn compute_audit_hash(entry: &AuditEntry) -> StorageResult<String> {
    let mut hasher = Sha256::new();

    hasher.update(entry.prev_hash.as_bytes());
    hasher.update(b"\x00");

    hasher.update(entry.sequence.to_le_bytes());
    hasher.update(entry.timestamp.to_le_bytes());

    hasher.update(entry.operation_id.as_bytes());
    hasher.update(b"\x00");

    hash_optional(&mut hasher, entry.episode_id);
    hash_optional(&mut hasher, entry.line_id);

    hasher.update(entry.actor.as_str().as_bytes());
    hasher.update(b"\x00");

    let outcome_json = serde_json::to_string(&entry.outcome)?;
    hasher.update(outcome_json.as_bytes());
    hasher.update(b"\x00");

    Ok(hex::encode(hasher.finalize()))
}

fn hash_optional(hasher: &mut Sha256, value: Option<u64>) {
    match value {
        Some(v) => {
            hasher.update(b"\x01");
            hasher.update(v.to_le_bytes());
        }
        None => hasher.update(b"\x00"),
    }
}
