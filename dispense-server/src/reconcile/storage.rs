//! redb-based storage layer for supply reconciliation
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `episodes` | `episode_id` | `Episode` | Episode records |
//! | `episode_keys` | `(episode_number, patient_id, first_name, last_name, episode_id)` | `()` | Natural-key index |
//! | `order_lines` | `line_id` | `OrderLine` | Order lines |
//! | `episode_lines` | `(episode_id, line_id)` | `()` | Lines per episode |
//! | `identity_lines` | `(billing_line_id, line_id)` | `()` | Cascade index |
//! | `item_lines` | `(item_code, line_id)` | `()` | Variance index |
//! | `return_records` | `return_id` | `ReturnRecord` | Return log (append-only) |
//! | `item_returns` | `(item_code, return_id)` | `()` | Variance index |
//! | `line_returns` | `(line_id, return_id)` | `()` | Returns per line |
//! | `stock_units` | `rfid` | `CabinetStockUnit` | Cabinet flags |
//! | `sequence_counter` | `name` | `u64` | Id allocation |
//!
//! Audit journal tables are owned by [`crate::audit`] and created here so a
//! single write transaction can cover both.
//!
//! # Transactions
//!
//! Every mutating method takes `&WriteTransaction`; callers compose one
//! transaction per operation. redb allows a single writer at a time, so any
//! read made through the write transaction observes current committed state.

use crate::audit::AuditJournal;
use redb::{
    Database, ReadTransaction, ReadableDatabase, ReadableTable, TableDefinition, WriteTransaction,
};
use shared::supply::{CabinetStockUnit, Episode, EpisodeKey, EpisodeState, OrderLine, ReturnRecord};
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Episodes: key = episode_id, value = JSON-serialized Episode
const EPISODES_TABLE: TableDefinition<u64, &[u8]> = TableDefinition::new("episodes");

/// Natural-key index: one tuple element per key field, then episode_id
const EPISODE_KEYS_TABLE: TableDefinition<(&str, &str, &str, &str, u64), ()> =
    TableDefinition::new("episode_keys");

/// Order lines: key = line_id, value = JSON-serialized OrderLine
const LINES_TABLE: TableDefinition<u64, &[u8]> = TableDefinition::new("order_lines");

/// Lines per episode: key = (episode_id, line_id)
const EPISODE_LINES_TABLE: TableDefinition<(u64, u64), ()> = TableDefinition::new("episode_lines");

/// Lines per billing identity: key = (billing_line_id, line_id)
const IDENTITY_LINES_TABLE: TableDefinition<(&str, u64), ()> =
    TableDefinition::new("identity_lines");

/// Lines per item code: key = (item_code, line_id)
const ITEM_LINES_TABLE: TableDefinition<(&str, u64), ()> = TableDefinition::new("item_lines");

/// Return records: key = return_id, value = JSON-serialized ReturnRecord
const RETURNS_TABLE: TableDefinition<u64, &[u8]> = TableDefinition::new("return_records");

/// Returns per item code: key = (item_code, return_id)
const ITEM_RETURNS_TABLE: TableDefinition<(&str, u64), ()> = TableDefinition::new("item_returns");

/// Returns per line: key = (line_id, return_id)
const LINE_RETURNS_TABLE: TableDefinition<(u64, u64), ()> = TableDefinition::new("line_returns");

/// Cabinet stock units: key = rfid, value = JSON-serialized CabinetStockUnit
const STOCK_UNITS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("stock_units");

/// Id counters: key = entity name, value = last allocated id
const SEQUENCE_TABLE: TableDefinition<&str, u64> = TableDefinition::new("sequence_counter");

const EPISODE_SEQ: &str = "episode";
const LINE_SEQ: &str = "line";
const RETURN_SEQ: &str = "return";

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Dangling index entry: {table} -> {id}")]
    DanglingIndex { table: &'static str, id: u64 },
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Supply storage backed by redb
#[derive(Clone)]
pub struct SupplyStorage {
    db: Arc<Database>,
}

impl std::fmt::Debug for SupplyStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupplyStorage").finish_non_exhaustive()
    }
}

impl SupplyStorage {
    /// Open or create the database at the given path
    ///
    /// redb commits with `Durability::Immediate` by default: a commit is
    /// persistent once `commit()` returns and the file is always consistent.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let db = Database::create(path)?;
        Self::initialize(db)
    }

    /// Open an in-memory database
    pub fn open_in_memory() -> StorageResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        Self::initialize(db)
    }

    fn initialize(db: Database) -> StorageResult<Self> {
        let write_txn = db.begin_write()?;
        {
            // Create all tables if they don't exist
            let _ = write_txn.open_table(EPISODES_TABLE)?;
            let _ = write_txn.open_table(EPISODE_KEYS_TABLE)?;
            let _ = write_txn.open_table(LINES_TABLE)?;
            let _ = write_txn.open_table(EPISODE_LINES_TABLE)?;
            let _ = write_txn.open_table(IDENTITY_LINES_TABLE)?;
            let _ = write_txn.open_table(ITEM_LINES_TABLE)?;
            let _ = write_txn.open_table(RETURNS_TABLE)?;
            let _ = write_txn.open_table(ITEM_RETURNS_TABLE)?;
            let _ = write_txn.open_table(LINE_RETURNS_TABLE)?;
            let _ = write_txn.open_table(STOCK_UNITS_TABLE)?;
            let _ = write_txn.open_table(SEQUENCE_TABLE)?;
            AuditJournal::init_tables(&write_txn)?;
        }
        write_txn.commit()?;

        Ok(Self { db: Arc::new(db) })
    }

    /// Begin a write transaction
    pub fn begin_write(&self) -> StorageResult<WriteTransaction> {
        Ok(self.db.begin_write()?)
    }

    /// Begin a read transaction
    pub fn begin_read(&self) -> StorageResult<ReadTransaction> {
        Ok(self.db.begin_read()?)
    }

    // ========== Id Allocation ==========

    fn next_id(&self, txn: &WriteTransaction, name: &str) -> StorageResult<u64> {
        let mut table = txn.open_table(SEQUENCE_TABLE)?;
        let current = table.get(name)?.map(|guard| guard.value()).unwrap_or(0);
        let next = current + 1;
        table.insert(name, next)?;
        Ok(next)
    }

    pub fn next_episode_id(&self, txn: &WriteTransaction) -> StorageResult<u64> {
        self.next_id(txn, EPISODE_SEQ)
    }

    pub fn next_line_id(&self, txn: &WriteTransaction) -> StorageResult<u64> {
        self.next_id(txn, LINE_SEQ)
    }

    pub fn next_return_id(&self, txn: &WriteTransaction) -> StorageResult<u64> {
        self.next_id(txn, RETURN_SEQ)
    }

    // ========== Episode Operations ==========

    /// Insert a new episode and index its natural key
    pub fn insert_episode(&self, txn: &WriteTransaction, episode: &Episode) -> StorageResult<()> {
        self.put_episode(txn, episode)?;
        let mut index = txn.open_table(EPISODE_KEYS_TABLE)?;
        let key = &episode.key;
        index.insert(
            (
                key.episode_number.as_str(),
                key.patient_id.as_str(),
                key.first_name.as_str(),
                key.last_name.as_str(),
                episode.id,
            ),
            (),
        )?;
        Ok(())
    }

    /// Store an episode (the natural key never changes after insert)
    pub fn put_episode(&self, txn: &WriteTransaction, episode: &Episode) -> StorageResult<()> {
        let mut table = txn.open_table(EPISODES_TABLE)?;
        let value = serde_json::to_vec(episode)?;
        table.insert(episode.id, value.as_slice())?;
        Ok(())
    }

    pub fn get_episode(&self, txn: &WriteTransaction, id: u64) -> StorageResult<Option<Episode>> {
        let table = txn.open_table(EPISODES_TABLE)?;
        get_json(&table, id)
    }

    /// Ids of every episode with this natural key, ascending
    pub fn episode_ids_for_key(
        &self,
        txn: &WriteTransaction,
        key: &EpisodeKey,
    ) -> StorageResult<Vec<u64>> {
        let table = txn.open_table(EPISODE_KEYS_TABLE)?;
        let fields = (
            key.episode_number.as_str(),
            key.patient_id.as_str(),
            key.first_name.as_str(),
            key.last_name.as_str(),
        );
        let lower = (fields.0, fields.1, fields.2, fields.3, 0u64);
        let upper = (fields.0, fields.1, fields.2, fields.3, u64::MAX);
        let mut ids = Vec::new();
        for result in table.range(lower..=upper)? {
            let (entry, _value) = result?;
            ids.push(entry.value().4);
        }
        Ok(ids)
    }

    /// Episode with all its lines (read transaction)
    pub fn read_episode_state(&self, id: u64) -> StorageResult<Option<EpisodeState>> {
        let read_txn = self.db.begin_read()?;
        let episodes = read_txn.open_table(EPISODES_TABLE)?;
        let Some(episode) = get_json::<Episode>(&episodes, id)? else {
            return Ok(None);
        };
        let index = read_txn.open_table(EPISODE_LINES_TABLE)?;
        let lines_table = read_txn.open_table(LINES_TABLE)?;
        let lines = load_lines(&lines_table, &child_ids(&index, id)?, "episode_lines")?;
        Ok(Some(EpisodeState { episode, lines }))
    }

    /// Episode with all its lines (inside a write transaction)
    pub fn episode_state(
        &self,
        txn: &WriteTransaction,
        id: u64,
    ) -> StorageResult<Option<EpisodeState>> {
        let Some(episode) = self.get_episode(txn, id)? else {
            return Ok(None);
        };
        let lines = self.lines_for_episode(txn, id)?;
        Ok(Some(EpisodeState { episode, lines }))
    }

    // ========== Order Line Operations ==========

    /// Insert a new line and maintain the episode, identity and item indexes
    pub fn insert_line(&self, txn: &WriteTransaction, line: &OrderLine) -> StorageResult<()> {
        self.put_line(txn, line)?;
        {
            let mut table = txn.open_table(EPISODE_LINES_TABLE)?;
            table.insert((line.episode_id, line.id), ())?;
        }
        if let Some(identity) = line.billing_line_id.as_deref() {
            let mut table = txn.open_table(IDENTITY_LINES_TABLE)?;
            table.insert((identity, line.id), ())?;
        }
        let mut table = txn.open_table(ITEM_LINES_TABLE)?;
        table.insert((line.item_code.as_str(), line.id), ())?;
        Ok(())
    }

    /// Store a line (identity, item code and episode never change after insert)
    pub fn put_line(&self, txn: &WriteTransaction, line: &OrderLine) -> StorageResult<()> {
        let mut table = txn.open_table(LINES_TABLE)?;
        let value = serde_json::to_vec(line)?;
        table.insert(line.id, value.as_slice())?;
        Ok(())
    }

    pub fn get_line(&self, txn: &WriteTransaction, id: u64) -> StorageResult<Option<OrderLine>> {
        let table = txn.open_table(LINES_TABLE)?;
        get_json(&table, id)
    }

    /// All lines of an episode, ordered by id
    pub fn lines_for_episode(
        &self,
        txn: &WriteTransaction,
        episode_id: u64,
    ) -> StorageResult<Vec<OrderLine>> {
        let index = txn.open_table(EPISODE_LINES_TABLE)?;
        let ids = child_ids(&index, episode_id)?;
        let table = txn.open_table(LINES_TABLE)?;
        load_lines(&table, &ids, "episode_lines")
    }

    /// Every line in the system sharing a billing identity, ordered by id
    pub fn lines_for_identity(
        &self,
        txn: &WriteTransaction,
        identity: &str,
    ) -> StorageResult<Vec<OrderLine>> {
        let index = txn.open_table(IDENTITY_LINES_TABLE)?;
        let ids = index_ids(&index, identity)?;
        let table = txn.open_table(LINES_TABLE)?;
        load_lines(&table, &ids, "identity_lines")
    }

    // ========== Return Records ==========

    /// Append a return record (never updated afterwards)
    pub fn insert_return(&self, txn: &WriteTransaction, record: &ReturnRecord) -> StorageResult<()> {
        {
            let mut table = txn.open_table(RETURNS_TABLE)?;
            let value = serde_json::to_vec(record)?;
            table.insert(record.id, value.as_slice())?;
        }
        {
            let mut index = txn.open_table(ITEM_RETURNS_TABLE)?;
            index.insert((record.item_code.as_str(), record.id), ())?;
        }
        let mut index = txn.open_table(LINE_RETURNS_TABLE)?;
        index.insert((record.line_id, record.id), ())?;
        Ok(())
    }

    /// Return records for one line, oldest first; `None` if the line does not exist
    pub fn read_returns_for_line(&self, line_id: u64) -> StorageResult<Option<Vec<ReturnRecord>>> {
        let read_txn = self.db.begin_read()?;
        let lines = read_txn.open_table(LINES_TABLE)?;
        if lines.get(line_id)?.is_none() {
            return Ok(None);
        }
        let index = read_txn.open_table(LINE_RETURNS_TABLE)?;
        let table = read_txn.open_table(RETURNS_TABLE)?;
        let mut records = Vec::new();
        for id in child_ids(&index, line_id)? {
            let record: ReturnRecord = get_json(&table, id)?.ok_or(StorageError::DanglingIndex {
                table: "line_returns",
                id,
            })?;
            records.push(record);
        }
        Ok(Some(records))
    }

    // ========== Cabinet Stock Units ==========

    pub fn put_stock_unit(&self, txn: &WriteTransaction, unit: &CabinetStockUnit) -> StorageResult<()> {
        let mut table = txn.open_table(STOCK_UNITS_TABLE)?;
        let value = serde_json::to_vec(unit)?;
        table.insert(unit.rfid.as_str(), value.as_slice())?;
        Ok(())
    }

    pub fn get_stock_unit(
        &self,
        txn: &WriteTransaction,
        rfid: &str,
    ) -> StorageResult<Option<CabinetStockUnit>> {
        let table = txn.open_table(STOCK_UNITS_TABLE)?;
        match table.get(rfid)? {
            Some(guard) => Ok(Some(serde_json::from_slice(guard.value())?)),
            None => Ok(None),
        }
    }

    // ========== Variance Reads ==========

    /// Consistent snapshot of everything the variance reporter needs
    pub fn read_variance_inputs(&self, item_code: Option<&str>) -> StorageResult<VarianceInputs> {
        let read_txn = self.db.begin_read()?;

        let mut units = Vec::new();
        let stock = read_txn.open_table(STOCK_UNITS_TABLE)?;
        for result in stock.iter()? {
            let (_key, value) = result?;
            let unit: CabinetStockUnit = serde_json::from_slice(value.value())?;
            if item_code.is_none_or(|code| unit.item_code == code) {
                units.push(unit);
            }
        }

        let item_lines = read_txn.open_table(ITEM_LINES_TABLE)?;
        let item_returns = read_txn.open_table(ITEM_RETURNS_TABLE)?;
        let codes: BTreeSet<String> = match item_code {
            Some(code) => BTreeSet::from([code.to_string()]),
            None => {
                let mut codes = index_prefixes(&item_lines)?;
                codes.extend(index_prefixes(&item_returns)?);
                codes
            }
        };

        let lines_table = read_txn.open_table(LINES_TABLE)?;
        let returns_table = read_txn.open_table(RETURNS_TABLE)?;
        let mut lines = Vec::new();
        let mut returns = Vec::new();
        for code in &codes {
            let line_ids = index_ids(&item_lines, code)?;
            lines.extend(load_lines(&lines_table, &line_ids, "item_lines")?);
            for id in index_ids(&item_returns, code)? {
                let record: ReturnRecord = get_json(&returns_table, id)?
                    .ok_or(StorageError::DanglingIndex {
                        table: "item_returns",
                        id,
                    })?;
                returns.push(record);
            }
        }

        Ok(VarianceInputs {
            units,
            lines,
            returns,
        })
    }
}

/// Raw rows behind one variance report
#[derive(Debug, Default)]
pub struct VarianceInputs {
    pub units: Vec<CabinetStockUnit>,
    pub lines: Vec<OrderLine>,
    pub returns: Vec<ReturnRecord>,
}

// ========== Table helpers (shared by read and write transactions) ==========

fn get_json<T: serde::de::DeserializeOwned>(
    table: &impl ReadableTable<u64, &'static [u8]>,
    id: u64,
) -> StorageResult<Option<T>> {
    match table.get(id)? {
        Some(guard) => Ok(Some(serde_json::from_slice(guard.value())?)),
        None => Ok(None),
    }
}

/// Ids stored under one string prefix of a `(prefix, id)` index
fn index_ids(
    table: &impl ReadableTable<(&'static str, u64), ()>,
    prefix: &str,
) -> StorageResult<Vec<u64>> {
    let mut ids = Vec::new();
    for result in table.range((prefix, 0u64)..=(prefix, u64::MAX))? {
        let (key, _value) = result?;
        ids.push(key.value().1);
    }
    Ok(ids)
}

/// Distinct prefixes of a `(prefix, id)` index
fn index_prefixes(
    table: &impl ReadableTable<(&'static str, u64), ()>,
) -> StorageResult<BTreeSet<String>> {
    let mut prefixes = BTreeSet::new();
    for result in table.iter()? {
        let (key, _value) = result?;
        prefixes.insert(key.value().0.to_string());
    }
    Ok(prefixes)
}

/// Ids stored under one parent id of a `(parent_id, id)` index
fn child_ids(
    table: &impl ReadableTable<(u64, u64), ()>,
    parent_id: u64,
) -> StorageResult<Vec<u64>> {
    let mut ids = Vec::new();
    for result in table.range((parent_id, 0u64)..=(parent_id, u64::MAX))? {
        let (key, _value) = result?;
        ids.push(key.value().1);
    }
    Ok(ids)
}

fn load_lines(
    table: &impl ReadableTable<u64, &'static [u8]>,
    ids: &[u64],
    index: &'static str,
) -> StorageResult<Vec<OrderLine>> {
    let mut lines = Vec::with_capacity(ids.len());
    for &id in ids {
        let line: OrderLine =
            get_json(table, id)?.ok_or(StorageError::DanglingIndex { table: index, id })?;
        lines.push(line);
    }
    lines.sort_by_key(|l| l.id);
    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::supply::{LifecycleStatus, LineStatus, StockState, UsageType};

    fn episode(id: u64, key: EpisodeKey) -> Episode {
        Episode {
            id,
            hospital_id: "H1".to_string(),
            key,
            department_code: "ER".to_string(),
            usage_type: UsageType::Outpatient,
            billing_status: None,
            total_amount: None,
            paid_amount: None,
            print_date: None,
            print_time: None,
            created_at: 1,
            updated_at: 1,
            version: 0,
        }
    }

    fn line(id: u64, episode_id: u64, identity: Option<&str>, item: &str) -> OrderLine {
        let mut line = OrderLine {
            id,
            episode_id,
            item_code: item.to_string(),
            item_description: String::new(),
            billing_line_id: identity.map(String::from),
            ordered_qty: 5,
            unit: "EA".to_string(),
            status: LineStatus::Verified,
            qty_used_with_patient: 0,
            qty_returned_to_cabinet: 0,
            pending_qty: 0,
            lifecycle: LifecycleStatus::Pending,
            created_at: 1,
            updated_at: 1,
            version: 0,
        };
        line.recompute();
        line
    }

    #[test]
    fn test_id_allocation_is_monotonic_per_entity() {
        let storage = SupplyStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();
        assert_eq!(storage.next_episode_id(&txn).unwrap(), 1);
        assert_eq!(storage.next_episode_id(&txn).unwrap(), 2);
        assert_eq!(storage.next_line_id(&txn).unwrap(), 1);
        txn.commit().unwrap();

        let txn = storage.begin_write().unwrap();
        assert_eq!(storage.next_episode_id(&txn).unwrap(), 3);
    }

    #[test]
    fn test_natural_key_index() {
        let storage = SupplyStorage::open_in_memory().unwrap();
        let key = EpisodeKey::new("EZ5-1", "20-01", "A", "B");
        let other = EpisodeKey::new("EZ5-1", "20-01", "A", "C");

        let txn = storage.begin_write().unwrap();
        storage.insert_episode(&txn, &episode(1, key.clone())).unwrap();
        storage.insert_episode(&txn, &episode(2, other.clone())).unwrap();
        storage.insert_episode(&txn, &episode(3, key.clone())).unwrap();

        assert_eq!(storage.episode_ids_for_key(&txn, &key).unwrap(), vec![1, 3]);
        assert_eq!(storage.episode_ids_for_key(&txn, &other).unwrap(), vec![2]);
    }

    #[test]
    fn test_line_indexes() {
        let storage = SupplyStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();
        storage.insert_line(&txn, &line(1, 10, Some("A1"), "X1")).unwrap();
        storage.insert_line(&txn, &line(2, 20, Some("A1"), "X1")).unwrap();
        storage.insert_line(&txn, &line(3, 10, None, "X2")).unwrap();
        txn.commit().unwrap();

        let txn = storage.begin_write().unwrap();
        let by_episode: Vec<u64> = storage
            .lines_for_episode(&txn, 10)
            .unwrap()
            .iter()
            .map(|l| l.id)
            .collect();
        assert_eq!(by_episode, vec![1, 3]);

        let by_identity: Vec<u64> = storage
            .lines_for_identity(&txn, "A1")
            .unwrap()
            .iter()
            .map(|l| l.id)
            .collect();
        assert_eq!(by_identity, vec![1, 2]);
        assert!(storage.lines_for_identity(&txn, "").unwrap().is_empty());
    }

    fn return_record(id: u64, line_id: u64, quantity: u32) -> ReturnRecord {
        ReturnRecord {
            id,
            line_id,
            episode_id: 1,
            item_code: "X1".to_string(),
            quantity,
            reason: "UNUSED".to_string(),
            actor: "staff:7".into(),
            note: None,
            created_at: 1,
        }
    }

    #[test]
    fn test_returns_are_indexed_per_line() {
        let storage = SupplyStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();
        storage.insert_line(&txn, &line(1, 1, Some("A1"), "X1")).unwrap();
        storage.insert_line(&txn, &line(2, 1, Some("A2"), "X1")).unwrap();
        storage.insert_return(&txn, &return_record(1, 1, 2)).unwrap();
        storage.insert_return(&txn, &return_record(2, 2, 1)).unwrap();
        storage.insert_return(&txn, &return_record(3, 1, 1)).unwrap();
        txn.commit().unwrap();

        let ids: Vec<u64> = storage
            .read_returns_for_line(1)
            .unwrap()
            .unwrap()
            .iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec![1, 3]);
        assert_eq!(storage.read_returns_for_line(2).unwrap().unwrap().len(), 1);
    }

    #[test]
    fn test_returns_for_unknown_line_is_none() {
        let storage = SupplyStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();
        storage.insert_line(&txn, &line(1, 1, Some("A1"), "X1")).unwrap();
        txn.commit().unwrap();

        assert_eq!(storage.read_returns_for_line(1).unwrap(), Some(vec![]));
        assert!(storage.read_returns_for_line(404).unwrap().is_none());
    }

    #[test]
    fn test_aborted_transaction_leaves_nothing() {
        let storage = SupplyStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();
        storage
            .insert_episode(&txn, &episode(1, EpisodeKey::new("E", "H", "F", "L")))
            .unwrap();
        storage.insert_line(&txn, &line(1, 1, Some("A1"), "X1")).unwrap();
        txn.abort().unwrap();

        assert!(storage.read_episode_state(1).unwrap().is_none());
    }

    #[test]
    fn test_variance_inputs_filter_by_item() {
        let storage = SupplyStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();
        storage.insert_line(&txn, &line(1, 1, Some("A1"), "X1")).unwrap();
        storage.insert_line(&txn, &line(2, 1, Some("A2"), "X2")).unwrap();
        storage
            .put_stock_unit(
                &txn,
                &CabinetStockUnit {
                    rfid: "R1".to_string(),
                    item_code: "X1".to_string(),
                    state: StockState::Dispensed,
                    modified_by: "staff:1".into(),
                    modified_at: 1,
                },
            )
            .unwrap();
        txn.commit().unwrap();

        let inputs = storage.read_variance_inputs(Some("X1")).unwrap();
        assert_eq!(inputs.units.len(), 1);
        assert_eq!(inputs.lines.len(), 1);
        assert_eq!(inputs.lines[0].item_code, "X1");

        let all = storage.read_variance_inputs(None).unwrap();
        assert_eq!(all.lines.len(), 2);
    }
}
