//! Cabinet stock flags
//!
//! Each RFID unit carries a single membership bit: in the cabinet or
//! dispensed. Only two transitions exist and neither may target the state
//! the unit is already in.

use crate::reconcile::storage::{StorageError, SupplyStorage};
use redb::WriteTransaction;
use shared::supply::{Actor, CabinetStockUnit, StockState};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CabinetError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Stock unit not found: {0}")]
    NotFound(String),

    #[error("Stock unit already registered: {0}")]
    AlreadyRegistered(String),

    #[error("Stock unit {0} is already dispensed")]
    AlreadyDispensed(String),

    #[error("Stock unit {0} is already in the cabinet")]
    AlreadyInCabinet(String),

    #[error("RFID and item code are required")]
    MissingField,
}

pub type CabinetResult<T> = Result<T, CabinetError>;

/// Register a new unit, initially in the cabinet
pub fn register(
    storage: &SupplyStorage,
    txn: &WriteTransaction,
    rfid: &str,
    item_code: &str,
    actor: &Actor,
    now: i64,
) -> CabinetResult<CabinetStockUnit> {
    if rfid.trim().is_empty() || item_code.trim().is_empty() {
        return Err(CabinetError::MissingField);
    }
    if storage.get_stock_unit(txn, rfid)?.is_some() {
        return Err(CabinetError::AlreadyRegistered(rfid.to_string()));
    }
    let unit = CabinetStockUnit {
        rfid: rfid.to_string(),
        item_code: item_code.to_string(),
        state: StockState::InCabinet,
        modified_by: actor.clone(),
        modified_at: now,
    };
    storage.put_stock_unit(txn, &unit)?;
    Ok(unit)
}

/// Flip a unit to dispensed
pub fn dispense(
    storage: &SupplyStorage,
    txn: &WriteTransaction,
    rfid: &str,
    actor: &Actor,
    now: i64,
) -> CabinetResult<CabinetStockUnit> {
    transition(storage, txn, rfid, StockState::Dispensed, actor, now)
}

/// Flip a unit back into the cabinet
pub fn return_unit(
    storage: &SupplyStorage,
    txn: &WriteTransaction,
    rfid: &str,
    actor: &Actor,
    now: i64,
) -> CabinetResult<CabinetStockUnit> {
    transition(storage, txn, rfid, StockState::InCabinet, actor, now)
}

fn transition(
    storage: &SupplyStorage,
    txn: &WriteTransaction,
    rfid: &str,
    target: StockState,
    actor: &Actor,
    now: i64,
) -> CabinetResult<CabinetStockUnit> {
    let mut unit = storage
        .get_stock_unit(txn, rfid)?
        .ok_or_else(|| CabinetError::NotFound(rfid.to_string()))?;

    if unit.state == target {
        return Err(match target {
            StockState::Dispensed => CabinetError::AlreadyDispensed(rfid.to_string()),
            StockState::InCabinet => CabinetError::AlreadyInCabinet(rfid.to_string()),
        });
    }

    unit.state = target;
    unit.modified_by = actor.clone();
    unit.modified_at = now;
    storage.put_stock_unit(txn, &unit)?;
    Ok(unit)
}
