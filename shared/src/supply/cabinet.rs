//! Cabinet stock unit - one RFID-tracked physical unit

use super::actor::Actor;
use serde::{Deserialize, Serialize};

/// Cabinet membership flag
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StockState {
    InCabinet,
    Dispensed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CabinetStockUnit {
    pub rfid: String,
    pub item_code: String,
    pub state: StockState,
    pub modified_by: Actor,
    pub modified_at: i64,
}

impl CabinetStockUnit {
    pub fn is_dispensed(&self) -> bool {
        self.state == StockState::Dispensed
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RegisterUnitRequest {
    pub rfid: String,
    pub item_code: String,
}
