//! Variance rows - dispensed units vs. clinically recorded usage

use serde::{Deserialize, Serialize};

/// Variance classification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VarianceClass {
    Matched,
    UsedWithoutDispense,
    DispensedNotUsed,
    DispenseExceedsUsage,
    UsageExceedsDispense,
}

impl VarianceClass {
    /// Classify dispensed against used
    ///
    /// Equality wins first, so an item with no activity is MATCHED.
    pub fn classify(dispensed: u64, used: u64) -> Self {
        if dispensed == used {
            Self::Matched
        } else if dispensed == 0 {
            Self::UsedWithoutDispense
        } else if used == 0 {
            Self::DispensedNotUsed
        } else if dispensed > used {
            Self::DispenseExceedsUsage
        } else {
            Self::UsageExceedsDispense
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VarianceRow {
    pub item_code: String,
    pub dispensed: u64,
    pub used: u64,
    /// Reported only; not part of the classification
    pub returned: u64,
    pub class: VarianceClass,
}

/// Variance filter; timestamps are Unix millis, both bounds inclusive
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct VarianceQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<i64>,
}

impl VarianceQuery {
    pub fn in_range(&self, ts: i64) -> bool {
        self.from.is_none_or(|from| ts >= from) && self.to.is_none_or(|to| ts <= to)
    }
}
