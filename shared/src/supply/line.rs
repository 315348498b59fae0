//! Order line - one ordered item within an episode
//!
//! Quantity bookkeeping lives on the line itself:
//!
//! ```text
//! pending = ordered - used - returned
//! used + returned <= ordered   (never violated, never clamped)
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical cancellation status string
pub const DISCONTINUE: &str = "Discontinue";

/// Default status for newly appended lines
pub const VERIFIED: &str = "Verified";

/// Line status
///
/// External systems send free-form strings. They are normalised once, at the
/// boundary, into this closed enumeration; nothing deeper in the engine looks
/// at raw casing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LineStatus {
    Verified,
    /// Cancellation sentinel ("Discontinue" / "Discontinued", any case)
    Discontinue,
    /// Any other upstream status, kept verbatim
    Other(String),
}

impl LineStatus {
    /// Normalise a raw upstream status
    ///
    /// Returns `None` for blank input so the caller can apply its own default.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        let lowered = trimmed.to_ascii_lowercase();
        Some(match lowered.as_str() {
            "discontinue" | "discontinued" => Self::Discontinue,
            "verified" => Self::Verified,
            _ => Self::Other(trimmed.to_string()),
        })
    }

    /// Whether this status is the cancellation sentinel
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Discontinue)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Verified => VERIFIED,
            Self::Discontinue => DISCONTINUE,
            Self::Other(s) => s,
        }
    }
}

impl From<String> for LineStatus {
    fn from(raw: String) -> Self {
        Self::parse(&raw).unwrap_or(Self::Verified)
    }
}

impl From<LineStatus> for String {
    fn from(status: LineStatus) -> Self {
        match status {
            LineStatus::Other(s) => s,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for LineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derived lifecycle status of a line
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LifecycleStatus {
    /// Nothing consumed or returned yet
    #[default]
    Pending,
    Partial,
    /// Nothing left pending
    Completed,
}

impl LifecycleStatus {
    /// Derive from pending vs ordered
    ///
    /// PENDING is checked first, so a zero-quantity line stays PENDING.
    pub fn derive(pending: u32, ordered: u32) -> Self {
        if pending == ordered {
            Self::Pending
        } else if pending == 0 {
            Self::Completed
        } else {
            Self::Partial
        }
    }
}

/// Order line
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderLine {
    pub id: u64,
    pub episode_id: u64,
    pub item_code: String,
    pub item_description: String,
    /// Externally supplied token, stable across resubmissions; cascade key
    #[serde(skip_serializing_if = "Option::is_none")]
    pub billing_line_id: Option<String>,
    pub ordered_qty: u32,
    pub unit: String,
    pub status: LineStatus,
    pub qty_used_with_patient: u32,
    pub qty_returned_to_cabinet: u32,
    /// Derived: ordered - used - returned
    pub pending_qty: u32,
    /// Derived from pending vs ordered
    pub lifecycle: LifecycleStatus,
    pub created_at: i64,
    pub updated_at: i64,
    /// Bumped on every write, for optimistic checks
    pub version: u64,
}

impl OrderLine {
    /// Recompute derived quantities
    ///
    /// Callers must have checked the conservation invariant before mutating
    /// counters; this only saturates to keep the arithmetic total.
    pub fn recompute(&mut self) {
        self.pending_qty = self
            .ordered_qty
            .saturating_sub(self.qty_used_with_patient)
            .saturating_sub(self.qty_returned_to_cabinet);
        self.lifecycle = LifecycleStatus::derive(self.pending_qty, self.ordered_qty);
    }

    pub fn is_cancelled(&self) -> bool {
        self.status.is_cancelled()
    }

    /// Whether `extra` more units (used or returned) fit into the ordered quantity
    pub fn has_room_for(&self, extra: u32) -> bool {
        let consumed = u64::from(self.qty_used_with_patient)
            + u64::from(self.qty_returned_to_cabinet)
            + u64::from(extra);
        consumed <= u64::from(self.ordered_qty)
    }

    /// Identity match used by the merge engine
    pub fn matches(&self, billing_line_id: &str, item_code: &str) -> bool {
        self.billing_line_id.as_deref() == Some(billing_line_id) && self.item_code == item_code
    }

    /// Mark a state change
    pub fn touch(&mut self, now: i64) {
        self.updated_at = now;
        self.version += 1;
    }
}
