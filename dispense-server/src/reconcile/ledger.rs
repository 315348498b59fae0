//! Quantity Ledger - per-line used/returned counters
//!
//! ```text
//! used + returned + qty <= ordered    checked against the line as read
//!                                     inside the caller's write transaction
//! ```
//!
//! A violation leaves the line untouched; nothing is ever clamped.

use shared::supply::OrderLine;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Quantity must be greater than zero")]
    NotPositive,

    #[error("Order line {0} is discontinued")]
    Cancelled(u64),

    #[error("Quantity {requested} exceeds pending {pending} on line {line_id}")]
    ExceedsOrdered {
        line_id: u64,
        requested: u32,
        pending: u32,
    },
}

/// Record clinical use of `qty` units
pub fn apply_used(line: &mut OrderLine, qty: u32, now: i64) -> Result<(), LedgerError> {
    check(line, qty)?;
    line.qty_used_with_patient += qty;
    line.recompute();
    line.touch(now);
    Ok(())
}

/// Record `qty` units returned to the cabinet
pub fn apply_returned(line: &mut OrderLine, qty: u32, now: i64) -> Result<(), LedgerError> {
    check(line, qty)?;
    line.qty_returned_to_cabinet += qty;
    line.recompute();
    line.touch(now);
    Ok(())
}

fn check(line: &OrderLine, qty: u32) -> Result<(), LedgerError> {
    if qty == 0 {
        return Err(LedgerError::NotPositive);
    }
    if line.is_cancelled() {
        return Err(LedgerError::Cancelled(line.id));
    }
    if !line.has_room_for(qty) {
        return Err(LedgerError::ExceedsOrdered {
            line_id: line.id,
            requested: qty,
            pending: line.pending_qty,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::supply::{LifecycleStatus, LineStatus};

    fn line(ordered: u32) -> OrderLine {
        let mut line = OrderLine {
            id: 1,
            episode_id: 1,
            item_code: "X1".to_string(),
            item_description: String::new(),
            billing_line_id: Some("A1".to_string()),
            ordered_qty: ordered,
            unit: "EA".to_string(),
            status: LineStatus::Verified,
            qty_used_with_patient: 0,
            qty_returned_to_cabinet: 0,
            pending_qty: 0,
            lifecycle: LifecycleStatus::Pending,
            created_at: 0,
            updated_at: 0,
            version: 0,
        };
        line.recompute();
        line
    }

    #[test]
    fn test_used_then_partial() {
        let mut l = line(10);
        apply_used(&mut l, 4, 5).unwrap();
        assert_eq!(l.qty_used_with_patient, 4);
        assert_eq!(l.pending_qty, 6);
        assert_eq!(l.lifecycle, LifecycleStatus::Partial);
        assert_eq!(l.version, 1);
        assert_eq!(l.updated_at, 5);
    }

    #[test]
    fn test_used_and_returned_complete_the_line() {
        let mut l = line(10);
        apply_used(&mut l, 4, 1).unwrap();
        apply_returned(&mut l, 6, 2).unwrap();
        assert_eq!(l.pending_qty, 0);
        assert_eq!(l.lifecycle, LifecycleStatus::Completed);
    }

    #[test]
    fn test_overdraw_is_rejected_without_mutation() {
        let mut l = line(10);
        apply_used(&mut l, 4, 1).unwrap();
        let before = l.clone();

        let err = apply_used(&mut l, 10, 2).unwrap_err();
        assert_eq!(
            err,
            LedgerError::ExceedsOrdered {
                line_id: 1,
                requested: 10,
                pending: 6
            }
        );
        assert_eq!(l, before);

        let err = apply_returned(&mut l, 7, 2).unwrap_err();
        assert!(matches!(err, LedgerError::ExceedsOrdered { .. }));
        assert_eq!(l, before);
    }

    #[test]
    fn test_zero_quantity_rejected() {
        let mut l = line(10);
        assert_eq!(apply_used(&mut l, 0, 1), Err(LedgerError::NotPositive));
        assert_eq!(apply_returned(&mut l, 0, 1), Err(LedgerError::NotPositive));
    }

    #[test]
    fn test_cancelled_line_rejected() {
        let mut l = line(10);
        l.status = LineStatus::Discontinue;
        assert_eq!(apply_used(&mut l, 1, 1), Err(LedgerError::Cancelled(1)));
    }

    #[test]
    fn test_huge_quantity_does_not_overflow() {
        let mut l = line(u32::MAX);
        apply_used(&mut l, u32::MAX - 1, 1).unwrap();
        assert!(apply_returned(&mut l, u32::MAX, 2).is_err());
        apply_returned(&mut l, 1, 2).unwrap();
        assert_eq!(l.lifecycle, LifecycleStatus::Completed);
    }
}
