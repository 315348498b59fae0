//! Line Merge Engine - partition of an incoming batch
//!
//! Each incoming line lands in exactly one group, tested in priority order:
//!
//! ```text
//! status is the cancellation sentinel         → discontinue
//! (identity, item_code) equals a live line    → matched
//! otherwise                                   → new
//! ```
//!
//! Matching is computed against the episode as it will look *after* the
//! discontinue cascade, so a line whose identity is cancelled by the same
//! submission never counts as matched.

use super::adapter::CanonicalLine;
use shared::supply::{LineStatus, OrderLine};
use std::collections::HashSet;

/// Write set of one submission against one episode
#[derive(Debug, Default, Clone, PartialEq)]
pub struct MergePlan {
    /// Cascade their identity, then append them as cancellation records
    pub discontinue: Vec<CanonicalLine>,
    /// (existing line id, incoming line): status update only
    pub matched: Vec<(u64, CanonicalLine)>,
    /// Appended as new lines
    pub new: Vec<CanonicalLine>,
}

impl MergePlan {
    /// Distinct billing identities to cascade, in first-seen order
    pub fn cascade_identities(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.discontinue
            .iter()
            .filter_map(|line| line.billing_line_id.as_deref())
            .filter(|id| seen.insert(*id))
            .collect()
    }

    /// Item codes of the new-line group
    pub fn new_item_codes(&self) -> Vec<&str> {
        self.new.iter().map(|line| line.item_code.as_str()).collect()
    }

    /// New non-cancellation lines that carry no positive quantity
    pub fn new_lines_missing_quantity(&self) -> Vec<&CanonicalLine> {
        self.new
            .iter()
            .filter(|line| line.quantity.unwrap_or(0) == 0)
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.discontinue.is_empty() && self.matched.is_empty() && self.new.is_empty()
    }
}

/// Partition `incoming` against the current episode's `existing` lines
pub fn plan(existing: &[OrderLine], incoming: Vec<CanonicalLine>) -> MergePlan {
    let (discontinue, rest): (Vec<_>, Vec<_>) =
        incoming.into_iter().partition(CanonicalLine::is_cancellation);

    let cancelled_identities: HashSet<&str> = discontinue
        .iter()
        .filter_map(|line| line.billing_line_id.as_deref())
        .collect();

    let mut matched = Vec::new();
    let mut new = Vec::new();
    for line in rest {
        let hit = line.billing_line_id.as_deref().and_then(|identity| {
            if cancelled_identities.contains(identity) {
                return None;
            }
            existing
                .iter()
                .find(|l| !l.is_cancelled() && l.matches(identity, &line.item_code))
        });
        match hit {
            Some(existing_line) => matched.push((existing_line.id, line)),
            None => new.push(line),
        }
    }

    MergePlan {
        discontinue,
        matched,
        new,
    }
}

/// Status written onto a matched line; an absent status re-affirms the current one
pub fn matched_status(current: &LineStatus, incoming: &CanonicalLine) -> LineStatus {
    incoming.status.clone().unwrap_or_else(|| current.clone())
}

/// Build a line to append
///
/// Cancellation records keep whatever quantity was supplied (zero if none);
/// other lines default their status to Verified.
pub fn build_line(id: u64, episode_id: u64, incoming: &CanonicalLine, now: i64) -> OrderLine {
    let status = incoming.status.clone().unwrap_or(LineStatus::Verified);
    let mut line = OrderLine {
        id,
        episode_id,
        item_code: incoming.item_code.clone(),
        item_description: incoming.item_description.clone(),
        billing_line_id: incoming.billing_line_id.clone(),
        ordered_qty: incoming.quantity.unwrap_or(0),
        unit: incoming.unit.clone(),
        status,
        qty_used_with_patient: 0,
        qty_returned_to_cabinet: 0,
        pending_qty: 0,
        lifecycle: Default::default(),
        created_at: now,
        updated_at: now,
        version: 0,
    };
    line.recompute();
    line
}
