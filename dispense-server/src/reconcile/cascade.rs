//! Cancellation Cascade
//!
//! The cascade key is the billing identity alone, not (episode, identity):
//! one cancellation can reach lines in episodes the caller never mentioned.
//! Already-cancelled lines are left untouched, so repeating a cancellation
//! is a no-op.

use super::storage::{StorageResult, SupplyStorage};
use redb::WriteTransaction;
use shared::supply::{LineStatus, OrderLine};
use std::collections::BTreeSet;

/// Cancel every live line in the system sharing `identity`
///
/// Returns the lines in their cancelled state, ordered by id.
pub fn cascade_by_identity(
    storage: &SupplyStorage,
    txn: &WriteTransaction,
    identity: &str,
    now: i64,
) -> StorageResult<Vec<OrderLine>> {
    let targets: Vec<OrderLine> = storage
        .lines_for_identity(txn, identity)?
        .into_iter()
        .filter(|line| !line.is_cancelled())
        .collect();
    apply(storage, txn, targets, now)
}

/// Cancel exactly the given lines (caller-scoped variant)
///
/// Unknown ids and already-cancelled lines are skipped.
pub fn cancel_lines(
    storage: &SupplyStorage,
    txn: &WriteTransaction,
    line_ids: &[u64],
    now: i64,
) -> StorageResult<Vec<OrderLine>> {
    let mut targets = Vec::with_capacity(line_ids.len());
    let mut seen = BTreeSet::new();
    for &id in line_ids {
        if !seen.insert(id) {
            continue;
        }
        if let Some(line) = storage.get_line(txn, id)?
            && !line.is_cancelled()
        {
            targets.push(line);
        }
    }
    apply(storage, txn, targets, now)
}

/// Status transition applied to one line
///
/// Clinical consumption is zeroed: the bill for this line never happened.
pub fn cancel_line(line: &mut OrderLine, now: i64) {
    line.status = LineStatus::Discontinue;
    line.qty_used_with_patient = 0;
    line.recompute();
    line.touch(now);
}

fn apply(
    storage: &SupplyStorage,
    txn: &WriteTransaction,
    mut targets: Vec<OrderLine>,
    now: i64,
) -> StorageResult<Vec<OrderLine>> {
    let mut episodes = BTreeSet::new();
    for line in &mut targets {
        cancel_line(line, now);
        storage.put_line(txn, line)?;
        episodes.insert(line.episode_id);
    }

    for episode_id in episodes {
        if let Some(mut episode) = storage.get_episode(txn, episode_id)? {
            episode.touch(now);
            storage.put_episode(txn, &episode)?;
        }
    }

    targets.sort_by_key(|line| line.id);
    Ok(targets)
}
