//! Episode Resolver - exact natural-key lookup

use super::storage::{StorageResult, SupplyStorage};
use redb::WriteTransaction;
use shared::supply::{Episode, EpisodeKey};

/// Most recently created episode with this natural key
///
/// Exact match on all four fields, no fuzzy matching. `None` is the expected
/// answer for a first-time submission, not an error.
pub fn resolve(
    storage: &SupplyStorage,
    txn: &WriteTransaction,
    key: &EpisodeKey,
) -> StorageResult<Option<Episode>> {
    let ids = storage.episode_ids_for_key(txn, key)?;
    for &id in ids.iter().rev() {
        if let Some(episode) = storage.get_episode(txn, id)?
            && episode.key == *key
        {
            return Ok(Some(episode));
        }
    }
    Ok(None)
}
