//! Return record - immutable log of one cabinet-return action

use super::actor::Actor;
use serde::{Deserialize, Serialize};

/// Return record
///
/// Created only, never updated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReturnRecord {
    pub id: u64,
    pub line_id: u64,
    pub episode_id: u64,
    pub item_code: String,
    pub quantity: u32,
    pub reason: String,
    pub actor: Actor,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub created_at: i64,
}
