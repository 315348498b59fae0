//! Request and response payloads of the boundary operations
//!
//! Two line shapes are accepted on submission: the current [`OrderLineInput`]
//! and the older [`SupplyItemInput`]. The server maps both into a single
//! canonical line before any merge logic runs.

use super::episode::{EpisodeKey, EpisodeMetadata, EpisodeState, UsageType};
use super::line::OrderLine;
use super::returns::ReturnRecord;
use serde::{Deserialize, Serialize};

/// Order line, current shape
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct OrderLineInput {
    pub item_code: String,
    #[serde(default)]
    pub item_description: String,
    /// Empty or missing identity never matches an existing line
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub billing_line_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

/// Supply item, legacy shape
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SupplyItemInput {
    pub supply_code: String,
    #[serde(default)]
    pub supply_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_item_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// Submission of one episode's order lines
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SubmitOrderRequest {
    #[serde(flatten)]
    pub key: EpisodeKey,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hospital_id: Option<String>,
    /// Department display name, resolved only when the episode is created
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department_hint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage_type: Option<UsageType>,
    #[serde(default)]
    pub order_lines: Vec<OrderLineInput>,
    #[serde(default)]
    pub supply_items: Vec<SupplyItemInput>,
    #[serde(default)]
    pub metadata: EpisodeMetadata,
}

impl SubmitOrderRequest {
    pub fn new(key: EpisodeKey) -> Self {
        Self {
            key,
            hospital_id: None,
            department_hint: None,
            usage_type: None,
            order_lines: Vec::new(),
            supply_items: Vec::new(),
            metadata: EpisodeMetadata::default(),
        }
    }

    pub fn line_count(&self) -> usize {
        self.order_lines.len() + self.supply_items.len()
    }
}

/// Result of a submission
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SubmitOutcome {
    /// True when the submission created the episode
    pub created: bool,
    /// Lines in other episodes cancelled by the discontinue cascade
    #[serde(default)]
    pub cascaded_line_ids: Vec<u64>,
    #[serde(flatten)]
    pub state: EpisodeState,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecordUsedRequest {
    pub quantity: u32,
    /// Optimistic check against the line version
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_version: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecordReturnedRequest {
    pub quantity: u32,
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_version: Option<u64>,
}

/// Line after a return, together with the return record it produced
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReturnOutcome {
    pub line: OrderLine,
    pub return_record: ReturnRecord,
}

/// One cancel-bill target
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CancelTarget {
    /// Explicit line in an explicit episode
    Line { episode_id: u64, line_id: u64 },
    /// Line derived from its billing identity, item code and (optionally) quantity
    Identity {
        billing_line_id: String,
        item_code: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        quantity: Option<u32>,
    },
}

/// Cancel a bill and optionally rebill under a new print date
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CancelBillRequest {
    /// Episode reference; with no targets every line of it is targeted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub episode_id: Option<u64>,
    #[serde(default)]
    pub targets: Vec<CancelTarget>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_print_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_print_date: Option<String>,
    /// Lines of the replacement episode; empty means no rebill
    #[serde(default)]
    pub replacement_lines: Vec<OrderLineInput>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CancelBillOutcome {
    pub cancelled_episode: EpisodeState,
    pub cancelled_line_ids: Vec<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_episode: Option<EpisodeState>,
    /// Old and new print dates are the same day
    pub same_day: bool,
}
