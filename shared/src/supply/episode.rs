//! Episode - one clinical billing context

use super::line::OrderLine;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Billing status written by cancel-bill
pub const BILLING_STATUS_CANCELLED: &str = "CANCELLED";

/// Natural key of an episode
///
/// There is no other external identifier guaranteed stable across
/// submissions. Comparison is exact: no trimming, no case folding.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EpisodeKey {
    /// EN
    pub episode_number: String,
    /// HN
    pub patient_id: String,
    pub first_name: String,
    pub last_name: String,
}

impl EpisodeKey {
    pub fn new(
        episode_number: impl Into<String>,
        patient_id: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
    ) -> Self {
        Self {
            episode_number: episode_number.into(),
            patient_id: patient_id.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
        }
    }
}

/// Usage type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UsageType {
    /// OPD
    #[default]
    Outpatient,
    /// IPD
    Inpatient,
}

/// Billing and print metadata carried by a submission
///
/// Partial overwrite: only supplied fields change.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EpisodeMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub billing_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_amount: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paid_amount: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub print_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub print_time: Option<String>,
}

impl EpisodeMetadata {
    pub fn is_empty(&self) -> bool {
        self.billing_status.is_none()
            && self.total_amount.is_none()
            && self.paid_amount.is_none()
            && self.print_date.is_none()
            && self.print_time.is_none()
    }
}

/// Episode
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Episode {
    pub id: u64,
    pub hospital_id: String,
    #[serde(flatten)]
    pub key: EpisodeKey,
    pub department_code: String,
    pub usage_type: UsageType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub billing_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_amount: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paid_amount: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub print_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub print_time: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
    pub version: u64,
}

impl Episode {
    /// Apply supplied metadata fields, returning the names of fields that changed
    pub fn apply_metadata(&mut self, metadata: &EpisodeMetadata) -> Vec<&'static str> {
        let mut changed = Vec::new();
        if let Some(v) = &metadata.billing_status
            && self.billing_status.as_ref() != Some(v)
        {
            self.billing_status = Some(v.clone());
            changed.push("billing_status");
        }
        if let Some(v) = metadata.total_amount
            && self.total_amount != Some(v)
        {
            self.total_amount = Some(v);
            changed.push("total_amount");
        }
        if let Some(v) = metadata.paid_amount
            && self.paid_amount != Some(v)
        {
            self.paid_amount = Some(v);
            changed.push("paid_amount");
        }
        if let Some(v) = &metadata.print_date
            && self.print_date.as_ref() != Some(v)
        {
            self.print_date = Some(v.clone());
            changed.push("print_date");
        }
        if let Some(v) = &metadata.print_time
            && self.print_time.as_ref() != Some(v)
        {
            self.print_time = Some(v.clone());
            changed.push("print_time");
        }
        changed
    }

    pub fn is_bill_cancelled(&self) -> bool {
        self.billing_status.as_deref() == Some(BILLING_STATUS_CANCELLED)
    }

    /// Mark a state change
    pub fn touch(&mut self, now: i64) {
        self.updated_at = now;
        self.version += 1;
    }
}

/// Episode together with its lines (post-operation state)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EpisodeState {
    pub episode: Episode,
    pub lines: Vec<OrderLine>,
}
