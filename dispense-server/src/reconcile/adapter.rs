//! Input adapter - both submission shapes into one canonical line
//!
//! The merge engine never sees [`OrderLineInput`] or [`SupplyItemInput`];
//! everything past this module works on [`CanonicalLine`].

use shared::supply::{LineStatus, OrderLineInput, SubmitOrderRequest, SupplyItemInput};

/// Canonical incoming line
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalLine {
    pub item_code: String,
    pub item_description: String,
    /// `None` when missing or blank; such a line never matches anything
    pub billing_line_id: Option<String>,
    /// `None` when the submission carried no (or a blank) status
    pub status: Option<LineStatus>,
    pub quantity: Option<u32>,
    pub unit: String,
}

impl CanonicalLine {
    pub fn is_cancellation(&self) -> bool {
        self.status.as_ref().is_some_and(LineStatus::is_cancelled)
    }
}

impl From<&OrderLineInput> for CanonicalLine {
    fn from(input: &OrderLineInput) -> Self {
        Self {
            item_code: input.item_code.clone(),
            item_description: input.item_description.clone(),
            billing_line_id: normalize_identity(input.billing_line_id.as_deref()),
            status: input.status.as_deref().and_then(LineStatus::parse),
            quantity: input.quantity,
            unit: input.unit.clone().unwrap_or_default(),
        }
    }
}

impl From<&SupplyItemInput> for CanonicalLine {
    fn from(input: &SupplyItemInput) -> Self {
        Self {
            item_code: input.supply_code.clone(),
            item_description: input.supply_name.clone(),
            billing_line_id: normalize_identity(input.order_item_id.as_deref()),
            status: input.status.as_deref().and_then(LineStatus::parse),
            quantity: input.quantity,
            unit: input.unit.clone().unwrap_or_default(),
        }
    }
}

/// All lines of a submission, current shape first, then legacy shape
pub fn canonicalize(request: &SubmitOrderRequest) -> Vec<CanonicalLine> {
    request
        .order_lines
        .iter()
        .map(CanonicalLine::from)
        .chain(request.supply_items.iter().map(CanonicalLine::from))
        .collect()
}

/// Replacement lines of a cancel-bill (always current shape)
pub fn canonicalize_lines(lines: &[OrderLineInput]) -> Vec<CanonicalLine> {
    lines.iter().map(CanonicalLine::from).collect()
}

fn normalize_identity(raw: Option<&str>) -> Option<String> {
    raw.filter(|id| !id.trim().is_empty()).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::supply::EpisodeKey;

    #[test]
    fn test_legacy_shape_maps_onto_canonical() {
        let legacy = SupplyItemInput {
            supply_code: "X2".to_string(),
            supply_name: "Gauze".to_string(),
            order_item_id: Some("A2".to_string()),
            quantity: Some(3),
            unit: Some("PK".to_string()),
            status: Some("discontinued".to_string()),
        };
        let line = CanonicalLine::from(&legacy);
        assert_eq!(line.item_code, "X2");
        assert_eq!(line.item_description, "Gauze");
        assert_eq!(line.billing_line_id.as_deref(), Some("A2"));
        assert_eq!(line.quantity, Some(3));
        assert!(line.is_cancellation());
    }

    #[test]
    fn test_blank_identity_and_status_become_none() {
        let input = OrderLineInput {
            item_code: "X1".to_string(),
            billing_line_id: Some("   ".to_string()),
            status: Some(String::new()),
            ..Default::default()
        };
        let line = CanonicalLine::from(&input);
        assert!(line.billing_line_id.is_none());
        assert!(line.status.is_none());
        assert!(!line.is_cancellation());
        assert_eq!(line.unit, "");
    }

    #[test]
    fn test_canonicalize_keeps_shape_order() {
        let mut request = SubmitOrderRequest::new(EpisodeKey::new("E", "H", "F", "L"));
        request.supply_items.push(SupplyItemInput {
            supply_code: "LEGACY".to_string(),
            ..Default::default()
        });
        request.order_lines.push(OrderLineInput {
            item_code: "CURRENT".to_string(),
            ..Default::default()
        });

        let codes: Vec<String> = canonicalize(&request)
            .into_iter()
            .map(|l| l.item_code)
            .collect();
        assert_eq!(codes, vec!["CURRENT".to_string(), "LEGACY".to_string()]);
    }
}
