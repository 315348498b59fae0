//! Variance Reporter - dispensed units vs. clinically used quantity
//!
//! Read-only: runs in a single read transaction and never writes.

use super::storage::{StorageResult, SupplyStorage, VarianceInputs};
use shared::supply::{VarianceClass, VarianceQuery, VarianceRow};
use std::collections::BTreeMap;

#[derive(Default)]
struct Totals {
    dispensed: u64,
    used: u64,
    returned: u64,
}

/// One row per item code, ordered by item code
pub fn report(storage: &SupplyStorage, query: &VarianceQuery) -> StorageResult<Vec<VarianceRow>> {
    let inputs = storage.read_variance_inputs(query.item_code.as_deref())?;
    Ok(summarize(query, inputs))
}

fn summarize(query: &VarianceQuery, inputs: VarianceInputs) -> Vec<VarianceRow> {
    let mut totals: BTreeMap<String, Totals> = BTreeMap::new();
    if let Some(code) = &query.item_code {
        totals.entry(code.clone()).or_default();
    }

    for unit in inputs.units {
        let entry = totals.entry(unit.item_code.clone()).or_default();
        if unit.is_dispensed() && query.in_range(unit.modified_at) {
            entry.dispensed += 1;
        }
    }
    for line in inputs.lines {
        let entry = totals.entry(line.item_code).or_default();
        if query.in_range(line.updated_at) {
            entry.used += u64::from(line.qty_used_with_patient);
        }
    }
    for record in inputs.returns {
        let entry = totals.entry(record.item_code).or_default();
        if query.in_range(record.created_at) {
            entry.returned += u64::from(record.quantity);
        }
    }

    totals
        .into_iter()
        .map(|(item_code, t)| VarianceRow {
            item_code,
            dispensed: t.dispensed,
            used: t.used,
            returned: t.returned,
            class: VarianceClass::classify(t.dispensed, t.used),
        })
        .collect()
}
