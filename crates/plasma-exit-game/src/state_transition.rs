//! Value conservation for in-flight transactions.

use std::collections::BTreeMap;

use plasma_types::{AssetId, ExitSlot, PlasmaError, Result};

/// Per asset, the outputs of a transaction must not exceed its inputs.
/// The difference is the fee.
///
/// # Errors
/// [`PlasmaError::InvalidStateTransition`] when an asset is over-spent or a
/// sum overflows.
pub fn verify_value_conserved(inputs: &[ExitSlot], outputs: &[ExitSlot]) -> Result<()> {
    let consumed = sum_per_asset(inputs)?;
    let created = sum_per_asset(outputs)?;
    for (asset, out_total) in &created {
        let in_total = consumed.get(asset).copied().unwrap_or(0);
        if *out_total > in_total {
            return Err(PlasmaError::InvalidStateTransition {
                reason: format!("outputs create {out_total} of {asset}, inputs hold {in_total}"),
            });
        }
    }
    Ok(())
}

fn sum_per_asset(slots: &[ExitSlot]) -> Result<BTreeMap<AssetId, u128>> {
    let mut totals = BTreeMap::new();
    for slot in slots {
        let total: &mut u128 = totals.entry(slot.asset).or_insert(0);
        *total = total
            .checked_add(slot.amount)
            .ok_or_else(|| PlasmaError::InvalidStateTransition {
                reason: format!("amount overflow for {}", slot.asset),
            })?;
    }
    Ok(totals)
}
