//! Output identifiers.
//!
//! An input names the output it consumes by id, independent of where the
//! owning transaction was included. Deposit transactions can be
//! byte-identical, so outputs in deposit blocks commit to the full position
//! instead of the output index.

use plasma_types::{OutputId, UtxoPosition, tagged_hash};

/// Id of output `output_index` of a transaction outside a deposit block.
#[must_use]
pub fn compute_output_id(tx_bytes: &[u8], output_index: u64) -> OutputId {
    OutputId(tagged_hash(
        b"plasma:output_id:v1:",
        &[tx_bytes, &output_index.to_be_bytes()],
    ))
}

/// Id of the output at `utxo_pos` of a deposit transaction.
#[must_use]
pub fn compute_deposit_output_id(tx_bytes: &[u8], utxo_pos: UtxoPosition) -> OutputId {
    OutputId(tagged_hash(
        b"plasma:output_id:deposit:v1:",
        &[tx_bytes, &utxo_pos.0.to_be_bytes()],
    ))
}

/// Id of the output at `utxo_pos`, picking the deposit rule when the
/// position lies in a deposit block.
#[must_use]
pub fn output_id_at(
    tx_bytes: &[u8],
    utxo_pos: UtxoPosition,
    child_block_interval: u64,
) -> OutputId {
    if utxo_pos.is_deposit(child_block_interval) {
        compute_deposit_output_id(tx_bytes, utxo_pos)
    } else {
        compute_output_id(tx_bytes, utxo_pos.output_index())
    }
}
