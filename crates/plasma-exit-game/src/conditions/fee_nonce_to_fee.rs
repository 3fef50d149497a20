use plasma_tx::FeeTransaction;
use plasma_tx::fee::FEE_NONCE_OUTPUT_INDEX;
use plasma_types::signature::verify_tx_witness;
use plasma_types::{OwnerAddress, Result};

use super::{SpendingCheck, SpendingCondition, references_output, wrong_output};

/// The nonce output of a fee claim consumed by the next fee claim.
///
/// Chains fee claims: the next claim must carry a strictly larger nonce and
/// be signed by the owner of the claim it continues.
#[derive(Debug, Default, Clone, Copy)]
pub struct FeeNonceToFeeTxCondition;

impl SpendingCondition for FeeNonceToFeeTxCondition {
    fn verify(&self, check: &SpendingCheck<'_>) -> Result<bool> {
        let consumed = FeeTransaction::decode(check.input_tx)?;
        if check.output_index != FEE_NONCE_OUTPUT_INDEX {
            return Err(wrong_output(check.output_index, "fee nonce output"));
        }
        let spending = FeeTransaction::decode(check.spending_tx)?;

        if !references_output(&spending.tx.inputs, check.input_index, check.output_id) {
            return Ok(false);
        }
        if spending.nonce.nonce <= consumed.nonce.nonce {
            tracing::debug!(
                consumed = consumed.nonce.nonce,
                next = spending.nonce.nonce,
                "Fee nonce does not increase"
            );
            return Ok(false);
        }
        let owner = OwnerAddress(consumed.value.guard);
        Ok(verify_tx_witness(&owner, check.spending_tx, check.witness))
    }
}
