//! Spending conditions: pluggable rules deciding whether a transaction is an
//! authorised consumer of an output.
//!
//! Each condition is registered under (consumed output type, spending tx
//! type). `Ok(false)` means "not authorised" (wrong witness, input doesn't
//! reference the output); `Err` means the evidence is structurally unusable.

mod fee_nonce_to_fee;
mod fee_to_payment;
mod payment_to_payment;

pub use fee_nonce_to_fee::FeeNonceToFeeTxCondition;
pub use fee_to_payment::FeeOutputToPaymentTxCondition;
pub use payment_to_payment::PaymentOutputToPaymentTxCondition;

use plasma_tx::{PaymentTransaction, WireTransactionOutput};
use plasma_types::signature::verify_tx_witness;
use plasma_types::{OutputId, OwnerAddress, PlasmaError, Result, TxType};

/// Evidence that `spending_tx` consumes an output.
#[derive(Debug, Clone, Copy)]
pub struct SpendingCheck<'a> {
    /// Encoded transaction that created the consumed output.
    pub input_tx: &'a [u8],
    /// Index of the consumed output within `input_tx`.
    pub output_index: u64,
    /// Id of the consumed output, as the caller derived it from its position.
    pub output_id: OutputId,
    pub spending_tx: &'a [u8],
    /// Which input of `spending_tx` references the output.
    pub input_index: usize,
    /// Authorisation, typically the owner's signature over `spending_tx`.
    pub witness: &'a [u8],
}

/// A pluggable spending rule.
pub trait SpendingCondition: Send + Sync {
    fn verify(&self, check: &SpendingCheck<'_>) -> Result<bool>;
}

/// `true` iff input `input_index` of the spending transaction is `expected`.
fn references_output(inputs: &[OutputId], input_index: usize, expected: OutputId) -> bool {
    inputs.get(input_index) == Some(&expected)
}

/// Shared tail of the value-output-to-payment rules: the payment references
/// the output and its owner signed the payment.
fn payment_spends_value_output(
    consumed: &WireTransactionOutput,
    check: &SpendingCheck<'_>,
    payment_tx_type: TxType,
) -> Result<bool> {
    let payment = PaymentTransaction::decode(check.spending_tx, payment_tx_type)?;
    if !references_output(&payment.tx.inputs, check.input_index, check.output_id) {
        tracing::debug!(
            output = %check.output_id,
            input_index = check.input_index,
            "Spending tx does not reference the output"
        );
        return Ok(false);
    }
    let owner = OwnerAddress(consumed.guard);
    Ok(verify_tx_witness(&owner, check.spending_tx, check.witness))
}

fn wrong_output(index: u64, expected: &str) -> PlasmaError {
    PlasmaError::InvalidTransaction {
        reason: format!("output {index} is not a {expected}"),
    }
}
