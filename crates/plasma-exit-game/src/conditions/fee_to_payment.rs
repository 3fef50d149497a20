use plasma_tx::FeeTransaction;
use plasma_tx::fee::FEE_VALUE_OUTPUT_INDEX;
use plasma_types::{Result, TxType};

use super::{SpendingCheck, SpendingCondition, payment_spends_value_output, wrong_output};

/// The value output of a fee-claim transaction consumed by a payment. Lets
/// the operator move collected fees like any other funds.
#[derive(Debug, Clone, Copy)]
pub struct FeeOutputToPaymentTxCondition {
    pub spending_tx_type: TxType,
}

impl FeeOutputToPaymentTxCondition {
    #[must_use]
    pub fn new(spending_tx_type: TxType) -> Self {
        Self { spending_tx_type }
    }
}

impl SpendingCondition for FeeOutputToPaymentTxCondition {
    fn verify(&self, check: &SpendingCheck<'_>) -> Result<bool> {
        let fee_tx = FeeTransaction::decode(check.input_tx)?;
        if check.output_index != FEE_VALUE_OUTPUT_INDEX {
            return Err(wrong_output(check.output_index, "fee value output"));
        }
        payment_spends_value_output(&fee_tx.value, check, self.spending_tx_type)
    }
}
