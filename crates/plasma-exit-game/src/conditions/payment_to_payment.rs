use plasma_tx::WireTransaction;
use plasma_types::{OutputType, Result, TxType};

use super::{SpendingCheck, SpendingCondition, payment_spends_value_output, wrong_output};

/// A payment output consumed by a payment transaction, authorised by the
/// output owner's signature.
#[derive(Debug, Clone, Copy)]
pub struct PaymentOutputToPaymentTxCondition {
    pub output_type: OutputType,
    pub spending_tx_type: TxType,
}

impl PaymentOutputToPaymentTxCondition {
    #[must_use]
    pub fn new(output_type: OutputType, spending_tx_type: TxType) -> Self {
        Self {
            output_type,
            spending_tx_type,
        }
    }
}

impl SpendingCondition for PaymentOutputToPaymentTxCondition {
    fn verify(&self, check: &SpendingCheck<'_>) -> Result<bool> {
        let input_tx = WireTransaction::decode(check.input_tx)?;
        let consumed = input_tx
            .value_output(check.output_index)?
            .clone();
        if consumed.output_type != self.output_type {
            return Err(wrong_output(check.output_index, "payment output"));
        }
        payment_spends_value_output(&consumed, check, self.spending_tx_type)
    }
}

#[cfg(test)]
mod tests {
    use plasma_tx::{WireTransactionOutput, compute_output_id};
    use plasma_types::signature::{owner_of, sign_tx, test_key};
    use plasma_types::{AssetId, OutputId};

    use super::*;

    fn condition() -> PaymentOutputToPaymentTxCondition {
        PaymentOutputToPaymentTxCondition::new(OutputType(1), TxType(1))
    }

    fn fixture() -> (Vec<u8>, OutputId, Vec<u8>) {
        let alice = test_key(1);
        let input_tx = WireTransaction::new(
            TxType(1),
            vec![OutputId([9u8; 32])],
            vec![
                WireTransactionOutput::new(OutputType(1), owner_of(&alice), AssetId::NATIVE, 10)
                    .into(),
            ],
        )
        .encode();
        let output_id = compute_output_id(&input_tx, 0);
        let spending_tx = WireTransaction::new(
            TxType(1),
            vec![output_id],
            vec![
                WireTransactionOutput::new(
                    OutputType(1),
                    owner_of(&test_key(2)),
                    AssetId::NATIVE,
                    10,
                )
                .into(),
            ],
        )
        .encode();
        (input_tx, output_id, spending_tx)
    }

    #[test]
    fn owner_signed_spend_verifies() {
        let (input_tx, output_id, spending_tx) = fixture();
        let witness = sign_tx(&test_key(1), &spending_tx);
        let check = SpendingCheck {
            input_tx: &input_tx,
            output_index: 0,
            output_id,
            spending_tx: &spending_tx,
            input_index: 0,
            witness: &witness,
        };
        assert!(condition().verify(&check).unwrap());
    }

    #[test]
    fn foreign_signature_rejected() {
        let (input_tx, output_id, spending_tx) = fixture();
        let witness = sign_tx(&test_key(2), &spending_tx);
        let check = SpendingCheck {
            input_tx: &input_tx,
            output_index: 0,
            output_id,
            spending_tx: &spending_tx,
            input_index: 0,
            witness: &witness,
        };
        assert!(!condition().verify(&check).unwrap());
    }

    #[test]
    fn unrelated_output_rejected() {
        let (input_tx, _, spending_tx) = fixture();
        let witness = sign_tx(&test_key(1), &spending_tx);
        let check = SpendingCheck {
            input_tx: &input_tx,
            output_index: 0,
            output_id: OutputId([1u8; 32]),
            spending_tx: &spending_tx,
            input_index: 0,
            witness: &witness,
        };
        assert!(!condition().verify(&check).unwrap());

        let check = SpendingCheck {
            input_index: 3,
            ..check
        };
        assert!(!condition().verify(&check).unwrap());
    }

    #[test]
    fn malformed_spending_tx_errors() {
        let (input_tx, output_id, _) = fixture();
        let check = SpendingCheck {
            input_tx: &input_tx,
            output_index: 0,
            output_id,
            spending_tx: &[0xc0],
            input_index: 0,
            witness: &[],
        };
        assert!(condition().verify(&check).is_err());
    }
}
