//! Payment transaction view: 0..=4 inputs, 1..=4 value outputs.

use plasma_types::constants::{FEE_NONCE_OUTPUT_TYPE, MAX_INPUTS, MAX_OUTPUTS};
use plasma_types::{PlasmaError, Result, TxType};

use crate::output::WireTransactionOutput;
use crate::transaction::WireTransaction;

/// A [`WireTransaction`] checked against the payment shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentTransaction {
    pub tx: WireTransaction,
    pub outputs: Vec<WireTransactionOutput>,
}

impl PaymentTransaction {
    /// Check `tx` against the payment shape for `tx_type`.
    pub fn try_from_wire(tx: WireTransaction, tx_type: TxType) -> Result<Self> {
        let invalid = |reason: String| PlasmaError::InvalidTransaction { reason };

        if tx.tx_type != tx_type {
            return Err(invalid(format!(
                "expected payment {tx_type}, got {}",
                tx.tx_type
            )));
        }
        if tx.inputs.len() > MAX_INPUTS {
            return Err(invalid(format!("{} inputs exceed {MAX_INPUTS}", tx.inputs.len())));
        }
        if tx.outputs.is_empty() || tx.outputs.len() > MAX_OUTPUTS {
            return Err(invalid(format!(
                "payment needs 1..={MAX_OUTPUTS} outputs, got {}",
                tx.outputs.len()
            )));
        }

        let mut outputs = Vec::with_capacity(tx.outputs.len());
        for (i, output) in tx.outputs.iter().enumerate() {
            let value = output
                .as_value()
                .filter(|v| v.output_type.0 != FEE_NONCE_OUTPUT_TYPE)
                .ok_or_else(|| invalid(format!("output {i} is not a value output")))?;
            if value.amount == 0 {
                return Err(invalid(format!("output {i} has zero amount")));
            }
            if value.guard == [0u8; 32] {
                return Err(invalid(format!("output {i} has an empty guard")));
            }
            outputs.push(value.clone());
        }
        Ok(Self { tx, outputs })
    }

    /// Decode and check in one step.
    pub fn decode(bytes: &[u8], tx_type: TxType) -> Result<Self> {
        Self::try_from_wire(WireTransaction::decode(bytes)?, tx_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::{FeeNonceOutput, TransactionOutput};
    use plasma_types::{AssetId, OutputId, OutputType, OwnerAddress};

    fn value(amount: u128) -> TransactionOutput {
        WireTransactionOutput::new(OutputType(1), OwnerAddress([1u8; 32]), AssetId::NATIVE, amount)
            .into()
    }

    #[test]
    fn accepts_well_formed_payment() {
        let tx = WireTransaction::new(
            TxType(1),
            vec![OutputId([0u8; 32])],
            vec![value(5), value(6)],
        );
        let payment = PaymentTransaction::decode(&tx.encode(), TxType(1)).unwrap();
        assert_eq!(payment.outputs.len(), 2);
        assert_eq!(payment.outputs[1].amount, 6);
    }

    #[test]
    fn rejects_wrong_type() {
        let tx = WireTransaction::new(TxType(2), vec![], vec![value(5)]);
        assert!(PaymentTransaction::try_from_wire(tx, TxType(1)).is_err());
    }

    #[test]
    fn rejects_missing_outputs_and_zero_amounts() {
        let empty = WireTransaction::new(TxType(1), vec![], vec![]);
        assert!(PaymentTransaction::try_from_wire(empty, TxType(1)).is_err());

        let zero = WireTransaction::new(TxType(1), vec![], vec![value(0)]);
        assert!(PaymentTransaction::try_from_wire(zero, TxType(1)).is_err());
    }

    #[test]
    fn rejects_nonce_outputs() {
        let tx = WireTransaction::new(
            TxType(1),
            vec![],
            vec![
                value(1),
                FeeNonceOutput {
                    output_type: OutputType(FEE_NONCE_OUTPUT_TYPE),
                    nonce: 1,
                }
                .into(),
            ],
        );
        let err = PaymentTransaction::try_from_wire(tx, TxType(1)).unwrap_err();
        assert!(matches!(err, PlasmaError::InvalidTransaction { .. }));
    }
}
