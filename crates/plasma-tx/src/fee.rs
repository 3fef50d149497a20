//! Fee-claim transaction view.
//!
//! Same envelope as every other transaction, constrained to exactly one
//! value output of [`FEE_OUTPUT_TYPE`] followed by one nonce output, and at
//! most one input (the previous fee claim's nonce output).

use plasma_types::constants::{FEE_NONCE_OUTPUT_TYPE, FEE_OUTPUT_TYPE, FEE_TX_TYPE};
use plasma_types::{PlasmaError, Result, TxType};

use crate::output::{FeeNonceOutput, WireTransactionOutput};
use crate::transaction::WireTransaction;

/// Index of the value output within a fee transaction.
pub const FEE_VALUE_OUTPUT_INDEX: u64 = 0;

/// Index of the nonce output within a fee transaction.
pub const FEE_NONCE_OUTPUT_INDEX: u64 = 1;

/// A [`WireTransaction`] checked against the fee shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeeTransaction {
    pub tx: WireTransaction,
    pub value: WireTransactionOutput,
    pub nonce: FeeNonceOutput,
}

impl FeeTransaction {
    pub fn try_from_wire(tx: WireTransaction) -> Result<Self> {
        let invalid = |reason: String| PlasmaError::InvalidTransaction { reason };

        if tx.tx_type != TxType(FEE_TX_TYPE) {
            return Err(invalid(format!(
                "expected fee {}, got {}",
                TxType(FEE_TX_TYPE),
                tx.tx_type
            )));
        }
        if tx.inputs.len() > 1 {
            return Err(invalid(format!(
                "fee transaction consumes at most one nonce, got {} inputs",
                tx.inputs.len()
            )));
        }
        let [first, second] = tx.outputs.as_slice() else {
            return Err(invalid(format!(
                "fee transaction needs exactly 2 outputs, got {}",
                tx.outputs.len()
            )));
        };
        let value = first
            .as_value()
            .filter(|v| v.output_type.0 == FEE_OUTPUT_TYPE)
            .ok_or_else(|| invalid("first fee output must be a fee value output".to_string()))?
            .clone();
        if value.amount == 0 {
            return Err(invalid("fee output has zero amount".to_string()));
        }
        let nonce = second
            .as_fee_nonce()
            .filter(|n| n.output_type.0 == FEE_NONCE_OUTPUT_TYPE)
            .ok_or_else(|| invalid("second fee output must be a nonce output".to_string()))?
            .clone();

        Ok(Self { tx, value, nonce })
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        Self::try_from_wire(WireTransaction::decode(bytes)?)
    }

    /// Whether this is the first claim of a chain (no consumed nonce).
    #[must_use]
    pub fn is_genesis(&self) -> bool {
        self.tx.inputs.is_empty()
    }
}
