//! The wire transaction envelope.
//!
//! ```text
//! [tx_type, [input(32) ...], [output ...], metadata(32)]
//! ```
//!
//! Encoding is deterministic. Decoding is strict: the input must be the
//! exact canonical encoding of the transaction it decodes to, so
//! `encode(decode(b)) == b` holds for every accepted `b`.

use rlp::{Rlp, RlpStream};
use serde::{Deserialize, Serialize};

use plasma_types::constants::{MAX_INPUTS, MAX_OUTPUTS, TX_METADATA_LEN};
use plasma_types::{OutputId, PlasmaError, Result, TxType};

use crate::output::{TransactionOutput, WireTransactionOutput};
use crate::rlp_util::{
    append_bytes, append_uint, decode_fixed, decode_u32, expect_list, item, malformed, rlp_error,
};

const FIELD_COUNT: usize = 4;

/// A decoded child-chain transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireTransaction {
    pub tx_type: TxType,
    /// Ids of the outputs this transaction consumes.
    pub inputs: Vec<OutputId>,
    pub outputs: Vec<TransactionOutput>,
    pub metadata: [u8; TX_METADATA_LEN],
}

impl WireTransaction {
    #[must_use]
    pub fn new(tx_type: TxType, inputs: Vec<OutputId>, outputs: Vec<TransactionOutput>) -> Self {
        Self {
            tx_type,
            inputs,
            outputs,
            metadata: [0u8; TX_METADATA_LEN],
        }
    }

    /// A transaction without inputs.
    #[must_use]
    pub fn is_deposit(&self) -> bool {
        self.inputs.is_empty()
    }

    /// Canonical encoding.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut stream = RlpStream::new_list(FIELD_COUNT);
        append_uint(&mut stream, u128::from(self.tx_type.0));
        stream.begin_list(self.inputs.len());
        for input in &self.inputs {
            append_bytes(&mut stream, &input.0);
        }
        stream.begin_list(self.outputs.len());
        for output in &self.outputs {
            output.rlp_append(&mut stream);
        }
        append_bytes(&mut stream, &self.metadata);
        stream.out().to_vec()
    }

    /// Decode a transaction, rejecting anything but its canonical encoding.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let rlp = Rlp::new(bytes);
        expect_list(&rlp, "transaction", FIELD_COUNT)?;
        let total = rlp
            .payload_info()
            .map_err(|e| rlp_error("transaction", e))?
            .total();
        if total != bytes.len() {
            return Err(malformed(format!(
                "{} trailing bytes after transaction",
                bytes.len().saturating_sub(total)
            )));
        }

        let tx_type = TxType(decode_u32(&item(&rlp, 0, "tx_type")?, "tx_type")?);

        let inputs_rlp = item(&rlp, 1, "inputs")?;
        if !inputs_rlp.is_list() {
            return Err(malformed("inputs must be an RLP list"));
        }
        let input_count = inputs_rlp.item_count().map_err(|e| rlp_error("inputs", e))?;
        if input_count > MAX_INPUTS {
            return Err(PlasmaError::InvalidTransaction {
                reason: format!("{input_count} inputs exceed the maximum of {MAX_INPUTS}"),
            });
        }
        let inputs = (0..input_count)
            .map(|i| {
                let field = format!("input[{i}]");
                decode_fixed::<32>(&item(&inputs_rlp, i, &field)?, &field).map(OutputId)
            })
            .collect::<Result<Vec<_>>>()?;

        let outputs_rlp = item(&rlp, 2, "outputs")?;
        if !outputs_rlp.is_list() {
            return Err(malformed("outputs must be an RLP list"));
        }
        let output_count = outputs_rlp.item_count().map_err(|e| rlp_error("outputs", e))?;
        if output_count > MAX_OUTPUTS {
            return Err(PlasmaError::InvalidTransaction {
                reason: format!("{output_count} outputs exceed the maximum of {MAX_OUTPUTS}"),
            });
        }
        let outputs = (0..output_count)
            .map(|i| TransactionOutput::decode(&item(&outputs_rlp, i, "outputs")?, i))
            .collect::<Result<Vec<_>>>()?;

        let metadata = decode_fixed::<TX_METADATA_LEN>(&item(&rlp, 3, "metadata")?, "metadata")?;

        let tx = Self {
            tx_type,
            inputs,
            outputs,
            metadata,
        };
        // Catches non-minimal length prefixes the field checks can't see.
        if tx.encode() != bytes {
            return Err(malformed("non-canonical encoding"));
        }
        Ok(tx)
    }

    /// Output `index`.
    pub fn output(&self, index: u64) -> Result<&TransactionOutput> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.outputs.get(i))
            .ok_or(PlasmaError::OutputIndexOutOfRange { index })
    }

    /// Output `index`, which must carry value.
    pub fn value_output(&self, index: u64) -> Result<&WireTransactionOutput> {
        self.output(index)?
            .as_value()
            .ok_or_else(|| PlasmaError::InvalidTransaction {
                reason: format!("output {index} carries no value"),
            })
    }
}
