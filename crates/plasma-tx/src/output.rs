//! Typed transaction outputs.
//!
//! Outputs form a closed set dispatched on the explicit output type:
//! [`FEE_NONCE_OUTPUT_TYPE`] decodes as a two-field [`FeeNonceOutput`], every
//! other type as a four-field [`WireTransactionOutput`].
//!
//! ```text
//! value output : [output_type, guard(32), asset(20), amount]
//! nonce output : [output_type, nonce]
//! ```

use rlp::{Rlp, RlpStream};
use serde::{Deserialize, Serialize};

use plasma_types::constants::FEE_NONCE_OUTPUT_TYPE;
use plasma_types::{AssetId, OutputType, OwnerAddress, Result};

use crate::rlp_util::{
    append_bytes, append_uint, decode_fixed, decode_u32, decode_u64, decode_uint, item,
    malformed, rlp_error,
};

/// An output carrying value, guarded by an address-like owner commitment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireTransactionOutput {
    pub output_type: OutputType,
    /// Opaque ownership commitment; the output guard handler for
    /// `output_type` resolves it to an owner.
    pub guard: [u8; 32],
    pub asset: AssetId,
    pub amount: u128,
}

impl WireTransactionOutput {
    #[must_use]
    pub fn new(output_type: OutputType, owner: OwnerAddress, asset: AssetId, amount: u128) -> Self {
        Self {
            output_type,
            guard: owner.0,
            asset,
            amount,
        }
    }
}

/// A valueless output that only makes fee transactions unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeNonceOutput {
    pub output_type: OutputType,
    pub nonce: u64,
}

/// Any output of a [`crate::WireTransaction`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionOutput {
    Value(WireTransactionOutput),
    FeeNonce(FeeNonceOutput),
}

impl TransactionOutput {
    #[must_use]
    pub fn output_type(&self) -> OutputType {
        match self {
            Self::Value(out) => out.output_type,
            Self::FeeNonce(out) => out.output_type,
        }
    }

    /// Value carried; zero for nonce outputs.
    #[must_use]
    pub fn amount(&self) -> u128 {
        match self {
            Self::Value(out) => out.amount,
            Self::FeeNonce(_) => 0,
        }
    }

    #[must_use]
    pub fn as_value(&self) -> Option<&WireTransactionOutput> {
        match self {
            Self::Value(out) => Some(out),
            Self::FeeNonce(_) => None,
        }
    }

    #[must_use]
    pub fn as_fee_nonce(&self) -> Option<&FeeNonceOutput> {
        match self {
            Self::FeeNonce(out) => Some(out),
            Self::Value(_) => None,
        }
    }

    pub(crate) fn rlp_append(&self, stream: &mut RlpStream) {
        match self {
            Self::Value(out) => {
                stream.begin_list(4);
                append_uint(stream, u128::from(out.output_type.0));
                append_bytes(stream, &out.guard);
                append_bytes(stream, &out.asset.0);
                append_uint(stream, out.amount);
            }
            Self::FeeNonce(out) => {
                stream.begin_list(2);
                append_uint(stream, u128::from(out.output_type.0));
                append_uint(stream, u128::from(out.nonce));
            }
        }
    }

    pub(crate) fn decode(rlp: &Rlp<'_>, index: usize) -> Result<Self> {
        let field = format!("output[{index}]");
        if !rlp.is_list() {
            return Err(malformed(format!("{field} must be an RLP list")));
        }
        let count = rlp.item_count().map_err(|e| rlp_error(&field, e))?;
        if count == 0 {
            return Err(malformed(format!("{field} is empty")));
        }
        let output_type = OutputType(decode_u32(&item(rlp, 0, &field)?, &field)?);

        if output_type.0 == FEE_NONCE_OUTPUT_TYPE {
            if count != 2 {
                return Err(malformed(format!(
                    "{field} (fee nonce) must have 2 fields, got {count}"
                )));
            }
            let nonce = decode_u64(&item(rlp, 1, &field)?, &format!("{field}.nonce"))?;
            return Ok(Self::FeeNonce(FeeNonceOutput { output_type, nonce }));
        }

        if count != 4 {
            return Err(malformed(format!(
                "{field} must have 4 fields, got {count}"
            )));
        }
        Ok(Self::Value(WireTransactionOutput {
            output_type,
            guard: decode_fixed::<32>(&item(rlp, 1, &field)?, &format!("{field}.guard"))?,
            asset: AssetId(decode_fixed::<20>(
                &item(rlp, 2, &field)?,
                &format!("{field}.asset"),
            )?),
            amount: decode_uint(&item(rlp, 3, &field)?, &format!("{field}.amount"))?,
        }))
    }
}

impl From<WireTransactionOutput> for TransactionOutput {
    fn from(out: WireTransactionOutput) -> Self {
        Self::Value(out)
    }
}

impl From<FeeNonceOutput> for TransactionOutput {
    fn from(out: FeeNonceOutput) -> Self {
        Self::FeeNonce(out)
    }
}
