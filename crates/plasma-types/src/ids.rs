//! Identifiers used throughout the exit core.
//!
//! Owners are raw ed25519 verifying keys, assets are 20-byte token
//! addresses (all-zero for the native asset), and every derived id is a
//! domain-separated SHA-256 digest.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::digest::{Hash32, tagged_hash};
use crate::position::UtxoPosition;

// ---------------------------------------------------------------------------
// OwnerAddress
// ---------------------------------------------------------------------------

/// Address of an output owner, exit owner or challenger.
/// This is the raw ed25519 verifying key (32 bytes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct OwnerAddress(pub [u8; 32]);

impl OwnerAddress {
    #[must_use]
    pub fn from_pubkey(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    #[must_use]
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl fmt::Display for OwnerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "owner:{}", hex::encode(&self.0[..8]))
    }
}

// ---------------------------------------------------------------------------
// AssetId
// ---------------------------------------------------------------------------

/// Token address of an asset. The all-zero address is the native asset,
/// which is also the asset bonds are denominated in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct AssetId(pub [u8; 20]);

impl AssetId {
    pub const NATIVE: Self = Self([0u8; 20]);

    #[must_use]
    pub fn is_native(&self) -> bool {
        *self == Self::NATIVE
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_native() {
            return write!(f, "asset:native");
        }
        write!(f, "asset:{}", hex::encode(self.0))
    }
}

// ---------------------------------------------------------------------------
// OutputId
// ---------------------------------------------------------------------------

/// Identifier linking a transaction input to the exact output it consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct OutputId(pub Hash32);

impl fmt::Display for OutputId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "out:{}", hex::encode(&self.0[..8]))
    }
}

// ---------------------------------------------------------------------------
// TxType / OutputType
// ---------------------------------------------------------------------------

/// Transaction type discriminant carried in the wire envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct TxType(pub u32);

impl fmt::Display for TxType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tx_type:{}", self.0)
    }
}

/// Output type discriminant carried in every output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct OutputType(pub u32);

impl fmt::Display for OutputType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "output_type:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// ExitId
// ---------------------------------------------------------------------------

/// Identifier of a standard or in-flight exit (160 bits of a digest).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct ExitId(pub [u8; 20]);

impl ExitId {
    /// Id of a standard exit.
    ///
    /// Deposit transactions can be byte-identical, so their exit id also
    /// commits to the full position. Any other transaction is unique through
    /// its inputs, so the output index is enough.
    #[must_use]
    pub fn standard(is_deposit: bool, tx_bytes: &[u8], utxo_pos: UtxoPosition) -> Self {
        let digest = if is_deposit {
            tagged_hash(
                b"plasma:standard_exit:deposit:v1:",
                &[tx_bytes, &utxo_pos.0.to_be_bytes()],
            )
        } else {
            tagged_hash(
                b"plasma:standard_exit:v1:",
                &[tx_bytes, &utxo_pos.output_index().to_be_bytes()],
            )
        };
        Self::truncate(&digest)
    }

    /// Id of an in-flight exit: one exit per transaction.
    #[must_use]
    pub fn in_flight(tx_bytes: &[u8]) -> Self {
        Self::truncate(&tagged_hash(b"plasma:in_flight_exit:v1:", &[tx_bytes]))
    }

    fn truncate(digest: &Hash32) -> Self {
        let mut id = [0u8; 20];
        id.copy_from_slice(&digest[..20]);
        Self(id)
    }
}

impl fmt::Display for ExitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "exit:{}", hex::encode(&self.0[..8]))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
