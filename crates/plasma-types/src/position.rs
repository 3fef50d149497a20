//! Packed UTXO and transaction positions.
//!
//! A position packs `(block_number, tx_index, output_index)` into one `u64`:
//!
//! ```text
//! utxo_pos = block_number * BLOCK_OFFSET + tx_index * TX_OFFSET + output_index
//! ```
//!
//! Because `tx_index < BLOCK_OFFSET / TX_OFFSET` and `output_index < TX_OFFSET`,
//! integer ordering equals lexicographic `(block, tx, output)` ordering. That
//! ordering is exit priority: older outputs exit first.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::{BLOCK_OFFSET, MAX_OUTPUT_INDEX, MAX_TX_INDEX, TX_OFFSET};
use crate::{PlasmaError, Result};

// ---------------------------------------------------------------------------
// UtxoPosition
// ---------------------------------------------------------------------------

/// Position of a single output in the child chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct UtxoPosition(pub u64);

impl UtxoPosition {
    /// The "not yet included" sentinel. Block 0 is never committed.
    pub const UNCONFIRMED: Self = Self(0);

    /// Pack a position, rejecting components that would overflow their slot.
    pub fn new(block_number: u64, tx_index: u64, output_index: u64) -> Result<Self> {
        if tx_index > MAX_TX_INDEX {
            return Err(PlasmaError::InvalidPosition {
                reason: format!("tx index {tx_index} exceeds {MAX_TX_INDEX}"),
            });
        }
        if output_index > MAX_OUTPUT_INDEX {
            return Err(PlasmaError::InvalidPosition {
                reason: format!("output index {output_index} exceeds {MAX_OUTPUT_INDEX}"),
            });
        }
        let packed = block_number
            .checked_mul(BLOCK_OFFSET)
            .and_then(|b| b.checked_add(tx_index * TX_OFFSET + output_index))
            .ok_or_else(|| PlasmaError::InvalidPosition {
                reason: format!("block number {block_number} overflows the position encoding"),
            })?;
        Ok(Self(packed))
    }

    #[must_use]
    pub fn block_number(self) -> u64 {
        self.0 / BLOCK_OFFSET
    }

    #[must_use]
    pub fn tx_index(self) -> u64 {
        (self.0 % BLOCK_OFFSET) / TX_OFFSET
    }

    #[must_use]
    pub fn output_index(self) -> u64 {
        self.0 % TX_OFFSET
    }

    /// Position of the transaction that owns this output.
    #[must_use]
    pub fn tx_position(self) -> TxPosition {
        TxPosition(self.0 - self.output_index())
    }

    /// Whether this output lives in a deposit block (block number not a
    /// multiple of the child-block interval).
    #[must_use]
    pub fn is_deposit(self, child_block_interval: u64) -> bool {
        self.block_number() % child_block_interval != 0
    }

    /// Whether this is the unconfirmed sentinel.
    #[must_use]
    pub fn is_unconfirmed(self) -> bool {
        self == Self::UNCONFIRMED
    }
}

impl fmt::Display for UtxoPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "utxo:{}/{}/{}",
            self.block_number(),
            self.tx_index(),
            self.output_index()
        )
    }
}

// ---------------------------------------------------------------------------
// TxPosition
// ---------------------------------------------------------------------------

/// Position of a transaction: a [`UtxoPosition`] with output index zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct TxPosition(pub u64);

impl TxPosition {
    /// The "not yet included" sentinel.
    pub const UNCONFIRMED: Self = Self(0);

    /// Position assigned to a competitor that never proved inclusion; it sorts
    /// after every real position, so it's always the youngest.
    pub const YOUNGEST: Self = Self(u64::MAX);

    pub fn new(block_number: u64, tx_index: u64) -> Result<Self> {
        UtxoPosition::new(block_number, tx_index, 0).map(|p| Self(p.0))
    }

    #[must_use]
    pub fn block_number(self) -> u64 {
        self.0 / BLOCK_OFFSET
    }

    #[must_use]
    pub fn tx_index(self) -> u64 {
        (self.0 % BLOCK_OFFSET) / TX_OFFSET
    }

    /// Position of output `output_index` of this transaction.
    pub fn output(self, output_index: u64) -> Result<UtxoPosition> {
        UtxoPosition::new(self.block_number(), self.tx_index(), output_index)
    }

    #[must_use]
    pub fn is_unconfirmed(self) -> bool {
        self == Self::UNCONFIRMED
    }
}

impl From<UtxoPosition> for TxPosition {
    fn from(pos: UtxoPosition) -> Self {
        pos.tx_position()
    }
}

impl fmt::Display for TxPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::YOUNGEST {
            return write!(f, "tx:unincluded");
        }
        write!(f, "tx:{}/{}", self.block_number(), self.tx_index())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pack_and_unpack() {
        let pos = UtxoPosition::new(2000, 3, 1).unwrap();
        assert_eq!(pos.0, 2000 * BLOCK_OFFSET + 3 * TX_OFFSET + 1);
        assert_eq!(pos.block_number(), 2000);
        assert_eq!(pos.tx_index(), 3);
        assert_eq!(pos.output_index(), 1);
    }

    #[test]
    fn ordering_is_lexicographic() {
        let a = UtxoPosition::new(1000, 9, 3).unwrap();
        let b = UtxoPosition::new(1000, 10, 0).unwrap();
        let c = UtxoPosition::new(1001, 0, 0).unwrap();
        assert!(a < b);
        assert!(b < c);
    }

    #[test]
    fn rejects_oversized_components() {
        assert!(UtxoPosition::new(1, MAX_TX_INDEX + 1, 0).is_err());
        assert!(UtxoPosition::new(1, 0, MAX_OUTPUT_INDEX + 1).is_err());
        assert!(UtxoPosition::new(u64::MAX, 0, 0).is_err());
    }

    #[test]
    fn tx_position_drops_output_index() {
        let pos = UtxoPosition::new(3000, 2, 3).unwrap();
        let tx = pos.tx_position();
        assert_eq!(tx, TxPosition::new(3000, 2).unwrap());
        assert_eq!(tx.output(3).unwrap(), pos);
    }

    #[test]
    fn deposit_detection() {
        assert!(UtxoPosition::new(1001, 0, 0).unwrap().is_deposit(1000));
        assert!(!UtxoPosition::new(2000, 0, 0).unwrap().is_deposit(1000));
    }

    #[test]
    fn sentinel_only_at_zero() {
        assert!(UtxoPosition(0).is_unconfirmed());
        assert!(!UtxoPosition::new(0, 0, 1).unwrap().is_unconfirmed());
        assert!(!UtxoPosition::new(1000, 0, 0).unwrap().is_unconfirmed());
    }

    #[test]
    fn youngest_sorts_last() {
        assert!(TxPosition::new(u64::MAX / BLOCK_OFFSET - 1, 0).unwrap() < TxPosition::YOUNGEST);
    }
}
