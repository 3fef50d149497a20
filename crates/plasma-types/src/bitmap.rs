//! Fixed-size per-slot bit vector for in-flight exit inputs and outputs.

use serde::{Deserialize, Serialize};

/// One bit per input or output slot. Transactions carry at most
/// [`crate::constants::MAX_INPUTS`] inputs and
/// [`crate::constants::MAX_OUTPUTS`] outputs, so eight bits suffice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SlotBitmap(pub u8);

impl SlotBitmap {
    /// Number of addressable slots.
    pub const CAPACITY: usize = 8;

    #[must_use]
    pub fn is_set(self, index: usize) -> bool {
        index < Self::CAPACITY && self.0 & (1 << index) != 0
    }

    /// Copy with `index` set. Out-of-range indices leave the bitmap unchanged.
    #[must_use]
    pub fn with(self, index: usize) -> Self {
        if index >= Self::CAPACITY {
            return self;
        }
        Self(self.0 | (1 << index))
    }

    /// Copy with `index` cleared.
    #[must_use]
    pub fn without(self, index: usize) -> Self {
        if index >= Self::CAPACITY {
            return self;
        }
        Self(self.0 & !(1 << index))
    }

    #[must_use]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Indices of all set bits below `count`, ascending.
    pub fn iter_set(self, count: usize) -> impl Iterator<Item = usize> {
        (0..count.min(Self::CAPACITY)).filter(move |&i| self.is_set(i))
    }
}
