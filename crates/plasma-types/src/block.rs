//! Committed child-chain and deposit blocks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::digest::Hash32;

/// A block root as stored by the framework. Immutable once submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockRecord {
    /// Merkle root over the block's encoded transactions.
    pub root: Hash32,
    /// Number of transactions committed under the root.
    pub transaction_count: u64,
    /// Ledger time of submission.
    pub submitted_at: DateTime<Utc>,
}

impl BlockRecord {
    #[must_use]
    pub fn root_hex(&self) -> String {
        hex::encode(self.root)
    }
}
