//! Per-asset exit queues ordered by UTXO position (oldest first).

use std::collections::{BTreeSet, HashMap};

use plasma_types::{AssetId, ExitId, UtxoPosition};

/// Standard exits waiting to be processed, one ordered set per asset.
#[derive(Debug, Default)]
pub struct ExitPriorityQueues {
    queues: HashMap<AssetId, BTreeSet<(UtxoPosition, ExitId)>>,
}

impl ExitPriorityQueues {
    pub fn insert(&mut self, asset: AssetId, position: UtxoPosition, exit_id: ExitId) {
        self.queues
            .entry(asset)
            .or_default()
            .insert((position, exit_id));
    }

    /// Returns whether the entry was queued.
    pub fn remove(&mut self, asset: AssetId, position: UtxoPosition, exit_id: ExitId) -> bool {
        self.queues
            .get_mut(&asset)
            .is_some_and(|q| q.remove(&(position, exit_id)))
    }

    /// The highest-priority exit for `asset`.
    #[must_use]
    pub fn peek(&self, asset: AssetId) -> Option<(UtxoPosition, ExitId)> {
        self.queues.get(&asset).and_then(|q| q.first().copied())
    }

    pub fn pop(&mut self, asset: AssetId) -> Option<(UtxoPosition, ExitId)> {
        self.queues.get_mut(&asset).and_then(BTreeSet::pop_first)
    }

    #[must_use]
    pub fn len(&self, asset: AssetId) -> usize {
        self.queues.get(&asset).map_or(0, BTreeSet::len)
    }

    #[must_use]
    pub fn is_empty(&self, asset: AssetId) -> bool {
        self.len(asset) == 0
    }
}
