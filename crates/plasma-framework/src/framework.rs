//! The root-chain framework: block store, exit-game protocol registry and
//! output spent flags.
//!
//! Child blocks are numbered `interval, 2*interval, ...`. Deposit blocks take
//! the numbers in between, `interval - 1` of them at most before the next
//! child block is submitted. Blocks are append-only.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use plasma_types::{
    BlockRecord, FrameworkConfig, Hash32, OutputId, PlasmaError, Protocol, Result, TxType,
};

use crate::clock::LedgerClock;

#[derive(Debug)]
struct FrameworkState {
    blocks: BTreeMap<u64, BlockRecord>,
    next_child_block: u64,
    /// Offset of the next deposit block within the current interval.
    next_deposit_block: u64,
    exit_games: HashMap<TxType, Protocol>,
    spent_outputs: HashSet<OutputId>,
}

/// Shared root-chain state consumed by the finality verifier and exit games.
pub struct PlasmaFramework {
    config: FrameworkConfig,
    clock: Arc<dyn LedgerClock>,
    state: RwLock<FrameworkState>,
}

impl PlasmaFramework {
    /// Create an empty framework.
    ///
    /// # Errors
    /// [`PlasmaError::Configuration`] if `config` is invalid.
    pub fn new(config: FrameworkConfig, clock: Arc<dyn LedgerClock>) -> Result<Self> {
        config.validate()?;
        let next_child_block = config.child_block_interval;
        Ok(Self {
            config,
            clock,
            state: RwLock::new(FrameworkState {
                blocks: BTreeMap::new(),
                next_child_block,
                next_deposit_block: 1,
                exit_games: HashMap::new(),
                spent_outputs: HashSet::new(),
            }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &FrameworkConfig {
        &self.config
    }

    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    // -----------------------------------------------------------------------
    // Blocks
    // -----------------------------------------------------------------------

    /// Commit an operator block root. Returns the block number.
    pub fn submit_block(&self, root: Hash32, transaction_count: u64) -> Result<u64> {
        let submitted_at = self.clock.now();
        let mut state = self.state.write();
        let number = state.next_child_block;
        let next = number
            .checked_add(self.config.child_block_interval)
            .ok_or_else(|| PlasmaError::Internal("child block numbers exhausted".to_string()))?;

        state.blocks.insert(
            number,
            BlockRecord {
                root,
                transaction_count,
                submitted_at,
            },
        );
        state.next_child_block = next;
        state.next_deposit_block = 1;

        tracing::info!(
            block = number,
            root = hex::encode(root),
            transactions = transaction_count,
            "Child block submitted"
        );
        Ok(number)
    }

    /// Commit a single-transaction deposit block root. Returns the block
    /// number.
    ///
    /// # Errors
    /// [`PlasmaError::DepositBlocksExhausted`] once every slot before the next
    /// child block is used.
    pub fn submit_deposit_block(&self, root: Hash32) -> Result<u64> {
        let submitted_at = self.clock.now();
        let mut state = self.state.write();
        if state.next_deposit_block >= self.config.child_block_interval {
            return Err(PlasmaError::DepositBlocksExhausted {
                next_child_block: state.next_child_block,
            });
        }
        let number =
            state.next_child_block - self.config.child_block_interval + state.next_deposit_block;

        state.blocks.insert(
            number,
            BlockRecord {
                root,
                transaction_count: 1,
                submitted_at,
            },
        );
        state.next_deposit_block += 1;

        tracing::info!(block = number, root = hex::encode(root), "Deposit block submitted");
        Ok(number)
    }

    /// Stored block `number`.
    pub fn block(&self, number: u64) -> Result<BlockRecord> {
        self.state
            .read()
            .blocks
            .get(&number)
            .cloned()
            .ok_or(PlasmaError::BlockNotFound(number))
    }

    #[must_use]
    pub fn next_child_block(&self) -> u64 {
        self.state.read().next_child_block
    }

    /// Number the next deposit block would get.
    #[must_use]
    pub fn next_deposit_block(&self) -> u64 {
        let state = self.state.read();
        state.next_child_block - self.config.child_block_interval + state.next_deposit_block
    }

    // -----------------------------------------------------------------------
    // Exit-game registry
    // -----------------------------------------------------------------------

    /// Bind `tx_type` to a finality protocol. Write-once.
    ///
    /// # Errors
    /// [`PlasmaError::InvalidProtocol`] for an unknown tag,
    /// [`PlasmaError::DuplicateRegistration`] if the type is already bound.
    pub fn register_exit_game(&self, tx_type: TxType, protocol_tag: u8) -> Result<()> {
        let protocol = Protocol::from_tag(protocol_tag)?;
        let mut state = self.state.write();
        if state.exit_games.contains_key(&tx_type) {
            return Err(PlasmaError::DuplicateRegistration {
                key: format!("exit_game({tx_type})"),
            });
        }
        state.exit_games.insert(tx_type, protocol);
        tracing::info!(tx_type = %tx_type, protocol = %protocol, "Exit game registered");
        Ok(())
    }

    /// Protocol bound to `tx_type`.
    pub fn protocol_for(&self, tx_type: TxType) -> Result<Protocol> {
        self.state
            .read()
            .exit_games
            .get(&tx_type)
            .copied()
            .ok_or(PlasmaError::TxTypeNotRegistered(tx_type))
    }

    // -----------------------------------------------------------------------
    // Spent outputs
    // -----------------------------------------------------------------------

    /// Mark outputs as withdrawn. Idempotent.
    pub fn flag_outputs_spent(&self, outputs: &[OutputId]) {
        let mut state = self.state.write();
        for id in outputs {
            if state.spent_outputs.insert(*id) {
                tracing::debug!(output = %id, "Output flagged spent");
            }
        }
    }

    #[must_use]
    pub fn is_output_spent(&self, output: &OutputId) -> bool {
        self.state.read().spent_outputs.contains(output)
    }
}

impl std::fmt::Debug for PlasmaFramework {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlasmaFramework")
            .field("config", &self.config)
            .field("state", &*self.state.read())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn framework() -> PlasmaFramework {
        let config = FrameworkConfig {
            child_block_interval: 4,
            ..FrameworkConfig::default()
        };
        PlasmaFramework::new(config, Arc::new(ManualClock::at_epoch())).unwrap()
    }

    #[test]
    fn child_blocks_step_by_interval() {
        let fw = framework();
        assert_eq!(fw.submit_block([1u8; 32], 3).unwrap(), 4);
        assert_eq!(fw.submit_block([2u8; 32], 1).unwrap(), 8);
        assert_eq!(fw.block(4).unwrap().transaction_count, 3);
        assert_eq!(fw.block(8).unwrap().root, [2u8; 32]);
        assert!(matches!(fw.block(12).unwrap_err(), PlasmaError::BlockNotFound(12)));
    }

    #[test]
    fn deposit_blocks_fill_the_gap() {
        let fw = framework();
        assert_eq!(fw.submit_deposit_block([1u8; 32]).unwrap(), 1);
        assert_eq!(fw.submit_deposit_block([2u8; 32]).unwrap(), 2);
        assert_eq!(fw.submit_deposit_block([3u8; 32]).unwrap(), 3);
        let err = fw.submit_deposit_block([4u8; 32]).unwrap_err();
        assert!(matches!(
            err,
            PlasmaError::DepositBlocksExhausted { next_child_block: 4 }
        ));

        assert_eq!(fw.submit_block([5u8; 32], 1).unwrap(), 4);
        assert_eq!(fw.next_deposit_block(), 5);
        assert_eq!(fw.submit_deposit_block([6u8; 32]).unwrap(), 5);
    }

    #[test]
    fn block_zero_is_never_committed() {
        let fw = framework();
        fw.submit_deposit_block([1u8; 32]).unwrap();
        fw.submit_block([2u8; 32], 1).unwrap();
        assert!(fw.block(0).is_err());
    }

    #[test]
    fn exit_game_registration_is_write_once() {
        let fw = framework();
        fw.register_exit_game(TxType(1), 2).unwrap();
        let err = fw.register_exit_game(TxType(1), 1).unwrap_err();
        assert!(matches!(err, PlasmaError::DuplicateRegistration { .. }));
        assert_eq!(fw.protocol_for(TxType(1)).unwrap(), Protocol::MoreVp);
    }

    #[test]
    fn exit_game_registration_rejects_unknown_protocol() {
        let fw = framework();
        let err = fw.register_exit_game(TxType(1), 9).unwrap_err();
        assert!(matches!(err, PlasmaError::InvalidProtocol(9)));
        assert!(matches!(
            fw.protocol_for(TxType(1)).unwrap_err(),
            PlasmaError::TxTypeNotRegistered(_)
        ));
    }

    #[test]
    fn spent_flags() {
        let fw = framework();
        let id = OutputId([7u8; 32]);
        assert!(!fw.is_output_spent(&id));
        fw.flag_outputs_spent(&[id, id]);
        assert!(fw.is_output_spent(&id));
    }

    #[test]
    fn rejects_invalid_config() {
        let config = FrameworkConfig {
            merkle_tree_depth: 0,
            ..FrameworkConfig::default()
        };
        assert!(PlasmaFramework::new(config, Arc::new(ManualClock::at_epoch())).is_err());
    }
}
