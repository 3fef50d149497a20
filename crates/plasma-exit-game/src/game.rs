//! The payment exit game: shared state, wiring and the payout path.
//!
//! Every operation validates and mutates under one lock, collects the value
//! releases it owes, drops the lock and only then calls the vault. A vault
//! that re-enters the game therefore sees the post-transition state.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use plasma_framework::{PlasmaFramework, verify_inclusion};
use plasma_tx::{WireTransaction, WireTransactionOutput};
use plasma_types::{
    AssetId, ExitGameConfig, ExitId, InFlightExit, OwnerAddress, PlasmaError, Result,
    StandardExit, TxPosition, UtxoPosition,
};
use serde::Serialize;

use crate::conditions::SpendingCheck;
use crate::priority_queue::ExitPriorityQueues;
use crate::registry::CapabilityRegistries;
use crate::vault::Vault;

// ---------------------------------------------------------------------------
// Payouts
// ---------------------------------------------------------------------------

/// Why value left custody.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PayoutKind {
    /// Exited output value.
    ExitValue,
    /// A bond returned to whoever posted it.
    BondReturned,
    /// A bond forfeited to a successful challenger.
    BondAwarded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Payout {
    pub recipient: OwnerAddress,
    pub asset: AssetId,
    pub amount: u128,
    pub kind: PayoutKind,
}

impl Payout {
    /// Bonds are always posted in the native asset.
    pub(crate) fn bond(recipient: OwnerAddress, amount: u128, kind: PayoutKind) -> Self {
        Self {
            recipient,
            asset: AssetId::NATIVE,
            amount,
            kind,
        }
    }
}

/// Outcome of the payout phase. Failed releases aren't retried or rolled
/// back; the state transition that owed them stands.
#[derive(Debug, Default)]
pub struct PayoutReport {
    pub paid: Vec<Payout>,
    pub failed: Vec<(Payout, PlasmaError)>,
}

impl PayoutReport {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    /// Sum paid to `recipient` in `asset` by this report.
    #[must_use]
    pub fn total_to(&self, recipient: OwnerAddress, asset: AssetId) -> u128 {
        self.paid
            .iter()
            .filter(|p| p.recipient == recipient && p.asset == asset)
            .map(|p| p.amount)
            .sum()
    }
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub(crate) struct GameState {
    pub(crate) standard_exits: HashMap<ExitId, StandardExit>,
    pub(crate) in_flight_exits: HashMap<ExitId, InFlightExit>,
    pub(crate) queues: ExitPriorityQueues,
}

// ---------------------------------------------------------------------------
// PaymentExitGame
// ---------------------------------------------------------------------------

/// Exit game for one payment transaction type.
pub struct PaymentExitGame {
    pub(crate) config: ExitGameConfig,
    pub(crate) framework: Arc<PlasmaFramework>,
    pub(crate) registries: Arc<CapabilityRegistries>,
    vault: Arc<dyn Vault>,
    pub(crate) state: Mutex<GameState>,
}

impl PaymentExitGame {
    /// Wire up a game.
    ///
    /// # Errors
    /// [`PlasmaError::Configuration`] if `config` is invalid, or
    /// [`PlasmaError::TxTypeNotRegistered`] if the game's tx type has no
    /// protocol registered in the framework.
    pub fn new(
        config: ExitGameConfig,
        framework: Arc<PlasmaFramework>,
        registries: Arc<CapabilityRegistries>,
        vault: Arc<dyn Vault>,
    ) -> Result<Self> {
        config.validate()?;
        let protocol = framework.protocol_for(config.tx_type)?;
        tracing::info!(
            tx_type = %config.tx_type,
            %protocol,
            "Payment exit game created"
        );
        Ok(Self {
            config,
            framework,
            registries,
            vault,
            state: Mutex::new(GameState::default()),
        })
    }

    #[must_use]
    pub fn config(&self) -> &ExitGameConfig {
        &self.config
    }

    #[must_use]
    pub fn framework(&self) -> &Arc<PlasmaFramework> {
        &self.framework
    }

    #[must_use]
    pub fn standard_exit(&self, exit_id: ExitId) -> Option<StandardExit> {
        self.state.lock().standard_exits.get(&exit_id).cloned()
    }

    #[must_use]
    pub fn in_flight_exit(&self, exit_id: ExitId) -> Option<InFlightExit> {
        self.state.lock().in_flight_exits.get(&exit_id).cloned()
    }

    /// Number of standard exits queued for `asset`.
    #[must_use]
    pub fn queued_exits(&self, asset: AssetId) -> usize {
        self.state.lock().queues.len(asset)
    }

    /// Release every payout in order. Must be called without the state lock.
    pub(crate) fn pay(&self, payouts: Vec<Payout>) -> PayoutReport {
        let mut report = PayoutReport::default();
        for payout in payouts {
            if payout.amount == 0 {
                continue;
            }
            match self
                .vault
                .release(payout.recipient, payout.asset, payout.amount)
            {
                Ok(()) => {
                    tracing::debug!(
                        recipient = %payout.recipient,
                        asset = %payout.asset,
                        amount = payout.amount,
                        kind = ?payout.kind,
                        "Payout released"
                    );
                    report.paid.push(payout);
                }
                Err(err) => {
                    tracing::warn!(
                        recipient = %payout.recipient,
                        asset = %payout.asset,
                        amount = payout.amount,
                        error = %err,
                        "Payout failed"
                    );
                    report.failed.push((payout, err));
                }
            }
        }
        report
    }

    pub(crate) fn ensure_bond(required: u128, provided: u128) -> Result<()> {
        if provided < required {
            return Err(PlasmaError::InsufficientBond { required, provided });
        }
        Ok(())
    }

    /// Value output `output_index` of `tx` together with its owner, resolved
    /// through the guard handler registered for its type.
    pub(crate) fn owned_value_output(
        &self,
        tx: &WireTransaction,
        output_index: u64,
    ) -> Result<(WireTransactionOutput, OwnerAddress)> {
        let output = tx.value_output(output_index)?.clone();
        let handler = self
            .registries
            .resolve_output_guard_handler(output.output_type)?;
        let owner = handler.owner_of(&output);
        Ok((output, owner))
    }

    /// Run the spending condition registered for (`consumed` output type,
    /// type of `check.spending_tx`).
    pub(crate) fn spends(
        &self,
        consumed_type: plasma_types::OutputType,
        check: &SpendingCheck<'_>,
    ) -> Result<bool> {
        let spending = WireTransaction::decode(check.spending_tx)?;
        let condition = self
            .registries
            .resolve_spending_condition(consumed_type, spending.tx_type)?;
        condition.verify(check)
    }

    /// The position `tx_bytes` is proven to sit at, or [`TxPosition::YOUNGEST`]
    /// without a valid proof.
    pub(crate) fn proven_position(
        &self,
        tx_bytes: &[u8],
        position: Option<UtxoPosition>,
        proof: &[u8],
    ) -> TxPosition {
        match position {
            Some(pos) if self.is_included(tx_bytes, pos, proof) => pos.tx_position(),
            _ => TxPosition::YOUNGEST,
        }
    }

    pub(crate) fn is_included(
        &self,
        tx_bytes: &[u8],
        position: UtxoPosition,
        proof: &[u8],
    ) -> bool {
        let Ok(block) = self.framework.block(position.block_number()) else {
            return false;
        };
        verify_inclusion(
            &block.root,
            tx_bytes,
            position.tx_index(),
            proof,
            self.framework.config().merkle_tree_depth,
        )
    }
}

impl std::fmt::Debug for PaymentExitGame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("PaymentExitGame")
            .field("config", &self.config)
            .field("standard_exits", &state.standard_exits.len())
            .field("in_flight_exits", &state.in_flight_exits.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use plasma_framework::SystemClock;
    use plasma_types::{FrameworkConfig, Protocol, TxType};

    use super::*;
    use crate::vault::InMemoryVault;

    fn framework() -> Arc<PlasmaFramework> {
        Arc::new(PlasmaFramework::new(FrameworkConfig::default(), Arc::new(SystemClock)).unwrap())
    }

    #[test]
    fn game_requires_registered_tx_type() {
        let err = PaymentExitGame::new(
            ExitGameConfig::for_tx_type(TxType(1)),
            framework(),
            Arc::new(CapabilityRegistries::new()),
            Arc::new(InMemoryVault::new()),
        )
        .unwrap_err();
        assert!(matches!(err, PlasmaError::TxTypeNotRegistered(_)));
    }

    #[test]
    fn failed_payouts_are_reported_not_fatal() {
        let fw = framework();
        fw.register_exit_game(TxType(1), Protocol::MoreVp.tag()).unwrap();
        let vault = Arc::new(InMemoryVault::new());
        vault.fund(AssetId::NATIVE, 5);
        let game = PaymentExitGame::new(
            ExitGameConfig::for_tx_type(TxType(1)),
            fw,
            Arc::new(CapabilityRegistries::new()),
            vault.clone(),
        )
        .unwrap();

        let alice = OwnerAddress([1u8; 32]);
        let report = game.pay(vec![
            Payout::bond(alice, 3, PayoutKind::BondReturned),
            Payout::bond(alice, 0, PayoutKind::BondReturned),
            Payout::bond(alice, 3, PayoutKind::BondReturned),
        ]);
        assert_eq!(report.paid.len(), 1);
        assert_eq!(report.failed.len(), 1);
        assert!(!report.is_complete());
        assert_eq!(report.total_to(alice, AssetId::NATIVE), 3);
        assert_eq!(vault.reserve(AssetId::NATIVE), 2);
    }

    #[test]
    fn insufficient_bond() {
        assert!(PaymentExitGame::ensure_bond(10, 10).is_ok());
        assert!(matches!(
            PaymentExitGame::ensure_bond(10, 9),
            Err(PlasmaError::InsufficientBond {
                required: 10,
                provided: 9
            })
        ));
    }
}
