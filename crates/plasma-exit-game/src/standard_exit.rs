//! Standard exits: a single finalized output leaving the child chain.
//!
//! Lifecycle:
//! ```text
//! start ──► PENDING ──► FINALIZED   (processed after the exit period)
//!              │
//!              └──────► CANCELLED   (successful spend challenge)
//! ```
//! A cancelled exit can be restarted; a finalized one can't, because its
//! output is flagged spent in the framework.

use plasma_framework::{FinalityRequest, TxFinalizationVerifier};
use plasma_tx::{WireTransaction, output_id_at};
use plasma_types::{
    AssetId, ExitId, OutputType, OwnerAddress, PlasmaError, Result, StandardExit,
    StandardExitState, UtxoPosition,
};

use crate::conditions::SpendingCheck;
use crate::game::{PaymentExitGame, Payout, PayoutKind, PayoutReport};

/// Arguments of [`PaymentExitGame::start_standard_exit`].
#[derive(Debug, Clone, Copy)]
pub struct StartStandardExit<'a> {
    pub position: UtxoPosition,
    /// Encoded transaction that created the output.
    pub output_tx: &'a [u8],
    /// Output types of the outputs `output_tx` consumes, one per input.
    /// Empty for deposits.
    pub input_output_types: &'a [OutputType],
    pub output_guard_preimage: &'a [u8],
    pub inclusion_proof: &'a [u8],
    /// Only consulted when the output transaction's type is finalized under
    /// MVP: the owner's confirmation of the block root.
    pub confirm_signature: &'a [u8],
    pub bond: u128,
    pub caller: OwnerAddress,
}

/// Arguments of [`PaymentExitGame::challenge_standard_exit`].
#[derive(Debug, Clone, Copy)]
pub struct ChallengeStandardExit<'a> {
    pub exit_id: ExitId,
    /// The transaction that created the exited output.
    pub exiting_tx: &'a [u8],
    /// A transaction spending the exited output.
    pub challenge_tx: &'a [u8],
    pub input_index: usize,
    pub witness: &'a [u8],
    pub challenger: OwnerAddress,
}

/// What a [`PaymentExitGame::process_exits`] call did.
#[derive(Debug, Default)]
pub struct ProcessedExits {
    pub finalized: Vec<ExitId>,
    /// Exits dropped because their output was already withdrawn elsewhere.
    pub omitted: Vec<ExitId>,
    pub payouts: PayoutReport,
}

impl PaymentExitGame {
    /// Start a standard exit of a finalized output owned by the caller.
    ///
    /// # Errors
    /// `InsufficientBond`, `ZeroAmountExit`, `NotOutputOwner`,
    /// `OutputAlreadySpent`, `UnregisteredCapability`, `TxNotFinalized` or
    /// `AlreadyExiting`; `InvalidTransaction` when `input_output_types` does
    /// not cover the inputs; codec errors for a malformed output transaction.
    pub fn start_standard_exit(&self, args: &StartStandardExit<'_>) -> Result<ExitId> {
        Self::ensure_bond(self.config.standard_exit_bond, args.bond)?;

        let tx = WireTransaction::decode(args.output_tx)?;
        let output = tx.value_output(args.position.output_index())?;
        if output.amount == 0 {
            return Err(PlasmaError::ZeroAmountExit);
        }
        let handler = self
            .registries
            .resolve_output_guard_handler(output.output_type)?;
        let owner = handler.owner_of(output);
        if !handler.is_valid(output, args.output_guard_preimage) || owner != args.caller {
            return Err(PlasmaError::NotOutputOwner);
        }

        let interval = self.framework.config().child_block_interval;
        let output_id = output_id_at(args.output_tx, args.position, interval);
        if self.framework.is_output_spent(&output_id) {
            return Err(PlasmaError::OutputAlreadySpent(output_id));
        }

        // Exits must stay challengeable by a spend into this game's tx type.
        self.registries
            .resolve_spending_condition(output.output_type, self.config.tx_type)?;
        self.ensure_inputs_spendable(&tx, args.input_output_types)?;

        let protocol = self.framework.protocol_for(tx.tx_type)?;
        let request = FinalityRequest::new(
            protocol,
            args.output_tx,
            args.position,
            args.inclusion_proof,
        )
        .with_confirmation(args.confirm_signature, owner);
        if !TxFinalizationVerifier::new(&self.framework).is_standard_finalized(&request)? {
            return Err(PlasmaError::TxNotFinalized {
                reason: format!("output transaction at {} is not final", args.position),
            });
        }

        let is_deposit = args.position.is_deposit(interval);
        let exit_id = ExitId::standard(is_deposit, args.output_tx, args.position);
        let now = self.framework.now();

        let mut state = self.state.lock();
        if state
            .standard_exits
            .get(&exit_id)
            .is_some_and(|e| e.state != StandardExitState::Cancelled)
        {
            return Err(PlasmaError::AlreadyExiting(exit_id));
        }
        let exit = StandardExit {
            exit_id,
            owner,
            position: args.position,
            output_id,
            output_type: output.output_type,
            asset: output.asset,
            amount: output.amount,
            bond: args.bond,
            started_at: now,
            state: StandardExitState::Pending,
        };
        state.queues.insert(exit.asset, exit.position, exit_id);
        state.standard_exits.insert(exit_id, exit);
        drop(state);

        tracing::info!(
            exit_id = %exit_id,
            position = %args.position,
            owner = %owner,
            asset = %output.asset,
            amount = output.amount,
            "Standard exit started"
        );
        Ok(exit_id)
    }

    /// Every input of `tx` must consume an output type that a rule lets
    /// `tx`'s own type spend.
    fn ensure_inputs_spendable(
        &self,
        tx: &WireTransaction,
        input_output_types: &[OutputType],
    ) -> Result<()> {
        if input_output_types.len() != tx.inputs.len() {
            return Err(PlasmaError::InvalidTransaction {
                reason: format!(
                    "{} input output types given for a tx with {} inputs",
                    input_output_types.len(),
                    tx.inputs.len()
                ),
            });
        }
        for output_type in input_output_types {
            self.registries
                .resolve_spending_condition(*output_type, tx.tx_type)?;
        }
        Ok(())
    }

    /// Cancel a pending exit by proving its output was spent. The exit bond
    /// goes to the challenger.
    ///
    /// # Errors
    /// `ExitNotFound`, `ExitNotPending`, `InvalidChallenge`, or
    /// `UnregisteredCapability` when no rule covers the challenge tx type.
    pub fn challenge_standard_exit(
        &self,
        args: &ChallengeStandardExit<'_>,
    ) -> Result<PayoutReport> {
        let interval = self.framework.config().child_block_interval;

        let mut state = self.state.lock();
        let exit = state
            .standard_exits
            .get(&args.exit_id)
            .ok_or(PlasmaError::ExitNotFound(args.exit_id))?;
        if !exit.is_pending() {
            return Err(PlasmaError::ExitNotPending(args.exit_id));
        }
        if args.challenge_tx == args.exiting_tx {
            return Err(PlasmaError::InvalidChallenge {
                reason: "challenge tx is the exiting tx".to_string(),
            });
        }
        if output_id_at(args.exiting_tx, exit.position, interval) != exit.output_id {
            return Err(PlasmaError::InvalidChallenge {
                reason: "exiting tx does not match the exit".to_string(),
            });
        }

        let check = SpendingCheck {
            input_tx: args.exiting_tx,
            output_index: exit.position.output_index(),
            output_id: exit.output_id,
            spending_tx: args.challenge_tx,
            input_index: args.input_index,
            witness: args.witness,
        };
        if !self.spends(exit.output_type, &check)? {
            return Err(PlasmaError::InvalidChallenge {
                reason: format!("challenge tx does not spend {}", exit.output_id),
            });
        }

        let mut exit = exit.clone();
        exit.mark_cancelled()?;
        state.queues.remove(exit.asset, exit.position, exit.exit_id);
        let payout = Payout::bond(args.challenger, exit.bond, PayoutKind::BondAwarded);
        state.standard_exits.insert(exit.exit_id, exit);
        drop(state);

        tracing::info!(
            exit_id = %args.exit_id,
            challenger = %args.challenger,
            "Standard exit challenged"
        );
        Ok(self.pay(vec![payout]))
    }

    /// Finalize up to `max_exits` exits of `asset` in position order.
    /// Processing stops at the first exit still inside its exit period.
    pub fn process_exits(&self, asset: AssetId, max_exits: usize) -> ProcessedExits {
        let window = self.framework.config().min_exit_period();
        let now = self.framework.now();
        let mut processed = ProcessedExits::default();
        let mut payouts = Vec::new();

        let mut state = self.state.lock();
        while processed.finalized.len() + processed.omitted.len() < max_exits {
            let Some((_, exit_id)) = state.queues.peek(asset) else {
                break;
            };
            let Some(exit) = state.standard_exits.get(&exit_id).cloned() else {
                state.queues.pop(asset);
                continue;
            };
            if !exit.is_pending() {
                state.queues.pop(asset);
                continue;
            }
            if !exit.is_exitable(window, now) {
                tracing::debug!(exit_id = %exit_id, "Head exit still in its exit period");
                break;
            }
            state.queues.pop(asset);

            let mut exit = exit;
            if self.framework.is_output_spent(&exit.output_id) {
                if exit.mark_cancelled().is_ok() {
                    payouts.push(Payout::bond(exit.owner, exit.bond, PayoutKind::BondReturned));
                    processed.omitted.push(exit_id);
                    tracing::info!(exit_id = %exit_id, "Exit omitted, output already spent");
                }
            } else if exit.mark_finalized().is_ok() {
                self.framework.flag_outputs_spent(&[exit.output_id]);
                payouts.push(Payout {
                    recipient: exit.owner,
                    asset: exit.asset,
                    amount: exit.amount,
                    kind: PayoutKind::ExitValue,
                });
                payouts.push(Payout::bond(exit.owner, exit.bond, PayoutKind::BondReturned));
                processed.finalized.push(exit_id);
                tracing::info!(
                    exit_id = %exit_id,
                    position = %exit.position,
                    amount = exit.amount,
                    "Standard exit finalized"
                );
            }
            state.standard_exits.insert(exit_id, exit);
        }
        drop(state);

        processed.payouts = self.pay(payouts);
        processed
    }
}
