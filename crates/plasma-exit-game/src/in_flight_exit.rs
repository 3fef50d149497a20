//! In-flight exits: exiting a transaction whose inclusion may be unknown or
//! withheld.
//!
//! The exit itself pays nothing. Owners piggyback the slots they want paid;
//! canonicity games decide whether the inputs (non-canonical) or the outputs
//! (canonical) are owed; spend challenges knock individual piggybacks out.

use std::collections::HashSet;

use chrono::{DateTime, TimeDelta, Utc};
use plasma_framework::{FinalityRequest, TxFinalizationVerifier};
use plasma_tx::{PaymentTransaction, WireTransaction, compute_output_id, output_id_at};
use plasma_types::{
    ExitId, ExitSlot, InFlightExit, InFlightExitState, OutputId, OwnerAddress, PlasmaError,
    Result, SlotBitmap, SlotSide, UtxoPosition,
};

use crate::conditions::SpendingCheck;
use crate::game::{PaymentExitGame, Payout, PayoutKind, PayoutReport};
use crate::state_transition::verify_value_conserved;

// ---------------------------------------------------------------------------
// Arguments
// ---------------------------------------------------------------------------

/// Evidence for one input of the in-flight transaction.
#[derive(Debug, Clone, Copy)]
pub struct InFlightInput<'a> {
    /// Transaction that created the consumed output.
    pub tx: &'a [u8],
    pub position: UtxoPosition,
    pub inclusion_proof: &'a [u8],
    /// MVP only: the output owner's confirmation of the block root.
    pub confirm_signature: &'a [u8],
    /// Authorisation of the in-flight tx spending this input.
    pub witness: &'a [u8],
}

/// Arguments of [`PaymentExitGame::start_in_flight_exit`].
#[derive(Debug, Clone, Copy)]
pub struct StartInFlightExit<'a> {
    pub in_flight_tx: &'a [u8],
    /// One entry per input of `in_flight_tx`, in input order.
    pub inputs: &'a [InFlightInput<'a>],
    pub bond: u128,
    pub caller: OwnerAddress,
}

/// Arguments of [`PaymentExitGame::challenge_in_flight_exit_not_canonical`].
#[derive(Debug, Clone, Copy)]
pub struct NonCanonicalChallenge<'a> {
    pub exit_id: ExitId,
    pub input_index: usize,
    /// Transaction that created the shared input, and its position.
    pub input_tx: &'a [u8],
    pub input_position: UtxoPosition,
    pub competing_tx: &'a [u8],
    pub competing_input_index: usize,
    /// Where the competitor is included. `None` or an invalid proof makes it
    /// the youngest possible competitor.
    pub competing_position: Option<UtxoPosition>,
    pub competing_proof: &'a [u8],
    pub witness: &'a [u8],
    pub challenger: OwnerAddress,
}

/// Arguments of [`PaymentExitGame::respond_to_non_canonical_challenge`].
#[derive(Debug, Clone, Copy)]
pub struct CanonicityResponse<'a> {
    pub exit_id: ExitId,
    pub in_flight_tx_position: UtxoPosition,
    pub inclusion_proof: &'a [u8],
    pub responder: OwnerAddress,
}

/// Arguments of the input-spent challenge.
#[derive(Debug, Clone, Copy)]
pub struct InputSpentChallenge<'a> {
    pub exit_id: ExitId,
    pub input_index: usize,
    /// Transaction that created the piggybacked input, and its position.
    pub input_tx: &'a [u8],
    pub input_position: UtxoPosition,
    pub spending_tx: &'a [u8],
    pub spending_input_index: usize,
    pub witness: &'a [u8],
    pub challenger: OwnerAddress,
}

/// Arguments of the output-spent challenge.
#[derive(Debug, Clone, Copy)]
pub struct OutputSpentChallenge<'a> {
    pub exit_id: ExitId,
    pub output_index: usize,
    pub spending_tx: &'a [u8],
    pub spending_input_index: usize,
    pub witness: &'a [u8],
    pub challenger: OwnerAddress,
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

impl PaymentExitGame {
    /// Start an in-flight exit of a payment transaction.
    ///
    /// Every input must be standard-finalized and authorised for spending by
    /// the in-flight transaction, and the transaction must not create value.
    ///
    /// # Errors
    /// `InsufficientBond`, `InvalidTransaction` for mismatched or duplicate
    /// inputs, `TxNotFinalized`, `InvalidStateTransition`,
    /// `UnregisteredCapability` or `AlreadyExiting`.
    pub fn start_in_flight_exit(&self, args: &StartInFlightExit<'_>) -> Result<ExitId> {
        Self::ensure_bond(self.config.in_flight_exit_bond, args.bond)?;

        let payment = PaymentTransaction::decode(args.in_flight_tx, self.config.tx_type)?;
        let tx = &payment.tx;
        if tx.inputs.is_empty() {
            return Err(PlasmaError::InvalidTransaction {
                reason: "in-flight tx has no inputs".to_string(),
            });
        }
        if args.inputs.len() != tx.inputs.len() {
            return Err(PlasmaError::InvalidTransaction {
                reason: format!(
                    "{} inputs given for a tx with {}",
                    args.inputs.len(),
                    tx.inputs.len()
                ),
            });
        }
        let mut seen = HashSet::new();
        if !tx.inputs.iter().all(|id| seen.insert(*id)) {
            return Err(PlasmaError::InvalidTransaction {
                reason: "duplicate inputs".to_string(),
            });
        }

        let exit_id = ExitId::in_flight(args.in_flight_tx);
        if self.state.lock().in_flight_exits.contains_key(&exit_id) {
            return Err(PlasmaError::AlreadyExiting(exit_id));
        }

        let inputs = tx
            .inputs
            .iter()
            .zip(args.inputs)
            .enumerate()
            .map(|(i, (expected, input))| {
                self.verified_input(args.in_flight_tx, i, *expected, input)
            })
            .collect::<Result<Vec<_>>>()?;

        let outputs = payment
            .outputs
            .iter()
            .enumerate()
            .map(|(i, output)| -> Result<ExitSlot> {
                let handler = self
                    .registries
                    .resolve_output_guard_handler(output.output_type)?;
                Ok(ExitSlot {
                    output_id: compute_output_id(args.in_flight_tx, i as u64),
                    output_type: output.output_type,
                    owner: handler.owner_of(output),
                    asset: output.asset,
                    amount: output.amount,
                    piggyback_bond: 0,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        verify_value_conserved(&inputs, &outputs)?;

        let exit = InFlightExit {
            exit_id,
            tx_bytes: args.in_flight_tx.to_vec(),
            tx_type: tx.tx_type,
            inputs,
            outputs,
            input_piggybacks: SlotBitmap::default(),
            output_piggybacks: SlotBitmap::default(),
            input_invalid: SlotBitmap::default(),
            output_invalid: SlotBitmap::default(),
            started_at: self.framework.now(),
            bond: args.bond,
            bond_owner: args.caller,
            oldest_competing_position: None,
            in_flight_tx_position: None,
            state: InFlightExitState::NonCanonical,
        };

        let mut state = self.state.lock();
        if state.in_flight_exits.contains_key(&exit_id) {
            return Err(PlasmaError::AlreadyExiting(exit_id));
        }
        state.in_flight_exits.insert(exit_id, exit);
        drop(state);

        tracing::info!(
            exit_id = %exit_id,
            inputs = args.inputs.len(),
            caller = %args.caller,
            "In-flight exit started"
        );
        Ok(exit_id)
    }

    /// Check one input and turn it into an exit slot.
    fn verified_input(
        &self,
        in_flight_tx: &[u8],
        index: usize,
        expected: OutputId,
        input: &InFlightInput<'_>,
    ) -> Result<ExitSlot> {
        let input_tx = WireTransaction::decode(input.tx)?;
        let (output, owner) = self.owned_value_output(&input_tx, input.position.output_index())?;

        let output_id = output_id_at(
            input.tx,
            input.position,
            self.framework.config().child_block_interval,
        );
        if output_id != expected {
            return Err(PlasmaError::InvalidTransaction {
                reason: format!(
                    "input {index} does not reference the output at {}",
                    input.position
                ),
            });
        }

        let protocol = self.framework.protocol_for(input_tx.tx_type)?;
        let request =
            FinalityRequest::new(protocol, input.tx, input.position, input.inclusion_proof)
                .with_confirmation(input.confirm_signature, owner);
        if !TxFinalizationVerifier::new(&self.framework).is_standard_finalized(&request)? {
            return Err(PlasmaError::TxNotFinalized {
                reason: format!("input {index} at {} is not final", input.position),
            });
        }

        let condition = self
            .registries
            .resolve_spending_condition(output.output_type, self.config.tx_type)?;
        let check = SpendingCheck {
            input_tx: input.tx,
            output_index: input.position.output_index(),
            output_id,
            spending_tx: in_flight_tx,
            input_index: index,
            witness: input.witness,
        };
        if !condition.verify(&check)? {
            return Err(PlasmaError::InvalidStateTransition {
                reason: format!("input {index} is not authorised"),
            });
        }

        Ok(ExitSlot {
            output_id,
            output_type: output.output_type,
            owner,
            asset: output.asset,
            amount: output.amount,
            piggyback_bond: 0,
        })
    }

    /// Piggyback input `index`, asking for it to be paid if the exit ends
    /// non-canonical.
    ///
    /// # Errors
    /// See [`Self::piggyback_output`].
    pub fn piggyback_input(
        &self,
        exit_id: ExitId,
        index: usize,
        bond: u128,
        caller: OwnerAddress,
    ) -> Result<()> {
        self.piggyback(exit_id, SlotSide::Input, index, bond, caller)
    }

    /// Piggyback output `index`, asking for it to be paid if the exit ends
    /// canonical.
    ///
    /// # Errors
    /// `ExitNotFound`, `ExitNotPending` once the exit period is over or the
    /// exit is finalized, `InvalidSlotIndex`, `NotOutputOwner`,
    /// `InsufficientBond` or `AlreadyPiggybacked`.
    pub fn piggyback_output(
        &self,
        exit_id: ExitId,
        index: usize,
        bond: u128,
        caller: OwnerAddress,
    ) -> Result<()> {
        self.piggyback(exit_id, SlotSide::Output, index, bond, caller)
    }

    fn piggyback(
        &self,
        exit_id: ExitId,
        side: SlotSide,
        index: usize,
        bond: u128,
        caller: OwnerAddress,
    ) -> Result<()> {
        let window = self.framework.config().min_exit_period();
        let now = self.framework.now();

        let mut state = self.state.lock();
        let exit = state
            .in_flight_exits
            .get(&exit_id)
            .ok_or(PlasmaError::ExitNotFound(exit_id))?;
        if exit.is_finalized() || !exit.in_challenge_window(window, now) {
            return Err(PlasmaError::ExitNotPending(exit_id));
        }
        if exit.slot(side, index)?.owner != caller {
            return Err(PlasmaError::NotOutputOwner);
        }
        Self::ensure_bond(self.config.piggyback_bond, bond)?;

        let next = exit.with_piggyback(side, index, bond)?;
        state.in_flight_exits.insert(exit_id, next);
        drop(state);

        tracing::info!(exit_id = %exit_id, %side, index, "Piggybacked");
        Ok(())
    }

    /// Show a competitor spending one of the exit's inputs. Makes the exit
    /// non-canonical and hands its bond to the challenger.
    ///
    /// # Errors
    /// `ExitNotFound`, `ExitNotPending`, `ChallengePeriodOver`,
    /// `InvalidSlotIndex`, `InvalidCompetitor` or `UnregisteredCapability`.
    pub fn challenge_in_flight_exit_not_canonical(
        &self,
        args: &NonCanonicalChallenge<'_>,
    ) -> Result<()> {
        let window = self.framework.config().min_exit_period();
        let now = self.framework.now();
        let interval = self.framework.config().child_block_interval;

        let mut state = self.state.lock();
        let exit = state
            .in_flight_exits
            .get(&args.exit_id)
            .ok_or(PlasmaError::ExitNotFound(args.exit_id))?;
        Self::ensure_challengeable(exit, window, now)?;
        let slot = exit.slot(SlotSide::Input, args.input_index)?;

        if args.competing_tx == exit.tx_bytes.as_slice() {
            return Err(PlasmaError::InvalidCompetitor {
                reason: "competitor is the in-flight tx".to_string(),
            });
        }
        if output_id_at(args.input_tx, args.input_position, interval) != slot.output_id {
            return Err(PlasmaError::InvalidCompetitor {
                reason: format!("input tx does not create input {}", args.input_index),
            });
        }
        let check = SpendingCheck {
            input_tx: args.input_tx,
            output_index: args.input_position.output_index(),
            output_id: slot.output_id,
            spending_tx: args.competing_tx,
            input_index: args.competing_input_index,
            witness: args.witness,
        };
        if !self.spends(slot.output_type, &check)? {
            return Err(PlasmaError::InvalidCompetitor {
                reason: format!("competitor does not spend input {}", args.input_index),
            });
        }

        let position = self.proven_position(
            args.competing_tx,
            args.competing_position,
            args.competing_proof,
        );
        let next = exit.with_competitor(position, args.challenger)?;
        state.in_flight_exits.insert(args.exit_id, next);
        drop(state);

        tracing::info!(
            exit_id = %args.exit_id,
            competitor = %position,
            challenger = %args.challenger,
            "In-flight exit challenged as non-canonical"
        );
        Ok(())
    }

    /// Prove the in-flight tx is included ahead of any known competitor.
    /// Makes the exit canonical and hands its bond to the responder.
    ///
    /// # Errors
    /// `ExitNotFound`, `ExitNotPending` or `InvalidResponse`.
    pub fn respond_to_non_canonical_challenge(&self, args: &CanonicityResponse<'_>) -> Result<()> {
        let mut state = self.state.lock();
        let exit = state
            .in_flight_exits
            .get(&args.exit_id)
            .ok_or(PlasmaError::ExitNotFound(args.exit_id))?;
        if exit.is_finalized() {
            return Err(PlasmaError::ExitNotPending(args.exit_id));
        }
        if !self.is_included(&exit.tx_bytes, args.in_flight_tx_position, args.inclusion_proof) {
            return Err(PlasmaError::InvalidResponse {
                reason: format!("in-flight tx not included at {}", args.in_flight_tx_position),
            });
        }
        let position = args.in_flight_tx_position.tx_position();
        let next = exit.with_response(position, args.responder)?;
        state.in_flight_exits.insert(args.exit_id, next);
        drop(state);

        tracing::info!(
            exit_id = %args.exit_id,
            position = %position,
            responder = %args.responder,
            "In-flight exit shown canonical"
        );
        Ok(())
    }

    /// Show a piggybacked input was spent by some other transaction.
    ///
    /// # Errors
    /// `ExitNotFound`, `ExitNotPending`, `ChallengePeriodOver`,
    /// `InvalidSlotIndex` or `InvalidChallenge`.
    pub fn challenge_in_flight_exit_input_spent(
        &self,
        args: &InputSpentChallenge<'_>,
    ) -> Result<PayoutReport> {
        let interval = self.framework.config().child_block_interval;
        if output_id_at(args.input_tx, args.input_position, interval)
            != self.slot_output_id(args.exit_id, SlotSide::Input, args.input_index)?
        {
            return Err(PlasmaError::InvalidChallenge {
                reason: format!("input tx does not create input {}", args.input_index),
            });
        }
        self.challenge_slot_spent(
            args.exit_id,
            SlotSide::Input,
            args.input_index,
            SpendingCheckParts {
                input_tx: args.input_tx,
                output_index: args.input_position.output_index(),
                spending_tx: args.spending_tx,
                spending_input_index: args.spending_input_index,
                witness: args.witness,
            },
            args.challenger,
        )
    }

    /// Show a piggybacked output was spent.
    ///
    /// # Errors
    /// `ExitNotFound`, `ExitNotPending`, `ChallengePeriodOver`,
    /// `InvalidSlotIndex` or `InvalidChallenge`.
    pub fn challenge_in_flight_exit_output_spent(
        &self,
        args: &OutputSpentChallenge<'_>,
    ) -> Result<PayoutReport> {
        let tx_bytes = self
            .in_flight_exit(args.exit_id)
            .ok_or(PlasmaError::ExitNotFound(args.exit_id))?
            .tx_bytes;
        self.challenge_slot_spent(
            args.exit_id,
            SlotSide::Output,
            args.output_index,
            SpendingCheckParts {
                input_tx: &tx_bytes,
                output_index: args.output_index as u64,
                spending_tx: args.spending_tx,
                spending_input_index: args.spending_input_index,
                witness: args.witness,
            },
            args.challenger,
        )
    }

    fn slot_output_id(&self, exit_id: ExitId, side: SlotSide, index: usize) -> Result<OutputId> {
        let state = self.state.lock();
        let exit = state
            .in_flight_exits
            .get(&exit_id)
            .ok_or(PlasmaError::ExitNotFound(exit_id))?;
        Ok(exit.slot(side, index)?.output_id)
    }

    fn challenge_slot_spent(
        &self,
        exit_id: ExitId,
        side: SlotSide,
        index: usize,
        parts: SpendingCheckParts<'_>,
        challenger: OwnerAddress,
    ) -> Result<PayoutReport> {
        let window = self.framework.config().min_exit_period();
        let now = self.framework.now();

        let mut state = self.state.lock();
        let exit = state
            .in_flight_exits
            .get(&exit_id)
            .ok_or(PlasmaError::ExitNotFound(exit_id))?;
        Self::ensure_challengeable(exit, window, now)?;
        let slot = exit.slot(side, index)?;
        if !exit.piggybacks(side).is_set(index) {
            return Err(PlasmaError::InvalidChallenge {
                reason: format!("{side} {index} is not piggybacked"),
            });
        }
        if parts.spending_tx == exit.tx_bytes.as_slice() {
            return Err(PlasmaError::InvalidChallenge {
                reason: "spending tx is the in-flight tx".to_string(),
            });
        }
        let check = SpendingCheck {
            input_tx: parts.input_tx,
            output_index: parts.output_index,
            output_id: slot.output_id,
            spending_tx: parts.spending_tx,
            input_index: parts.spending_input_index,
            witness: parts.witness,
        };
        if !self.spends(slot.output_type, &check)? {
            return Err(PlasmaError::InvalidChallenge {
                reason: format!("{side} {index} is not spent by the given tx"),
            });
        }

        let (next, forfeited) = exit.with_slot_invalidated(side, index)?;
        state.in_flight_exits.insert(exit_id, next);
        drop(state);

        tracing::info!(
            exit_id = %exit_id,
            %side,
            index,
            challenger = %challenger,
            "Piggyback challenged as spent"
        );
        Ok(self.pay(vec![Payout::bond(
            challenger,
            forfeited,
            PayoutKind::BondAwarded,
        )]))
    }

    /// Settle an in-flight exit once its exit period is over.
    ///
    /// The record is finalized before anything is paid. A canonical exit
    /// whose inputs were partly withdrawn elsewhere settles as non-canonical.
    /// Piggybacked slots on the owed side are paid unless they were proven
    /// spent or already withdrawn; piggyback bonds go back to the
    /// piggybackers and the exit bond to its current owner.
    ///
    /// # Errors
    /// `ExitNotFound`, `ExitNotPending` or `ChallengePeriodNotOver`.
    pub fn process_in_flight_exit(&self, exit_id: ExitId) -> Result<PayoutReport> {
        let window = self.framework.config().min_exit_period();
        let now = self.framework.now();

        let mut state = self.state.lock();
        let exit = state
            .in_flight_exits
            .get(&exit_id)
            .ok_or(PlasmaError::ExitNotFound(exit_id))?;
        if exit.is_finalized() {
            return Err(PlasmaError::ExitNotPending(exit_id));
        }
        if exit.in_challenge_window(window, now) {
            return Err(PlasmaError::ChallengePeriodNotOver(exit_id));
        }

        // An input already withdrawn elsewhere means the outputs can't be
        // honoured; settle as non-canonical and skip the withdrawn inputs.
        let input_withdrawn = exit
            .inputs
            .iter()
            .any(|slot| self.framework.is_output_spent(&slot.output_id));
        let canonical = exit.is_canonical() && !input_withdrawn;
        let side = if canonical {
            SlotSide::Output
        } else {
            SlotSide::Input
        };
        let mut payouts = Vec::new();
        let mut withdrawn = Vec::new();
        for index in exit.payable_slots_on(side) {
            let slot = exit.slot(side, index)?;
            if self.framework.is_output_spent(&slot.output_id) {
                tracing::debug!(exit_id = %exit_id, %side, index, "Slot already withdrawn");
                continue;
            }
            payouts.push(Payout {
                recipient: slot.owner,
                asset: slot.asset,
                amount: slot.amount,
                kind: PayoutKind::ExitValue,
            });
            withdrawn.push(slot.output_id);
        }
        if canonical {
            withdrawn.extend(exit.inputs.iter().map(|slot| slot.output_id));
        }
        for side in [SlotSide::Input, SlotSide::Output] {
            let slots = exit.slots(side);
            for index in exit.piggybacks(side).iter_set(slots.len()) {
                let slot = &slots[index];
                payouts.push(Payout::bond(
                    slot.owner,
                    slot.piggyback_bond,
                    PayoutKind::BondReturned,
                ));
            }
        }
        payouts.push(Payout::bond(
            exit.bond_owner,
            exit.bond,
            PayoutKind::BondReturned,
        ));

        let next = exit.finalized()?;
        state.in_flight_exits.insert(exit_id, next);
        self.framework.flag_outputs_spent(&withdrawn);
        drop(state);

        tracing::info!(
            exit_id = %exit_id,
            canonical,
            paid_slots = withdrawn.len(),
            "In-flight exit processed"
        );
        Ok(self.pay(payouts))
    }

    fn ensure_challengeable(
        exit: &InFlightExit,
        window: TimeDelta,
        now: DateTime<Utc>,
    ) -> Result<()> {
        if exit.is_finalized() {
            return Err(PlasmaError::ExitNotPending(exit.exit_id));
        }
        if !exit.in_challenge_window(window, now) {
            return Err(PlasmaError::ChallengePeriodOver(exit.exit_id));
        }
        Ok(())
    }
}

/// Spend evidence for a slot, minus the slot's own output id.
#[derive(Debug, Clone, Copy)]
struct SpendingCheckParts<'a> {
    input_tx: &'a [u8],
    output_index: u64,
    spending_tx: &'a [u8],
    spending_input_index: usize,
    witness: &'a [u8],
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use ed25519_dalek::SigningKey;
    use plasma_framework::{BlockBuilder, ManualClock, PlasmaFramework};
    use plasma_tx::WireTransactionOutput;
    use plasma_types::constants::{PAYMENT_OUTPUT_TYPE, PAYMENT_TX_TYPE};
    use plasma_types::signature::{owner_of, sign_tx, test_key};
    use plasma_types::{AssetId, ExitGameConfig, FrameworkConfig, OutputType, Protocol, TxType};

    use super::*;
    use crate::conditions::PaymentOutputToPaymentTxCondition;
    use crate::guard_handler::AddressOutputGuardHandler;
    use crate::registry::CapabilityRegistries;
    use crate::standard_exit::StartStandardExit;
    use crate::vault::InMemoryVault;

    const IFE_BOND: u128 = 300;
    const PB_BOND: u128 = 200;

    struct Fixture {
        clock: Arc<ManualClock>,
        framework: Arc<PlasmaFramework>,
        game: PaymentExitGame,
        alice: SigningKey,
        bob: SigningKey,
        /// Alice's committed 50-unit output.
        funding_tx: Vec<u8>,
        funding_pos: UtxoPosition,
        funding_proof: Vec<u8>,
    }

    fn payment(inputs: Vec<OutputId>, outputs: &[(OwnerAddress, u128)]) -> Vec<u8> {
        WireTransaction::new(
            TxType(PAYMENT_TX_TYPE),
            inputs,
            outputs
                .iter()
                .map(|(owner, amount)| {
                    WireTransactionOutput::new(
                        OutputType(PAYMENT_OUTPUT_TYPE),
                        *owner,
                        AssetId::NATIVE,
                        *amount,
                    )
                    .into()
                })
                .collect(),
        )
        .encode()
    }

    fn commit(fw: &PlasmaFramework, tx: &[u8]) -> (UtxoPosition, Vec<u8>) {
        let mut builder = BlockBuilder::for_framework(fw);
        builder.push_encoded(tx.to_vec()).unwrap();
        let block = builder.seal().unwrap().submit(fw).unwrap();
        (block.utxo_position(0, 0).unwrap(), block.inclusion_proof(0).unwrap())
    }

    fn fixture() -> Fixture {
        let clock = Arc::new(ManualClock::at_epoch());
        let framework =
            Arc::new(PlasmaFramework::new(FrameworkConfig::default(), clock.clone()).unwrap());
        framework
            .register_exit_game(TxType(PAYMENT_TX_TYPE), Protocol::MoreVp.tag())
            .unwrap();
        let mut registries = CapabilityRegistries::new();
        registries
            .register_spending_condition(
                OutputType(PAYMENT_OUTPUT_TYPE),
                TxType(PAYMENT_TX_TYPE),
                Arc::new(PaymentOutputToPaymentTxCondition::new(
                    OutputType(PAYMENT_OUTPUT_TYPE),
                    TxType(PAYMENT_TX_TYPE),
                )),
            )
            .unwrap();
        registries
            .register_output_guard_handler(
                OutputType(PAYMENT_OUTPUT_TYPE),
                Arc::new(AddressOutputGuardHandler),
            )
            .unwrap();
        let vault = Arc::new(InMemoryVault::new());
        vault.fund(AssetId::NATIVE, 1_000_000);
        let config = ExitGameConfig {
            tx_type: TxType(PAYMENT_TX_TYPE),
            standard_exit_bond: 100,
            in_flight_exit_bond: IFE_BOND,
            piggyback_bond: PB_BOND,
        };
        let game =
            PaymentExitGame::new(config, framework.clone(), Arc::new(registries), vault).unwrap();

        let alice = test_key(1);
        let bob = test_key(2);
        let funding_tx = payment(vec![OutputId([7u8; 32])], &[(owner_of(&alice), 50)]);
        let (funding_pos, funding_proof) = commit(&framework, &funding_tx);
        Fixture {
            clock,
            framework,
            game,
            alice,
            bob,
            funding_tx,
            funding_pos,
            funding_proof,
        }
    }

    impl Fixture {
        fn funding_id(&self) -> OutputId {
            compute_output_id(&self.funding_tx, 0)
        }

        /// Alice pays `amount` of her 50 to bob.
        fn in_flight_tx(&self, amount: u128) -> Vec<u8> {
            payment(vec![self.funding_id()], &[(owner_of(&self.bob), amount)])
        }

        fn start(&self, tx: &[u8]) -> Result<ExitId> {
            let witness = sign_tx(&self.alice, tx);
            self.start_with_witness(tx, &witness)
        }

        fn start_with_witness(&self, tx: &[u8], witness: &[u8]) -> Result<ExitId> {
            let inputs = [InFlightInput {
                tx: &self.funding_tx,
                position: self.funding_pos,
                inclusion_proof: &self.funding_proof,
                confirm_signature: &[],
                witness,
            }];
            self.game.start_in_flight_exit(&StartInFlightExit {
                in_flight_tx: tx,
                inputs: &inputs,
                bond: IFE_BOND,
                caller: owner_of(&self.bob),
            })
        }

        fn past_window(&self) {
            self.clock.advance(self.framework.config().min_exit_period());
        }
    }

    #[test]
    fn start_records_non_canonical_exit() {
        let f = fixture();
        let tx = f.in_flight_tx(40);
        let exit_id = f.start(&tx).unwrap();
        let exit = f.game.in_flight_exit(exit_id).unwrap();
        assert_eq!(exit.state, InFlightExitState::NonCanonical);
        assert_eq!(exit.inputs.len(), 1);
        assert_eq!(exit.inputs[0].owner, owner_of(&f.alice));
        assert_eq!(exit.outputs[0].amount, 40);
        assert_eq!(exit.bond_owner, owner_of(&f.bob));
        assert!(exit.input_piggybacks.is_empty() && exit.output_piggybacks.is_empty());

        assert!(matches!(f.start(&tx), Err(PlasmaError::AlreadyExiting(_))));
    }

    #[test]
    fn start_rejections() {
        let f = fixture();

        let minting = f.in_flight_tx(51);
        assert!(matches!(
            f.start(&minting),
            Err(PlasmaError::InvalidStateTransition { .. })
        ));

        let tx = f.in_flight_tx(40);
        let forged = sign_tx(&f.bob, &tx);
        assert!(matches!(
            f.start_with_witness(&tx, &forged),
            Err(PlasmaError::InvalidStateTransition { .. })
        ));

        let witness = sign_tx(&f.alice, &tx);
        let short = f.game.start_in_flight_exit(&StartInFlightExit {
            in_flight_tx: &tx,
            inputs: &[],
            bond: IFE_BOND,
            caller: owner_of(&f.bob),
        });
        assert!(matches!(short, Err(PlasmaError::InvalidTransaction { .. })));

        let low_bond = f.game.start_in_flight_exit(&StartInFlightExit {
            in_flight_tx: &tx,
            inputs: &[InFlightInput {
                tx: &f.funding_tx,
                position: f.funding_pos,
                inclusion_proof: &f.funding_proof,
                confirm_signature: &[],
                witness: &witness,
            }],
            bond: IFE_BOND - 1,
            caller: owner_of(&f.bob),
        });
        assert!(matches!(low_bond, Err(PlasmaError::InsufficientBond { .. })));

        let dup = payment(
            vec![f.funding_id(), f.funding_id()],
            &[(owner_of(&f.bob), 1)],
        );
        assert!(matches!(
            f.start(&dup),
            Err(PlasmaError::InvalidTransaction { .. })
        ));
    }

    #[test]
    fn piggyback_rules() {
        let f = fixture();
        let exit_id = f.start(&f.in_flight_tx(40)).unwrap();
        let alice = owner_of(&f.alice);
        let bob = owner_of(&f.bob);

        assert!(matches!(
            f.game.piggyback_output(exit_id, 0, PB_BOND, alice),
            Err(PlasmaError::NotOutputOwner)
        ));
        assert!(matches!(
            f.game.piggyback_output(exit_id, 1, PB_BOND, bob),
            Err(PlasmaError::InvalidSlotIndex { index: 1, count: 1 })
        ));
        assert!(matches!(
            f.game.piggyback_output(exit_id, 0, PB_BOND - 1, bob),
            Err(PlasmaError::InsufficientBond { .. })
        ));
        f.game.piggyback_output(exit_id, 0, PB_BOND, bob).unwrap();
        assert!(matches!(
            f.game.piggyback_output(exit_id, 0, PB_BOND, bob),
            Err(PlasmaError::AlreadyPiggybacked { .. })
        ));

        f.past_window();
        assert!(matches!(
            f.game.piggyback_input(exit_id, 0, PB_BOND, alice),
            Err(PlasmaError::ExitNotPending(id)) if id == exit_id
        ));
        f.game.process_in_flight_exit(exit_id).unwrap();
        assert!(matches!(
            f.game.piggyback_input(exit_id, 0, PB_BOND, alice),
            Err(PlasmaError::ExitNotPending(_))
        ));
    }

    #[test]
    fn canonical_exit_pays_outputs() {
        let f = fixture();
        let tx = f.in_flight_tx(40);
        let exit_id = f.start(&tx).unwrap();
        let bob = owner_of(&f.bob);
        let alice = owner_of(&f.alice);
        f.game.piggyback_output(exit_id, 0, PB_BOND, bob).unwrap();
        f.game.piggyback_input(exit_id, 0, PB_BOND, alice).unwrap();

        let (pos, proof) = commit(&f.framework, &tx);
        let responder = owner_of(&test_key(5));
        f.game
            .respond_to_non_canonical_challenge(&CanonicityResponse {
                exit_id,
                in_flight_tx_position: pos,
                inclusion_proof: &proof,
                responder,
            })
            .unwrap();
        assert!(f.game.in_flight_exit(exit_id).unwrap().is_canonical());

        assert!(matches!(
            f.game.process_in_flight_exit(exit_id),
            Err(PlasmaError::ChallengePeriodNotOver(_))
        ));
        f.past_window();
        let report = f.game.process_in_flight_exit(exit_id).unwrap();
        assert!(report.is_complete());
        assert_eq!(report.total_to(bob, AssetId::NATIVE), 40 + PB_BOND);
        // Alice only gets her piggyback bond back; her input isn't owed.
        assert_eq!(report.total_to(alice, AssetId::NATIVE), PB_BOND);
        assert_eq!(report.total_to(responder, AssetId::NATIVE), IFE_BOND);
        assert!(f.framework.is_output_spent(&compute_output_id(&tx, 0)));
        assert!(f.framework.is_output_spent(&f.funding_id()));

        assert!(matches!(
            f.game.process_in_flight_exit(exit_id),
            Err(PlasmaError::ExitNotPending(_))
        ));
    }

    #[test]
    fn canonical_exit_with_withdrawn_input_pays_no_outputs() {
        let f = fixture();
        let alice = owner_of(&f.alice);
        let bob = owner_of(&f.bob);

        // Alice withdraws her 50 through a standard exit first.
        let se = f
            .game
            .start_standard_exit(&StartStandardExit {
                position: f.funding_pos,
                output_tx: &f.funding_tx,
                input_output_types: &[OutputType(PAYMENT_OUTPUT_TYPE)],
                output_guard_preimage: &[],
                inclusion_proof: &f.funding_proof,
                confirm_signature: &[],
                bond: 100,
                caller: alice,
            })
            .unwrap();

        // Then the 40 she paid bob is exited in flight and proven canonical.
        let tx = f.in_flight_tx(40);
        let exit_id = f.start(&tx).unwrap();
        f.game.piggyback_output(exit_id, 0, PB_BOND, bob).unwrap();
        f.game.piggyback_input(exit_id, 0, PB_BOND, alice).unwrap();
        let (pos, proof) = commit(&f.framework, &tx);
        f.game
            .respond_to_non_canonical_challenge(&CanonicityResponse {
                exit_id,
                in_flight_tx_position: pos,
                inclusion_proof: &proof,
                responder: bob,
            })
            .unwrap();

        f.past_window();
        let processed = f.game.process_exits(AssetId::NATIVE, 10);
        assert_eq!(processed.finalized, vec![se]);
        assert_eq!(processed.payouts.total_to(alice, AssetId::NATIVE), 50 + 100);

        let report = f.game.process_in_flight_exit(exit_id).unwrap();
        let value_paid: u128 = report
            .paid
            .iter()
            .filter(|p| p.kind == PayoutKind::ExitValue)
            .map(|p| p.amount)
            .sum();
        assert_eq!(value_paid, 0);
        assert_eq!(report.total_to(bob, AssetId::NATIVE), PB_BOND + IFE_BOND);
        assert_eq!(report.total_to(alice, AssetId::NATIVE), PB_BOND);
        assert!(!f.framework.is_output_spent(&compute_output_id(&tx, 0)));
        assert!(f.game.in_flight_exit(exit_id).unwrap().is_finalized());
    }

    #[test]
    fn non_canonical_exit_pays_inputs() {
        let f = fixture();
        let tx = f.in_flight_tx(40);
        let exit_id = f.start(&tx).unwrap();
        let alice = owner_of(&f.alice);
        f.game.piggyback_input(exit_id, 0, PB_BOND, alice).unwrap();

        let carol = owner_of(&test_key(3));
        let competitor = payment(vec![f.funding_id()], &[(carol, 50)]);
        let witness = sign_tx(&f.alice, &competitor);
        let (cpos, cproof) = commit(&f.framework, &competitor);
        let challenger = owner_of(&test_key(4));
        let challenge = NonCanonicalChallenge {
            exit_id,
            input_index: 0,
            input_tx: &f.funding_tx,
            input_position: f.funding_pos,
            competing_tx: &competitor,
            competing_input_index: 0,
            competing_position: Some(cpos),
            competing_proof: &cproof,
            witness: &witness,
            challenger,
        };
        f.game.challenge_in_flight_exit_not_canonical(&challenge).unwrap();
        let exit = f.game.in_flight_exit(exit_id).unwrap();
        assert_eq!(exit.oldest_competing_position, Some(cpos.tx_position()));
        assert_eq!(exit.bond_owner, challenger);

        // Same competitor again is not strictly older.
        assert!(matches!(
            f.game.challenge_in_flight_exit_not_canonical(&challenge),
            Err(PlasmaError::InvalidCompetitor { .. })
        ));

        // The in-flight tx landing after the competitor can't win.
        let (pos, proof) = commit(&f.framework, &tx);
        assert!(matches!(
            f.game.respond_to_non_canonical_challenge(&CanonicityResponse {
                exit_id,
                in_flight_tx_position: pos,
                inclusion_proof: &proof,
                responder: owner_of(&f.bob),
            }),
            Err(PlasmaError::InvalidResponse { .. })
        ));

        f.past_window();
        let report = f.game.process_in_flight_exit(exit_id).unwrap();
        assert_eq!(report.total_to(alice, AssetId::NATIVE), 50 + PB_BOND);
        assert_eq!(report.total_to(challenger, AssetId::NATIVE), IFE_BOND);
        assert!(f.framework.is_output_spent(&f.funding_id()));
        assert!(!f.framework.is_output_spent(&compute_output_id(&tx, 0)));
    }

    #[test]
    fn competitor_must_spend_the_input() {
        let f = fixture();
        let tx = f.in_flight_tx(40);
        let exit_id = f.start(&tx).unwrap();
        let competitor = payment(vec![f.funding_id()], &[(owner_of(&f.bob), 50)]);
        let forged = sign_tx(&f.bob, &competitor);
        let challenge = NonCanonicalChallenge {
            exit_id,
            input_index: 0,
            input_tx: &f.funding_tx,
            input_position: f.funding_pos,
            competing_tx: &competitor,
            competing_input_index: 0,
            competing_position: None,
            competing_proof: &[],
            witness: &forged,
            challenger: owner_of(&f.bob),
        };
        assert!(matches!(
            f.game.challenge_in_flight_exit_not_canonical(&challenge),
            Err(PlasmaError::InvalidCompetitor { .. })
        ));

        let itself = NonCanonicalChallenge {
            competing_tx: &tx,
            ..challenge
        };
        assert!(matches!(
            f.game.challenge_in_flight_exit_not_canonical(&itself),
            Err(PlasmaError::InvalidCompetitor { .. })
        ));
    }

    #[test]
    fn unconfirmed_competitor_loses_to_any_inclusion() {
        let f = fixture();
        let tx = f.in_flight_tx(40);
        let exit_id = f.start(&tx).unwrap();
        let competitor = payment(vec![f.funding_id()], &[(owner_of(&f.bob), 50)]);
        let witness = sign_tx(&f.alice, &competitor);
        f.game
            .challenge_in_flight_exit_not_canonical(&NonCanonicalChallenge {
                exit_id,
                input_index: 0,
                input_tx: &f.funding_tx,
                input_position: f.funding_pos,
                competing_tx: &competitor,
                competing_input_index: 0,
                competing_position: None,
                competing_proof: &[],
                witness: &witness,
                challenger: owner_of(&f.bob),
            })
            .unwrap();
        assert_eq!(
            f.game.in_flight_exit(exit_id).unwrap().oldest_competing_position,
            Some(plasma_types::TxPosition::YOUNGEST)
        );

        let (pos, proof) = commit(&f.framework, &tx);
        f.game
            .respond_to_non_canonical_challenge(&CanonicityResponse {
                exit_id,
                in_flight_tx_position: pos,
                inclusion_proof: &proof,
                responder: owner_of(&f.alice),
            })
            .unwrap();
        assert!(f.game.in_flight_exit(exit_id).unwrap().is_canonical());
    }

    #[test]
    fn spent_output_piggyback_is_forfeited() {
        let f = fixture();
        let tx = f.in_flight_tx(40);
        let exit_id = f.start(&tx).unwrap();
        let bob = owner_of(&f.bob);
        f.game.piggyback_output(exit_id, 0, PB_BOND, bob).unwrap();

        let spend = payment(vec![compute_output_id(&tx, 0)], &[(owner_of(&f.alice), 40)]);
        let witness = sign_tx(&f.bob, &spend);
        let challenger = owner_of(&test_key(6));
        let args = OutputSpentChallenge {
            exit_id,
            output_index: 0,
            spending_tx: &spend,
            spending_input_index: 0,
            witness: &witness,
            challenger,
        };
        let report = f.game.challenge_in_flight_exit_output_spent(&args).unwrap();
        assert_eq!(report.total_to(challenger, AssetId::NATIVE), PB_BOND);
        let exit = f.game.in_flight_exit(exit_id).unwrap();
        assert!(exit.output_invalid.is_set(0));
        assert!(!exit.output_piggybacks.is_set(0));

        // Not piggybacked any more.
        assert!(matches!(
            f.game.challenge_in_flight_exit_output_spent(&args),
            Err(PlasmaError::InvalidChallenge { .. })
        ));
        // And can't be piggybacked again.
        assert!(matches!(
            f.game.piggyback_output(exit_id, 0, PB_BOND, bob),
            Err(PlasmaError::AlreadyPiggybacked { .. })
        ));
    }

    #[test]
    fn spent_input_piggyback_is_forfeited() {
        let f = fixture();
        let tx = f.in_flight_tx(40);
        let exit_id = f.start(&tx).unwrap();
        let alice = owner_of(&f.alice);
        f.game.piggyback_input(exit_id, 0, PB_BOND, alice).unwrap();

        let other = payment(vec![f.funding_id()], &[(alice, 50)]);
        let witness = sign_tx(&f.alice, &other);
        let args = InputSpentChallenge {
            exit_id,
            input_index: 0,
            input_tx: &f.funding_tx,
            input_position: f.funding_pos,
            spending_tx: &tx,
            spending_input_index: 0,
            witness: &witness,
            challenger: owner_of(&f.bob),
        };
        // The in-flight tx itself is not a double spend.
        assert!(matches!(
            f.game.challenge_in_flight_exit_input_spent(&args),
            Err(PlasmaError::InvalidChallenge { .. })
        ));

        let args = InputSpentChallenge {
            spending_tx: &other,
            ..args
        };
        let report = f.game.challenge_in_flight_exit_input_spent(&args).unwrap();
        assert_eq!(report.total_to(owner_of(&f.bob), AssetId::NATIVE), PB_BOND);

        f.past_window();
        let report = f.game.process_in_flight_exit(exit_id).unwrap();
        // Only the exit bond goes back; the input was proven spent.
        assert_eq!(report.total_to(alice, AssetId::NATIVE), 0);
        assert_eq!(report.paid.len(), 1);
    }
}
