//! # InFlightExit: exit of a transaction whose inclusion is unknown or
//! disputed
//!
//! ## State Machine
//!
//! ```text
//!                 respond (older inclusion)
//!   ┌──────────────┐ ─────────────────────▶ ┌───────────┐
//!   │ NON_CANONICAL│                        │ CANONICAL │
//!   └──────┬───────┘ ◀───────────────────── └─────┬─────┘
//!          │       challenge (older competitor)   │
//!          │ process                     process  │
//!          ▼                                      ▼
//!       ┌──────────────────────────────────────────┐
//!       │                FINALIZED                 │
//!       └──────────────────────────────────────────┘
//! ```
//!
//! A non-canonical exit pays its piggybacked **inputs** back; a canonical one
//! pays its piggybacked **outputs**. Every transition is a pure function from
//! a record to a new record, so a failed call never leaves partial state.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::config::window_elapsed;
use crate::{
    AssetId, ExitId, OutputId, OutputType, OwnerAddress, PlasmaError, Result, SlotBitmap,
    TxPosition, TxType,
};

/// Lifecycle state of an in-flight exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InFlightExitState {
    /// Inputs are owed. The initial state.
    NonCanonical,
    /// The transaction proved itself the oldest spend; outputs are owed.
    Canonical,
    /// Paid out. **Irreversible.**
    Finalized,
}

impl std::fmt::Display for InFlightExitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NonCanonical => write!(f, "NON_CANONICAL"),
            Self::Canonical => write!(f, "CANONICAL"),
            Self::Finalized => write!(f, "FINALIZED"),
        }
    }
}

/// Which side of the in-flight transaction a slot belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SlotSide {
    Input,
    Output,
}

impl std::fmt::Display for SlotSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Input => write!(f, "input"),
            Self::Output => write!(f, "output"),
        }
    }
}

/// One input or output of the in-flight transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExitSlot {
    pub output_id: OutputId,
    pub output_type: OutputType,
    /// Owner resolved through the output guard handler.
    pub owner: OwnerAddress,
    pub asset: AssetId,
    pub amount: u128,
    /// Bond posted by the piggyback on this slot; zero when not piggybacked.
    pub piggyback_bond: u128,
}

/// An in-flight exit record, keyed by [`ExitId::in_flight`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InFlightExit {
    pub exit_id: ExitId,
    pub tx_bytes: Vec<u8>,
    pub tx_type: TxType,
    pub inputs: Vec<ExitSlot>,
    pub outputs: Vec<ExitSlot>,
    pub input_piggybacks: SlotBitmap,
    pub output_piggybacks: SlotBitmap,
    /// Slots proven spent elsewhere; excluded from payout.
    pub input_invalid: SlotBitmap,
    pub output_invalid: SlotBitmap,
    pub started_at: DateTime<Utc>,
    /// Exit bond, in the native asset.
    pub bond: u128,
    /// Receives the exit bond on processing. Moves to whoever last won the
    /// canonicity dispute.
    pub bond_owner: OwnerAddress,
    pub oldest_competing_position: Option<TxPosition>,
    /// Set once the exiting transaction's inclusion has been proven.
    pub in_flight_tx_position: Option<TxPosition>,
    pub state: InFlightExitState,
}

impl InFlightExit {
    #[must_use]
    pub fn is_finalized(&self) -> bool {
        self.state == InFlightExitState::Finalized
    }

    #[must_use]
    pub fn is_canonical(&self) -> bool {
        self.state == InFlightExitState::Canonical
    }

    /// Whether challenges and piggybacks are still accepted at `now`.
    #[must_use]
    pub fn in_challenge_window(&self, window: TimeDelta, now: DateTime<Utc>) -> bool {
        !window_elapsed(self.started_at, window, now)
    }

    #[must_use]
    pub fn slots(&self, side: SlotSide) -> &[ExitSlot] {
        match side {
            SlotSide::Input => &self.inputs,
            SlotSide::Output => &self.outputs,
        }
    }

    #[must_use]
    pub fn piggybacks(&self, side: SlotSide) -> SlotBitmap {
        match side {
            SlotSide::Input => self.input_piggybacks,
            SlotSide::Output => self.output_piggybacks,
        }
    }

    #[must_use]
    pub fn invalid(&self, side: SlotSide) -> SlotBitmap {
        match side {
            SlotSide::Input => self.input_invalid,
            SlotSide::Output => self.output_invalid,
        }
    }

    /// Slot lookup with bounds checking.
    pub fn slot(&self, side: SlotSide, index: usize) -> Result<&ExitSlot> {
        let slots = self.slots(side);
        slots.get(index).ok_or(PlasmaError::InvalidSlotIndex {
            index,
            count: slots.len(),
        })
    }

    /// The side paid out on processing.
    #[must_use]
    pub fn owed_side(&self) -> SlotSide {
        if self.is_canonical() {
            SlotSide::Output
        } else {
            SlotSide::Input
        }
    }

    /// Piggybacked slots on the owed side that weren't proven spent.
    #[must_use]
    pub fn payable_slots(&self) -> Vec<usize> {
        self.payable_slots_on(self.owed_side())
    }

    /// Piggybacked slots on `side` that weren't proven spent.
    #[must_use]
    pub fn payable_slots_on(&self, side: SlotSide) -> Vec<usize> {
        let invalid = self.invalid(side);
        self.piggybacks(side)
            .iter_set(self.slots(side).len())
            .filter(|&i| !invalid.is_set(i))
            .collect()
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_finalized() {
            return Err(PlasmaError::ExitNotPending(self.exit_id));
        }
        Ok(())
    }

    fn set_bitmaps(&mut self, side: SlotSide, piggybacks: SlotBitmap, invalid: SlotBitmap) {
        match side {
            SlotSide::Input => {
                self.input_piggybacks = piggybacks;
                self.input_invalid = invalid;
            }
            SlotSide::Output => {
                self.output_piggybacks = piggybacks;
                self.output_invalid = invalid;
            }
        }
    }

    fn slot_mut(&mut self, side: SlotSide, index: usize) -> Option<&mut ExitSlot> {
        match side {
            SlotSide::Input => self.inputs.get_mut(index),
            SlotSide::Output => self.outputs.get_mut(index),
        }
    }

    // -----------------------------------------------------------------------
    // Transitions
    // -----------------------------------------------------------------------

    /// Record a piggyback on `side[index]` with the given bond.
    pub fn with_piggyback(&self, side: SlotSide, index: usize, bond: u128) -> Result<Self> {
        self.ensure_open()?;
        self.slot(side, index)?;
        if self.piggybacks(side).is_set(index) || self.invalid(side).is_set(index) {
            return Err(PlasmaError::AlreadyPiggybacked {
                exit_id: self.exit_id,
                slot: format!("{side} {index}"),
            });
        }
        let mut next = self.clone();
        next.set_bitmaps(side, self.piggybacks(side).with(index), self.invalid(side));
        if let Some(slot) = next.slot_mut(side, index) {
            slot.piggyback_bond = bond;
        }
        Ok(next)
    }

    /// Record a competitor at `position`. It must be strictly older than any
    /// competitor or inclusion already on record.
    pub fn with_competitor(&self, position: TxPosition, challenger: OwnerAddress) -> Result<Self> {
        self.ensure_open()?;
        if let Some(oldest) = self.oldest_competing_position {
            if position >= oldest {
                return Err(PlasmaError::InvalidCompetitor {
                    reason: format!("competitor at {position} is not older than {oldest}"),
                });
            }
        }
        let mut next = self.clone();
        next.oldest_competing_position = Some(position);
        next.state = InFlightExitState::NonCanonical;
        next.bond_owner = challenger;
        Ok(next)
    }

    /// Record the exiting transaction's own inclusion at `position`, which
    /// must be strictly older than the recorded competitor.
    pub fn with_response(&self, position: TxPosition, responder: OwnerAddress) -> Result<Self> {
        self.ensure_open()?;
        if let Some(oldest) = self.oldest_competing_position {
            if position >= oldest {
                return Err(PlasmaError::InvalidResponse {
                    reason: format!(
                        "inclusion at {position} is not older than competitor {oldest}"
                    ),
                });
            }
        }
        let mut next = self.clone();
        next.in_flight_tx_position = Some(position);
        next.oldest_competing_position = Some(position);
        next.state = InFlightExitState::Canonical;
        next.bond_owner = responder;
        Ok(next)
    }

    /// Mark a piggybacked slot as spent elsewhere. Returns the new record and
    /// the forfeited piggyback bond.
    pub fn with_slot_invalidated(&self, side: SlotSide, index: usize) -> Result<(Self, u128)> {
        self.ensure_open()?;
        self.slot(side, index)?;
        if !self.piggybacks(side).is_set(index) {
            return Err(PlasmaError::InvalidChallenge {
                reason: format!("{side} {index} of {} is not piggybacked", self.exit_id),
            });
        }
        let mut next = self.clone();
        next.set_bitmaps(
            side,
            self.piggybacks(side).without(index),
            self.invalid(side).with(index),
        );
        let mut forfeited = 0;
        if let Some(slot) = next.slot_mut(side, index) {
            forfeited = std::mem::take(&mut slot.piggyback_bond);
        }
        Ok((next, forfeited))
    }

    /// Transition to FINALIZED. The caller computes payouts from the record
    /// before this call.
    pub fn finalized(&self) -> Result<Self> {
        self.ensure_open()?;
        let mut next = self.clone();
        next.state = InFlightExitState::Finalized;
        Ok(next)
    }
}

/// Dummy in-flight exit for testing. **Never use in production.**
#[cfg(any(test, feature = "test-helpers"))]
impl InFlightExit {
    pub fn dummy(input_count: usize, output_count: usize) -> Self {
        let slot = || ExitSlot {
            output_id: OutputId(rand::random::<[u8; 32]>()),
            output_type: OutputType(crate::constants::PAYMENT_OUTPUT_TYPE),
            owner: OwnerAddress(rand::random::<[u8; 32]>()),
            asset: AssetId::NATIVE,
            amount: 10,
            piggyback_bond: 0,
        };
        let tx_bytes = rand::random::<[u8; 32]>().to_vec();
        Self {
            exit_id: ExitId::in_flight(&tx_bytes),
            tx_bytes,
            tx_type: TxType(crate::constants::PAYMENT_TX_TYPE),
            inputs: (0..input_count).map(|_| slot()).collect(),
            outputs: (0..output_count).map(|_| slot()).collect(),
            input_piggybacks: SlotBitmap::default(),
            output_piggybacks: SlotBitmap::default(),
            input_invalid: SlotBitmap::default(),
            output_invalid: SlotBitmap::default(),
            started_at: Utc::now(),
            bond: crate::constants::DEFAULT_IN_FLIGHT_EXIT_BOND,
            bond_owner: OwnerAddress(rand::random::<[u8; 32]>()),
            oldest_competing_position: None,
            in_flight_tx_position: None,
            state: InFlightExitState::NonCanonical,
        }
    }
}
