//! # StandardExit: bonded withdrawal of one included output
//!
//! ## State Machine
//!
//! ```text
//!   ┌─────────┐  window elapsed   ┌───────────┐
//!   │ PENDING ├──────────────────▶│ FINALIZED │
//!   └────┬────┘                   └───────────┘
//!        │ successful challenge
//!        ▼
//!   ┌───────────┐
//!   │ CANCELLED │
//!   └───────────┘
//! ```
//!
//! Terminal states absorb. A cancelled exit's id may be reused by a fresh
//! exit; a finalized output is blocked by the framework's spent flags.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::config::window_elapsed;
use crate::{AssetId, ExitId, OutputId, OutputType, OwnerAddress, PlasmaError, UtxoPosition};

/// Lifecycle state of a standard exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StandardExitState {
    /// Queued and challengeable.
    Pending,
    /// Value paid out to the owner. **Irreversible.**
    Finalized,
    /// Proven invalid by a challenger, or omitted because its output was
    /// already withdrawn elsewhere.
    Cancelled,
}

impl StandardExitState {
    #[must_use]
    pub fn can_transition_to(&self, target: Self) -> bool {
        matches!((self, target), (Self::Pending, Self::Finalized | Self::Cancelled))
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl std::fmt::Display for StandardExitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "PENDING"),
            Self::Finalized => write!(f, "FINALIZED"),
            Self::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

/// A standard exit record, owned by the exit game for its whole lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandardExit {
    pub exit_id: ExitId,
    /// Owner resolved through the output guard handler at start.
    pub owner: OwnerAddress,
    /// Position of the exiting output; also its queue priority.
    pub position: UtxoPosition,
    pub output_id: OutputId,
    pub output_type: OutputType,
    pub asset: AssetId,
    /// Value released to the owner on finalization.
    pub amount: u128,
    /// Escrowed bond, in the native asset.
    pub bond: u128,
    pub started_at: DateTime<Utc>,
    pub state: StandardExitState,
}

impl StandardExit {
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.state == StandardExitState::Pending
    }

    /// Whether the challenge window has elapsed at `now`.
    #[must_use]
    pub fn is_exitable(&self, window: TimeDelta, now: DateTime<Utc>) -> bool {
        window_elapsed(self.started_at, window, now)
    }

    /// Transition to FINALIZED.
    ///
    /// # Errors
    /// [`PlasmaError::ExitNotPending`] if the exit isn't pending.
    pub fn mark_finalized(&mut self) -> crate::Result<()> {
        self.transition(StandardExitState::Finalized)
    }

    /// Transition to CANCELLED.
    ///
    /// # Errors
    /// [`PlasmaError::ExitNotPending`] if the exit isn't pending.
    pub fn mark_cancelled(&mut self) -> crate::Result<()> {
        self.transition(StandardExitState::Cancelled)
    }

    fn transition(&mut self, target: StandardExitState) -> crate::Result<()> {
        if !self.state.can_transition_to(target) {
            return Err(PlasmaError::ExitNotPending(self.exit_id));
        }
        self.state = target;
        Ok(())
    }
}

/// Dummy exit for testing. **Never use in production.**
#[cfg(any(test, feature = "test-helpers"))]
impl StandardExit {
    pub fn dummy(position: UtxoPosition, asset: AssetId, amount: u128) -> Self {
        Self {
            exit_id: ExitId(rand::random::<[u8; 20]>()),
            owner: OwnerAddress(rand::random::<[u8; 32]>()),
            position,
            output_id: OutputId(rand::random::<[u8; 32]>()),
            output_type: OutputType(crate::constants::PAYMENT_OUTPUT_TYPE),
            asset,
            amount,
            bond: crate::constants::DEFAULT_STANDARD_EXIT_BOND,
            started_at: Utc::now(),
            state: StandardExitState::Pending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_exit() -> StandardExit {
        StandardExit::dummy(UtxoPosition::new(1000, 0, 0).unwrap(), AssetId::NATIVE, 100)
    }

    #[test]
    fn state_transitions_valid() {
        assert!(StandardExitState::Pending.can_transition_to(StandardExitState::Finalized));
        assert!(StandardExitState::Pending.can_transition_to(StandardExitState::Cancelled));
    }

    #[test]
    fn terminal_states_absorb() {
        for from in [StandardExitState::Finalized, StandardExitState::Cancelled] {
            assert!(from.is_terminal());
            for to in [
                StandardExitState::Pending,
                StandardExitState::Finalized,
                StandardExitState::Cancelled,
            ] {
                assert!(!from.can_transition_to(to), "{from} -> {to} must fail");
            }
        }
    }

    #[test]
    fn double_finalize_blocked() {
        let mut exit = make_exit();
        exit.mark_finalized().unwrap();
        assert!(matches!(
            exit.mark_finalized().unwrap_err(),
            PlasmaError::ExitNotPending(_)
        ));
        assert!(exit.mark_cancelled().is_err());
    }

    #[test]
    fn cancelled_cannot_finalize() {
        let mut exit = make_exit();
        exit.mark_cancelled().unwrap();
        assert!(exit.mark_finalized().is_err());
        assert_eq!(exit.state, StandardExitState::Cancelled);
    }

    #[test]
    fn exitable_after_window() {
        let exit = make_exit();
        let window = TimeDelta::try_seconds(10).unwrap();
        assert!(!exit.is_exitable(window, exit.started_at));
        assert!(exit.is_exitable(window, exit.started_at + window));
    }

    #[test]
    fn serde_roundtrip() {
        let exit = make_exit();
        let json = serde_json::to_string(&exit).unwrap();
        let back: StandardExit = serde_json::from_str(&json).unwrap();
        assert_eq!(exit, back);
    }
}
