//! Configuration types for the framework and exit games.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::{PlasmaError, Result, TxType, constants};

/// Upper bound on the challenge window (ten years).
const MAX_EXIT_PERIOD_SECS: u64 = 10 * 365 * 24 * 60 * 60;

/// `true` once `now >= start + window`. A deadline that overflows never
/// elapses.
#[must_use]
pub fn window_elapsed(start: DateTime<Utc>, window: TimeDelta, now: DateTime<Utc>) -> bool {
    start
        .checked_add_signed(window)
        .is_some_and(|deadline| now >= deadline)
}

/// Parameters fixed per deployment of the root-chain framework.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameworkConfig {
    /// Spacing between child blocks; deposit blocks fill the gaps.
    pub child_block_interval: u64,
    /// Depth of every block's transaction Merkle tree.
    pub merkle_tree_depth: u32,
    /// Challenge window, in seconds of ledger time.
    pub min_exit_period_secs: u64,
}

impl Default for FrameworkConfig {
    fn default() -> Self {
        Self {
            child_block_interval: constants::CHILD_BLOCK_INTERVAL,
            merkle_tree_depth: constants::DEFAULT_MERKLE_TREE_DEPTH,
            min_exit_period_secs: constants::DEFAULT_MIN_EXIT_PERIOD_SECS,
        }
    }
}

impl FrameworkConfig {
    /// Reject configurations the position encoding or tree can't support.
    pub fn validate(&self) -> Result<()> {
        if self.child_block_interval < 2 {
            return Err(PlasmaError::Configuration(format!(
                "child_block_interval must be >= 2, got {}",
                self.child_block_interval
            )));
        }
        if self.merkle_tree_depth == 0 || self.merkle_tree_depth > constants::MAX_MERKLE_TREE_DEPTH
        {
            return Err(PlasmaError::Configuration(format!(
                "merkle_tree_depth must be in 1..={}, got {}",
                constants::MAX_MERKLE_TREE_DEPTH,
                self.merkle_tree_depth
            )));
        }
        if self.min_exit_period_secs == 0 || self.min_exit_period_secs > MAX_EXIT_PERIOD_SECS {
            return Err(PlasmaError::Configuration(format!(
                "min_exit_period_secs must be in 1..={MAX_EXIT_PERIOD_SECS}, got {}",
                self.min_exit_period_secs
            )));
        }
        Ok(())
    }

    /// The challenge window as a duration.
    #[must_use]
    pub fn min_exit_period(&self) -> TimeDelta {
        i64::try_from(self.min_exit_period_secs)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .unwrap_or(TimeDelta::MAX)
    }

    /// Parse and validate a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(json)?;
        cfg.validate()?;
        Ok(cfg)
    }
}

/// Parameters of one exit game instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExitGameConfig {
    /// The transaction type this game exits and spends into.
    pub tx_type: TxType,
    /// Minimum bond to start a standard exit.
    pub standard_exit_bond: u128,
    /// Minimum bond to start an in-flight exit.
    pub in_flight_exit_bond: u128,
    /// Minimum bond to piggyback an in-flight exit slot.
    pub piggyback_bond: u128,
}

impl Default for ExitGameConfig {
    fn default() -> Self {
        Self {
            tx_type: TxType(constants::PAYMENT_TX_TYPE),
            standard_exit_bond: constants::DEFAULT_STANDARD_EXIT_BOND,
            in_flight_exit_bond: constants::DEFAULT_IN_FLIGHT_EXIT_BOND,
            piggyback_bond: constants::DEFAULT_PIGGYBACK_BOND,
        }
    }
}

impl ExitGameConfig {
    /// Default bonds for the given tx type.
    #[must_use]
    pub fn for_tx_type(tx_type: TxType) -> Self {
        Self {
            tx_type,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.standard_exit_bond == 0
            || self.in_flight_exit_bond == 0
            || self.piggyback_bond == 0
        {
            return Err(PlasmaError::Configuration(
                "exit bonds must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}
