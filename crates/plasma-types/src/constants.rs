//! System-wide constants for the plasma exit core.

/// Spacing between operator-submitted child blocks. Block numbers that are
/// not a multiple of this value are deposit blocks.
pub const CHILD_BLOCK_INTERVAL: u64 = 1000;

/// Multiplier separating the block number inside a packed UTXO position.
pub const BLOCK_OFFSET: u64 = 1_000_000_000;

/// Multiplier separating the transaction index inside a packed UTXO position.
pub const TX_OFFSET: u64 = 10_000;

/// Largest transaction index that fits in a packed position.
pub const MAX_TX_INDEX: u64 = BLOCK_OFFSET / TX_OFFSET - 1;

/// Largest output index that fits in a packed position.
pub const MAX_OUTPUT_INDEX: u64 = TX_OFFSET - 1;

/// Default depth of the per-block transaction Merkle tree (65 536 leaves).
pub const DEFAULT_MERKLE_TREE_DEPTH: u32 = 16;

/// Hard upper bound on the Merkle tree depth accepted by the framework.
pub const MAX_MERKLE_TREE_DEPTH: u32 = 32;

/// Default challenge window in seconds (one week).
pub const DEFAULT_MIN_EXIT_PERIOD_SECS: u64 = 7 * 24 * 60 * 60;

/// Default bond required to start a standard exit.
pub const DEFAULT_STANDARD_EXIT_BOND: u128 = 14_000_000_000_000_000;

/// Default bond required to start an in-flight exit.
pub const DEFAULT_IN_FLIGHT_EXIT_BOND: u128 = 37_000_000_000_000_000;

/// Default bond required to piggyback an in-flight exit slot.
pub const DEFAULT_PIGGYBACK_BOND: u128 = 28_000_000_000_000_000;

/// Maximum number of inputs of a payment transaction.
pub const MAX_INPUTS: usize = 4;

/// Maximum number of outputs of a payment transaction.
pub const MAX_OUTPUTS: usize = 4;

/// Width of the opaque transaction metadata field.
pub const TX_METADATA_LEN: usize = 32;

/// Transaction type of the canonical payment transaction.
pub const PAYMENT_TX_TYPE: u32 = 1;

/// Output type of the canonical payment output.
pub const PAYMENT_OUTPUT_TYPE: u32 = 1;

/// Transaction type of an operator fee-claim transaction.
pub const FEE_TX_TYPE: u32 = 3;

/// Output type of the value output of a fee-claim transaction.
pub const FEE_OUTPUT_TYPE: u32 = 2;

/// Output type of the valueless nonce output of a fee-claim transaction.
pub const FEE_NONCE_OUTPUT_TYPE: u32 = 3;

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
