//! Error types for the plasma exit core.
//!
//! All errors use the `PL_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Codec errors
//! - 2xx: Commitment / block errors
//! - 3xx: Finality errors
//! - 4xx: Registry errors
//! - 5xx: Standard exit errors
//! - 6xx: In-flight exit errors
//! - 7xx: Bond / payout errors
//! - 9xx: General / internal errors
//!
//! Inclusion-proof and signature failures are deliberately absent: finality
//! checks report them as `Ok(false)`.

use thiserror::Error;

use crate::{AssetId, ExitId, OutputId, OutputType, TxType};

/// Central error enum for all exit-core operations.
#[derive(Debug, Error)]
pub enum PlasmaError {
    // =================================================================
    // Codec Errors (1xx)
    // =================================================================
    /// Bytes don't match the wire structure. Never partially parsed.
    #[error("PL_ERR_100: Malformed encoding: {reason}")]
    MalformedEncoding { reason: String },

    /// Well-formed encoding that violates a transaction variant's shape.
    #[error("PL_ERR_101: Invalid transaction: {reason}")]
    InvalidTransaction { reason: String },

    /// A position component doesn't fit its packed slot.
    #[error("PL_ERR_102: Invalid position: {reason}")]
    InvalidPosition { reason: String },

    /// The referenced output doesn't exist in the transaction.
    #[error("PL_ERR_103: Output index {index} out of range")]
    OutputIndexOutOfRange { index: u64 },

    // =================================================================
    // Commitment Errors (2xx)
    // =================================================================
    /// No block has been committed under this number.
    #[error("PL_ERR_200: Block not found: {0}")]
    BlockNotFound(u64),

    /// Every deposit slot before the next child block is taken.
    #[error("PL_ERR_201: Deposit blocks exhausted before child block {next_child_block}")]
    DepositBlocksExhausted { next_child_block: u64 },

    /// Too many leaves for the configured tree depth.
    #[error("PL_ERR_202: Merkle tree of depth {depth} cannot hold {leaves} leaves")]
    TooManyLeaves { depth: u32, leaves: usize },

    // =================================================================
    // Finality Errors (3xx)
    // =================================================================
    /// Caller-configuration error: protocol tag outside {MVP, MoreVP}.
    #[error("PL_ERR_300: Invalid protocol value: {0}")]
    InvalidProtocol(u8),

    /// A transaction required to be finalized is not.
    #[error("PL_ERR_301: Transaction not finalized: {reason}")]
    TxNotFinalized { reason: String },

    /// No exit game / protocol has been registered for this tx type.
    #[error("PL_ERR_302: Transaction type not registered: {0}")]
    TxTypeNotRegistered(TxType),

    // =================================================================
    // Registry Errors (4xx)
    // =================================================================
    /// Write-once registry key already taken.
    #[error("PL_ERR_400: Duplicate registration: {key}")]
    DuplicateRegistration { key: String },

    /// No capability registered under this key.
    #[error("PL_ERR_401: Unregistered capability: {key}")]
    UnregisteredCapability { key: String },

    // =================================================================
    // Standard Exit Errors (5xx)
    // =================================================================
    /// A non-terminal exit already exists for this id.
    #[error("PL_ERR_500: Already exiting: {0}")]
    AlreadyExiting(ExitId),

    #[error("PL_ERR_501: Exit not found: {0}")]
    ExitNotFound(ExitId),

    /// The exit is in a state that doesn't allow the requested operation.
    #[error("PL_ERR_502: Exit not pending: {0}")]
    ExitNotPending(ExitId),

    /// The caller doesn't own the output it is acting on.
    #[error("PL_ERR_503: Caller is not the owner of the output")]
    NotOutputOwner,

    /// The output was already withdrawn through another exit.
    #[error("PL_ERR_504: Output already spent: {0}")]
    OutputAlreadySpent(OutputId),

    #[error("PL_ERR_505: Cannot exit an output with zero amount")]
    ZeroAmountExit,

    /// The challenge evidence doesn't prove what it claims.
    #[error("PL_ERR_506: Invalid challenge: {reason}")]
    InvalidChallenge { reason: String },

    // =================================================================
    // In-Flight Exit Errors (6xx)
    // =================================================================
    /// The input/output slot has already been piggybacked.
    #[error("PL_ERR_600: Already piggybacked: {exit_id} {slot}")]
    AlreadyPiggybacked { exit_id: ExitId, slot: String },

    #[error("PL_ERR_601: Invalid slot index {index} (slot count {count})")]
    InvalidSlotIndex { index: usize, count: usize },

    #[error("PL_ERR_602: Challenge period over for {0}")]
    ChallengePeriodOver(ExitId),

    #[error("PL_ERR_603: Challenge period not over for {0}")]
    ChallengePeriodNotOver(ExitId),

    #[error("PL_ERR_604: Invalid competitor: {reason}")]
    InvalidCompetitor { reason: String },

    #[error("PL_ERR_605: Invalid response: {reason}")]
    InvalidResponse { reason: String },

    /// The in-flight transaction creates more value than it consumes, or its
    /// inputs aren't authorised.
    #[error("PL_ERR_606: Invalid state transition: {reason}")]
    InvalidStateTransition { reason: String },

    // =================================================================
    // Bond / Payout Errors (7xx)
    // =================================================================
    #[error("PL_ERR_700: Insufficient bond: required {required}, provided {provided}")]
    InsufficientBond { required: u128, provided: u128 },

    /// The vault rejected a value release.
    #[error("PL_ERR_701: Payout of {amount} {asset} failed: {reason}")]
    PayoutFailed {
        asset: AssetId,
        amount: u128,
        reason: String,
    },

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    #[error("PL_ERR_900: Internal error: {0}")]
    Internal(String),

    #[error("PL_ERR_901: Serialization error: {0}")]
    Serialization(String),

    #[error("PL_ERR_902: Configuration error: {0}")]
    Configuration(String),
}

impl PlasmaError {
    /// Key formatter shared by the capability registries.
    #[must_use]
    pub fn spending_condition_key(output_type: OutputType, tx_type: TxType) -> String {
        format!("spending_condition({output_type}, {tx_type})")
    }

    #[must_use]
    pub fn guard_handler_key(output_type: OutputType) -> String {
        format!("output_guard_handler({output_type})")
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, PlasmaError>;

impl From<serde_json::Error> for PlasmaError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
