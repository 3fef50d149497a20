//! # plasma-exit-game
//!
//! Bonded exit games on top of [`plasma_framework`].
//!
//! - [`CapabilityRegistries`]: write-once spending conditions and output
//!   guard handlers, shared with games behind an `Arc`
//! - [`conditions`]: payment, fee and fee-nonce spending rules
//! - [`PaymentExitGame`]: standard exits (start, challenge, process in
//!   priority order) and in-flight exits (piggybacks, canonicity games,
//!   spend challenges, processing)
//! - [`Vault`]: the payout sink, called only after state has been committed

pub mod conditions;
pub mod game;
pub mod guard_handler;
pub mod in_flight_exit;
pub mod priority_queue;
pub mod registry;
pub mod standard_exit;
pub mod state_transition;
pub mod vault;

pub use conditions::{
    FeeNonceToFeeTxCondition, FeeOutputToPaymentTxCondition, PaymentOutputToPaymentTxCondition,
    SpendingCheck, SpendingCondition,
};
pub use game::{PaymentExitGame, Payout, PayoutKind, PayoutReport};
pub use guard_handler::{AddressOutputGuardHandler, OutputGuardHandler};
pub use in_flight_exit::{
    CanonicityResponse, InFlightInput, InputSpentChallenge, NonCanonicalChallenge,
    OutputSpentChallenge, StartInFlightExit,
};
pub use registry::CapabilityRegistries;
pub use standard_exit::{ChallengeStandardExit, ProcessedExits, StartStandardExit};
pub use state_transition::verify_value_conserved;
pub use vault::{InMemoryVault, Release, Vault};
