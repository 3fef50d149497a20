//! # plasma-framework
//!
//! The root-chain side of the plasma exit core.
//!
//! - [`merkle`]: fixed-depth Merkle commitments and inclusion proofs
//! - [`PlasmaFramework`]: append-only block store (child and deposit
//!   blocks), exit-game protocol registry, output spent flags
//! - [`BlockBuilder`]: operator-side block sealing
//! - [`TxFinalizationVerifier`]: MVP / MoreVP finality decisions
//! - [`LedgerClock`]: injected ledger time

pub mod block_builder;
pub mod clock;
pub mod finality;
pub mod framework;
pub mod merkle;

pub use block_builder::{BlockBuilder, CommittedBlock, SealedBlock};
#[cfg(any(test, feature = "test-helpers"))]
pub use clock::ManualClock;
pub use clock::{LedgerClock, SystemClock};
pub use finality::{FinalityRequest, TxFinalizationVerifier};
pub use framework::PlasmaFramework;
pub use merkle::{MerkleProof, MerkleTree, verify_inclusion};
