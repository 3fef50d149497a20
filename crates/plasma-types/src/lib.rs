//! # plasma-types
//!
//! Shared types, errors, and configuration for the **plasma exit core**.
//!
//! This crate is the leaf dependency of the workspace; every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`OwnerAddress`], [`AssetId`], [`OutputId`], [`ExitId`], [`TxType`], [`OutputType`]
//! - **Positions**: [`UtxoPosition`], [`TxPosition`]
//! - **Finality protocols**: [`Protocol`]
//! - **Blocks**: [`BlockRecord`]
//! - **Exit records**: [`StandardExit`], [`StandardExitState`], [`InFlightExit`], [`InFlightExitState`], [`ExitSlot`], [`SlotBitmap`]
//! - **Signatures**: ed25519 witness and confirmation helpers in [`signature`]
//! - **Configuration**: [`FrameworkConfig`], [`ExitGameConfig`]
//! - **Errors**: [`PlasmaError`] with `PL_ERR_` prefix codes
//! - **Constants**: system-wide limits and defaults

pub mod bitmap;
pub mod block;
pub mod config;
pub mod constants;
pub mod digest;
pub mod error;
pub mod ids;
pub mod in_flight_exit;
pub mod position;
pub mod protocol;
pub mod signature;
pub mod standard_exit;

// Re-export all primary types at crate root for ergonomic imports:
//   use plasma_types::{UtxoPosition, ExitId, StandardExit, ...};

pub use bitmap::*;
pub use block::*;
pub use config::*;
pub use digest::{Hash32, tagged_hash};
pub use error::*;
pub use ids::*;
pub use in_flight_exit::*;
pub use position::*;
pub use protocol::*;
pub use standard_exit::*;

// Constants are accessed via `plasma_types::constants::FOO`, signature
// helpers via `plasma_types::signature::*` (not re-exported).
