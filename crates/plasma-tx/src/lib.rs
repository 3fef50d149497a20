//! # plasma-tx
//!
//! **TransactionCodec**: the canonical binary encoding of child-chain
//! transactions and their typed outputs, plus stable output identifiers.
//!
//! Everything here is pure. Variants are views over one envelope:
//!
//! - [`WireTransaction`]: `[tx_type, [inputs], [outputs], metadata]`
//! - [`PaymentTransaction`]: value outputs only
//! - [`FeeTransaction`]: exactly `[fee value output, nonce output]`

pub mod fee;
pub mod output;
pub mod output_id;
pub mod payment;
mod rlp_util;
pub mod transaction;

pub use fee::FeeTransaction;
pub use output::{FeeNonceOutput, TransactionOutput, WireTransactionOutput};
pub use output_id::{compute_deposit_output_id, compute_output_id, output_id_at};
pub use payment::PaymentTransaction;
pub use transaction::WireTransaction;
