//! Output guard handlers: resolve who owns an output.

use plasma_tx::WireTransactionOutput;
use plasma_types::OwnerAddress;

/// Pluggable ownership rule for one output type.
pub trait OutputGuardHandler: Send + Sync {
    /// Whether `preimage` is acceptable evidence for the output's guard.
    fn is_valid(&self, output: &WireTransactionOutput, preimage: &[u8]) -> bool;

    /// The owner the output pays out to.
    fn owner_of(&self, output: &WireTransactionOutput) -> OwnerAddress;
}

/// The guard is the owner's address itself; no preimage is involved.
#[derive(Debug, Default, Clone, Copy)]
pub struct AddressOutputGuardHandler;

impl OutputGuardHandler for AddressOutputGuardHandler {
    fn is_valid(&self, _output: &WireTransactionOutput, preimage: &[u8]) -> bool {
        preimage.is_empty()
    }

    fn owner_of(&self, output: &WireTransactionOutput) -> OwnerAddress {
        OwnerAddress(output.guard)
    }
}
