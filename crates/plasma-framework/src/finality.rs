//! Transaction finality under the MVP and MoreVP protocols.
//!
//! Bad proofs and bad signatures are ordinary "not finalized" answers
//! (`Ok(false)`). Only an unknown protocol tag is an error, and it is
//! checked before anything else.

use plasma_types::signature::verify_confirmation;
use plasma_types::{OwnerAddress, Protocol, Result, UtxoPosition};

use crate::framework::PlasmaFramework;
use crate::merkle::verify_inclusion;

/// Everything a finality decision looks at.
#[derive(Debug, Clone, Copy)]
pub struct FinalityRequest<'a> {
    /// Raw protocol tag; validated by the verifier.
    pub protocol: u8,
    pub tx_bytes: &'a [u8],
    /// Position of the transaction (any of its outputs works). The raw
    /// value `0` is the unconfirmed sentinel.
    pub position: UtxoPosition,
    pub inclusion_proof: &'a [u8],
    /// MVP only: signature over the block root.
    pub confirm_signature: &'a [u8],
    /// MVP only: who must have confirmed.
    pub expected_signer: Option<OwnerAddress>,
}

impl<'a> FinalityRequest<'a> {
    /// A MoreVP-style request without confirmation data.
    #[must_use]
    pub fn new(
        protocol: Protocol,
        tx_bytes: &'a [u8],
        position: UtxoPosition,
        inclusion_proof: &'a [u8],
    ) -> Self {
        Self {
            protocol: protocol.tag(),
            tx_bytes,
            position,
            inclusion_proof,
            confirm_signature: &[],
            expected_signer: None,
        }
    }

    #[must_use]
    pub fn with_confirmation(mut self, signature: &'a [u8], signer: OwnerAddress) -> Self {
        self.confirm_signature = signature;
        self.expected_signer = Some(signer);
        self
    }
}

/// Read-only finality checks against committed blocks.
#[derive(Debug, Clone, Copy)]
pub struct TxFinalizationVerifier<'a> {
    framework: &'a PlasmaFramework,
}

impl<'a> TxFinalizationVerifier<'a> {
    #[must_use]
    pub fn new(framework: &'a PlasmaFramework) -> Self {
        Self { framework }
    }

    /// Finality of an included transaction.
    ///
    /// # Errors
    /// [`plasma_types::PlasmaError::InvalidProtocol`] for an unknown tag.
    pub fn is_standard_finalized(&self, req: &FinalityRequest<'_>) -> Result<bool> {
        let finalized = match Protocol::from_tag(req.protocol)? {
            Protocol::Mvp => self.is_confirmed(req),
            Protocol::MoreVp => self.is_included(req),
        };
        tracing::debug!(
            protocol = req.protocol,
            position = %req.position,
            finalized,
            "Standard finality checked"
        );
        Ok(finalized)
    }

    /// Finality for exit eligibility: under MoreVP an unincluded transaction
    /// is provisionally final when it is non-empty and sits at the sentinel.
    ///
    /// # Errors
    /// [`plasma_types::PlasmaError::InvalidProtocol`] for an unknown tag.
    pub fn is_protocol_finalized(&self, req: &FinalityRequest<'_>) -> Result<bool> {
        let finalized = match Protocol::from_tag(req.protocol)? {
            Protocol::Mvp => self.is_confirmed(req),
            Protocol::MoreVp => {
                self.is_included(req)
                    || (!req.tx_bytes.is_empty() && req.position.is_unconfirmed())
            }
        };
        tracing::debug!(
            protocol = req.protocol,
            position = %req.position,
            finalized,
            "Protocol finality checked"
        );
        Ok(finalized)
    }

    fn is_included(&self, req: &FinalityRequest<'_>) -> bool {
        let Ok(block) = self.framework.block(req.position.block_number()) else {
            return false;
        };
        verify_inclusion(
            &block.root,
            req.tx_bytes,
            req.position.tx_index(),
            req.inclusion_proof,
            self.framework.config().merkle_tree_depth,
        )
    }

    fn is_confirmed(&self, req: &FinalityRequest<'_>) -> bool {
        let Some(signer) = req.expected_signer else {
            return false;
        };
        let Ok(block) = self.framework.block(req.position.block_number()) else {
            return false;
        };
        self.is_included(req) && verify_confirmation(&signer, &block.root, req.confirm_signature)
    }
}
