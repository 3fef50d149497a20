//! Ed25519 witnesses and block confirmations.
//!
//! Owners are identified by their verifying key, so "the signature recovers to
//! the owner" becomes "the signature verifies under the owner's key". A
//! malformed key or signature is simply a failed verification.

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};

use crate::digest::{Hash32, tagged_hash};
use crate::ids::OwnerAddress;

/// Length of an encoded signature.
pub const SIGNATURE_LEN: usize = 64;

/// Digest an owner signs to authorise a transaction spending their output.
#[must_use]
pub fn tx_signing_digest(tx_bytes: &[u8]) -> Hash32 {
    tagged_hash(b"plasma:tx_sign:v1:", &[tx_bytes])
}

/// Message an owner signs to confirm a transaction once its block is known.
#[must_use]
pub fn confirmation_message(block_root: &Hash32) -> Hash32 {
    tagged_hash(b"plasma:confirm:v1:", &[block_root])
}

/// Owner address of a signing key.
#[must_use]
pub fn owner_of(key: &SigningKey) -> OwnerAddress {
    OwnerAddress(key.verifying_key().to_bytes())
}

/// Sign `message`, returning the 64 raw signature bytes.
#[must_use]
pub fn sign(key: &SigningKey, message: &[u8]) -> Vec<u8> {
    key.sign(message).to_bytes().to_vec()
}

/// Witness for a spend: a signature over [`tx_signing_digest`].
#[must_use]
pub fn sign_tx(key: &SigningKey, tx_bytes: &[u8]) -> Vec<u8> {
    sign(key, &tx_signing_digest(tx_bytes))
}

/// Confirmation signature over a block root.
#[must_use]
pub fn sign_confirmation(key: &SigningKey, block_root: &Hash32) -> Vec<u8> {
    sign(key, &confirmation_message(block_root))
}

/// `true` iff `signature` is a valid signature by `signer` over `message`.
#[must_use]
pub fn verify(signer: &OwnerAddress, message: &[u8], signature: &[u8]) -> bool {
    let Ok(raw) = <[u8; SIGNATURE_LEN]>::try_from(signature) else {
        return false;
    };
    let Ok(key) = VerifyingKey::from_bytes(signer.as_bytes()) else {
        return false;
    };
    key.verify(message, &Signature::from_bytes(&raw)).is_ok()
}

/// `true` iff `witness` authorises `tx_bytes` on behalf of `owner`.
#[must_use]
pub fn verify_tx_witness(owner: &OwnerAddress, tx_bytes: &[u8], witness: &[u8]) -> bool {
    verify(owner, &tx_signing_digest(tx_bytes), witness)
}

/// `true` iff `signature` confirms `block_root` on behalf of `signer`.
#[must_use]
pub fn verify_confirmation(signer: &OwnerAddress, block_root: &Hash32, signature: &[u8]) -> bool {
    verify(signer, &confirmation_message(block_root), signature)
}

/// Deterministic signing key for tests.
#[cfg(any(test, feature = "test-helpers"))]
#[must_use]
pub fn test_key(seed: u8) -> SigningKey {
    SigningKey::from_bytes(&[seed; 32])
}

/// Random signing key for tests.
#[cfg(any(test, feature = "test-helpers"))]
#[must_use]
pub fn random_key() -> SigningKey {
    SigningKey::from_bytes(&rand::random::<[u8; 32]>())
}
