//! Domain-separated SHA-256 hashing.
//!
//! Every hash in the system carries a `plasma:<purpose>:v1:` prefix so a
//! digest computed for one purpose can never be replayed as another
//! (an output id can't collide with a Merkle node, etc.).

use sha2::{Digest, Sha256};

/// A 32-byte SHA-256 digest.
pub type Hash32 = [u8; 32];

/// Hash `parts` in order under the given domain tag.
#[must_use]
pub fn tagged_hash(domain: &[u8], parts: &[&[u8]]) -> Hash32 {
    let mut hasher = Sha256::new();
    hasher.update(domain);
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}
