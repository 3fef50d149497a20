//! Fixed-depth Merkle commitments over encoded transactions.
//!
//! Leaves and inner nodes are hashed under different domains, so a leaf can
//! never be passed off as a node. The tree always has `2^depth` leaves:
//! slots past the last real leaf hold a fixed empty-leaf hash, and the
//! empty subtrees above them come from a precomputed zero-hash ladder. Only
//! the populated prefix of each level is stored.
//!
//! Proof wire layout: `depth` sibling hashes of 32 bytes, leaf-to-root, with
//! no framing.

use plasma_types::{Hash32, PlasmaError, Result, tagged_hash};

const LEAF_DOMAIN: &[u8] = b"plasma:merkle_leaf:v1:";
const NODE_DOMAIN: &[u8] = b"plasma:merkle_node:v1:";
const EMPTY_DOMAIN: &[u8] = b"plasma:merkle_empty:v1:";

/// Hash of a leaf's raw bytes.
#[must_use]
pub fn hash_leaf(data: &[u8]) -> Hash32 {
    tagged_hash(LEAF_DOMAIN, &[data])
}

fn hash_nodes(left: &Hash32, right: &Hash32) -> Hash32 {
    tagged_hash(NODE_DOMAIN, &[left, right])
}

/// `zero[h]` is the root of an empty subtree of height `h`.
fn zero_hashes(depth: u32) -> Vec<Hash32> {
    let mut zero = Vec::with_capacity(depth as usize + 1);
    zero.push(tagged_hash(EMPTY_DOMAIN, &[]));
    for h in 0..depth as usize {
        zero.push(hash_nodes(&zero[h], &zero[h]));
    }
    zero
}

/// A built tree.
#[derive(Debug, Clone)]
pub struct MerkleTree {
    depth: u32,
    /// `levels[0]` are leaf hashes; `levels[depth]` holds the root.
    levels: Vec<Vec<Hash32>>,
    zero: Vec<Hash32>,
}

impl MerkleTree {
    /// Build a tree of the given depth over `leaves`, in order.
    ///
    /// # Errors
    /// [`PlasmaError::TooManyLeaves`] if `leaves` doesn't fit in `2^depth`.
    pub fn build<T: AsRef<[u8]>>(leaves: &[T], depth: u32) -> Result<Self> {
        let capacity = 1u64.checked_shl(depth).unwrap_or(u64::MAX);
        if leaves.len() as u64 > capacity {
            return Err(PlasmaError::TooManyLeaves {
                depth,
                leaves: leaves.len(),
            });
        }

        let zero = zero_hashes(depth);
        let mut levels = Vec::with_capacity(depth as usize + 1);
        levels.push(leaves.iter().map(|l| hash_leaf(l.as_ref())).collect::<Vec<_>>());

        for h in 0..depth as usize {
            let current = &levels[h];
            let next = current
                .chunks(2)
                .map(|pair| {
                    let right = pair.get(1).unwrap_or(&zero[h]);
                    hash_nodes(&pair[0], right)
                })
                .collect::<Vec<_>>();
            levels.push(next);
        }

        Ok(Self {
            depth,
            levels,
            zero,
        })
    }

    #[must_use]
    pub fn depth(&self) -> u32 {
        self.depth
    }

    #[must_use]
    pub fn leaf_count(&self) -> usize {
        self.levels[0].len()
    }

    #[must_use]
    pub fn root(&self) -> Hash32 {
        self.levels[self.depth as usize]
            .first()
            .copied()
            .unwrap_or(self.zero[self.depth as usize])
    }

    /// Inclusion proof for the leaf at `index`, or `None` past the last real
    /// leaf.
    #[must_use]
    pub fn inclusion_proof(&self, index: usize) -> Option<MerkleProof> {
        if index >= self.leaf_count() {
            return None;
        }
        let mut siblings = Vec::with_capacity(self.depth as usize);
        let mut i = index;
        for h in 0..self.depth as usize {
            let sibling = self.levels[h].get(i ^ 1).copied().unwrap_or(self.zero[h]);
            siblings.push(sibling);
            i >>= 1;
        }
        Some(MerkleProof { siblings })
    }
}

/// Sibling hashes from leaf to root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerkleProof {
    pub siblings: Vec<Hash32>,
}

impl MerkleProof {
    /// Concatenated 32-byte siblings.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        self.siblings.concat()
    }

    /// Parse the wire layout.
    ///
    /// # Errors
    /// [`PlasmaError::MalformedEncoding`] unless the length is a multiple
    /// of 32.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() % 32 != 0 {
            return Err(PlasmaError::MalformedEncoding {
                reason: format!("proof length {} is not a multiple of 32", bytes.len()),
            });
        }
        let siblings = bytes
            .chunks_exact(32)
            .map(|c| {
                let mut h = [0u8; 32];
                h.copy_from_slice(c);
                h
            })
            .collect();
        Ok(Self { siblings })
    }

    /// `true` iff `leaf` sits at `index` under `root`.
    #[must_use]
    pub fn verify(&self, root: &Hash32, leaf: &[u8], index: u64) -> bool {
        let depth = self.siblings.len();
        if depth < 64 && index >> depth != 0 {
            return false;
        }
        let mut node = hash_leaf(leaf);
        let mut i = index;
        for sibling in &self.siblings {
            node = if i & 1 == 0 {
                hash_nodes(&node, sibling)
            } else {
                hash_nodes(sibling, &node)
            };
            i >>= 1;
        }
        node == *root
    }
}

/// Verify a wire-format proof for a tree of fixed `depth`. Any malformed
/// input yields `false`.
#[must_use]
pub fn verify_inclusion(root: &Hash32, leaf: &[u8], index: u64, proof: &[u8], depth: u32) -> bool {
    if proof.len() != depth as usize * 32 {
        return false;
    }
    MerkleProof::from_bytes(proof).is_ok_and(|p| p.verify(root, leaf, index))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn leaves(n: usize) -> Vec<Vec<u8>> {
        (0..n).map(|i| format!("tx-{i}").into_bytes()).collect()
    }

    #[test]
    fn empty_tree_root_is_zero_ladder() {
        let tree = MerkleTree::build::<Vec<u8>>(&[], 4).unwrap();
        assert_eq!(tree.root(), zero_hashes(4)[4]);
        assert!(tree.inclusion_proof(0).is_none());
    }

    #[test]
    fn proof_length_is_depth() {
        let tree = MerkleTree::build(&leaves(3), 16).unwrap();
        let proof = tree.inclusion_proof(2).unwrap();
        assert_eq!(proof.siblings.len(), 16);
        assert_eq!(proof.to_bytes().len(), 16 * 32);
    }

    #[test]
    fn every_leaf_verifies() {
        let data = leaves(5);
        let tree = MerkleTree::build(&data, 3).unwrap();
        let root = tree.root();
        for (i, leaf) in data.iter().enumerate() {
            let proof = tree.inclusion_proof(i).unwrap().to_bytes();
            assert!(verify_inclusion(&root, leaf, i as u64, &proof, 3));
        }
    }

    #[test]
    fn wrong_index_fails() {
        let data = leaves(4);
        let tree = MerkleTree::build(&data, 2).unwrap();
        let proof = tree.inclusion_proof(1).unwrap();
        assert!(!proof.verify(&tree.root(), &data[1], 0));
        assert!(!proof.verify(&tree.root(), &data[1], 5));
    }

    #[test]
    fn padding_leaf_does_not_verify_as_data() {
        let data = leaves(1);
        let tree = MerkleTree::build(&data, 2).unwrap();
        let proof = tree.inclusion_proof(0).unwrap();
        assert!(!proof.verify(&tree.root(), b"", 1));
    }

    #[test]
    fn too_many_leaves() {
        let err = MerkleTree::build(&leaves(5), 2).unwrap_err();
        assert!(matches!(err, PlasmaError::TooManyLeaves { depth: 2, leaves: 5 }));
    }

    #[test]
    fn wrong_length_proofs_rejected() {
        let data = leaves(2);
        let tree = MerkleTree::build(&data, 4).unwrap();
        let mut proof = tree.inclusion_proof(0).unwrap().to_bytes();
        assert!(!verify_inclusion(&tree.root(), &data[0], 0, &proof[..proof.len() - 32], 4));
        proof.push(0);
        assert!(!verify_inclusion(&tree.root(), &data[0], 0, &proof, 4));
        assert!(MerkleProof::from_bytes(&proof).is_err());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_included_leaves_verify(
            data in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..40), 1..16),
            pick in any::<prop::sample::Index>(),
        ) {
            let tree = MerkleTree::build(&data, 4).unwrap();
            let i = pick.index(data.len());
            let proof = tree.inclusion_proof(i).unwrap().to_bytes();
            prop_assert!(verify_inclusion(&tree.root(), &data[i], i as u64, &proof, 4));
        }

        #[test]
        fn prop_mutated_leaf_or_index_fails(
            data in prop::collection::vec(prop::collection::vec(any::<u8>(), 1..40), 2..16),
            pick in any::<prop::sample::Index>(),
            other in any::<prop::sample::Index>(),
        ) {
            let tree = MerkleTree::build(&data, 4).unwrap();
            let root = tree.root();
            let i = pick.index(data.len());
            let proof = tree.inclusion_proof(i).unwrap().to_bytes();

            let mut mutated = data[i].clone();
            mutated[0] ^= 0x01;
            prop_assert!(!verify_inclusion(&root, &mutated, i as u64, &proof, 4));

            let j = other.index(16);
            if j != i {
                prop_assert!(!verify_inclusion(&root, &data[i], j as u64, &proof, 4));
            }
        }
    }
}
