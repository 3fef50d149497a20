//! Block builder: seals encoded transactions into a committed block.
//!
//! The operator-side counterpart of the framework: collect transactions,
//! build the fixed-depth Merkle tree over their encodings in arrival order,
//! submit the root, and hand out positions and inclusion proofs.

use plasma_tx::WireTransaction;
use plasma_types::{Hash32, PlasmaError, Result, TxPosition, UtxoPosition};

use crate::framework::PlasmaFramework;
use crate::merkle::MerkleTree;

/// Accumulates transactions for one block.
#[derive(Debug, Clone)]
pub struct BlockBuilder {
    depth: u32,
    transactions: Vec<Vec<u8>>,
}

impl BlockBuilder {
    #[must_use]
    pub fn new(depth: u32) -> Self {
        Self {
            depth,
            transactions: Vec::new(),
        }
    }

    /// Builder sized for `framework`'s tree depth.
    #[must_use]
    pub fn for_framework(framework: &PlasmaFramework) -> Self {
        Self::new(framework.config().merkle_tree_depth)
    }

    /// Append a transaction. Returns its index in the block.
    pub fn push(&mut self, tx: &WireTransaction) -> usize {
        self.transactions.push(tx.encode());
        self.transactions.len() - 1
    }

    /// Append an already-encoded transaction, which must decode.
    pub fn push_encoded(&mut self, tx_bytes: Vec<u8>) -> Result<usize> {
        WireTransaction::decode(&tx_bytes)?;
        self.transactions.push(tx_bytes);
        Ok(self.transactions.len() - 1)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// Build the tree.
    ///
    /// # Errors
    /// [`PlasmaError::TooManyLeaves`] if the block overflows the tree.
    pub fn seal(self) -> Result<SealedBlock> {
        let tree = MerkleTree::build(&self.transactions, self.depth)?;
        Ok(SealedBlock {
            transactions: self.transactions,
            tree,
        })
    }
}

/// A sealed block whose root is fixed but not yet submitted.
#[derive(Debug, Clone)]
pub struct SealedBlock {
    transactions: Vec<Vec<u8>>,
    tree: MerkleTree,
}

impl SealedBlock {
    #[must_use]
    pub fn root(&self) -> Hash32 {
        self.tree.root()
    }

    #[must_use]
    pub fn transaction_count(&self) -> usize {
        self.transactions.len()
    }

    /// Submit as an operator child block.
    pub fn submit(self, framework: &PlasmaFramework) -> Result<CommittedBlock> {
        let number = framework.submit_block(self.root(), self.transactions.len() as u64)?;
        Ok(CommittedBlock {
            block_number: number,
            sealed: self,
        })
    }

    /// Submit as a deposit block. Deposit blocks hold exactly one transaction.
    pub fn submit_deposit(self, framework: &PlasmaFramework) -> Result<CommittedBlock> {
        if self.transactions.len() != 1 {
            return Err(PlasmaError::InvalidTransaction {
                reason: format!(
                    "deposit block needs exactly one transaction, got {}",
                    self.transactions.len()
                ),
            });
        }
        let number = framework.submit_deposit_block(self.root())?;
        Ok(CommittedBlock {
            block_number: number,
            sealed: self,
        })
    }
}

/// A submitted block, able to hand out positions and proofs.
#[derive(Debug, Clone)]
pub struct CommittedBlock {
    pub block_number: u64,
    sealed: SealedBlock,
}

impl CommittedBlock {
    #[must_use]
    pub fn root(&self) -> Hash32 {
        self.sealed.root()
    }

    /// Encoded transaction at `index`.
    #[must_use]
    pub fn transaction(&self, index: usize) -> Option<&[u8]> {
        self.sealed.transactions.get(index).map(Vec::as_slice)
    }

    pub fn tx_position(&self, index: usize) -> Result<TxPosition> {
        TxPosition::new(self.block_number, index as u64)
    }

    pub fn utxo_position(&self, index: usize, output_index: u64) -> Result<UtxoPosition> {
        self.tx_position(index)?.output(output_index)
    }

    /// Wire-format inclusion proof for the transaction at `index`.
    #[must_use]
    pub fn inclusion_proof(&self, index: usize) -> Option<Vec<u8>> {
        self.sealed
            .tree
            .inclusion_proof(index)
            .map(|proof| proof.to_bytes())
    }
}
