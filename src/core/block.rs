use crate::core::Transaction;
use crate::error::Result;
use crate::utils::{serialize, sha256_digest, Hash};
use data_encoding::HEXLOWER;

/// `previous_hash` of the genesis block
pub const GENESIS_PREVIOUS_HASH: Hash = [0u8; 32];

// Everything the block hash commits to, in sorted-key order.
#[derive(bincode::Encode)]
struct BlockContent<'a> {
    index: u64,
    nonce: u64,
    previous_hash: &'a Hash,
    timestamp: f64,
    transactions: &'a [Transaction],
}

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    index: u64,
    transactions: Vec<Transaction>,
    timestamp: f64,
    previous_hash: Hash,
    nonce: u64,
    hash: Hash,
}

impl Block {
    /// Seals a block with nonce 0 and computes its hash straight away.
    pub fn new(
        index: u64,
        transactions: Vec<Transaction>,
        timestamp: f64,
        previous_hash: Hash,
    ) -> Result<Block> {
        let mut block = Block {
            index,
            transactions,
            timestamp,
            previous_hash,
            nonce: 0,
            hash: [0u8; 32],
        };
        block.hash = block.recompute_hash()?;
        Ok(block)
    }

    pub fn genesis(transactions: Vec<Transaction>, timestamp: f64) -> Result<Block> {
        Block::new(0, transactions, timestamp, GENESIS_PREVIOUS_HASH)
    }

    /// Hash of the current field values. Does not touch the stored hash.
    pub fn recompute_hash(&self) -> Result<Hash> {
        self.hash_with_nonce(self.nonce)
    }

    /// Hash the block would have with `nonce`; used by mining workers that
    /// share one read-only candidate.
    pub fn hash_with_nonce(&self, nonce: u64) -> Result<Hash> {
        let content = BlockContent {
            index: self.index,
            nonce,
            previous_hash: &self.previous_hash,
            timestamp: self.timestamp,
            transactions: &self.transactions,
        };
        Ok(sha256_digest(&serialize(&content)?))
    }

    /// Stored hash matches the content.
    pub fn is_self_consistent(&self) -> bool {
        matches!(self.recompute_hash(), Ok(hash) if hash == self.hash)
    }

    // Only the miner calls this, on a candidate that is not in any chain yet.
    pub(crate) fn seal(&mut self, nonce: u64, hash: Hash) {
        self.nonce = nonce;
        self.hash = hash;
    }

    pub fn get_index(&self) -> u64 {
        self.index
    }

    pub fn get_transactions(&self) -> &[Transaction] {
        self.transactions.as_slice()
    }

    pub fn get_timestamp(&self) -> f64 {
        self.timestamp
    }

    pub fn get_previous_hash(&self) -> &Hash {
        &self.previous_hash
    }

    pub fn get_nonce(&self) -> u64 {
        self.nonce
    }

    pub fn get_hash(&self) -> &Hash {
        &self.hash
    }

    pub fn get_hash_hex(&self) -> String {
        HEXLOWER.encode(&self.hash)
    }

    #[cfg(test)]
    pub(crate) fn transactions_mut(&mut self) -> &mut Vec<Transaction> {
        &mut self.transactions
    }
}
