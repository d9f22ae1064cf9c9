// This is the ledger itself - the ordered chain of sealed blocks plus the
// buffer of transactions that were accepted but not mined yet.
// Nothing here caches balances: I replay the whole history every time I need
// to know who owns a coin, so the chain is the only source of truth.

use crate::core::validation::{owned_coins, validate_transaction};
use crate::core::{Block, ProofOfWork, Transaction};
use crate::error::{AppendError, MiningError, Result, ValidationError};
use crate::utils::{current_timestamp, Hash};
use crate::wallet::Wallet;
use log::{debug, info, warn};
use std::collections::BTreeSet;
use std::sync::atomic::AtomicBool;

#[derive(Debug, Clone)]
pub struct Blockchain {
    chain: Vec<Block>,          // Sealed blocks, genesis first, append-only
    pending: Vec<Transaction>,  // Validated transactions waiting for the next block
}

impl Blockchain {
    // When I already have a genesis block (for example one shared by several ledgers)
    pub fn new(genesis: Block) -> Blockchain {
        info!("Installing genesis block {}", genesis.get_hash_hex());
        Blockchain {
            chain: vec![genesis],
            pending: vec![],
        }
    }

    // When I want the issuer to hand out one coin per recipient, ids 1..=n in order
    pub fn with_initial_coins(issuer: &Wallet, recipients: &[&[u8]]) -> Result<Blockchain> {
        let mut transactions = Vec::with_capacity(recipients.len());
        for (coin_id, recipient) in (1u64..).zip(recipients.iter()) {
            transactions.push(issuer.new_transfer(recipient, coin_id)?);
        }
        let genesis = Block::genesis(transactions, current_timestamp()?)?;
        Ok(Self::new(genesis))
    }

    pub fn get_blocks(&self) -> &[Block] {
        self.chain.as_slice()
    }

    pub fn get_pending(&self) -> &[Transaction] {
        self.pending.as_slice()
    }

    pub fn last_block(&self) -> &Block {
        self.chain
            .last()
            .expect("Chain always holds the genesis block - this should never happen")
    }

    pub fn height(&self) -> u64 {
        self.last_block().get_index()
    }

    // Full history in chronological order: every sealed block (genesis included),
    // then the pending buffer in insertion order
    fn history(&self) -> impl Iterator<Item = &Transaction> {
        self.chain
            .iter()
            .flat_map(|block| block.get_transactions())
            .chain(self.pending.iter())
    }

    /// Runs the self-transfer, signature and ownership checks without admitting.
    pub fn validate_transaction(&self, tx: &Transaction) -> std::result::Result<(), ValidationError> {
        validate_transaction(self.history(), tx)
    }

    /// Validates a transaction built elsewhere and adds it to the pending buffer.
    pub fn submit_transaction(
        &mut self,
        tx: Transaction,
    ) -> std::result::Result<(), ValidationError> {
        match self.validate_transaction(&tx) {
            Ok(()) => {
                debug!("Accepted transaction: {tx}");
                self.pending.push(tx);
                Ok(())
            }
            Err(e) => {
                warn!("Rejected transaction ({tx}): {e}");
                Err(e)
            }
        }
    }

    pub fn new_transaction(
        &mut self,
        sender: &[u8],
        recipient: &[u8],
        coin_id: u64,
        signature: &[u8],
    ) -> std::result::Result<Transaction, ValidationError> {
        let tx = Transaction::new(sender, recipient, coin_id, signature);
        self.submit_transaction(tx.clone())?;
        Ok(tx)
    }

    /// Coins `public_key` holds across the chain and the pending buffer.
    pub fn check_balance(&self, public_key: &[u8]) -> BTreeSet<u64> {
        owned_coins(self.history(), public_key)
    }

    // When I want to mine on a single thread with no way to stop early
    pub fn mine(&mut self, difficulty: u32) -> std::result::Result<Block, MiningError> {
        self.mine_with(difficulty, 1, &AtomicBool::new(false))
    }

    // The full mining routine: build the candidate, search for a nonce, then commit.
    // If the search is cancelled I return before touching anything.
    pub fn mine_with(
        &mut self,
        difficulty: u32,
        workers: usize,
        cancel: &AtomicBool,
    ) -> std::result::Result<Block, MiningError> {
        let mut candidate = self.prepare_candidate()?;
        let (nonce, hash) = ProofOfWork::new(&candidate, difficulty)
            .run_parallel(workers, cancel)?
            .ok_or(MiningError::Cancelled)?;
        candidate.seal(nonce, hash);
        self.commit_mined(candidate)
    }

    /// Unsealed candidate on top of the current tip holding a snapshot of `pending`.
    pub fn prepare_candidate(&self) -> std::result::Result<Block, MiningError> {
        if self.pending.is_empty() {
            return Err(MiningError::NothingToMine);
        }
        let last_block = self.last_block();
        let candidate = Block::new(
            last_block.get_index() + 1,
            self.pending.clone(),
            current_timestamp()?,
            *last_block.get_hash(),
        )?;
        Ok(candidate)
    }

    /// Appends a mined candidate and drops the transactions it sealed from `pending`.
    ///
    /// Fails with `Stale` if `pending` no longer starts with the sealed batch.
    pub fn commit_mined(&mut self, block: Block) -> std::result::Result<Block, MiningError> {
        let sealed = block.get_transactions().len();
        if !self.pending.starts_with(block.get_transactions()) {
            warn!("Discarding mined block {}: pending changed", block.get_index());
            return Err(MiningError::Stale);
        }
        let claimed_hash = *block.get_hash();
        self.append(block.clone(), &claimed_hash)?;
        info!(
            "Mined block {} with {} transactions: {}",
            block.get_index(),
            sealed,
            block.get_hash_hex()
        );
        Ok(block)
    }

    // This is the only way a block gets into the chain. I check everything first,
    // so on any error the chain is exactly what it was before the call.
    // Once the block is in, whatever it sealed is no longer pending, whoever mined it.
    pub fn append(
        &mut self,
        block: Block,
        claimed_hash: &Hash,
    ) -> std::result::Result<(), AppendError> {
        let last_block = self.last_block();

        if block.get_previous_hash() != last_block.get_hash() {
            warn!(
                "Rejected block {}: previous hash does not match tip {}",
                block.get_index(),
                last_block.get_hash_hex()
            );
            return Err(AppendError::PreviousHashMismatch);
        }

        if claimed_hash != block.get_hash() || !block.is_self_consistent() {
            warn!("Rejected block {}: invalid proof", block.get_index());
            return Err(AppendError::ProofInvalid);
        }

        let expected = last_block.get_index() + 1;
        if block.get_index() != expected {
            warn!(
                "Rejected block: expected index {expected}, got {}",
                block.get_index()
            );
            return Err(AppendError::IndexMismatch {
                expected,
                actual: block.get_index(),
            });
        }

        info!("Appended block {}: {}", block.get_index(), block.get_hash_hex());
        self.pending.retain(|tx| !block.get_transactions().contains(tx));
        self.chain.push(block);
        Ok(())
    }

    /// Read-only diagnostic: linkage, stored hashes and every signature.
    pub fn check_integrity(&self) -> bool {
        for (i, block) in self.chain.iter().enumerate() {
            for tx in block.get_transactions() {
                if !tx.verify_signature() {
                    warn!("Signature does not match in block {i}: {tx}");
                    return false;
                }
            }
            if !block.is_self_consistent() {
                warn!("Stored hash of block {i} does not match its content");
                return false;
            }
            if i == 0 {
                continue;
            }
            let previous = &self.chain[i - 1];
            if block.get_previous_hash() != previous.get_hash()
                || block.get_index() != previous.get_index() + 1
            {
                warn!("Block {i} is not linked to block {}", i - 1);
                return false;
            }
        }
        true
    }

    /// Every genesis transaction is issued and signed by `issuer_public_key`.
    pub fn validate_initial_coins(&self, issuer_public_key: &[u8]) -> bool {
        self.chain[0].get_transactions().iter().all(|tx| {
            let valid = tx.get_sender() == issuer_public_key && tx.verify_signature();
            if !valid {
                warn!("Invalid issuance in genesis block: {tx}");
            }
            valid
        })
    }

    #[cfg(test)]
    pub(crate) fn blocks_mut(&mut self) -> &mut Vec<Block> {
        &mut self.chain
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testnet::create_test_ledger;
    use std::sync::atomic::Ordering;

    #[test]
    fn test_genesis_issuance() {
        let ledger = create_test_ledger(&["Kamil", "Piotr", "Zofia"]);
        let chain = &ledger.blockchain;

        assert_eq!(chain.get_blocks().len(), 1);
        assert_eq!(chain.height(), 0);
        assert_eq!(chain.check_balance(ledger.user(0).get_public_key()), BTreeSet::from([1]));
        assert_eq!(chain.check_balance(ledger.user(1).get_public_key()), BTreeSet::from([2]));
        assert_eq!(chain.check_balance(ledger.user(2).get_public_key()), BTreeSet::from([3]));
        assert!(chain.check_balance(ledger.issuer.get_public_key()).is_empty());
        assert!(chain.validate_initial_coins(ledger.issuer.get_public_key()));
        assert!(!chain.validate_initial_coins(ledger.user(0).get_public_key()));
        assert!(chain.check_integrity());
    }

    #[test]
    fn test_pending_transactions_count_for_ownership() {
        let mut ledger = create_test_ledger(&["a", "b", "c"]);
        let (a, b, c) = (ledger.user(0).clone(), ledger.user(1).clone(), ledger.user(2).clone());

        // b receives coin 1 in pending and may pass it on before any mining
        let tx = a.new_transfer(b.get_public_key(), 1).unwrap();
        ledger.blockchain.submit_transaction(tx).unwrap();
        let tx = b.new_transfer(c.get_public_key(), 1).unwrap();
        ledger.blockchain.submit_transaction(tx).unwrap();

        assert_eq!(ledger.blockchain.get_pending().len(), 2);
        assert_eq!(
            ledger.blockchain.check_balance(c.get_public_key()),
            BTreeSet::from([1, 3])
        );
        assert!(ledger.blockchain.check_balance(a.get_public_key()).is_empty());
    }

    #[test]
    fn test_rejected_transaction_leaves_pending_untouched() {
        let mut ledger = create_test_ledger(&["a", "b"]);
        let (a, b) = (ledger.user(0).clone(), ledger.user(1).clone());

        let signature = a.sign_transfer(b.get_public_key(), 2).unwrap();
        let result = ledger.blockchain.new_transaction(
            a.get_public_key(),
            b.get_public_key(),
            2,
            &signature,
        );
        assert_eq!(result, Err(ValidationError::CoinNotOwned));
        assert!(ledger.blockchain.get_pending().is_empty());
    }

    #[test]
    fn test_mine_without_pending() {
        let mut ledger = create_test_ledger(&["a"]);
        assert_eq!(ledger.blockchain.mine(1), Err(MiningError::NothingToMine));
        assert_eq!(ledger.blockchain.get_blocks().len(), 1);
    }

    #[test]
    fn test_mine_seals_pending_and_clears_buffer() {
        let mut ledger = create_test_ledger(&["a", "b"]);
        let (a, b) = (ledger.user(0).clone(), ledger.user(1).clone());
        let tx = a.new_transfer(b.get_public_key(), 1).unwrap();
        ledger.blockchain.submit_transaction(tx.clone()).unwrap();

        let block = ledger.blockchain.mine(2).unwrap();
        assert_eq!(block.get_index(), 1);
        assert_eq!(block.get_transactions(), &[tx]);
        assert!(block.get_hash_hex().starts_with("00"));
        assert_eq!(ledger.blockchain.last_block(), &block);
        assert!(ledger.blockchain.get_pending().is_empty());
        assert!(ledger.blockchain.check_integrity());
    }

    #[test]
    fn test_cancelled_mining_keeps_pending() {
        let mut ledger = create_test_ledger(&["a", "b"]);
        let (a, b) = (ledger.user(0).clone(), ledger.user(1).clone());
        let tx = a.new_transfer(b.get_public_key(), 1).unwrap();
        ledger.blockchain.submit_transaction(tx).unwrap();

        let cancel = AtomicBool::new(false);
        cancel.store(true, Ordering::Relaxed);
        let result = ledger.blockchain.mine_with(64, 2, &cancel);

        assert_eq!(result, Err(MiningError::Cancelled));
        assert_eq!(ledger.blockchain.get_pending().len(), 1);
        assert_eq!(ledger.blockchain.get_blocks().len(), 1);
    }

    #[test]
    fn test_commit_keeps_transactions_that_arrived_during_mining() {
        let mut ledger = create_test_ledger(&["a", "b", "c"]);
        let (a, b, c) = (ledger.user(0).clone(), ledger.user(1).clone(), ledger.user(2).clone());
        let first = a.new_transfer(b.get_public_key(), 1).unwrap();
        ledger.blockchain.submit_transaction(first).unwrap();

        let mut candidate = ledger.blockchain.prepare_candidate().unwrap();
        let late = c.new_transfer(a.get_public_key(), 3).unwrap();
        ledger.blockchain.submit_transaction(late.clone()).unwrap();

        let (nonce, hash) = ProofOfWork::new(&candidate, 1)
            .run(&AtomicBool::new(false))
            .unwrap()
            .unwrap();
        candidate.seal(nonce, hash);
        ledger.blockchain.commit_mined(candidate).unwrap();

        assert_eq!(ledger.blockchain.get_pending(), &[late]);
        assert_eq!(ledger.blockchain.height(), 1);
    }

    #[test]
    fn test_commit_stale_candidate_is_refused() {
        let mut ledger = create_test_ledger(&["a", "b"]);
        let (a, b) = (ledger.user(0).clone(), ledger.user(1).clone());
        let tx = a.new_transfer(b.get_public_key(), 1).unwrap();
        ledger.blockchain.submit_transaction(tx).unwrap();

        let candidate = ledger.blockchain.prepare_candidate().unwrap();
        ledger.blockchain.mine(1).unwrap();

        assert_eq!(
            ledger.blockchain.commit_mined(candidate),
            Err(MiningError::Stale)
        );
        assert_eq!(ledger.blockchain.height(), 1);
    }

    #[test]
    fn test_append_rejections_leave_chain_untouched() {
        let mut ledger = create_test_ledger(&["a", "b"]);
        let before = ledger.blockchain.get_blocks().to_vec();
        let tip = *ledger.blockchain.last_block().get_hash();
        let (a, b) = (ledger.user(0).clone(), ledger.user(1).clone());
        let txs = vec![a.new_transfer(b.get_public_key(), 1).unwrap()];

        let orphan = Block::new(1, txs.clone(), 1.0, [9u8; 32]).unwrap();
        assert_eq!(
            ledger.blockchain.append(orphan.clone(), orphan.get_hash()),
            Err(AppendError::PreviousHashMismatch)
        );

        let block = Block::new(1, txs.clone(), 1.0, tip).unwrap();
        assert_eq!(
            ledger.blockchain.append(block.clone(), &[0u8; 32]),
            Err(AppendError::ProofInvalid)
        );

        let mut tampered = block.clone();
        tampered.transactions_mut().clear();
        assert_eq!(
            ledger.blockchain.append(tampered, block.get_hash()),
            Err(AppendError::ProofInvalid)
        );

        let skipped = Block::new(5, txs, 1.0, tip).unwrap();
        assert_eq!(
            ledger.blockchain.append(skipped.clone(), skipped.get_hash()),
            Err(AppendError::IndexMismatch {
                expected: 1,
                actual: 5
            })
        );

        assert_eq!(ledger.blockchain.get_blocks(), before.as_slice());

        assert_eq!(ledger.blockchain.append(block.clone(), block.get_hash()), Ok(()));
        assert_eq!(ledger.blockchain.height(), 1);
    }

    #[test]
    fn test_append_from_another_miner_clears_sealed_pending() {
        let mut ledger = create_test_ledger(&["a", "b", "c"]);
        let (a, b, c) = (ledger.user(0).clone(), ledger.user(1).clone(), ledger.user(2).clone());
        let tx = a.new_transfer(b.get_public_key(), 1).unwrap();
        ledger.blockchain.submit_transaction(tx).unwrap();

        let mut replica = ledger.blockchain.clone();
        // Only the replica has seen this one, so it must stay pending there
        let local = c.new_transfer(a.get_public_key(), 3).unwrap();
        replica.submit_transaction(local.clone()).unwrap();

        let block = ledger.blockchain.mine(1).unwrap();
        assert_eq!(replica.append(block.clone(), block.get_hash()), Ok(()));
        assert_eq!(replica.get_pending(), &[local]);

        let next = replica.mine(1).unwrap();
        assert_eq!(next.get_transactions().len(), 1);
        assert!(replica.get_pending().is_empty());
        assert_eq!(replica.check_balance(b.get_public_key()), BTreeSet::from([1, 2]));
        assert!(replica.check_integrity());
    }

    #[test]
    fn test_tampered_transactions_break_integrity() {
        let mut ledger = create_test_ledger(&["a", "b"]);
        let (a, b) = (ledger.user(0).clone(), ledger.user(1).clone());
        let tx = a.new_transfer(b.get_public_key(), 1).unwrap();
        ledger.blockchain.submit_transaction(tx).unwrap();
        ledger.blockchain.mine(1).unwrap();
        assert!(ledger.blockchain.check_integrity());

        let mut removed = ledger.blockchain.clone();
        removed.blocks_mut()[1].transactions_mut().clear();
        assert!(!removed.check_integrity());

        let mut rewritten = ledger.blockchain.clone();
        rewritten.blocks_mut()[1].transactions_mut()[0].set_coin_id(2);
        assert!(!rewritten.check_integrity());

        let mut genesis_changed = ledger.blockchain.clone();
        let extra = b.new_transfer(a.get_public_key(), 2).unwrap();
        genesis_changed.blocks_mut()[0].transactions_mut().push(extra);
        assert!(!genesis_changed.check_integrity());
    }

    #[test]
    fn test_parallel_mining_appends_valid_block() {
        let mut ledger = create_test_ledger(&["a", "b"]);
        let (a, b) = (ledger.user(0).clone(), ledger.user(1).clone());
        let tx = a.new_transfer(b.get_public_key(), 1).unwrap();
        ledger.blockchain.submit_transaction(tx).unwrap();

        let block = ledger
            .blockchain
            .mine_with(2, 4, &AtomicBool::new(false))
            .unwrap();
        assert!(ProofOfWork::validate(&block, 2));
        assert!(ledger.blockchain.check_integrity());
    }
}
