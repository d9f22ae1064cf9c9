use crate::core::{Block, Blockchain, ProofOfWork, Transaction};
use crate::error::{AppendError, MiningError, ValidationError};
use crate::utils::Hash;
use log::info;
use std::collections::BTreeSet;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Cloneable handle to one ledger shared between threads.
///
/// Every operation runs atomically with respect to the others. Mining is the
/// exception on purpose: the candidate is prepared under the lock, the nonce
/// search runs without it, and the result is committed under the lock again,
/// so a long search never blocks readers or transaction submission.
#[derive(Clone)]
pub struct SharedBlockchain {
    inner: Arc<RwLock<Blockchain>>,
}

impl SharedBlockchain {
    pub fn new(blockchain: Blockchain) -> SharedBlockchain {
        SharedBlockchain {
            inner: Arc::new(RwLock::new(blockchain)),
        }
    }

    // Each mutation validates before it mutates, so a poisoned lock still
    // guards a consistent ledger.
    fn read(&self) -> RwLockReadGuard<'_, Blockchain> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Blockchain> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn new_transaction(
        &self,
        sender: &[u8],
        recipient: &[u8],
        coin_id: u64,
        signature: &[u8],
    ) -> Result<Transaction, ValidationError> {
        self.write()
            .new_transaction(sender, recipient, coin_id, signature)
    }

    pub fn submit_transaction(&self, tx: Transaction) -> Result<(), ValidationError> {
        self.write().submit_transaction(tx)
    }

    pub fn append(&self, block: Block, claimed_hash: &Hash) -> Result<(), AppendError> {
        self.write().append(block, claimed_hash)
    }

    /// Mines the pending buffer without holding the lock during the search.
    ///
    /// A raised `cancel` flag returns `Cancelled` and leaves `pending` as is.
    /// If another miner commits first the result is `Stale` or `Rejected`.
    pub fn mine(
        &self,
        difficulty: u32,
        workers: usize,
        cancel: &AtomicBool,
    ) -> Result<Block, MiningError> {
        let mut candidate = self.read().prepare_candidate()?;

        let (nonce, hash) = ProofOfWork::new(&candidate, difficulty)
            .run_parallel(workers, cancel)?
            .ok_or_else(|| {
                info!("Mining of block {} cancelled", candidate.get_index());
                MiningError::Cancelled
            })?;
        candidate.seal(nonce, hash);

        self.write().commit_mined(candidate)
    }

    pub fn check_integrity(&self) -> bool {
        self.read().check_integrity()
    }

    pub fn check_balance(&self, public_key: &[u8]) -> BTreeSet<u64> {
        self.read().check_balance(public_key)
    }

    pub fn height(&self) -> u64 {
        self.read().height()
    }

    pub fn pending_len(&self) -> usize {
        self.read().get_pending().len()
    }

    /// Copy of the current ledger state
    pub fn snapshot(&self) -> Blockchain {
        self.read().clone()
    }
}
