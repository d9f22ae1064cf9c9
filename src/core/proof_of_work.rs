use crate::core::Block;
use crate::error::{BlockchainError, MiningError, Result};
use crate::utils::Hash;
use log::{debug, info, warn};
use num_bigint::BigUint;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::thread;

// Each hex character of the digest carries 4 bits
const BITS_PER_DIFFICULTY: u32 = 4;
// 64 hex characters in a SHA-256 digest
pub const MAX_DIFFICULTY: u32 = 64;

/// Brute-force nonce search over a read-only candidate block.
///
/// A hash satisfies `difficulty` when its first `difficulty` hex characters
/// are `'0'`, i.e. when it is numerically below `2^(256 - 4 * difficulty)`.
pub struct ProofOfWork<'a> {
    block: &'a Block,
    target: BigUint,
    difficulty: u32,
}

impl<'a> ProofOfWork<'a> {
    pub fn new(block: &'a Block, difficulty: u32) -> ProofOfWork<'a> {
        let difficulty = difficulty.min(MAX_DIFFICULTY);
        ProofOfWork {
            block,
            target: Self::target_for(difficulty),
            difficulty,
        }
    }

    pub fn target_for(difficulty: u32) -> BigUint {
        let difficulty = difficulty.min(MAX_DIFFICULTY);
        BigUint::from(1u32) << (256 - BITS_PER_DIFFICULTY * difficulty) as usize
    }

    pub fn meets_target(hash: &Hash, difficulty: u32) -> bool {
        BigUint::from_bytes_be(hash) < Self::target_for(difficulty)
    }

    /// Stored hash is consistent with the content and meets the target.
    pub fn validate(block: &Block, difficulty: u32) -> bool {
        block.is_self_consistent() && Self::meets_target(block.get_hash(), difficulty)
    }

    pub fn get_difficulty(&self) -> u32 {
        self.difficulty
    }

    fn is_valid(&self, hash: &Hash) -> bool {
        BigUint::from_bytes_be(hash) < self.target
    }

    /// Single-worker search from nonce 0 upward.
    ///
    /// Returns `Ok(None)` if `cancel` is raised before a nonce is found and
    /// `MiningError::NonceSpaceExhausted` if every nonce misses the target.
    pub fn run(&self, cancel: &AtomicBool) -> Result<Option<(u64, Hash)>> {
        info!(
            "Mining block {} (difficulty: {})",
            self.block.get_index(),
            self.difficulty
        );
        let found = match self.search(0, 1, cancel) {
            Err(BlockchainError::Mining(MiningError::NonceSpaceExhausted)) => {
                warn!("Nonce space exhausted for block {}", self.block.get_index());
                return Err(MiningError::NonceSpaceExhausted.into());
            }
            other => other?,
        };
        self.log_outcome(&found);
        Ok(found)
    }

    /// Searches with `workers` threads, worker `w` trying nonces
    /// `w, w + workers, w + 2 * workers, ...`.
    ///
    /// Workers report through one channel; the first report wins and raises
    /// a shared stop flag for the rest. Returns `Ok(None)` if `cancel` is
    /// raised before any worker finds a nonce.
    pub fn run_parallel(&self, workers: usize, cancel: &AtomicBool) -> Result<Option<(u64, Hash)>> {
        if workers <= 1 {
            return self.run(cancel);
        }
        info!(
            "Mining block {} with {workers} workers (difficulty: {})",
            self.block.get_index(),
            self.difficulty
        );

        let stop = AtomicBool::new(false);
        let (sender, receiver) = mpsc::channel::<Result<(u64, Hash)>>();

        let found = thread::scope(|scope| {
            for worker in 0..workers {
                let sender = sender.clone();
                let stop = &stop;
                scope.spawn(move || {
                    let flags = [cancel, stop];
                    match self.search_until(worker as u64, workers as u64, &flags) {
                        Ok(Some(result)) => {
                            let _ = sender.send(Ok(result));
                        }
                        Ok(None) | Err(BlockchainError::Mining(MiningError::NonceSpaceExhausted)) => {}
                        Err(e) => {
                            let _ = sender.send(Err(e));
                        }
                    }
                });
            }
            drop(sender);

            // Every worker either reports, exits on a flag or runs out of nonces,
            // so recv returns once all senders are dropped.
            let first = receiver.recv().ok();
            stop.store(true, Ordering::Relaxed);
            first
        });

        let found = match found {
            Some(result) => Some(result?),
            // All workers left without a report: either cancelled or out of nonces
            None if cancel.load(Ordering::Relaxed) => None,
            None => {
                warn!("Nonce space exhausted for block {}", self.block.get_index());
                return Err(MiningError::NonceSpaceExhausted.into());
            }
        };
        self.log_outcome(&found);
        Ok(found)
    }

    fn search(&self, start: u64, step: u64, cancel: &AtomicBool) -> Result<Option<(u64, Hash)>> {
        self.search_until(start, step, &[cancel])
    }

    fn search_until(
        &self,
        start: u64,
        step: u64,
        flags: &[&AtomicBool],
    ) -> Result<Option<(u64, Hash)>> {
        let mut nonce = start;
        loop {
            if flags.iter().any(|flag| flag.load(Ordering::Relaxed)) {
                return Ok(None);
            }
            let hash = self.block.hash_with_nonce(nonce)?;
            if self.is_valid(&hash) {
                return Ok(Some((nonce, hash)));
            }
            nonce = match nonce.checked_add(step) {
                Some(next) => next,
                None => return Err(MiningError::NonceSpaceExhausted.into()),
            };
        }
    }

    fn log_outcome(&self, found: &Option<(u64, Hash)>) {
        match found {
            Some((nonce, hash)) => debug!(
                "Found nonce {nonce} for block {}: {}",
                self.block.get_index(),
                data_encoding::HEXLOWER.encode(hash)
            ),
            None => info!("Mining of block {} stopped", self.block.get_index()),
        }
    }
}
