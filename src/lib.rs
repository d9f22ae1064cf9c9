//! # SimpleCoin - A Minimal Proof-of-Work Coin Ledger
//!
//! A single-process ledger where every coin is a numbered, indivisible unit.
//! Blocks are hash-linked and sealed by proof-of-work, transfers are signed
//! with ECDSA, and ownership is always replayed from the full history.
//!
//! ## How the Code Is Organized
//! - `core/`: blocks, transactions, mining, the ledger and its validation rules
//! - `wallet/`: key holders that sign transfers (owned by users, not the ledger)
//! - `network/`: relaying transfers between peer ledgers
//! - `config/`: difficulty, worker count and logging settings
//! - `utils/`: hashing, signing, canonical encoding and the clock
//! - `error/`: error enums returned by every ledger operation
//! - `cli/`: command-line parsing for the demo binary
//!
//! ## Flow of a Transfer
//! 1. A wallet signs `{sender, recipient, coin_id}`
//! 2. `Blockchain::new_transaction` checks the signature and replays history
//!    to confirm the sender holds the coin, then buffers it as pending
//! 3. `Blockchain::mine` seals the pending buffer into a block, searches for a
//!    nonce and appends the block through `Blockchain::append`
//!
//! Use `SharedBlockchain` when several threads work on one ledger.

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod network;
pub mod utils;
pub mod wallet;

#[cfg(test)]
pub mod testnet;

// Re-export commonly used types for convenience
pub use cli::{Command, Opt};
pub use config::{Config, Settings, GLOBAL_CONFIG};
pub use core::{Block, Blockchain, ProofOfWork, SharedBlockchain, Transaction};
pub use error::{AppendError, BlockchainError, MiningError, Result, ValidationError};
pub use network::{relay_transaction, RelayOutcome};
pub use utils::{
    current_timestamp, ecdsa_p256_sha256_sign, ecdsa_p256_sha256_verify, new_key_pair,
    sha256_digest, Hash,
};
pub use wallet::Wallet;
