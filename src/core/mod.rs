//! Core ledger functionality
//!
//! Blocks, transactions, the proof-of-work search, the ledger with its
//! append and integrity rules, and the ownership replay that guards every
//! transfer.

pub mod block;
pub mod blockchain;
pub mod proof_of_work;
pub mod shared;
pub mod transaction;
pub mod validation;

pub use block::{Block, GENESIS_PREVIOUS_HASH};
pub use blockchain::Blockchain;
pub use proof_of_work::{ProofOfWork, MAX_DIFFICULTY};
pub use shared::SharedBlockchain;
pub use transaction::{short_key, Transaction};
pub use validation::{owned_coins, owns_coin};
