//! Wallets and key management
//!
//! A wallet is owned by whoever creates it. It holds the private key and
//! signs transfers; the ledger only ever receives public keys.

#[allow(clippy::module_inception)]
pub mod wallet;

pub use wallet::{hash_pub_key, Wallet, ADDRESS_CHECK_SUM_LEN};
