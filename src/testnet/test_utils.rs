//! Test utilities for ledger testing

use crate::core::{Blockchain, Transaction};
use crate::wallet::Wallet;

/// A ledger whose genesis block issues coin `i + 1` to `users[i]`.
pub struct TestLedger {
    pub issuer: Wallet,
    pub users: Vec<Wallet>,
    pub blockchain: Blockchain,
}

impl TestLedger {
    pub fn user(&self, index: usize) -> &Wallet {
        &self.users[index]
    }
}

/// Create one wallet per name
pub fn create_test_wallets(names: &[&str]) -> Vec<Wallet> {
    names
        .iter()
        .map(|name| Wallet::new(name).expect("Wallet creation should work"))
        .collect()
}

/// Create a ledger with one initial coin per named user
pub fn create_test_ledger(names: &[&str]) -> TestLedger {
    let issuer = Wallet::new("BLOCKCHAIN").expect("Wallet creation should work");
    let users = create_test_wallets(names);
    let recipients: Vec<&[u8]> = users.iter().map(|w| w.get_public_key()).collect();
    let blockchain =
        Blockchain::with_initial_coins(&issuer, &recipients).expect("Genesis should build");
    TestLedger {
        issuer,
        users,
        blockchain,
    }
}

/// Signed transfer that has not been submitted anywhere
pub fn create_test_transfer(from: &Wallet, to: &Wallet, coin_id: u64) -> Transaction {
    from.new_transfer(to.get_public_key(), coin_id)
        .expect("Signing should work")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_test_ledger() {
        let ledger = create_test_ledger(&["a", "b", "c"]);
        assert_eq!(ledger.users.len(), 3);
        assert_eq!(ledger.blockchain.height(), 0);
        assert_eq!(ledger.blockchain.get_blocks()[0].get_transactions().len(), 3);
        assert!(ledger.blockchain.check_integrity());
    }

    #[test]
    fn test_create_test_wallets_are_unique() {
        let wallets = create_test_wallets(&["x", "y", "z"]);
        for i in 0..wallets.len() {
            for j in i + 1..wallets.len() {
                assert_ne!(wallets[i].get_public_key(), wallets[j].get_public_key());
            }
        }
    }

    #[test]
    fn test_create_test_transfer_is_signed() {
        let wallets = create_test_wallets(&["x", "y"]);
        let tx = create_test_transfer(&wallets[0], &wallets[1], 4);
        assert!(tx.verify_signature());
    }
}
