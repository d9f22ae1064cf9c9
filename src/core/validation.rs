//! Transaction validation
//!
//! Ownership is never cached. Every check replays the full history (all
//! sealed blocks from genesis, then the pending buffer) in order, so the
//! answer always follows from the log itself.

use crate::core::Transaction;
use crate::error::ValidationError;
use std::collections::BTreeSet;

/// Whether `owner` holds `coin_id` after replaying `history`.
///
/// Receiving the coin sets ownership, sending it clears it; the last event wins.
pub fn owns_coin<'a, I>(history: I, owner: &[u8], coin_id: u64) -> bool
where
    I: IntoIterator<Item = &'a Transaction>,
{
    let mut owns = false;
    for tx in history {
        if tx.get_coin_id() != coin_id {
            continue;
        }
        if tx.get_recipient() == owner {
            owns = true;
        }
        if tx.get_sender() == owner {
            owns = false;
        }
    }
    owns
}

/// Every coin `owner` holds after replaying `history`.
pub fn owned_coins<'a, I>(history: I, owner: &[u8]) -> BTreeSet<u64>
where
    I: IntoIterator<Item = &'a Transaction>,
{
    let mut coins = BTreeSet::new();
    for tx in history {
        if tx.get_recipient() == owner {
            coins.insert(tx.get_coin_id());
        }
        if tx.get_sender() == owner {
            coins.remove(&tx.get_coin_id());
        }
    }
    coins
}

/// Runs the admission checks in order; the first failure decides the error.
pub fn validate_transaction<'a, I>(history: I, tx: &Transaction) -> Result<(), ValidationError>
where
    I: IntoIterator<Item = &'a Transaction>,
{
    if tx.get_sender() == tx.get_recipient() {
        return Err(ValidationError::SelfTransfer);
    }
    if !tx.verify_signature() {
        return Err(ValidationError::BadSignature);
    }
    if !owns_coin(history, tx.get_sender(), tx.get_coin_id()) {
        return Err(ValidationError::CoinNotOwned);
    }
    Ok(())
}
