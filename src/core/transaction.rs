// A transaction moves one whole coin, identified by its id, from one public key
// to another. Ownership is never stored; it is replayed from history by the
// validator, so the transaction itself only carries who, to whom, which coin
// and the sender's signature over those three fields.

use crate::error::Result;
use crate::utils::{ecdsa_p256_sha256_verify, serialize};
use data_encoding::HEXLOWER;
use std::fmt;

// The signed part of a transaction, fields in sorted-key order
#[derive(bincode::Encode)]
struct TransferPayload<'a> {
    coin_id: u64,
    recipient: &'a [u8],
    sender: &'a [u8],
}

#[derive(Debug, Clone, PartialEq, Eq, bincode::Encode)]
pub struct Transaction {
    sender: Vec<u8>,    // Public key of the current holder
    recipient: Vec<u8>, // Public key of the new holder
    coin_id: u64,       // The coin being moved
    signature: Vec<u8>, // Sender's signature over the payload
}

impl Transaction {
    pub fn new(sender: &[u8], recipient: &[u8], coin_id: u64, signature: &[u8]) -> Transaction {
        Transaction {
            sender: sender.to_vec(),
            recipient: recipient.to_vec(),
            coin_id,
            signature: signature.to_vec(),
        }
    }

    /// Canonical bytes the sender signs: `{sender, recipient, coin_id}` without the signature.
    pub fn signing_bytes(sender: &[u8], recipient: &[u8], coin_id: u64) -> Result<Vec<u8>> {
        serialize(&TransferPayload {
            coin_id,
            recipient,
            sender,
        })
    }

    pub fn get_sender(&self) -> &[u8] {
        self.sender.as_slice()
    }

    pub fn get_recipient(&self) -> &[u8] {
        self.recipient.as_slice()
    }

    pub fn get_coin_id(&self) -> u64 {
        self.coin_id
    }

    pub fn get_signature(&self) -> &[u8] {
        self.signature.as_slice()
    }

    /// Checks the signature against the sender's public key.
    /// An encoding failure counts as a bad signature.
    pub fn verify_signature(&self) -> bool {
        match Self::signing_bytes(&self.sender, &self.recipient, self.coin_id) {
            Ok(message) => ecdsa_p256_sha256_verify(&self.sender, &self.signature, &message),
            Err(_) => false,
        }
    }

    #[cfg(test)]
    pub(crate) fn set_coin_id(&mut self, coin_id: u64) {
        self.coin_id = coin_id;
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "coin {} from {} to {}",
            self.coin_id,
            short_key(&self.sender),
            short_key(&self.recipient)
        )
    }
}

/// First eight hex characters of a key, for log lines
pub fn short_key(key: &[u8]) -> String {
    let hex = HEXLOWER.encode(key);
    hex.chars().take(8).collect()
}
