use crate::core::Transaction;
use crate::error::Result;
use crate::utils::{
    base58_encode, ecdsa_p256_sha256_sign, new_key_pair, ripemd160_digest, sha256_digest,
};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

const VERSION: u8 = 0x00;
pub const ADDRESS_CHECK_SUM_LEN: usize = 4;

/// A key holder. The ledger never sees a wallet, only its public key and the
/// signatures it produces.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Wallet {
    #[zeroize(skip)]
    name: String,
    pkcs8: Vec<u8>,
    #[zeroize(skip)]
    public_key: Vec<u8>,
}

impl Wallet {
    pub fn new(name: &str) -> Result<Wallet> {
        let (public_key, pkcs8) = new_key_pair()?;
        Ok(Wallet {
            name: name.to_string(),
            pkcs8,
            public_key,
        })
    }

    pub fn get_name(&self) -> &str {
        self.name.as_str()
    }

    pub fn get_public_key(&self) -> &[u8] {
        self.public_key.as_slice()
    }

    pub fn get_address(&self) -> String {
        let pub_key_hash = hash_pub_key(self.public_key.as_slice());
        let mut payload: Vec<u8> = vec![];
        payload.push(VERSION);
        payload.extend(pub_key_hash.as_slice());
        let checksum = checksum(payload.as_slice());
        payload.extend(checksum.as_slice());
        // version + pub_key_hash + checksum
        base58_encode(payload.as_slice())
    }

    pub fn sign(&self, message: &[u8]) -> Result<Vec<u8>> {
        ecdsa_p256_sha256_sign(self.pkcs8.as_slice(), message)
    }

    /// Signs the transfer of `coin_id` from this wallet to `recipient`.
    pub fn sign_transfer(&self, recipient: &[u8], coin_id: u64) -> Result<Vec<u8>> {
        let message = Transaction::signing_bytes(&self.public_key, recipient, coin_id)?;
        self.sign(&message)
    }

    pub fn new_transfer(&self, recipient: &[u8], coin_id: u64) -> Result<Transaction> {
        let signature = self.sign_transfer(recipient, coin_id)?;
        Ok(Transaction::new(
            &self.public_key,
            recipient,
            coin_id,
            &signature,
        ))
    }
}

impl fmt::Debug for Wallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wallet")
            .field("name", &self.name)
            .field("address", &self.get_address())
            .finish_non_exhaustive()
    }
}

pub fn hash_pub_key(pub_key: &[u8]) -> Vec<u8> {
    let pub_key_sha256 = sha256_digest(pub_key);
    ripemd160_digest(pub_key_sha256.as_slice())
}

fn checksum(payload: &[u8]) -> Vec<u8> {
    let first_sha = sha256_digest(payload);
    let second_sha = sha256_digest(first_sha.as_slice());
    second_sha[0..ADDRESS_CHECK_SUM_LEN].to_vec()
}
