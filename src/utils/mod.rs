//! Utility functions and helpers
//!
//! Hashing, signing, the canonical encoding and the clock used by the ledger.

pub mod crypto;
pub mod serialization;

pub use crypto::{
    base58_encode, current_timestamp, ecdsa_p256_sha256_sign, ecdsa_p256_sha256_verify,
    new_key_pair, public_key_from_pkcs8, ripemd160_digest, sha256_digest, Hash,
};

pub use serialization::serialize;
