use ring::digest::{Context, SHA256};
use ring::rand::SystemRandom;
use ring::signature::{
    EcdsaKeyPair, KeyPair, UnparsedPublicKey, ECDSA_P256_SHA256_FIXED,
    ECDSA_P256_SHA256_FIXED_SIGNING,
};
use ripemd::{Digest as RipemdDigest, Ripemd160};

use crate::error::{BlockchainError, Result};
use std::time::{SystemTime, UNIX_EPOCH};

/// 256-bit digest used for block hashes
pub type Hash = [u8; 32];

/// Seconds since the Unix epoch, with sub-second precision
pub fn current_timestamp() -> Result<f64> {
    let duration = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| BlockchainError::Clock(e.to_string()))?;
    Ok(duration.as_secs_f64())
}

pub fn sha256_digest(data: &[u8]) -> Hash {
    let mut context = Context::new(&SHA256);
    context.update(data);
    let digest = context.finish();
    let mut hash = [0u8; 32];
    hash.copy_from_slice(digest.as_ref());
    hash
}

pub fn ripemd160_digest(data: &[u8]) -> Vec<u8> {
    let mut hasher = Ripemd160::new();
    hasher.update(data);
    hasher.finalize().to_vec()
}

pub fn base58_encode(data: &[u8]) -> String {
    bs58::encode(data).into_string()
}

/// Generates a fresh P-256 key pair.
///
/// Returns `(public_key, private_key)` where the public key is the 65-byte
/// uncompressed point and the private key is a PKCS#8 document.
pub fn new_key_pair() -> Result<(Vec<u8>, Vec<u8>)> {
    let rng = SystemRandom::new();
    let pkcs8 = EcdsaKeyPair::generate_pkcs8(&ECDSA_P256_SHA256_FIXED_SIGNING, &rng)
        .map_err(|e| BlockchainError::Crypto(format!("Failed to generate ECDSA key pair: {e}")))?
        .as_ref()
        .to_vec();
    let public_key = public_key_from_pkcs8(&pkcs8)?;
    Ok((public_key, pkcs8))
}

pub fn public_key_from_pkcs8(pkcs8: &[u8]) -> Result<Vec<u8>> {
    let rng = SystemRandom::new();
    let key_pair = EcdsaKeyPair::from_pkcs8(&ECDSA_P256_SHA256_FIXED_SIGNING, pkcs8, &rng)
        .map_err(|e| {
            BlockchainError::Crypto(format!("Failed to create key pair from PKCS8: {e}"))
        })?;
    Ok(key_pair.public_key().as_ref().to_vec())
}

pub fn ecdsa_p256_sha256_sign(pkcs8: &[u8], message: &[u8]) -> Result<Vec<u8>> {
    let rng = SystemRandom::new();
    let key_pair = EcdsaKeyPair::from_pkcs8(&ECDSA_P256_SHA256_FIXED_SIGNING, pkcs8, &rng)
        .map_err(|e| {
            BlockchainError::Crypto(format!("Failed to create key pair from PKCS8: {e}"))
        })?;
    let signature = key_pair
        .sign(&rng, message)
        .map_err(|e| BlockchainError::Crypto(format!("Failed to sign message: {e}")))?
        .as_ref()
        .to_vec();
    Ok(signature)
}

/// Malformed keys or signatures verify as `false`, same as a mismatch.
pub fn ecdsa_p256_sha256_verify(public_key: &[u8], signature: &[u8], message: &[u8]) -> bool {
    let peer_public_key = UnparsedPublicKey::new(&ECDSA_P256_SHA256_FIXED, public_key);
    peer_public_key.verify(message, signature).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_is_deterministic() {
        assert_eq!(sha256_digest(b"simplecoin"), sha256_digest(b"simplecoin"));
        assert_ne!(sha256_digest(b"simplecoin"), sha256_digest(b"simplecoin!"));
    }

    #[test]
    fn test_sha256_known_vector() {
        let hash = sha256_digest(b"abc");
        assert_eq!(
            data_encoding::HEXLOWER.encode(&hash),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_key_pairs_are_unique() {
        let (pk1, sk1) = new_key_pair().unwrap();
        let (pk2, sk2) = new_key_pair().unwrap();
        assert_ne!(pk1, pk2);
        assert_ne!(sk1, sk2);
        assert_eq!(pk1.len(), 65);
        assert_eq!(public_key_from_pkcs8(&sk1).unwrap(), pk1);
    }

    #[test]
    fn test_sign_and_verify() {
        let (public_key, pkcs8) = new_key_pair().unwrap();
        let signature = ecdsa_p256_sha256_sign(&pkcs8, b"coin 1").unwrap();

        assert!(ecdsa_p256_sha256_verify(&public_key, &signature, b"coin 1"));
        assert!(!ecdsa_p256_sha256_verify(&public_key, &signature, b"coin 2"));
    }

    #[test]
    fn test_verify_with_wrong_key_fails() {
        let (_, pkcs8) = new_key_pair().unwrap();
        let (other_public_key, _) = new_key_pair().unwrap();
        let signature = ecdsa_p256_sha256_sign(&pkcs8, b"message").unwrap();

        assert!(!ecdsa_p256_sha256_verify(&other_public_key, &signature, b"message"));
    }

    #[test]
    fn test_verify_malformed_input_returns_false() {
        let (public_key, pkcs8) = new_key_pair().unwrap();
        let signature = ecdsa_p256_sha256_sign(&pkcs8, b"message").unwrap();

        assert!(!ecdsa_p256_sha256_verify(&public_key, &[], b"message"));
        assert!(!ecdsa_p256_sha256_verify(&public_key, &signature[1..], b"message"));
        assert!(!ecdsa_p256_sha256_verify(&[0xFF; 12], &signature, b"message"));
        assert!(!ecdsa_p256_sha256_verify(&[], &[], b""));
    }

    #[test]
    fn test_sign_with_invalid_pkcs8_fails() {
        let result = ecdsa_p256_sha256_sign(&[1, 2, 3], b"message");
        assert!(matches!(result, Err(BlockchainError::Crypto(_))));
    }

    #[test]
    fn test_current_timestamp_is_positive() {
        assert!(current_timestamp().unwrap() > 0.0);
    }
}
