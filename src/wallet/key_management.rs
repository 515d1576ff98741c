// src/wallet/key_management.rs
//! Cryptographic key management for issuer accounts.
//!
//! Uses the secp256k1 curve (via the `k256` crate) with Keccak-256
//! prehashing, matching Ethereum signature conventions.

use crate::error::{Error, Result};
use crate::utils::crypto::hash_data;
use ethers::types::Address;
use ethers::utils::keccak256;
use k256::ecdsa::signature::hazmat::PrehashSigner;
use k256::ecdsa::{Signature, SigningKey};
use k256::elliptic_curve::sec1::ToEncodedPoint;
use k256::{PublicKey, SecretKey};

/// An account capable of signing messages.
///
/// Implemented by [`KeyManager`] for local keys; remote or hardware signers
/// can implement it as well.
pub trait MessageSigner {
    /// Signs a message.
    ///
    /// # Arguments
    /// * `message` - Raw message bytes; implementations hash before signing
    ///
    /// # Returns
    /// The signature in compact 64-byte ECDSA form.
    fn sign_message(&self, message: &[u8]) -> Result<Vec<u8>>;

    /// Ethereum address corresponding to the signing key.
    fn address(&self) -> Address;
}

/// Local secp256k1 key manager.
#[derive(Clone)]
pub struct KeyManager {
    secret_key: SecretKey,
    /// Derived public key for verification.
    pub public_key: PublicKey,
}

impl KeyManager {
    /// Generates a KeyManager with fresh cryptographic keys.
    ///
    /// # Returns
    /// New KeyManager instance containing:
    /// - Randomly generated secp256k1 private key
    /// - Derived public key
    pub fn new() -> Self {
        let secret_key = SecretKey::random(&mut rand::thread_rng());
        let public_key = secret_key.public_key();
        KeyManager {
            secret_key,
            public_key,
        }
    }

    /// Builds a KeyManager from an existing secret key.
    ///
    /// # Arguments
    /// * `secret_key` - The secp256k1 private key to manage
    ///
    /// # Returns
    /// KeyManager wrapping the key with its derived public key.
    pub fn from_secret_key(secret_key: SecretKey) -> Self {
        let public_key = secret_key.public_key();
        KeyManager {
            secret_key,
            public_key,
        }
    }
}

impl Default for KeyManager {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageSigner for KeyManager {
    fn sign_message(&self, message: &[u8]) -> Result<Vec<u8>> {
        let hash = hash_data(message);
        let signing_key = SigningKey::from(&self.secret_key);
        let signature: Signature = signing_key
            .sign_prehash(&hash)
            .map_err(|e| Error::Signing(e.to_string()))?;
        Ok(signature.to_vec())
    }

    fn address(&self) -> Address {
        // Ethereum address: keccak of the uncompressed point minus prefix
        // byte, last 20 bytes.
        let encoded = self.public_key.to_encoded_point(false);
        let digest = keccak256(&encoded.as_bytes()[1..]);
        Address::from_slice(&digest[12..])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_message_is_compact_and_deterministic() {
        let manager = KeyManager::new();
        let a = manager.sign_message(b"commitment-value").unwrap();
        let b = manager.sign_message(b"commitment-value").unwrap();

        // RFC 6979 deterministic ECDSA, 64-byte compact form.
        assert_eq!(a.len(), 64);
        assert_eq!(a, b);
    }

    #[test]
    fn test_address_is_stable() {
        let manager = KeyManager::new();
        assert_eq!(manager.address(), manager.address());
        assert_ne!(manager.address(), Address::zero());
    }
}
