// src/utils/crypto.rs
//! Cryptographic utilities optimized for blockchain compatibility.
//!
//! Uses Keccak-256 (Ethereum's standard hash function) for all hashing, and
//! reduces hashes into the BN254 scalar field so they can be used directly
//! as public signals of the external proving system.

use ethers::utils::keccak256;
use num_bigint::BigUint;
use once_cell::sync::Lazy;

/// Order of the BN254 scalar field used by the proving system.
///
/// All DID and credential hashes are reduced modulo this value before being
/// handed to the prover or used as public signals.
pub static SCALAR_FIELD: Lazy<BigUint> = Lazy::new(|| {
    BigUint::parse_bytes(
        b"21888242871839275222246405745257275088548364400416034343698204186575808495617",
        10,
    )
    .expect("field order constant is valid decimal")
});

/// Computes a Keccak-256 hash of the input data (Ethereum-compatible).
///
/// # Arguments
/// * `data` - Binary data to hash (as bytes slice)
///
/// # Returns
/// Fixed-size 32-byte array (`[u8; 32]`) containing the hash.
pub fn hash_data(data: &[u8]) -> [u8; 32] {
    keccak256(data)
}

/// Hashes a string into the proving system's scalar field.
///
/// The string is encoded as UTF-8, hashed with Keccak-256, the digest is
/// interpreted as a big-endian integer and reduced modulo [`SCALAR_FIELD`].
///
/// # Arguments
/// * `input` - The string to hash (DID, canonical credential JSON, ...)
///
/// # Returns
/// The reduced hash as a [`BigUint`], always `< SCALAR_FIELD`.
pub fn hash_to_field(input: &str) -> BigUint {
    BigUint::from_bytes_be(&keccak256(input.as_bytes())) % &*SCALAR_FIELD
}

/// Like [`hash_to_field`] but returns the decimal string representation
/// expected by the proving service API.
///
/// # Arguments
/// * `input` - The string to hash
///
/// # Returns
/// The field element as a base-10 string.
pub fn hash_to_field_dec(input: &str) -> String {
    hash_to_field(input).to_str_radix(10)
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_bigint::BigUint;

    #[test]
    fn test_hash_to_field_is_deterministic() {
        let a = hash_to_field("did:pkh:eip155:11155111:0xabc");
        let b = hash_to_field("did:pkh:eip155:11155111:0xabc");
        assert_eq!(a, b);
    }

    #[test]
    fn test_hash_to_field_distinct_inputs() {
        let issuer = hash_to_field("did:pkh:eip155:11155111:0xdef");
        let subject = hash_to_field("did:pkh:eip155:11155111:0xabc");
        let claim = hash_to_field(r#"{"name":"Acme Inc."}"#);

        assert_ne!(issuer, subject);
        assert_ne!(issuer, claim);
        assert_ne!(subject, claim);
    }

    #[test]
    fn test_hash_to_field_nonzero_and_in_field() {
        let h = hash_to_field("organization");
        assert_ne!(h, BigUint::from(0u8));
        assert!(h < *SCALAR_FIELD);
    }

    #[test]
    fn test_decimal_form_round_trips() {
        let h = hash_to_field("example.com");
        let dec = hash_to_field_dec("example.com");
        assert_eq!(BigUint::parse_bytes(dec.as_bytes(), 10).unwrap(), h);
    }
}
