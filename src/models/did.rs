// src/models/did.rs
//! Decentralized Identifier (DID) value type.
//!
//! Identities in this system are always bound to an on-chain address using
//! the `did:pkh` method: `did:pkh:eip155:<chainId>:<address>`.

use ethers::types::Address;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A Decentralized Identifier.
///
/// Stored as the full DID string. Use [`Did::pkh`] to construct one from a
/// chain id and address, and [`Did::address`] to recover the bound address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Did(String);

impl Did {
    /// Wraps an existing DID string.
    pub fn new(did: impl Into<String>) -> Self {
        Did(did.into())
    }

    /// Builds a `did:pkh:eip155` DID binding a chain id and address.
    pub fn pkh(chain_id: u64, address: Address) -> Self {
        Did(format!("did:pkh:eip155:{}:{:#x}", chain_id, address))
    }

    /// The full DID string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when the DID string is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Extracts the on-chain address bound by a `did:pkh` DID.
    ///
    /// Returns `None` when the last DID segment is not a parseable address.
    pub fn address(&self) -> Option<Address> {
        self.0.rsplit(':').next()?.parse().ok()
    }
}

impl fmt::Display for Did {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Did {
    fn from(s: &str) -> Self {
        Did(s.to_string())
    }
}
