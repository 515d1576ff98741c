// src/models/account.rs
//! Smart account data model.
//!
//! A smart account is derived deterministically from an owner address, an
//! implementation kind and a deploy salt. The same triple always yields the
//! same counterfactual address whether or not the account is deployed.

use ethers::types::{Address, U256};
use serde::{Deserialize, Serialize};

/// Implementation kind of a smart account.
///
/// The kind drives both the address derivation (each kind has its own tag)
/// and the salt discovery strategy used by the provisioner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountKind {
    /// Personal account of an individual.
    Individual,
    /// Root-owned organization account.
    Organization,
    /// Account operated by an agent bound to a DNS domain.
    Agent {
        /// Domain the agent is registered under; salted by its keccak hash.
        domain: String,
    },
}

impl AccountKind {
    /// One-byte tag mixed into the address derivation for domain
    /// separation between kinds.
    pub fn tag(&self) -> u8 {
        match self {
            AccountKind::Individual => 0x01,
            AccountKind::Organization => 0x02,
            AccountKind::Agent { .. } => 0x03,
        }
    }
}

/// A counterfactual smart account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmartAccount {
    /// Externally-owned account controlling this smart account.
    pub owner: Address,
    /// Implementation kind used during derivation.
    pub kind: AccountKind,
    /// Salt the address was derived with.
    pub salt: U256,
    /// Deterministic counterfactual address.
    pub address: Address,
}
