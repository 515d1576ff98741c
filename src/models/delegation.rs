// src/models/delegation.rs
//! Delegation chains: signed capability grants from a root authority down
//! to an executing account.
//!
//! A chain is created once when a subordinate account is first granted
//! capability and is immutable afterwards. Revocation is modeled as an
//! attestation deletion, never as mutation of a link. Redemption encodes the
//! whole chain into a single permission context consumed by the on-chain
//! delegation manager.

use crate::error::{Error, Result};
use ethers::abi::{self, Token};
use ethers::types::{Address, Bytes};
use serde::{Deserialize, Serialize};

/// Execution mode for redeeming a single delegation chain.
pub const SINGLE_DEFAULT_MODE: [u8; 32] = [0u8; 32];

/// A restriction attached to a delegation link, enforced on-chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caveat {
    /// Contract that enforces the restriction.
    pub enforcer: Address,
    /// Enforcer-specific terms.
    pub terms: Bytes,
}

/// One signed grant of authority from `delegator` to `delegate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelegationLink {
    /// Account granting capability.
    pub delegator: Address,
    /// Account receiving capability.
    pub delegate: Address,
    /// Restrictions on the grant.
    pub caveats: Vec<Caveat>,
    /// Delegator signature over the link.
    pub signature: Bytes,
}

/// An ordered sequence of delegation links from a root authority down to
/// the account that will execute on its behalf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelegationChain {
    links: Vec<DelegationLink>,
}

impl DelegationChain {
    /// Builds a chain from ordered links (root grant first).
    pub fn new(links: Vec<DelegationLink>) -> Self {
        DelegationChain { links }
    }

    /// The links in root-first order.
    pub fn links(&self) -> &[DelegationLink] {
        &self.links
    }

    /// Number of links in the chain.
    pub fn len(&self) -> usize {
        self.links.len()
    }

    /// True for a chain with no links.
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// The root authority the chain relies on, when non-empty.
    pub fn root(&self) -> Option<Address> {
        self.links.first().map(|l| l.delegator)
    }

    /// The account at the end of the chain, when non-empty.
    pub fn executor(&self) -> Option<Address> {
        self.links.last().map(|l| l.delegate)
    }

    /// Validates the chain against the root authority being relied upon.
    ///
    /// Checks that the chain is non-empty, that the first delegator is
    /// `root`, and that consecutive links actually chain
    /// (`links[i].delegate == links[i + 1].delegator`). Chains constructed
    /// with gaps are rejected rather than trusted.
    pub fn validate(&self, root: Address) -> Result<()> {
        let first = self.links.first().ok_or_else(|| {
            Error::InvalidDelegationChain("chain has no links".to_string())
        })?;
        if first.delegator != root {
            return Err(Error::InvalidDelegationChain(format!(
                "chain root {:?} does not match authority {:?}",
                first.delegator, root
            )));
        }
        for (i, pair) in self.links.windows(2).enumerate() {
            if pair[0].delegate != pair[1].delegator {
                return Err(Error::InvalidDelegationChain(format!(
                    "link {} delegate {:?} does not match link {} delegator {:?}",
                    i,
                    pair[0].delegate,
                    i + 1,
                    pair[1].delegator
                )));
            }
        }
        Ok(())
    }

    /// ABI-encodes the chain into a single permission context for the
    /// delegation manager's redeem call.
    pub fn encode_permission_context(&self) -> Bytes {
        let links = self
            .links
            .iter()
            .map(|link| {
                let caveats = link
                    .caveats
                    .iter()
                    .map(|c| {
                        Token::Tuple(vec![
                            Token::Address(c.enforcer),
                            Token::Bytes(c.terms.to_vec()),
                        ])
                    })
                    .collect();
                Token::Tuple(vec![
                    Token::Address(link.delegator),
                    Token::Address(link.delegate),
                    Token::Array(caveats),
                    Token::Bytes(link.signature.to_vec()),
                ])
            })
            .collect();
        Bytes::from(abi::encode(&[Token::Array(links)]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(n: u8) -> Address {
        Address::from_low_u64_be(n as u64)
    }

    fn link(delegator: Address, delegate: Address) -> DelegationLink {
        DelegationLink {
            delegator,
            delegate,
            caveats: vec![],
            signature: Bytes::from(vec![1, 2, 3]),
        }
    }

    #[test]
    fn test_validate_accepts_contiguous_chain() {
        let chain = DelegationChain::new(vec![
            link(addr(1), addr(2)),
            link(addr(2), addr(3)),
        ]);
        assert!(chain.validate(addr(1)).is_ok());
        assert_eq!(chain.root(), Some(addr(1)));
        assert_eq!(chain.executor(), Some(addr(3)));
    }

    #[test]
    fn test_validate_rejects_wrong_root() {
        let chain = DelegationChain::new(vec![link(addr(1), addr(2))]);
        assert!(matches!(
            chain.validate(addr(9)),
            Err(Error::InvalidDelegationChain(_))
        ));
    }

    #[test]
    fn test_validate_rejects_broken_continuity() {
        let chain = DelegationChain::new(vec![
            link(addr(1), addr(2)),
            link(addr(5), addr(3)),
        ]);
        assert!(matches!(
            chain.validate(addr(1)),
            Err(Error::InvalidDelegationChain(_))
        ));
    }

    #[test]
    fn test_validate_rejects_empty_chain() {
        let chain = DelegationChain::new(vec![]);
        assert!(chain.validate(addr(1)).is_err());
    }

    #[test]
    fn test_permission_context_is_nonempty_and_deterministic() {
        let chain = DelegationChain::new(vec![link(addr(1), addr(2))]);
        let a = chain.encode_permission_context();
        let b = chain.encode_permission_context();
        assert!(!a.is_empty());
        assert_eq!(a, b);
    }
}
