// src/blockchain/provisioner.rs
//! Deterministic smart-account provisioning.
//!
//! Address derivation is a pure function of `(owner, kind, salt)`. Salt
//! candidates are generated per account kind and consumed sequentially by a
//! bounded discovery loop; later salts are only tried after earlier ones
//! fail so behavior stays deterministic across runs. Deployment is
//! triggered lazily through a no-op sponsored operation and is idempotent.

use crate::blockchain::bundler::{Bundler, Call};
use crate::blockchain::chain_client::ChainClient;
use crate::blockchain::executor::SponsoredExecutor;
use crate::error::{Error, Result};
use crate::models::account::{AccountKind, SmartAccount};
use ethers::types::{Address, U256};
use ethers::utils::keccak256;
use log::{debug, info, warn};
use std::future::Future;

/// Maximum number of salt candidates tried during discovery.
pub const MAX_SALT_CANDIDATES: usize = 5;

/// First salt tried for individual accounts.
const INDIVIDUAL_SALT_BASE: u64 = 100;
/// The single salt used for organization accounts.
const ORGANIZATION_SALT: u64 = 0;

/// Derives and deploys counterfactual smart accounts.
#[derive(Debug)]
pub struct SmartAccountProvisioner<C: ChainClient> {
    chain: C,
}

impl<C: ChainClient> SmartAccountProvisioner<C> {
    /// Creates a provisioner reading chain state through `chain`.
    pub fn new(chain: C) -> Self {
        SmartAccountProvisioner { chain }
    }

    /// Pure counterfactual derivation.
    ///
    /// The address is the last 20 bytes of
    /// `keccak(owner || kind tag || salt)`. The same triple always yields
    /// the same address, whether or not the account is deployed.
    pub fn derive(owner: Address, kind: &AccountKind, salt: U256) -> SmartAccount {
        let mut buf = Vec::with_capacity(20 + 1 + 32);
        buf.extend_from_slice(owner.as_bytes());
        buf.push(kind.tag());
        let mut salt_bytes = [0u8; 32];
        salt.to_big_endian(&mut salt_bytes);
        buf.extend_from_slice(&salt_bytes);
        let digest = keccak256(&buf);
        SmartAccount {
            owner,
            kind: kind.clone(),
            salt,
            address: Address::from_slice(&digest[12..]),
        }
    }

    /// Salt candidates for a kind, in the order they are tried.
    ///
    /// Individual accounts probe a window starting at a fixed base seed,
    /// organizations use a single fixed seed, and agents derive their one
    /// salt from the keccak hash of the lowercased domain.
    pub fn salt_candidates(kind: &AccountKind) -> Vec<U256> {
        match kind {
            AccountKind::Individual => (0..MAX_SALT_CANDIDATES as u64)
                .map(|i| U256::from(INDIVIDUAL_SALT_BASE + i))
                .collect(),
            AccountKind::Organization => vec![U256::from(ORGANIZATION_SALT)],
            AccountKind::Agent { domain } => {
                let digest = keccak256(domain.to_lowercase().as_bytes());
                vec![U256::from_big_endian(&digest)]
            }
        }
    }

    /// Sequential bounded discovery.
    ///
    /// Derives an account for each salt candidate and returns the first one
    /// the `is_valid` predicate accepts. Predicate failures are logged and
    /// treated as rejection; exhausting all candidates yields
    /// [`Error::NoValidAccount`].
    pub async fn find_account<F, Fut>(
        &self,
        owner: Address,
        kind: &AccountKind,
        mut is_valid: F,
    ) -> Result<SmartAccount>
    where
        F: FnMut(SmartAccount) -> Fut,
        Fut: Future<Output = Result<bool>>,
    {
        for salt in Self::salt_candidates(kind).into_iter().take(MAX_SALT_CANDIDATES) {
            let candidate = Self::derive(owner, kind, salt);
            match is_valid(candidate.clone()).await {
                Ok(true) => {
                    debug!("account discovery accepted salt {}", salt);
                    return Ok(candidate);
                }
                Ok(false) => continue,
                Err(e) => {
                    warn!("account validity check failed for salt {}: {}", salt, e);
                    continue;
                }
            }
        }
        Err(Error::NoValidAccount)
    }

    /// True when bytecode is present at the account address.
    pub async fn is_deployed(&self, account: &SmartAccount) -> Result<bool> {
        let code = self.chain.get_code(account.address).await?;
        Ok(!code.is_empty())
    }

    /// Deploys the account when it has no bytecode yet.
    ///
    /// Deployment is a no-op sponsored operation (zero-value call to the
    /// zero address) whose only purpose is to trigger the factory. Returns
    /// `true` when a deployment was performed, `false` when the account was
    /// already deployed. Idempotent: the second call is a cheap
    /// check-and-skip.
    pub async fn ensure_deployed<B: Bundler>(
        &self,
        account: &SmartAccount,
        executor: &SponsoredExecutor<B>,
    ) -> Result<bool> {
        if self.is_deployed(account).await? {
            debug!("account {:?} already deployed", account.address);
            return Ok(false);
        }
        let hash = executor.send(account, vec![Call::noop()], None).await?;
        executor.wait(hash).await?;
        info!("deployed smart account {:?}", account.address);
        Ok(true)
    }
}
