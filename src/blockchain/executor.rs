// src/blockchain/executor.rs
//! Sponsored execution of smart-account operations.
//!
//! The executor turns batches of calls into sponsored operations, submits
//! them through the bundler and polls for receipts. Bundler-side simulation
//! rejects zero gas limits, so every operation carries generous defaults
//! unless the caller overrides them.

use crate::blockchain::bundler::{
    Bundler, Call, GasFees, OperationReceipt, SponsoredOperation, SPONSORED_MODE,
};
use crate::blockchain::chain_client::{AgentRegistration, ChainClient, IdentityRegistry};
use crate::blockchain::provisioner::SmartAccountProvisioner;
use crate::error::{Error, Result};
use crate::models::account::SmartAccount;
use ethers::types::{H256, U256};
use log::{debug, info, warn};
use std::time::Duration;

/// Default gas limit for the call phase.
pub const DEFAULT_CALL_GAS_LIMIT: u64 = 500_000;
/// Default gas limit for the verification phase.
pub const DEFAULT_VERIFICATION_GAS_LIMIT: u64 = 500_000;
/// Default pre-verification gas.
pub const DEFAULT_PRE_VERIFICATION_GAS: u64 = 100_000;

const RECEIPT_POLL_ATTEMPTS: u32 = 40;
const RECEIPT_POLL_INTERVAL: Duration = Duration::from_secs(3);

/// Caller-supplied fee and gas overrides.
///
/// Zero gas limits are replaced by the defaults rather than forwarded;
/// bundler simulation rejects them.
#[derive(Debug, Clone, Default)]
pub struct FeeHint {
    /// Fee parameters; fetched from the bundler when absent.
    pub fees: Option<GasFees>,
    /// Call-phase gas limit override.
    pub call_gas_limit: Option<U256>,
    /// Verification-phase gas limit override.
    pub verification_gas_limit: Option<U256>,
    /// Pre-verification gas override.
    pub pre_verification_gas: Option<U256>,
}

fn gas_or_default(hint: Option<U256>, default: u64) -> U256 {
    match hint {
        Some(g) if !g.is_zero() => g,
        _ => U256::from(default),
    }
}

/// Builds and submits gas-sponsored operations.
#[derive(Debug)]
pub struct SponsoredExecutor<B: Bundler> {
    bundler: B,
    poll_interval: Duration,
    poll_attempts: u32,
}

impl<B: Bundler> SponsoredExecutor<B> {
    /// Creates an executor submitting through `bundler`.
    pub fn new(bundler: B) -> Self {
        SponsoredExecutor {
            bundler,
            poll_interval: RECEIPT_POLL_INTERVAL,
            poll_attempts: RECEIPT_POLL_ATTEMPTS,
        }
    }

    /// Overrides the receipt polling schedule.
    pub fn with_polling(mut self, interval: Duration, attempts: u32) -> Self {
        self.poll_interval = interval;
        self.poll_attempts = attempts;
        self
    }

    /// Submits `calls` as one sponsored operation executed by `account`.
    ///
    /// Fees are fetched from the bundler when the hint does not supply
    /// them. The payment mode is always sponsored; the executing account
    /// does not need to hold gas funds.
    pub async fn send(
        &self,
        account: &SmartAccount,
        calls: Vec<Call>,
        fee_hint: Option<FeeHint>,
    ) -> Result<H256> {
        if calls.is_empty() {
            return Err(Error::MissingContext(vec!["calls"]));
        }
        let hint = fee_hint.unwrap_or_default();
        let fees = match hint.fees {
            Some(fees) => fees,
            None => self.bundler.gas_price().await?,
        };
        let operation = SponsoredOperation {
            sender: account.address,
            calls,
            call_gas_limit: gas_or_default(hint.call_gas_limit, DEFAULT_CALL_GAS_LIMIT),
            verification_gas_limit: gas_or_default(
                hint.verification_gas_limit,
                DEFAULT_VERIFICATION_GAS_LIMIT,
            ),
            pre_verification_gas: gas_or_default(
                hint.pre_verification_gas,
                DEFAULT_PRE_VERIFICATION_GAS,
            ),
            fees,
            sponsorship_mode: SPONSORED_MODE.to_string(),
        };
        let hash = self.bundler.send_operation(&operation).await?;
        debug!("submitted sponsored operation {:?}", hash);
        Ok(hash)
    }

    /// Polls for the receipt of `operation_hash` until it is included or
    /// the polling budget is exhausted.
    pub async fn wait(&self, operation_hash: H256) -> Result<OperationReceipt> {
        for attempt in 0..self.poll_attempts {
            if let Some(receipt) = self.bundler.operation_receipt(operation_hash).await? {
                return Ok(receipt);
            }
            if attempt + 1 < self.poll_attempts {
                tokio::time::sleep(self.poll_interval).await;
            }
        }
        Err(Error::ReceiptTimeout(operation_hash))
    }

    /// Convenience wrapper around [`send`](Self::send) and
    /// [`wait`](Self::wait).
    pub async fn send_and_wait(
        &self,
        account: &SmartAccount,
        calls: Vec<Call>,
        fee_hint: Option<FeeHint>,
    ) -> Result<OperationReceipt> {
        let hash = self.send(account, calls, fee_hint).await?;
        self.wait(hash).await
    }
}

/// Idempotent domain registration through account abstraction.
///
/// Reads the existing registration for `domain` and returns it when
/// present. Otherwise ensures `account` is deployed, submits the
/// registration call and re-reads. The post-write read is best-effort: it
/// may race the indexer and come back empty, in which case `None` is
/// returned and callers retry later.
pub async fn ensure_identity_with_aa<R, C, B>(
    registry: &R,
    provisioner: &SmartAccountProvisioner<C>,
    executor: &SponsoredExecutor<B>,
    domain: &str,
    account: &SmartAccount,
) -> Result<Option<AgentRegistration>>
where
    R: IdentityRegistry,
    C: ChainClient,
    B: Bundler,
{
    if domain.is_empty() {
        return Err(Error::MissingContext(vec!["domain"]));
    }
    if let Some(existing) = registry.resolve_by_domain(domain).await? {
        debug!("domain {} already registered, skipping write", domain);
        return Ok(Some(existing));
    }

    provisioner.ensure_deployed(account, executor).await?;
    let call = registry.encode_new_agent(domain, account.address)?;
    let hash = executor.send(account, vec![call], None).await?;
    executor.wait(hash).await?;
    info!("registered domain {} via {:?}", domain, account.address);

    match registry.resolve_by_domain(domain).await {
        Ok(registration) => Ok(registration),
        Err(e) => {
            // Read-after-write race with the indexer; callers retry.
            warn!("post-registration read for {} failed: {}", domain, e);
            Ok(None)
        }
    }
}
