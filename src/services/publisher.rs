// src/services/publisher.rs
//! Attestation publishing.
//!
//! Publishes credential-derived attestations to the on-chain registry via
//! sponsored operations. The registry enforces no uniqueness, so the
//! publisher reads before it writes: at most one attestation exists per
//! `(attester, schema, entityId, displayName)` tuple and re-publishing an
//! existing one is a success no-op. When the executing account is not the
//! attester itself, the write is wrapped in a delegation redemption so the
//! attestation still appears under the root authority.

use crate::blockchain::bundler::{Bundler, Call};
use crate::blockchain::chain_client::AttestationRegistry;
use crate::blockchain::executor::SponsoredExecutor;
use crate::error::{Error, Result};
use crate::models::account::SmartAccount;
use crate::models::attestation::{Attestation, AttestationRecord};
use crate::models::delegation::{DelegationChain, SINGLE_DEFAULT_MODE};
use ethers::abi::{self, Token};
use ethers::types::{Address, Bytes, H256, U256};
use ethers::utils::id;
use log::{debug, info};

/// Publishes and deletes attestations through the registry.
pub struct AttestationPublisher<R: AttestationRegistry, B: Bundler> {
    registry: R,
    executor: SponsoredExecutor<B>,
    delegation_manager: Address,
}

/// Wraps an inner call into a `redeemDelegations` call on the delegation
/// manager, authorizing it through `chain`.
fn encode_redemption(manager: Address, chain: &DelegationChain, inner: &Call) -> Call {
    let execution = abi::encode(&[Token::Tuple(vec![
        Token::Address(inner.to),
        Token::Uint(inner.value),
        Token::Bytes(inner.data.to_vec()),
    ])]);
    let args = abi::encode(&[
        Token::Array(vec![Token::Bytes(chain.encode_permission_context().to_vec())]),
        Token::Array(vec![Token::FixedBytes(SINGLE_DEFAULT_MODE.to_vec())]),
        Token::Array(vec![Token::Bytes(execution)]),
    ]);
    let selector = id("redeemDelegations(bytes[],bytes32[],bytes[])");
    let mut data = selector.to_vec();
    data.extend(args);
    Call {
        to: manager,
        value: U256::zero(),
        data: Bytes::from(data),
    }
}

impl<R: AttestationRegistry, B: Bundler> AttestationPublisher<R, B> {
    /// Creates a publisher writing through `registry` and `executor`.
    pub fn new(registry: R, executor: SponsoredExecutor<B>, delegation_manager: Address) -> Self {
        AttestationPublisher {
            registry,
            executor,
            delegation_manager,
        }
    }

    /// Publishes `attestation` under `schema`, executed by `account`.
    ///
    /// Reads the registry first; an existing attestation for the same tuple
    /// short-circuits with its UID and no write. When `account` is not the
    /// attester, `chain` must be a valid delegation from the attester down
    /// to some delegate and the write goes through the delegation manager.
    pub async fn publish(
        &self,
        attestation: &Attestation,
        schema: H256,
        chain: &DelegationChain,
        account: &SmartAccount,
    ) -> Result<H256> {
        let attester = attestation
            .attester
            .address()
            .ok_or(Error::MissingContext(vec!["attester"]))?;

        if let Some(existing) = self
            .registry
            .find(
                attester,
                schema,
                &attestation.entity_id,
                &attestation.display_name,
            )
            .await?
        {
            info!(
                "attestation for {} ({}) already published as {:?}",
                attestation.entity_id, attestation.display_name, existing.uid
            );
            return Ok(existing.uid);
        }

        let mut call = self.registry.encode_attest(schema, attestation)?;
        if account.address != attester {
            chain.validate(attester)?;
            debug!(
                "redeeming {}-link delegation chain for attester {:?}",
                chain.len(),
                attester
            );
            call = encode_redemption(self.delegation_manager, chain, &call);
        }

        let receipt = self.executor.send_and_wait(account, vec![call], None).await?;
        if !receipt.success {
            return Err(Error::Chain(format!(
                "attestation write for {} reverted in {:?}",
                attestation.entity_id, receipt.transaction_hash
            )));
        }

        match self
            .registry
            .find(
                attester,
                schema,
                &attestation.entity_id,
                &attestation.display_name,
            )
            .await?
        {
            Some(record) => {
                info!(
                    "published attestation {:?} for {}",
                    record.uid, attestation.entity_id
                );
                Ok(record.uid)
            }
            None => Err(Error::Chain(format!(
                "attestation for {} not found after write",
                attestation.entity_id
            ))),
        }
    }

    /// Deletes the given attestations, one sponsored operation each.
    ///
    /// Failures are independent: the result vector is position-aligned with
    /// `records` and each entry carries that deletion's outcome.
    pub async fn delete_attestations(
        &self,
        records: &[AttestationRecord],
        chain: &DelegationChain,
        account: &SmartAccount,
    ) -> Vec<Result<H256>> {
        let deletions = records.iter().map(|record| async move {
            let mut call = self.registry.encode_revoke(record.schema, record.uid)?;
            if account.address != record.attester {
                chain.validate(record.attester)?;
                call = encode_redemption(self.delegation_manager, chain, &call);
            }
            let hash = self.executor.send(account, vec![call], None).await?;
            let receipt = self.executor.wait(hash).await?;
            if !receipt.success {
                return Err(Error::Chain(format!(
                    "revocation of {:?} reverted",
                    record.uid
                )));
            }
            Ok(record.uid)
        });
        futures::future::join_all(deletions).await
    }
}
