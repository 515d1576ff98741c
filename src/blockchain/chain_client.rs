// src/blockchain/chain_client.rs
//! Read access to the chain and the on-chain registries.
//!
//! Writes never go through this module; they are encoded into calls here
//! and submitted as sponsored operations by the executor. Reads use a plain
//! JSON-RPC provider.

use crate::blockchain::bundler::Call;
use crate::error::{Error, Result};
use crate::models::attestation::{Attestation, AttestationRecord};
use ethers::abi::Abi;
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{Address, Bytes, TransactionRequest, H256, U256};
use ethers_contract::BaseContract;
use std::sync::Arc;

use ethers::abi::{self as ethabi, Token};
use ethers::providers::{Http, Middleware, Provider};

/// Chain read interface.
#[allow(async_fn_in_trait)]
pub trait ChainClient {
    /// Deployed bytecode at `address` (empty when not deployed).
    async fn get_code(&self, address: Address) -> Result<Bytes>;

    /// Executes a read-only contract call.
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes>;
}

impl<C: ChainClient> ChainClient for &C {
    async fn get_code(&self, address: Address) -> Result<Bytes> {
        (**self).get_code(address).await
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes> {
        (**self).call(to, data).await
    }
}

/// JSON-RPC chain client.
#[derive(Debug, Clone)]
pub struct EthersChainClient {
    provider: Arc<Provider<Http>>,
}

impl EthersChainClient {
    /// Connects to the JSON-RPC endpoint at `rpc_url`.
    pub fn new(rpc_url: &str) -> Result<Self> {
        let provider = Provider::<Http>::try_from(rpc_url)
            .map_err(|e| Error::Chain(format!("invalid rpc url: {}", e)))?;
        Ok(EthersChainClient {
            provider: Arc::new(provider),
        })
    }
}

impl ChainClient for EthersChainClient {
    async fn get_code(&self, address: Address) -> Result<Bytes> {
        self.provider
            .get_code(address, None)
            .await
            .map_err(|e| Error::Chain(e.to_string()))
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes> {
        let tx: TypedTransaction = TransactionRequest::new().to(to).data(data).into();
        self.provider
            .call(&tx, None)
            .await
            .map_err(|e| Error::Chain(e.to_string()))
    }
}

/// An agent registration as stored by the identity registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentRegistration {
    /// Registry-assigned agent id.
    pub agent_id: U256,
    /// Domain the agent is registered under.
    pub agent_domain: String,
    /// Smart account of the agent.
    pub agent_address: Address,
}

/// Identity registry interface: domain-based agent registration.
#[allow(async_fn_in_trait)]
pub trait IdentityRegistry {
    /// Reads the registration for `domain`, if any.
    async fn resolve_by_domain(&self, domain: &str) -> Result<Option<AgentRegistration>>;

    /// Encodes the registration call for submission via the executor.
    fn encode_new_agent(&self, domain: &str, agent_account: Address) -> Result<Call>;
}

impl<R: IdentityRegistry> IdentityRegistry for &R {
    async fn resolve_by_domain(&self, domain: &str) -> Result<Option<AgentRegistration>> {
        (**self).resolve_by_domain(domain).await
    }

    fn encode_new_agent(&self, domain: &str, agent_account: Address) -> Result<Call> {
        (**self).encode_new_agent(domain, agent_account)
    }
}

/// Identity registry backed by an on-chain contract.
#[derive(Debug, Clone)]
pub struct EthersIdentityRegistry<C: ChainClient> {
    address: Address,
    contract: BaseContract,
    chain: C,
}

impl<C: ChainClient> EthersIdentityRegistry<C> {
    /// Wraps the identity registry deployed at `address`.
    pub fn new(address: Address, chain: C) -> Result<Self> {
        let abi = Abi::load(&include_bytes!("abi/IdentityRegistry.json")[..])
            .map_err(|e| Error::Abi(e.to_string()))?;
        Ok(EthersIdentityRegistry {
            address,
            contract: BaseContract::from(abi),
            chain,
        })
    }
}

impl<C: ChainClient> IdentityRegistry for EthersIdentityRegistry<C> {
    async fn resolve_by_domain(&self, domain: &str) -> Result<Option<AgentRegistration>> {
        let data = self
            .contract
            .encode("resolveByDomain", domain.to_string())
            .map_err(|e| Error::Abi(e.to_string()))?;
        let raw = self.chain.call(self.address, data).await?;
        let (agent_id, agent_domain, agent_address): (U256, String, Address) = self
            .contract
            .decode_output("resolveByDomain", raw)
            .map_err(|e| Error::Abi(e.to_string()))?;
        if agent_address == Address::zero() {
            return Ok(None);
        }
        Ok(Some(AgentRegistration {
            agent_id,
            agent_domain,
            agent_address,
        }))
    }

    fn encode_new_agent(&self, domain: &str, agent_account: Address) -> Result<Call> {
        let data = self
            .contract
            .encode("newAgent", (domain.to_string(), agent_account))
            .map_err(|e| Error::Abi(e.to_string()))?;
        Ok(Call {
            to: self.address,
            value: U256::zero(),
            data,
        })
    }
}

/// Attestation registry interface: schema-keyed claim records.
#[allow(async_fn_in_trait)]
pub trait AttestationRegistry {
    /// Registry contract address.
    fn address(&self) -> Address;

    /// Looks up the attestation for the uniqueness tuple, if any.
    async fn find(
        &self,
        attester: Address,
        schema: H256,
        entity_id: &str,
        display_name: &str,
    ) -> Result<Option<AttestationRecord>>;

    /// Encodes an attestation write.
    fn encode_attest(&self, schema: H256, attestation: &Attestation) -> Result<Call>;

    /// Encodes an attestation deletion.
    fn encode_revoke(&self, schema: H256, uid: H256) -> Result<Call>;
}

impl<R: AttestationRegistry> AttestationRegistry for &R {
    fn address(&self) -> Address {
        (**self).address()
    }

    async fn find(
        &self,
        attester: Address,
        schema: H256,
        entity_id: &str,
        display_name: &str,
    ) -> Result<Option<AttestationRecord>> {
        (**self).find(attester, schema, entity_id, display_name).await
    }

    fn encode_attest(&self, schema: H256, attestation: &Attestation) -> Result<Call> {
        (**self).encode_attest(schema, attestation)
    }

    fn encode_revoke(&self, schema: H256, uid: H256) -> Result<Call> {
        (**self).encode_revoke(schema, uid)
    }
}

/// Attestation registry backed by an on-chain contract.
#[derive(Debug, Clone)]
pub struct EthersAttestationRegistry<C: ChainClient> {
    address: Address,
    contract: BaseContract,
    chain: C,
}

impl<C: ChainClient> EthersAttestationRegistry<C> {
    /// Wraps the attestation registry deployed at `address`.
    pub fn new(address: Address, chain: C) -> Result<Self> {
        let abi = Abi::load(&include_bytes!("abi/AttestationRegistry.json")[..])
            .map_err(|e| Error::Abi(e.to_string()))?;
        Ok(EthersAttestationRegistry {
            address,
            contract: BaseContract::from(abi),
            chain,
        })
    }

    /// ABI-encodes the claim payload written under the schema.
    ///
    /// The tuple layout mirrors the schema definition the UID is derived
    /// from: the common envelope columns with the claim-specific fields
    /// spliced in between `hash` and `vccomm`. Claim fields are encoded in
    /// key order, which is lexicographic for the JSON maps carried by
    /// [`Attestation`].
    fn encode_payload(attestation: &Attestation) -> Vec<u8> {
        let mut columns = vec![
            Token::String(attestation.entity_id.clone()),
            Token::String(attestation.display_name.clone()),
            Token::String(attestation.class.clone()),
            Token::String(attestation.category.clone()),
            Token::String(attestation.hash.clone()),
        ];
        for value in attestation.fields.values() {
            let text = match value {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            columns.push(Token::String(text));
        }
        columns.extend([
            Token::String(attestation.vccomm.clone()),
            Token::String(attestation.vcsig.clone()),
            Token::String(attestation.vciss.clone()),
            Token::String(attestation.vcid.clone().unwrap_or_default()),
            Token::String(attestation.proof.clone()),
        ]);
        ethabi::encode(&[Token::Tuple(columns)])
    }
}

impl<C: ChainClient> AttestationRegistry for EthersAttestationRegistry<C> {
    fn address(&self) -> Address {
        self.address
    }

    async fn find(
        &self,
        attester: Address,
        schema: H256,
        entity_id: &str,
        display_name: &str,
    ) -> Result<Option<AttestationRecord>> {
        let data = self
            .contract
            .encode(
                "findAttestation",
                (
                    attester,
                    schema,
                    entity_id.to_string(),
                    display_name.to_string(),
                ),
            )
            .map_err(|e| Error::Abi(e.to_string()))?;
        let raw = self.chain.call(self.address, data).await?;
        let uid: H256 = self
            .contract
            .decode_output("findAttestation", raw)
            .map_err(|e| Error::Abi(e.to_string()))?;
        if uid == H256::zero() {
            return Ok(None);
        }
        Ok(Some(AttestationRecord {
            uid,
            attester,
            schema,
            entity_id: entity_id.to_string(),
            display_name: display_name.to_string(),
        }))
    }

    fn encode_attest(&self, schema: H256, attestation: &Attestation) -> Result<Call> {
        let payload = Self::encode_payload(attestation);
        let data = self
            .contract
            .encode("attest", (schema, Bytes::from(payload)))
            .map_err(|e| Error::Abi(e.to_string()))?;
        Ok(Call {
            to: self.address,
            value: U256::zero(),
            data,
        })
    }

    fn encode_revoke(&self, schema: H256, uid: H256) -> Result<Call> {
        let data = self
            .contract
            .encode("revoke", (schema, uid))
            .map_err(|e| Error::Abi(e.to_string()))?;
        Ok(Call {
            to: self.address,
            value: U256::zero(),
            data,
        })
    }
}
