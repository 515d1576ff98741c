// src/blockchain/bundler.rs
//! Bundler/paymaster interface for sponsored (gas-abstracted) operations.
//!
//! Executing accounts never hold gas funds; every operation is submitted
//! with the SPONSORED payment mode and paid for by the paymaster. The
//! [`Bundler`] trait is the seam between the executor and the bundler
//! infrastructure; [`HttpBundler`] speaks the JSON-RPC dialect of common
//! ERC-4337 bundlers.

use crate::error::{Error, Result};
use ethers::abi::{self, Token};
use ethers::types::{Address, Bytes, H256, U256};
use ethers::utils::id;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Payment mode requested for every operation.
pub const SPONSORED_MODE: &str = "SPONSORED";

/// A single call executed by a smart account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Call {
    /// Target contract.
    pub to: Address,
    /// Wei attached to the call.
    pub value: U256,
    /// ABI-encoded calldata.
    pub data: Bytes,
}

impl Call {
    /// A zero-value call with empty calldata to the zero address. Submitting
    /// it deploys a counterfactual account without any other effect.
    pub fn noop() -> Self {
        Call {
            to: Address::zero(),
            value: U256::zero(),
            data: Bytes::default(),
        }
    }
}

/// Fee recommendations from the bundler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GasFees {
    /// Maximum total fee per gas unit.
    #[serde(rename = "maxFeePerGas")]
    pub max_fee_per_gas: U256,
    /// Maximum priority fee per gas unit.
    #[serde(rename = "maxPriorityFeePerGas")]
    pub max_priority_fee_per_gas: U256,
}

/// A fully specified sponsored operation ready for submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SponsoredOperation {
    /// Smart account executing the calls.
    pub sender: Address,
    /// Calls batched into the operation.
    pub calls: Vec<Call>,
    /// Gas limit for the call phase.
    pub call_gas_limit: U256,
    /// Gas limit for the verification phase.
    pub verification_gas_limit: U256,
    /// Gas paid up front before verification.
    pub pre_verification_gas: U256,
    /// Fee parameters.
    pub fees: GasFees,
    /// Payment mode; always [`SPONSORED_MODE`] in this system.
    pub sponsorship_mode: String,
}

/// Receipt of an executed sponsored operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationReceipt {
    /// Hash of the operation.
    pub operation_hash: H256,
    /// Hash of the transaction that included it.
    pub transaction_hash: H256,
    /// Whether the inner execution succeeded.
    pub success: bool,
}

/// Bundler infrastructure seam.
#[allow(async_fn_in_trait)]
pub trait Bundler {
    /// Current fee recommendations.
    async fn gas_price(&self) -> Result<GasFees>;

    /// Submits an operation, returning its hash.
    async fn send_operation(&self, operation: &SponsoredOperation) -> Result<H256>;

    /// Polls for the receipt of a previously submitted operation.
    /// `None` means the operation is not yet included.
    async fn operation_receipt(&self, operation_hash: H256) -> Result<Option<OperationReceipt>>;
}

impl<B: Bundler> Bundler for &B {
    async fn gas_price(&self) -> Result<GasFees> {
        (**self).gas_price().await
    }

    async fn send_operation(&self, operation: &SponsoredOperation) -> Result<H256> {
        (**self).send_operation(operation).await
    }

    async fn operation_receipt(&self, operation_hash: H256) -> Result<Option<OperationReceipt>> {
        (**self).operation_receipt(operation_hash).await
    }
}

/// Encodes a batch of calls into `executeBatch` calldata for the smart
/// account implementation.
pub fn encode_execute_batch(calls: &[Call]) -> Bytes {
    let tokens = Token::Array(
        calls
            .iter()
            .map(|c| {
                Token::Tuple(vec![
                    Token::Address(c.to),
                    Token::Uint(c.value),
                    Token::Bytes(c.data.to_vec()),
                ])
            })
            .collect(),
    );
    let selector = id("executeBatch((address,uint256,bytes)[])");
    let mut out = selector.to_vec();
    out.extend(abi::encode(&[tokens]));
    Bytes::from(out)
}

#[derive(Serialize)]
struct RpcRequest<'a, P: Serialize> {
    jsonrpc: &'a str,
    id: u64,
    method: &'a str,
    params: P,
}

#[derive(Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcError>,
}

#[derive(Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

#[derive(Deserialize)]
struct GasPriceTiers {
    standard: GasFees,
}

#[derive(Deserialize)]
struct ReceiptResult {
    #[serde(rename = "userOpHash")]
    user_op_hash: H256,
    success: bool,
    receipt: InnerReceipt,
}

#[derive(Deserialize)]
struct InnerReceipt {
    #[serde(rename = "transactionHash")]
    transaction_hash: H256,
}

/// JSON-RPC bundler client.
#[derive(Debug, Clone)]
pub struct HttpBundler {
    http: reqwest::Client,
    url: String,
    entry_point: Address,
}

impl HttpBundler {
    /// Creates a client for the bundler at `url` using `entry_point`.
    pub fn new(url: impl Into<String>, entry_point: Address) -> Self {
        HttpBundler {
            http: reqwest::Client::new(),
            url: url.into(),
            entry_point,
        }
    }

    async fn rpc<T: serde::de::DeserializeOwned, P: Serialize>(
        &self,
        method: &str,
        params: P,
    ) -> Result<T> {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: 1,
            method,
            params,
        };
        let response = self.http.post(&self.url).json(&request).send().await?;
        if !response.status().is_success() {
            return Err(Error::ExternalService(format!(
                "bundler returned {}",
                response.status()
            )));
        }
        let parsed: RpcResponse<T> = response.json().await?;
        if let Some(err) = parsed.error {
            return Err(Error::ExternalService(format!(
                "bundler rpc error {}: {}",
                err.code, err.message
            )));
        }
        parsed
            .result
            .ok_or_else(|| Error::ExternalService("bundler returned empty result".to_string()))
    }

    fn operation_json(&self, operation: &SponsoredOperation) -> Value {
        json!({
            "sender": operation.sender,
            "callData": encode_execute_batch(&operation.calls),
            "callGasLimit": operation.call_gas_limit,
            "verificationGasLimit": operation.verification_gas_limit,
            "preVerificationGas": operation.pre_verification_gas,
            "maxFeePerGas": operation.fees.max_fee_per_gas,
            "maxPriorityFeePerGas": operation.fees.max_priority_fee_per_gas,
            "paymasterContext": { "mode": operation.sponsorship_mode },
        })
    }
}

impl Bundler for HttpBundler {
    async fn gas_price(&self) -> Result<GasFees> {
        let tiers: GasPriceTiers = self
            .rpc("pimlico_getUserOperationGasPrice", json!([]))
            .await?;
        Ok(tiers.standard)
    }

    async fn send_operation(&self, operation: &SponsoredOperation) -> Result<H256> {
        self.rpc(
            "eth_sendUserOperation",
            json!([self.operation_json(operation), self.entry_point]),
        )
        .await
    }

    async fn operation_receipt(&self, operation_hash: H256) -> Result<Option<OperationReceipt>> {
        let result: Option<ReceiptResult> = self
            .rpc("eth_getUserOperationReceipt", json!([operation_hash]))
            .await
            .map(Some)
            .or_else(|e| match e {
                // Bundlers answer `null` for pending operations, which the
                // rpc helper reports as an empty result.
                Error::ExternalService(ref msg) if msg.contains("empty result") => Ok(None),
                other => Err(other),
            })?;
        Ok(result.map(|r| OperationReceipt {
            operation_hash: r.user_op_hash,
            transaction_hash: r.receipt.transaction_hash,
            success: r.success,
        }))
    }
}
