// src/error.rs
//! Error taxonomy for the attestation system.

use ethers::types::H256;
use thiserror::Error;

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// All failure modes surfaced by this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// Required inputs were absent. Carries every missing field name so
    /// callers can fix them all in one pass.
    #[error("missing required context: {0:?}")]
    MissingContext(Vec<&'static str>),

    /// An external service (prover, bundler, indexer) answered with an
    /// unusable response.
    #[error("external service error: {0}")]
    ExternalService(String),

    /// Transport-level HTTP failure.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// An on-chain interaction failed or produced an unexpected state.
    #[error("chain error: {0}")]
    Chain(String),

    /// ABI encoding or decoding failed.
    #[error("abi error: {0}")]
    Abi(String),

    /// Smart-account discovery exhausted all salt candidates.
    #[error("no valid smart account found")]
    NoValidAccount,

    /// A submitted operation was not included within the polling budget.
    #[error("timed out waiting for receipt of operation {0:?}")]
    ReceiptTimeout(H256),

    /// Message signing failed.
    #[error("signing error: {0}")]
    Signing(String),

    /// JSON serialization or deserialization failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// A delegation chain failed structural validation.
    #[error("invalid delegation chain: {0}")]
    InvalidDelegationChain(String),
}
