// src/prover/keys.rs
//! Verification key source.
//!
//! The proving system publishes two static JSON documents: the key for
//! forward (commitment) proofs and the key for revocation proofs. Each is
//! fetched at most once per process and reused across verifications.

use crate::error::{Error, Result};
use serde_json::Value;
use tokio::sync::OnceCell;

/// Fetches and caches the two verification keys.
#[derive(Debug)]
pub struct VerificationKeySource {
    http: reqwest::Client,
    forward_url: String,
    revocation_url: String,
    forward: OnceCell<Value>,
    revocation: OnceCell<Value>,
}

impl VerificationKeySource {
    /// Creates a source reading the forward key from `forward_url` and the
    /// revocation key from `revocation_url`.
    pub fn new(forward_url: impl Into<String>, revocation_url: impl Into<String>) -> Self {
        VerificationKeySource {
            http: reqwest::Client::new(),
            forward_url: forward_url.into(),
            revocation_url: revocation_url.into(),
            forward: OnceCell::new(),
            revocation: OnceCell::new(),
        }
    }

    async fn fetch(&self, url: &str) -> Result<Value> {
        let response = self.http.get(url).send().await?;
        if !response.status().is_success() {
            return Err(Error::ExternalService(format!(
                "verification key fetch from {} returned {}",
                url,
                response.status()
            )));
        }
        Ok(response.json().await?)
    }

    /// The verification key for forward (commitment) proofs.
    pub async fn forward(&self) -> Result<&Value> {
        self.forward
            .get_or_try_init(|| self.fetch(&self.forward_url))
            .await
    }

    /// The verification key for revocation proofs.
    pub async fn revocation(&self) -> Result<&Value> {
        self.revocation
            .get_or_try_init(|| self.fetch(&self.revocation_url))
            .await
    }
}
