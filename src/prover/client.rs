// src/prover/client.rs
//! HTTP client for the external proving service.
//!
//! The prover turns `(issuerDidHash, didHash, vcHash)` into a hiding
//! commitment, produces zero-knowledge proofs binding issuer, subject and
//! claim, and checks proofs against a verification key. Commitments are
//! never recomputed locally; they are only requested here and later
//! re-verified.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A zero-knowledge proof as returned by the proving service.
///
/// The proof itself is opaque serialized JSON; `public_signals` are the
/// inputs it was produced for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZkProof {
    /// Opaque serialized proof document.
    #[serde(rename = "proofJson")]
    pub proof_json: String,
    /// Public signals the proof binds, as decimal strings.
    #[serde(rename = "publicSignals", default)]
    pub public_signals: Vec<String>,
}

#[derive(Serialize)]
struct CommitmentRequest<'a> {
    #[serde(rename = "issuerDidHash")]
    issuer_did_hash: &'a str,
    #[serde(rename = "didHash")]
    did_hash: &'a str,
    #[serde(rename = "vcHash")]
    vc_hash: &'a str,
}

#[derive(Deserialize)]
struct CommitmentResponse {
    commitment: String,
}

#[derive(Serialize)]
struct CreateProofRequest<'a> {
    inputs: &'a [String],
    did: &'a str,
    commitment: &'a str,
}

#[derive(Deserialize)]
struct CreateProofResponse {
    #[serde(rename = "proofJson")]
    proof_json: String,
    #[serde(rename = "publicSignals", default)]
    public_signals: Vec<String>,
}

#[derive(Serialize)]
struct CheckProofRequest<'a> {
    #[serde(rename = "verificationKey")]
    verification_key: &'a Value,
    #[serde(rename = "publicSignals")]
    public_signals: &'a [String],
    #[serde(rename = "zkProofJson")]
    zk_proof_json: Value,
}

/// Client for the proving service HTTP API.
#[derive(Debug, Clone)]
pub struct CommitmentClient {
    http: reqwest::Client,
    base_url: String,
}

impl CommitmentClient {
    /// Creates a client for the proving service at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        CommitmentClient {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Requests a commitment for the three domain-separated hashes.
    ///
    /// Returns the commitment as an opaque decimal string.
    pub async fn request_commitment(
        &self,
        issuer_did_hash: &str,
        did_hash: &str,
        vc_hash: &str,
    ) -> Result<String> {
        let body = CommitmentRequest {
            issuer_did_hash,
            did_hash,
            vc_hash,
        };
        let response = self
            .http
            .post(format!("{}/api/proof/commitment", self.base_url))
            .json(&body)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Error::ExternalService(format!(
                "prover commitment endpoint returned {}",
                response.status()
            )));
        }
        let parsed: CommitmentResponse = response.json().await?;
        Ok(parsed.commitment)
    }

    /// Requests a proof for the given inputs, subject DID and commitment.
    pub async fn request_proof(
        &self,
        inputs: &[String],
        did: &str,
        commitment: &str,
    ) -> Result<ZkProof> {
        let body = CreateProofRequest {
            inputs,
            did,
            commitment,
        };
        let response = self
            .http
            .post(format!("{}/api/proof/create", self.base_url))
            .json(&body)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Error::ExternalService(format!(
                "prover create endpoint returned {}",
                response.status()
            )));
        }
        let parsed: CreateProofResponse = response.json().await?;
        Ok(ZkProof {
            proof_json: parsed.proof_json,
            public_signals: parsed.public_signals,
        })
    }

    /// Checks a proof against a verification key and public signals.
    ///
    /// The proof JSON is decoded before submission; the endpoint answers
    /// with a plain boolean.
    pub async fn check_proof(
        &self,
        verification_key: &Value,
        public_signals: &[String],
        proof_json: &str,
    ) -> Result<bool> {
        let decoded: Value = serde_json::from_str(proof_json)?;
        let body = CheckProofRequest {
            verification_key,
            public_signals,
            zk_proof_json: decoded,
        };
        let response = self
            .http
            .post(format!("{}/api/proof/checkproof", self.base_url))
            .json(&body)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Error::ExternalService(format!(
                "prover checkproof endpoint returned {}",
                response.status()
            )));
        }
        Ok(response.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{mock, Matcher};
    use serde_json::json;

    #[tokio::test]
    async fn test_request_commitment_parses_response() {
        let _m = mock("POST", "/api/proof/commitment")
            .match_body(Matcher::PartialJsonString(
                r#"{"issuerDidHash":"11"}"#.to_string(),
            ))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"commitment":"123456789"}"#)
            .create();

        let client = CommitmentClient::new(mockito::server_url());
        let commitment = client
            .request_commitment("11", "22", "33")
            .await
            .unwrap();
        assert_eq!(commitment, "123456789");
    }

    #[tokio::test]
    async fn test_request_proof_parses_response() {
        let _m = mock("POST", "/api/proof/create")
            .match_body(Matcher::PartialJsonString(
                r#"{"commitment":"42"}"#.to_string(),
            ))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"proofJson":"{\"pi_a\":[]}","publicSignals":["1","2","3"]}"#)
            .create();

        let client = CommitmentClient::new(mockito::server_url());
        let proof = client
            .request_proof(&["1".to_string()], "did:example:subject", "42")
            .await
            .unwrap();
        assert_eq!(proof.proof_json, r#"{"pi_a":[]}"#);
        assert_eq!(proof.public_signals, vec!["1", "2", "3"]);
    }

    #[tokio::test]
    async fn test_check_proof_returns_boolean() {
        let _m = mock("POST", "/api/proof/checkproof")
            .match_body(Matcher::PartialJsonString(
                r#"{"publicSignals":["1"]}"#.to_string(),
            ))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("true")
            .create();

        let client = CommitmentClient::new(mockito::server_url());
        let vk = json!({"protocol": "groth16"});
        let ok = client
            .check_proof(&vk, &["1".to_string()], r#"{"pi_a":[]}"#)
            .await
            .unwrap();
        assert!(ok);
    }

    #[tokio::test]
    async fn test_non_success_status_is_external_service_error() {
        let _m = mock("POST", "/api/proof/commitment")
            .match_body(Matcher::PartialJsonString(
                r#"{"issuerDidHash":"1"}"#.to_string(),
            ))
            .with_status(502)
            .create();

        let client = CommitmentClient::new(mockito::server_url());
        let err = client.request_commitment("1", "2", "3").await.unwrap_err();
        assert!(matches!(err, crate::error::Error::ExternalService(_)));
    }
}
