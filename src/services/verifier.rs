// src/services/verifier.rs
//! Proof verification.
//!
//! Verification is delegated to the proving service: the verifier
//! assembles public signals, forwards the appropriate verification key and
//! caches boolean outcomes in a bounded cache. Forward proofs bind
//! `(subject DID, issuer DID, commitment)`; revocation proofs carry their
//! own public signals and fall back to the bare commitment when they
//! don't.

use crate::error::Result;
use crate::prover::client::CommitmentClient;
use crate::prover::keys::VerificationKeySource;
use crate::utils::cache::Cache;
use crate::utils::crypto::hash_to_field_dec;
use log::debug;
use serde_json::Value;
use std::sync::{Arc, Mutex};

/// Default capacity of the verification outcome caches.
const OUTCOME_CACHE_CAPACITY: usize = 512;

/// Outcome of a proof verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerificationResult {
    /// Whether the proof checked out against the key and signals.
    pub is_valid: bool,
}

/// Verifies forward (commitment) proofs.
pub struct ZkProofVerifier {
    prover: CommitmentClient,
    keys: Arc<VerificationKeySource>,
    outcomes: Mutex<Cache<bool>>,
}

impl ZkProofVerifier {
    /// Creates a verifier checking proofs through `prover` with keys from
    /// `keys`.
    pub fn new(prover: CommitmentClient, keys: Arc<VerificationKeySource>) -> Self {
        ZkProofVerifier {
            prover,
            keys,
            outcomes: Mutex::new(Cache::new(OUTCOME_CACHE_CAPACITY)),
        }
    }

    /// Verifies that `proof_json` binds `commitment` to the subject and
    /// issuer DIDs.
    ///
    /// Public signals are `[subjectDidHash, issuerDidHash, commitment]` in
    /// that order. Outcomes are cached by the signal tuple, so repeat
    /// verifications of the same proof skip the prover round-trip.
    pub async fn verify(
        &self,
        proof_json: &str,
        commitment: &str,
        issuer_did: &str,
        subject_did: &str,
    ) -> Result<VerificationResult> {
        let signals = vec![
            hash_to_field_dec(subject_did),
            hash_to_field_dec(issuer_did),
            commitment.to_string(),
        ];
        let key = signals.join("|");
        {
            let cache = self.outcomes.lock().unwrap();
            if let Some(cached) = cache.get(&key) {
                debug!("verification cache hit for commitment {}", commitment);
                return Ok(VerificationResult { is_valid: *cached });
            }
        }

        let verification_key = self.keys.forward().await?.clone();
        let is_valid = self
            .prover
            .check_proof(&verification_key, &signals, proof_json)
            .await?;
        self.outcomes.lock().unwrap().insert(key, is_valid);
        Ok(VerificationResult { is_valid })
    }
}

/// Verifies revocation (non-membership) proofs.
pub struct RevocationVerifier {
    prover: CommitmentClient,
    keys: Arc<VerificationKeySource>,
    outcomes: Mutex<Cache<bool>>,
}

impl RevocationVerifier {
    /// Creates a verifier checking revocation proofs through `prover`.
    pub fn new(prover: CommitmentClient, keys: Arc<VerificationKeySource>) -> Self {
        RevocationVerifier {
            prover,
            keys,
            outcomes: Mutex::new(Cache::new(OUTCOME_CACHE_CAPACITY)),
        }
    }

    /// Verifies a revocation proof for `commitment`.
    ///
    /// Signals are taken from the proof document's own `publicSignals`
    /// field when present; proofs without embedded signals are checked
    /// against the bare commitment. Outcomes are cached by the proof
    /// document.
    pub async fn verify_revocation(
        &self,
        proof_json: &str,
        commitment: &str,
    ) -> Result<VerificationResult> {
        {
            let cache = self.outcomes.lock().unwrap();
            if let Some(cached) = cache.get(proof_json) {
                return Ok(VerificationResult { is_valid: *cached });
            }
        }

        let signals = extract_signals(proof_json)
            .unwrap_or_else(|| vec![commitment.to_string()]);
        let verification_key = self.keys.revocation().await?.clone();
        let is_valid = self
            .prover
            .check_proof(&verification_key, &signals, proof_json)
            .await?;
        self.outcomes
            .lock()
            .unwrap()
            .insert(proof_json.to_string(), is_valid);
        Ok(VerificationResult { is_valid })
    }
}

/// Pulls the `publicSignals` array out of a proof document, if it carries
/// one.
fn extract_signals(proof_json: &str) -> Option<Vec<String>> {
    let document: Value = serde_json::from_str(proof_json).ok()?;
    let signals = document.get("publicSignals")?.as_array()?;
    let parsed: Vec<String> = signals
        .iter()
        .filter_map(|s| s.as_str().map(str::to_string))
        .collect();
    if parsed.is_empty() {
        None
    } else {
        Some(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{mock, Matcher};

    const ISSUER_DID: &str = "did:pkh:eip155:11155111:0x00000000000000000000000000000000000000de";
    const SUBJECT_DID: &str = "did:pkh:eip155:11155111:0x00000000000000000000000000000000000000ab";

    fn key_source() -> Arc<VerificationKeySource> {
        let base = mockito::server_url();
        Arc::new(VerificationKeySource::new(
            format!("{}/keys/forward.json", base),
            format!("{}/keys/revocation.json", base),
        ))
    }

    fn mock_key(path: &str) -> mockito::Mock {
        mock("GET", path)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"protocol":"groth16","curve":"bn128"}"#)
            .create()
    }

    #[tokio::test]
    async fn test_verify_caches_outcome() {
        let _key = mock_key("/keys/forward.json");
        // A unique commitment value keys this test's traffic; the single
        // expected hit proves the second verification came from the cache.
        let commitment = "777000111";
        let check = mock("POST", "/api/proof/checkproof")
            .match_body(Matcher::Regex(commitment.to_string()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("true")
            .expect(1)
            .create();

        let verifier = ZkProofVerifier::new(
            CommitmentClient::new(mockito::server_url()),
            key_source(),
        );

        let first = verifier
            .verify(r#"{"pi_a":[]}"#, commitment, ISSUER_DID, SUBJECT_DID)
            .await
            .unwrap();
        assert!(first.is_valid);

        let second = verifier
            .verify(r#"{"pi_a":[]}"#, commitment, ISSUER_DID, SUBJECT_DID)
            .await
            .unwrap();
        assert!(second.is_valid);
        check.assert();
    }

    #[tokio::test]
    async fn test_verify_reports_invalid_proof() {
        let _key = mock_key("/keys/forward.json");
        let commitment = "777000222";
        let _check = mock("POST", "/api/proof/checkproof")
            .match_body(Matcher::Regex(commitment.to_string()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("false")
            .create();

        let verifier = ZkProofVerifier::new(
            CommitmentClient::new(mockito::server_url()),
            key_source(),
        );
        let result = verifier
            .verify(r#"{"pi_a":[]}"#, commitment, ISSUER_DID, SUBJECT_DID)
            .await
            .unwrap();
        assert!(!result.is_valid);
    }

    #[tokio::test]
    async fn test_revocation_uses_embedded_signals() {
        let _key = mock_key("/keys/revocation.json");
        let _check = mock("POST", "/api/proof/checkproof")
            .match_body(Matcher::Regex("888000111".to_string()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("true")
            .create();

        let verifier = RevocationVerifier::new(
            CommitmentClient::new(mockito::server_url()),
            key_source(),
        );
        let proof = r#"{"pi_a":[],"publicSignals":["888000111","5"]}"#;
        let result = verifier
            .verify_revocation(proof, "ignored-when-embedded")
            .await
            .unwrap();
        assert!(result.is_valid);
    }

    #[tokio::test]
    async fn test_revocation_falls_back_to_commitment_signal() {
        let _key = mock_key("/keys/revocation.json");
        let commitment = "888000222";
        let _check = mock("POST", "/api/proof/checkproof")
            .match_body(Matcher::Regex(commitment.to_string()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("true")
            .create();

        let verifier = RevocationVerifier::new(
            CommitmentClient::new(mockito::server_url()),
            key_source(),
        );
        let result = verifier
            .verify_revocation(r#"{"pi_b":[]}"#, commitment)
            .await
            .unwrap();
        assert!(result.is_valid);
    }
}
