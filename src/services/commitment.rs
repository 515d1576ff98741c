// src/services/commitment.rs
//! Credential commitment pipeline.
//!
//! Turns a plaintext claim into a credential, a hiding commitment and a
//! zero-knowledge proof binding issuer, subject and claim without
//! revealing the claim. The commitment is requested from the external
//! prover (never computed locally), signed by the issuer and embedded into
//! the credential subject before the credential is issued and persisted.

use crate::error::{Error, Result};
use crate::models::credential::{Credential, CredentialProof};
use crate::models::did::Did;
use crate::prover::client::{CommitmentClient, ZkProof};
use crate::storage::credential_store::CredentialStore;
use crate::utils::cache::Cache;
use crate::utils::crypto::hash_to_field_dec;
use crate::utils::serialization::canonical_json;
use crate::wallet::key_management::MessageSigner;
use chrono::Utc;
use ethers::utils::hex;
use log::{debug, info};
use std::sync::Mutex;

/// Default capacity of the credential lookup cache.
const LOOKUP_CACHE_CAPACITY: usize = 256;

/// A credential together with the proof produced for its commitment.
#[derive(Debug, Clone)]
pub struct CreatedCredential {
    /// The issued, signed credential.
    pub credential: Credential,
    /// Proof binding issuer, subject and claim to the commitment.
    pub proof: ZkProof,
}

/// Orchestrates hashing, commitment retrieval, proof retrieval, issuer
/// signing and persistence.
pub struct CredentialCommitmentService<S: CredentialStore, K: MessageSigner> {
    prover: CommitmentClient,
    store: Mutex<S>,
    signer: K,
    lookup_cache: Mutex<Cache<Credential>>,
}

fn lookup_key(entity_id: &str, display_name: &str, holder: &Did) -> String {
    format!(
        "{}|{}|{}",
        entity_id.to_lowercase(),
        display_name,
        holder.as_str()
    )
}

impl<S: CredentialStore, K: MessageSigner> CredentialCommitmentService<S, K> {
    /// Creates the service with the issuer signer injected.
    pub fn new(prover: CommitmentClient, store: S, signer: K) -> Self {
        Self::with_cache_capacity(prover, store, signer, LOOKUP_CACHE_CAPACITY)
    }

    /// Like [`new`](Self::new) with an explicit lookup cache capacity.
    pub fn with_cache_capacity(
        prover: CommitmentClient,
        store: S,
        signer: K,
        cache_capacity: usize,
    ) -> Self {
        CredentialCommitmentService {
            prover,
            store: Mutex::new(store),
            signer,
            lookup_cache: Mutex::new(Cache::new(cache_capacity)),
        }
    }

    /// Runs the full commitment pipeline for a claim.
    ///
    /// Stamps the entity identity onto the subject, derives the three
    /// domain-separated hashes, obtains commitment and proof from the
    /// prover, signs the commitment, issues the credential under the
    /// issuer DID and persists it keyed by
    /// `entity_id + display_name + holder DID`.
    ///
    /// Missing inputs abort the whole operation with
    /// [`Error::MissingContext`]; nothing is persisted on failure.
    pub async fn create_credential(
        &self,
        claim: Credential,
        entity_id: &str,
        display_name: &str,
        subject_did: &Did,
    ) -> Result<CreatedCredential> {
        let mut missing: Vec<&'static str> = Vec::new();
        if claim.issuer.is_empty() {
            missing.push("issuer");
        }
        if claim.credential_subject.id.is_empty() {
            missing.push("credentialSubject");
        }
        if entity_id.is_empty() {
            missing.push("entityId");
        }
        if display_name.is_empty() {
            missing.push("displayName");
        }
        if subject_did.is_empty() {
            missing.push("subjectDid");
        }
        if !missing.is_empty() {
            return Err(Error::MissingContext(missing));
        }

        // Stamp the entity identity onto the subject before hashing so the
        // commitment binds it.
        let mut subject = claim.credential_subject.clone();
        subject.entity_id = Some(entity_id.to_string());
        subject.display_name = Some(display_name.to_string());

        let vc_hash = hash_to_field_dec(&canonical_json(&subject)?);
        let issuer_hash = hash_to_field_dec(claim.issuer.as_str());
        let did_hash = hash_to_field_dec(subject_did.as_str());

        let commitment = self
            .prover
            .request_commitment(&issuer_hash, &did_hash, &vc_hash)
            .await?;
        let inputs = [issuer_hash, did_hash, vc_hash];
        let proof = self
            .prover
            .request_proof(&inputs, subject_did.as_str(), &commitment)
            .await?;

        let signature = self.signer.sign_message(commitment.as_bytes())?;
        subject.commitment = Some(commitment);
        subject.commitment_signature = Some(format!("0x{}", hex::encode(&signature)));

        let mut credential = claim;
        credential.credential_subject = subject;
        credential.issuance_date = Utc::now().to_rfc3339();

        // Issuer signature over the canonical document, before the proof
        // envelope is attached.
        let document_signature = self
            .signer
            .sign_message(canonical_json(&credential)?.as_bytes())?;
        credential.proof = Some(CredentialProof {
            proof_type: "EcdsaSecp256k1Signature2019".to_string(),
            created: Utc::now().to_rfc3339(),
            verification_method: format!("{}#controller", credential.issuer),
            proof_value: format!("0x{}", hex::encode(&document_signature)),
        });

        let holder = {
            let mut store = self.store.lock().unwrap();
            let holder = store.holder_did()?;
            store.save(credential.clone())?;
            holder
        };
        self.lookup_cache.lock().unwrap().insert(
            lookup_key(entity_id, display_name, &holder),
            credential.clone(),
        );
        info!(
            "issued credential for entity {} ({})",
            entity_id, display_name
        );

        Ok(CreatedCredential { credential, proof })
    }

    /// Looks up a stored credential by entity id and optional display name.
    ///
    /// Checks the bounded lookup cache first, then falls back to a full
    /// scan of the store with a case-insensitive `entityId` match. Scan
    /// hits populate the cache.
    pub fn get_credential(
        &self,
        entity_id: &str,
        display_name: Option<&str>,
    ) -> Result<Option<Credential>> {
        let store = self.store.lock().unwrap();
        let holder = store.holder_did()?;
        let key = lookup_key(entity_id, display_name.unwrap_or(""), &holder);

        {
            let cache = self.lookup_cache.lock().unwrap();
            if let Some(hit) = cache.get(&key) {
                debug!("credential lookup cache hit for {}", entity_id);
                return Ok(Some(hit.clone()));
            }
        }

        let found = store.query()?.into_iter().find(|credential| {
            let subject = &credential.credential_subject;
            let entity_matches = subject
                .entity_id
                .as_deref()
                .map_or(false, |id| id.eq_ignore_ascii_case(entity_id));
            let name_matches = match display_name {
                Some(name) => subject.display_name.as_deref() == Some(name),
                None => true,
            };
            entity_matches && name_matches
        });

        if let Some(credential) = &found {
            self.lookup_cache
                .lock()
                .unwrap()
                .insert(key, credential.clone());
        }
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::did::Did;
    use crate::services::builder::{ClaimKind, CredentialBuilder};
    use crate::storage::credential_store::MemoryCredentialStore;
    use crate::utils::crypto::hash_to_field;
    use crate::wallet::key_management::KeyManager;
    use mockito::{mock, Matcher};

    const ISSUER_DID: &str = "did:pkh:eip155:11155111:0x00000000000000000000000000000000000000de";
    const SUBJECT_DID: &str = "did:pkh:eip155:11155111:0x00000000000000000000000000000000000000ab";

    fn organization_claim() -> Credential {
        CredentialBuilder::new(ClaimKind::Organization)
            .issuer(Did::new(ISSUER_DID))
            .subject(Did::new(SUBJECT_DID))
            .field("name", "Acme Inc.")
            .build()
            .unwrap()
    }

    fn service() -> CredentialCommitmentService<MemoryCredentialStore, KeyManager> {
        CredentialCommitmentService::new(
            CommitmentClient::new(mockito::server_url()),
            MemoryCredentialStore::new(Did::new("did:example:holder")),
            KeyManager::new(),
        )
    }

    fn mock_prover() -> (mockito::Mock, mockito::Mock) {
        let issuer_hash = hash_to_field(ISSUER_DID).to_str_radix(10);
        let commitment = mock("POST", "/api/proof/commitment")
            .match_body(Matcher::PartialJsonString(format!(
                r#"{{"issuerDidHash":"{}"}}"#,
                issuer_hash
            )))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"commitment":"123456789"}"#)
            .create();
        let proof = mock("POST", "/api/proof/create")
            .match_body(Matcher::PartialJsonString(
                r#"{"commitment":"123456789"}"#.to_string(),
            ))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"proofJson":"{\"pi_a\":[]}","publicSignals":["1","2","3"]}"#)
            .create();
        (commitment, proof)
    }

    #[tokio::test]
    async fn test_create_credential_scenario() {
        let _ = env_logger::builder().is_test(true).try_init();
        let (_commitment_mock, _proof_mock) = mock_prover();
        let service = service();

        let created = service
            .create_credential(
                organization_claim(),
                "acme",
                "Acme Inc.",
                &Did::new(SUBJECT_DID),
            )
            .await
            .unwrap();

        // The three hash inputs are distinct and non-zero; the body matcher
        // above already pinned the issuer hash.
        let issuer_hash = hash_to_field(ISSUER_DID);
        let subject_hash = hash_to_field(SUBJECT_DID);
        assert_ne!(issuer_hash, subject_hash);

        let subject = &created.credential.credential_subject;
        assert_eq!(
            subject.claims["name"],
            serde_json::Value::String("Acme Inc.".to_string())
        );
        assert_eq!(subject.entity_id.as_deref(), Some("acme"));
        assert_eq!(subject.commitment.as_deref(), Some("123456789"));
        assert!(subject
            .commitment_signature
            .as_deref()
            .unwrap()
            .starts_with("0x"));
        assert!(subject.is_committed());
        assert!(created.credential.proof.is_some());
        assert_eq!(created.proof.proof_json, r#"{"pi_a":[]}"#);
        assert_eq!(created.proof.public_signals, vec!["1", "2", "3"]);
    }

    #[tokio::test]
    async fn test_round_trip_through_store() {
        let (_c, _p) = mock_prover();
        let service = service();

        let created = service
            .create_credential(
                organization_claim(),
                "acme",
                "Acme Inc.",
                &Did::new(SUBJECT_DID),
            )
            .await
            .unwrap();

        let reloaded = service
            .get_credential("acme", Some("Acme Inc."))
            .unwrap()
            .expect("credential should be stored");
        assert_eq!(
            reloaded.credential_subject.commitment,
            created.credential.credential_subject.commitment
        );
        assert_eq!(
            reloaded.credential_subject.commitment_signature,
            created.credential.credential_subject.commitment_signature
        );

        // Case-insensitive entity match also resolves.
        let upper = service.get_credential("ACME", None).unwrap();
        assert!(upper.is_some());
    }

    #[tokio::test]
    async fn test_missing_context_is_explicit() {
        let service = service();
        let err = service
            .create_credential(organization_claim(), "", "Acme Inc.", &Did::new(SUBJECT_DID))
            .await
            .unwrap_err();
        match err {
            Error::MissingContext(fields) => assert_eq!(fields, vec!["entityId"]),
            other => panic!("expected MissingContext, got {:?}", other),
        }
    }
}
