// src/models/credential.rs
//! Verifiable Credential data model.
//!
//! Defines the W3C-style credential envelope used throughout the system.
//! A credential that has completed the commitment pipeline carries both a
//! `commitment` and a `commitmentSignature` in its subject; a freshly built
//! claim carries neither.

use crate::models::did::Did;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A Verifiable Credential.
///
/// Serialization follows the W3C Verifiable Credentials Data Model field
/// names (`@context`, `type`, `issuanceDate`, `credentialSubject`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credential {
    /// JSON-LD context URIs.
    #[serde(rename = "@context")]
    pub context: Vec<String>,

    /// Credential types, always starting with "VerifiableCredential".
    #[serde(rename = "type")]
    pub credential_type: Vec<String>,

    /// DID of the issuing authority.
    pub issuer: Did,

    /// RFC 3339 issuance timestamp, set when the credential is issued.
    #[serde(rename = "issuanceDate")]
    pub issuance_date: String,

    /// The entity the claims are about.
    #[serde(rename = "credentialSubject")]
    pub credential_subject: CredentialSubject,

    /// Issuer signature envelope, present once the credential is issued.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proof: Option<CredentialProof>,
}

/// The subject of a credential: a DID plus claim fields.
///
/// `entity_id` is immutable once set and, together with `display_name`,
/// forms the lookup key for stored credentials. `commitment` and
/// `commitment_signature` are present iff the commitment pipeline has run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CredentialSubject {
    /// DID of the subject.
    pub id: Did,

    /// Stable identifier of the entity the claim is about.
    #[serde(rename = "entityId", skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,

    /// Human-readable name used together with `entity_id` for lookups.
    #[serde(rename = "displayName", skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    /// Hiding commitment over the claim, issued by the proving service.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commitment: Option<String>,

    /// Issuer ECDSA signature over the commitment value, hex encoded.
    #[serde(
        rename = "commitmentSignature",
        skip_serializing_if = "Option::is_none"
    )]
    pub commitment_signature: Option<String>,

    /// Claim-kind specific fields (name, url, domain, ...).
    #[serde(flatten)]
    pub claims: Map<String, Value>,
}

impl CredentialSubject {
    /// A bare subject for the given DID with no claims attached.
    pub fn new(id: Did) -> Self {
        CredentialSubject {
            id,
            entity_id: None,
            display_name: None,
            commitment: None,
            commitment_signature: None,
            claims: Map::new(),
        }
    }

    /// True once the commitment pipeline has stamped this subject.
    pub fn is_committed(&self) -> bool {
        self.commitment.is_some() && self.commitment_signature.is_some()
    }
}

/// Issuer signature over the canonical credential document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CredentialProof {
    /// Signature suite identifier.
    #[serde(rename = "type")]
    pub proof_type: String,

    /// RFC 3339 creation timestamp.
    pub created: String,

    /// Verification method (issuer DID fragment).
    #[serde(rename = "verificationMethod")]
    pub verification_method: String,

    /// Hex-encoded compact ECDSA signature.
    #[serde(rename = "proofValue")]
    pub proof_value: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_committed_state_requires_both_fields() {
        let mut subject = CredentialSubject::new(Did::new("did:example:subject"));
        assert!(!subject.is_committed());

        subject.commitment = Some("42".to_string());
        assert!(!subject.is_committed());

        subject.commitment_signature = Some("0xdead".to_string());
        assert!(subject.is_committed());
    }

    #[test]
    fn test_serde_uses_w3c_field_names() {
        let mut subject = CredentialSubject::new(Did::new("did:example:subject"));
        subject.entity_id = Some("acme".to_string());
        let credential = Credential {
            context: vec!["https://www.w3.org/2018/credentials/v1".to_string()],
            credential_type: vec!["VerifiableCredential".to_string()],
            issuer: Did::new("did:example:issuer"),
            issuance_date: "2024-01-01T00:00:00Z".to_string(),
            credential_subject: subject,
            proof: None,
        };

        let json = serde_json::to_value(&credential).unwrap();
        assert!(json.get("@context").is_some());
        assert!(json.get("credentialSubject").is_some());
        assert_eq!(json["credentialSubject"]["entityId"], "acme");
        assert!(json.get("proof").is_none());
    }
}
