// src/services/builder.rs
//! Credential builder.
//!
//! Assembles typed credential documents for the supported claim kinds.
//! Each kind carries a fixed schema of required subject fields plus the
//! common W3C envelope; missing fields surface as a typed error rather
//! than a silently incomplete document.

use crate::error::{Error, Result};
use crate::models::credential::{Credential, CredentialSubject};
use crate::models::did::Did;
use chrono::Utc;
use ethers::types::H256;
use ethers::utils::keccak256;
use serde_json::{Map, Value};

/// The claim kinds the system can issue credentials for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClaimKind {
    Organization,
    Individual,
    Account,
    Website,
    Email,
    Social,
    Domain,
    Insurance,
    Agent,
}

impl ClaimKind {
    /// Credential type name placed in the envelope's `type` array.
    pub fn credential_type(&self) -> &'static str {
        match self {
            ClaimKind::Organization => "OrganizationCredential",
            ClaimKind::Individual => "IndividualCredential",
            ClaimKind::Account => "AccountCredential",
            ClaimKind::Website => "WebsiteCredential",
            ClaimKind::Email => "EmailCredential",
            ClaimKind::Social => "SocialCredential",
            ClaimKind::Domain => "DomainCredential",
            ClaimKind::Insurance => "InsuranceCredential",
            ClaimKind::Agent => "AgentCredential",
        }
    }

    /// Subject fields that must be present for this kind.
    pub fn required_fields(&self) -> &'static [&'static str] {
        match self {
            ClaimKind::Organization => &["name"],
            ClaimKind::Individual => &["name"],
            ClaimKind::Account => &["platform", "username"],
            ClaimKind::Website => &["url"],
            ClaimKind::Email => &["email"],
            ClaimKind::Social => &["platform", "handle"],
            ClaimKind::Domain => &["domain"],
            ClaimKind::Insurance => &["policyNumber", "insurer"],
            ClaimKind::Agent => &["domain", "agentAddress"],
        }
    }

    /// Claim class recorded on attestations for this kind.
    pub fn class(&self) -> &'static str {
        match self {
            ClaimKind::Organization => "organization",
            ClaimKind::Individual => "individual",
            ClaimKind::Account => "account",
            ClaimKind::Website => "website",
            ClaimKind::Email => "email",
            ClaimKind::Social => "social",
            ClaimKind::Domain => "domain",
            ClaimKind::Insurance => "insurance",
            ClaimKind::Agent => "agent",
        }
    }

    /// Claim fields in the order they appear in the payload tuple:
    /// lexicographic, matching the key order claim maps iterate in.
    pub fn schema_fields(&self) -> Vec<&'static str> {
        let mut fields = self.required_fields().to_vec();
        fields.sort_unstable();
        fields
    }

    /// Schema definition string the on-chain schema UID is derived from.
    ///
    /// Mirrors the exact tuple the registry adapter encodes: the common
    /// envelope columns with the kind's claim fields spliced in between
    /// `hash` and `vccomm`, in [`schema_fields`](Self::schema_fields)
    /// order.
    fn schema_definition(&self) -> String {
        let fields = self
            .schema_fields()
            .iter()
            .map(|f| format!("string {}", f))
            .collect::<Vec<_>>()
            .join(",");
        format!(
            "string entityId,string displayName,string class,string category,string hash,{},string vccomm,string vcsig,string vciss,string vcid,string proof",
            fields
        )
    }

    /// Schema UID the attestations of this kind are written under.
    pub fn schema_uid(&self) -> H256 {
        H256::from(keccak256(self.schema_definition().as_bytes()))
    }
}

/// Builder for typed credential documents.
#[derive(Debug)]
pub struct CredentialBuilder {
    kind: ClaimKind,
    issuer: Option<Did>,
    subject: Option<Did>,
    fields: Map<String, Value>,
}

impl CredentialBuilder {
    /// Starts a builder for the given claim kind.
    pub fn new(kind: ClaimKind) -> Self {
        CredentialBuilder {
            kind,
            issuer: None,
            subject: None,
            fields: Map::new(),
        }
    }

    /// Sets the issuer DID.
    pub fn issuer(mut self, issuer: Did) -> Self {
        self.issuer = Some(issuer);
        self
    }

    /// Sets the subject DID.
    pub fn subject(mut self, subject: Did) -> Self {
        self.subject = Some(subject);
        self
    }

    /// Adds a claim field.
    pub fn field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Builds the credential document.
    ///
    /// The result has no commitment, signature or issuance proof yet; the
    /// commitment service completes those. Fails with
    /// [`Error::MissingContext`] naming every absent required input.
    pub fn build(self) -> Result<Credential> {
        let mut missing: Vec<&'static str> = Vec::new();
        if self.issuer.as_ref().map_or(true, |d| d.is_empty()) {
            missing.push("issuer");
        }
        if self.subject.as_ref().map_or(true, |d| d.is_empty()) {
            missing.push("subject");
        }
        for field in self.kind.required_fields() {
            if !self.fields.contains_key(*field) {
                missing.push(field);
            }
        }
        if !missing.is_empty() {
            return Err(Error::MissingContext(missing));
        }

        let issuer = self.issuer.expect("checked above");
        let mut subject = CredentialSubject::new(self.subject.expect("checked above"));
        subject.claims = self.fields;

        Ok(Credential {
            context: vec!["https://www.w3.org/2018/credentials/v1".to_string()],
            credential_type: vec![
                "VerifiableCredential".to_string(),
                self.kind.credential_type().to_string(),
            ],
            issuer,
            issuance_date: Utc::now().to_rfc3339(),
            credential_subject: subject,
            proof: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_organization_credential() {
        let credential = CredentialBuilder::new(ClaimKind::Organization)
            .issuer(Did::new("did:pkh:eip155:11155111:0xdef"))
            .subject(Did::new("did:pkh:eip155:11155111:0xabc"))
            .field("name", "Acme Inc.")
            .build()
            .unwrap();

        assert!(credential
            .credential_type
            .contains(&"OrganizationCredential".to_string()));
        assert_eq!(
            credential.credential_subject.claims["name"],
            Value::String("Acme Inc.".to_string())
        );
        assert!(!credential.credential_subject.is_committed());
    }

    #[test]
    fn test_build_reports_all_missing_fields() {
        let err = CredentialBuilder::new(ClaimKind::Social)
            .issuer(Did::new("did:example:issuer"))
            .build()
            .unwrap_err();

        match err {
            Error::MissingContext(fields) => {
                assert!(fields.contains(&"subject"));
                assert!(fields.contains(&"platform"));
                assert!(fields.contains(&"handle"));
            }
            other => panic!("expected MissingContext, got {:?}", other),
        }
    }

    #[test]
    fn test_schema_definition_matches_payload_layout() {
        // The definition must name exactly the columns the registry
        // adapter encodes, claim fields in lexicographic order.
        assert_eq!(
            ClaimKind::Account.schema_definition(),
            "string entityId,string displayName,string class,string category,string hash,\
             string platform,string username,\
             string vccomm,string vcsig,string vciss,string vcid,string proof"
        );
        // Lexicographic ordering also applies when it differs from the
        // declaration order of the required fields.
        assert_eq!(ClaimKind::Social.schema_fields(), vec!["handle", "platform"]);
        assert_eq!(
            ClaimKind::Insurance.schema_fields(),
            vec!["insurer", "policyNumber"]
        );
    }

    #[test]
    fn test_schema_uids_are_distinct_and_stable() {
        assert_eq!(
            ClaimKind::Organization.schema_uid(),
            ClaimKind::Organization.schema_uid()
        );
        assert_ne!(
            ClaimKind::Organization.schema_uid(),
            ClaimKind::Domain.schema_uid()
        );
    }
}
