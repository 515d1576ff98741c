// src/models/attestation.rs
//! Attestation data model.
//!
//! An attestation is the published, schema-typed on-chain record derived
//! from an off-chain credential. At most one attestation exists per
//! `(attester DID, schema, entityId, displayName)` tuple; the ledger does
//! not enforce this, so the publisher checks before creating.

use crate::models::did::Did;
use ethers::types::{Address, H256};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// An attestation payload about to be published on-chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attestation {
    /// DID of the root authority making the attestation.
    pub attester: Did,

    /// Stable identifier of the attested entity.
    #[serde(rename = "entityId")]
    pub entity_id: String,

    /// Human-readable name; part of the uniqueness tuple.
    #[serde(rename = "displayName")]
    pub display_name: String,

    /// Claim class (e.g. "organization", "account").
    pub class: String,

    /// Claim category within the class.
    pub category: String,

    /// Hash of the underlying claim document.
    pub hash: String,

    /// Commitment carried over from the credential subject.
    pub vccomm: String,

    /// Issuer signature over the commitment.
    pub vcsig: String,

    /// Issuer DID of the underlying credential.
    pub vciss: String,

    /// Optional credential identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vcid: Option<String>,

    /// Serialized zero-knowledge proof.
    pub proof: String,

    /// Claim-specific extra fields.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

/// An attestation as read back from the on-chain registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttestationRecord {
    /// Registry-assigned unique identifier.
    pub uid: H256,
    /// Address of the attesting authority.
    pub attester: Address,
    /// Schema the attestation was written under.
    pub schema: H256,
    /// Entity identifier from the payload.
    pub entity_id: String,
    /// Display name from the payload.
    pub display_name: String,
}
