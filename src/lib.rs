// src/lib.rs
//! Verifiable-credential attestation system.
//!
//! Credentials are issued off-chain, bound to hiding commitments produced
//! by an external proving service, and surfaced on-chain as schema-typed
//! attestations published through gas-sponsored smart-account operations.
//! Verification delegates zero-knowledge checking back to the prover;
//! revocation is tracked in a Merkle registry whose roots are stable
//! functions of the revoked set.
//!
//! The main entry points are:
//! - [`services::builder::CredentialBuilder`] for assembling typed claims,
//! - [`services::commitment::CredentialCommitmentService`] for the full
//!   issue-and-commit pipeline,
//! - [`services::publisher::AttestationPublisher`] for on-chain publishing,
//! - [`services::verifier::ZkProofVerifier`] and
//!   [`services::verifier::RevocationVerifier`] for proof checks,
//! - [`blockchain::provisioner::SmartAccountProvisioner`] and
//!   [`blockchain::executor::SponsoredExecutor`] for account abstraction.

pub mod blockchain;
pub mod error;
pub mod models;
pub mod prover;
pub mod revocation;
pub mod services;
pub mod storage;
pub mod utils;
pub mod wallet;

pub use error::{Error, Result};
pub use models::credential::{Credential, CredentialProof, CredentialSubject};
pub use models::did::Did;
pub use prover::client::{CommitmentClient, ZkProof};
