// src/storage/credential_store.rs
//! Credential persistence.
//!
//! The store interface is deliberately small so backends can range from the
//! in-memory implementation below to a remote wallet manager. The holder
//! DID identifies whose wallet the store belongs to and is part of every
//! lookup key.

use crate::error::Result;
use crate::models::credential::Credential;
use crate::models::did::Did;

/// Key-value persistence for credentials.
pub trait CredentialStore {
    /// Persists a credential.
    fn save(&mut self, credential: Credential) -> Result<()>;

    /// Returns all stored credentials.
    fn query(&self) -> Result<Vec<Credential>>;

    /// DID of the wallet holder.
    fn holder_did(&self) -> Result<Did>;
}

/// In-memory credential store.
///
/// Suitable for tests and single-process use; production deployments plug
/// in a persistent backend instead.
#[derive(Debug)]
pub struct MemoryCredentialStore {
    holder: Did,
    credentials: Vec<Credential>,
}

impl MemoryCredentialStore {
    /// Creates an empty store owned by `holder`.
    pub fn new(holder: Did) -> Self {
        MemoryCredentialStore {
            holder,
            credentials: Vec::new(),
        }
    }

    /// Number of stored credentials.
    pub fn len(&self) -> usize {
        self.credentials.len()
    }

    /// True when no credentials are stored.
    pub fn is_empty(&self) -> bool {
        self.credentials.is_empty()
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn save(&mut self, credential: Credential) -> Result<()> {
        self.credentials.push(credential);
        Ok(())
    }

    fn query(&self) -> Result<Vec<Credential>> {
        Ok(self.credentials.clone())
    }

    fn holder_did(&self) -> Result<Did> {
        Ok(self.holder.clone())
    }
}
