// src/blockchain/mod.rs
//! Chain interactions: reads, sponsored execution and provisioning.

pub mod bundler;
pub mod chain_client;
pub mod executor;
pub mod provisioner;
