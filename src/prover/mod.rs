// src/prover/mod.rs
//! Clients for the external proving service.

pub mod client;
pub mod keys;
