// src/revocation/mod.rs
//! Merkle-backed revocation tracking.

pub mod merkle;
pub mod registry;
