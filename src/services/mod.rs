// src/services/mod.rs
//! Credential lifecycle services: building, committing, publishing and
//! verifying.

pub mod builder;
pub mod commitment;
pub mod publisher;
pub mod verifier;
