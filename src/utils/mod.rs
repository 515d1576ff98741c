// src/utils/mod.rs
//! Helper functions shared across the system.

pub mod cache;
pub mod crypto;
pub mod serialization;
