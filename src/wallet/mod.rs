// src/wallet/mod.rs
//! Cryptographic key operations.

pub mod key_management;
