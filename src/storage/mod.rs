// src/storage/mod.rs
//! Persistence layer.

pub mod credential_store;
