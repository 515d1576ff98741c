// src/models/mod.rs
//! Data structures shared by the services.

pub mod account;
pub mod attestation;
pub mod credential;
pub mod delegation;
pub mod did;
