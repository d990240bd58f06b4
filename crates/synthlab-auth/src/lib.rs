//! SynthLab — Accounts & Access bounded context.
//!
//! Issues and verifies bearer tokens, keeps the revocation set that makes
//! logout effective before a token's natural expiry, and manages user
//! accounts.

pub mod application;
pub mod domain;
pub mod password;
pub mod repository;
pub mod revocation;
pub mod token;
