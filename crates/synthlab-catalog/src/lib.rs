//! SynthLab — Reaction Catalog bounded context.
//!
//! Owns the reference data that synthesis orders are assembled from: each
//! reaction pairs a starting material with a result material and carries the
//! physical constants the result-volume formula reads.

pub mod application;
pub mod domain;
pub mod repository;
