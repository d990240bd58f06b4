//! SynthLab — Synthesis Ordering bounded context.
//!
//! A creator assembles catalog reactions into a draft order, submits it, and a
//! moderator completes or rejects it. This crate holds the order aggregate,
//! the lifecycle state machine, the result-volume formula and the facade that
//! composes them with the catalog and the revocation gate.

pub mod application;
pub mod domain;
pub mod repository;
