//! SynthLab Core — shared domain abstractions.
//!
//! This crate defines the error type, caller identity, clock and deadline
//! helpers that every bounded context depends on. It contains no
//! infrastructure code.

pub mod clock;
pub mod command;
pub mod deadline;
pub mod error;
pub mod identity;
