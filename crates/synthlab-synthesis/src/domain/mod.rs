//! Domain layer for the Synthesis Ordering context.

pub mod aggregates;
pub mod commands;
pub mod lifecycle;
pub mod result_volume;
pub mod status;
