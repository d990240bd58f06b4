//! Domain layer for the Reaction Catalog context.

pub mod commands;
pub mod reaction;
