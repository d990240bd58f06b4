//! Application layer for the Reaction Catalog context.

pub mod command_handlers;
pub mod context;
pub mod query_handlers;
