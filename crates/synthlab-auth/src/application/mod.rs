//! Application layer for the Accounts & Access context.

pub mod command_handlers;
pub mod query_handlers;
