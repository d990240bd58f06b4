//! Domain layer for the Accounts & Access context.

pub mod account;
pub mod commands;
