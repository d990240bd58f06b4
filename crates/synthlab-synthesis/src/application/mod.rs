//! Application layer for the Synthesis Ordering context.

pub mod command_handlers;
pub mod context;
pub mod projection;
pub mod query_handlers;

#[cfg(test)]
mod test_doubles;
