//! Route modules organized by bounded context.

pub mod health;
pub mod reactions;
pub mod syntheses;
pub mod users;

#[cfg(test)]
pub(crate) mod testing;
