//! Adapters behind the SynthLab persistence ports.
//!
//! Every repository here runs against a shared `PgPool`; the schema lives in
//! the workspace `migrations/` directory and is applied by [`db::migrate`].

pub mod db;
mod error;
pub mod fs_image_store;
pub mod pg_reaction_repository;
pub mod pg_revocation_store;
pub mod pg_synthesis_repository;
pub mod pg_user_repository;
