//! Shared test doubles for the SynthLab service.

mod accounts;
mod catalog;
mod clock;
mod orders;
mod revocation;

pub use accounts::InMemoryUserRepository;
pub use catalog::{InMemoryImageStore, InMemoryReactionRepository, sample_reaction};
pub use clock::{FixedClock, fixed_now};
pub use orders::InMemorySynthesisRepository;
pub use revocation::{FailingRevocationStore, InMemoryRevocationStore};
