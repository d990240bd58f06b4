//! The shape every state-changing request takes.

use uuid::Uuid;

/// A request to change state, carried from the HTTP layer into a handler.
pub trait Command: Send + Sync + std::fmt::Debug {
    /// Dotted name used in log fields, e.g. `synthesis.form`.
    fn command_type(&self) -> &'static str;

    /// Ties every log line of one request together.
    fn correlation_id(&self) -> Uuid;

    /// The user on whose behalf the command runs, when one is known.
    fn actor_id(&self) -> Option<Uuid> {
        None
    }
}
