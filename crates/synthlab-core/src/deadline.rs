//! Bounded waits on external dependencies.
//!
//! Persistence and revocation lookups are awaited with a deadline. An expired
//! deadline becomes `DomainError::Infrastructure` and the operation is not
//! retried: repeating a non-idempotent write such as a quantity increment
//! could double-count.

use std::future::Future;
use std::time::Duration;

use crate::error::DomainError;

/// Awaits `future` for at most `limit`.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` naming `operation` when the deadline
/// elapses, otherwise whatever `future` resolves to.
pub async fn bounded<T, F>(limit: Duration, operation: &str, future: F) -> Result<T, DomainError>
where
    F: Future<Output = Result<T, DomainError>>,
{
    match tokio::time::timeout(limit, future).await {
        Ok(result) => result,
        Err(_) => Err(DomainError::Infrastructure(format!(
            "{operation} timed out after {}ms",
            limit.as_millis()
        ))),
    }
}
