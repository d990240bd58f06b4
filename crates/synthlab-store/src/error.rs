use synthlab_core::error::DomainError;
use tracing::error;

/// Maps a driver error to `DomainError::Infrastructure`, logging it under
/// `operation`.
pub(crate) fn db_error(operation: &'static str) -> impl FnOnce(sqlx::Error) -> DomainError {
    move |e| {
        error!(operation, error = %e, "database call failed");
        DomainError::Infrastructure(format!("{operation} failed: {e}"))
    }
}

/// Maps a column that holds a value the domain cannot represent.
pub(crate) fn corrupt(column: &'static str, detail: impl std::fmt::Display) -> DomainError {
    error!(column, %detail, "stored value rejected");
    DomainError::Infrastructure(format!("column {column} holds an invalid value: {detail}"))
}
