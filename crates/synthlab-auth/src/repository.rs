//! Persistence port for user accounts.

use async_trait::async_trait;
use synthlab_core::error::DomainError;
use uuid::Uuid;

use crate::domain::account::UserAccount;

/// Storage for user accounts.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Looks up an account by login name.
    async fn find_by_login(&self, login: &str) -> Result<Option<UserAccount>, DomainError>;

    /// Looks up an account by identifier.
    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<UserAccount>, DomainError>;

    /// Inserts a new account.
    ///
    /// Returns `DomainError::Validation` if the login is already taken.
    async fn insert(&self, account: &UserAccount) -> Result<(), DomainError>;

    /// Stores the login and display name of an existing account.
    ///
    /// Returns `DomainError::UserNotFound` if the account does not exist and
    /// `DomainError::Validation` if the login belongs to another account.
    async fn update(&self, account: &UserAccount) -> Result<(), DomainError>;
}
