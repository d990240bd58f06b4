//! In-memory account storage.

use std::sync::Mutex;

use async_trait::async_trait;
use synthlab_auth::domain::account::UserAccount;
use synthlab_auth::repository::UserRepository;
use synthlab_core::error::DomainError;
use uuid::Uuid;

/// A user repository backed by a `Vec`.
#[derive(Debug, Default)]
pub struct InMemoryUserRepository {
    accounts: Mutex<Vec<UserAccount>>,
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_login(&self, login: &str) -> Result<Option<UserAccount>, DomainError> {
        Ok(self
            .accounts
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.login == login)
            .cloned())
    }

    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<UserAccount>, DomainError> {
        Ok(self
            .accounts
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.id == user_id)
            .cloned())
    }

    async fn insert(&self, account: &UserAccount) -> Result<(), DomainError> {
        let mut accounts = self.accounts.lock().unwrap();
        if accounts.iter().any(|a| a.login == account.login) {
            return Err(DomainError::Validation(format!(
                "login {} is already taken",
                account.login
            )));
        }
        accounts.push(account.clone());
        Ok(())
    }

    async fn update(&self, account: &UserAccount) -> Result<(), DomainError> {
        let mut accounts = self.accounts.lock().unwrap();
        if accounts
            .iter()
            .any(|a| a.login == account.login && a.id != account.id)
        {
            return Err(DomainError::Validation(format!(
                "login {} is already taken",
                account.login
            )));
        }
        let stored = accounts
            .iter_mut()
            .find(|a| a.id == account.id)
            .ok_or(DomainError::UserNotFound(account.id))?;
        stored.login.clone_from(&account.login);
        stored.display_name.clone_from(&account.display_name);
        Ok(())
    }
}
