//! `PostgreSQL` implementation of the `UserRepository` trait.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use synthlab_auth::domain::account::UserAccount;
use synthlab_auth::repository::UserRepository;
use synthlab_core::error::DomainError;
use uuid::Uuid;

use crate::error::db_error;

/// PostgreSQL-backed account storage.
#[derive(Debug, Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    /// Creates a new `PgUserRepository`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn account_from_row(row: &PgRow) -> Result<UserAccount, sqlx::Error> {
    Ok(UserAccount {
        id: row.try_get("id")?,
        login: row.try_get("login")?,
        display_name: row.try_get("display_name")?,
        password_hash: row.try_get("password_hash")?,
        is_moderator: row.try_get("is_moderator")?,
        created_at: row.try_get("created_at")?,
    })
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_login(&self, login: &str) -> Result<Option<UserAccount>, DomainError> {
        sqlx::query(
            "SELECT id, login, display_name, password_hash, is_moderator, created_at \
             FROM users WHERE login = $1",
        )
        .bind(login)
        .fetch_optional(&self.pool)
        .await
        .and_then(|row| row.as_ref().map(account_from_row).transpose())
        .map_err(db_error("user lookup"))
    }

    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<UserAccount>, DomainError> {
        sqlx::query(
            "SELECT id, login, display_name, password_hash, is_moderator, created_at \
             FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .and_then(|row| row.as_ref().map(account_from_row).transpose())
        .map_err(db_error("user lookup"))
    }

    async fn insert(&self, account: &UserAccount) -> Result<(), DomainError> {
        let result = sqlx::query(
            "INSERT INTO users (id, login, display_name, password_hash, is_moderator, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(account.id)
        .bind(&account.login)
        .bind(&account.display_name)
        .bind(&account.password_hash)
        .bind(account.is_moderator)
        .bind(account.created_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(
                DomainError::Validation(format!("login {} is already taken", account.login)),
            ),
            Err(e) => Err(db_error("user insert")(e)),
        }
    }

    async fn update(&self, account: &UserAccount) -> Result<(), DomainError> {
        let result = sqlx::query("UPDATE users SET login = $2, display_name = $3 WHERE id = $1")
            .bind(account.id)
            .bind(&account.login)
            .bind(&account.display_name)
            .execute(&self.pool)
            .await;

        match result {
            Ok(done) if done.rows_affected() == 0 => Err(DomainError::UserNotFound(account.id)),
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(
                DomainError::Validation(format!("login {} is already taken", account.login)),
            ),
            Err(e) => Err(db_error("user update")(e)),
        }
    }
}
