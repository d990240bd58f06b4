//! User accounts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use synthlab_core::error::DomainError;
use synthlab_core::identity::{CallerIdentity, Role};
use uuid::Uuid;

const MIN_PASSWORD_LEN: usize = 6;

/// A registered user.
#[derive(Debug, Clone, PartialEq)]
pub struct UserAccount {
    /// Unique identifier.
    pub id: Uuid,
    /// Login name, unique across accounts.
    pub login: String,
    /// Name shown to other users.
    pub display_name: String,
    /// Output of a [`PasswordHasher`](crate::password::PasswordHasher).
    pub password_hash: String,
    /// Whether the account holds the moderator role.
    pub is_moderator: bool,
    /// When the account was registered.
    pub created_at: DateTime<Utc>,
}

impl UserAccount {
    /// The identity tokens for this account carry.
    #[must_use]
    pub fn identity(&self) -> CallerIdentity {
        CallerIdentity {
            user_id: self.id,
            role: if self.is_moderator {
                Role::Moderator
            } else {
                Role::User
            },
        }
    }

    /// Applies `patch` to the login and display name. Leading and trailing
    /// whitespace is trimmed.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the patch is empty, the new login
    /// is malformed, or the new display name is blank. The account is left
    /// unchanged on error.
    pub fn apply_profile_patch(&mut self, patch: &ProfilePatch) -> Result<(), DomainError> {
        if patch.is_empty() {
            return Err(DomainError::Validation("no fields to update".to_owned()));
        }
        let login = match patch.login.as_deref().map(str::trim) {
            Some(login) => {
                validate_login(login)?;
                login.to_owned()
            }
            None => self.login.clone(),
        };
        let display_name = match patch.display_name.as_deref().map(str::trim) {
            Some("") => {
                return Err(DomainError::Validation(
                    "display name must not be blank".to_owned(),
                ));
            }
            Some(name) => name.to_owned(),
            None => self.display_name.clone(),
        };
        self.login = login;
        self.display_name = display_name;
        Ok(())
    }

    /// The public view of this account.
    #[must_use]
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            login: self.login.clone(),
            display_name: self.display_name.clone(),
            is_moderator: self.is_moderator,
        }
    }
}

/// Public account details.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserProfile {
    /// Unique identifier.
    pub id: Uuid,
    /// Login name.
    pub login: String,
    /// Display name.
    pub display_name: String,
    /// Whether the user is a moderator.
    pub is_moderator: bool,
}

/// Partial update of an account's public details. `None` leaves the field
/// unchanged.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProfilePatch {
    /// New login name.
    pub login: Option<String>,
    /// New display name.
    pub display_name: Option<String>,
}

impl ProfilePatch {
    /// Returns `true` if the patch changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.login.is_none() && self.display_name.is_none()
    }
}

fn validate_login(login: &str) -> Result<(), DomainError> {
    if login.trim().is_empty() {
        return Err(DomainError::Validation("login is required".to_owned()));
    }
    if login.chars().any(char::is_whitespace) {
        return Err(DomainError::Validation(
            "login must not contain whitespace".to_owned(),
        ));
    }
    Ok(())
}

/// Checks registration input.
///
/// # Errors
///
/// Returns `DomainError::Validation` for a blank login or a password shorter
/// than six characters.
pub fn validate_registration(login: &str, password: &str) -> Result<(), DomainError> {
    validate_login(login)?;
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(DomainError::Validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}
