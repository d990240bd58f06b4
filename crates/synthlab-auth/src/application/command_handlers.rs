//! Command handlers for the Accounts & Access context.

use synthlab_core::clock::Clock;
use synthlab_core::command::Command;
use synthlab_core::error::DomainError;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::domain::account::{UserAccount, UserProfile, validate_registration};
use crate::domain::commands::{LogIn, LogOut, RegisterUser, UpdateProfile};
use crate::password::PasswordHasher;
use crate::repository::UserRepository;
use crate::revocation::RevocationGate;
use crate::token::{IssuedToken, TokenCodec};

/// Result of a successful login.
#[derive(Debug)]
pub struct LoginOutcome {
    /// The bearer token to present on later requests.
    pub token: IssuedToken,
    /// The account that logged in.
    pub user: UserProfile,
}

/// Handles the `RegisterUser` command. New accounts are never moderators.
///
/// # Errors
///
/// Returns `DomainError::Validation` for malformed input or a taken login.
pub async fn handle_register_user(
    command: &RegisterUser,
    clock: &dyn Clock,
    hasher: &dyn PasswordHasher,
    repo: &dyn UserRepository,
) -> Result<UserProfile, DomainError> {
    let login = command.login.trim();
    validate_registration(login, &command.password)?;

    if repo.find_by_login(login).await?.is_some() {
        return Err(DomainError::Validation(format!(
            "login '{login}' is already taken"
        )));
    }

    let display_name = match command.display_name.trim() {
        "" => login.to_owned(),
        name => name.to_owned(),
    };
    let account = UserAccount {
        id: Uuid::now_v7(),
        login: login.to_owned(),
        display_name,
        password_hash: hasher.hash(&command.password),
        is_moderator: false,
        created_at: clock.now(),
    };
    repo.insert(&account).await?;

    Ok(account.profile())
}

/// Handles the `LogIn` command.
///
/// # Errors
///
/// Returns `DomainError::Unauthenticated` for an unknown login or a wrong
/// password. The two cases are indistinguishable to the caller.
pub async fn handle_log_in(
    command: &LogIn,
    clock: &dyn Clock,
    hasher: &dyn PasswordHasher,
    codec: &TokenCodec,
    repo: &dyn UserRepository,
) -> Result<LoginOutcome, DomainError> {
    let rejected = || DomainError::Unauthenticated("invalid login or password".to_owned());

    let account = repo
        .find_by_login(command.login.trim())
        .await?
        .ok_or_else(rejected)?;
    if !hasher.verify(&command.password, &account.password_hash) {
        return Err(rejected());
    }

    let token = codec.issue(account.identity(), clock)?;
    Ok(LoginOutcome {
        token,
        user: account.profile(),
    })
}

/// Handles the `LogOut` command by revoking the presented token.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if the revocation cannot be
/// recorded; the caller must not assume the token is dead in that case.
pub async fn handle_log_out(
    command: &LogOut,
    clock: &dyn Clock,
    gate: &RevocationGate,
) -> Result<(), DomainError> {
    gate.revoke(&command.token, clock).await
}

/// Handles the `UpdateProfile` command for the token's bearer.
///
/// # Errors
///
/// Returns `DomainError::Validation` for an empty patch, malformed fields or
/// a login held by another account, `DomainError::Unauthenticated` for a
/// revoked token and `DomainError::UserNotFound` if the account is gone.
#[instrument(skip_all, fields(correlation_id = %command.correlation_id()))]
pub async fn handle_update_profile(
    command: &UpdateProfile,
    gate: &RevocationGate,
    repo: &dyn UserRepository,
) -> Result<UserProfile, DomainError> {
    let caller = gate.admit(&command.token).await?;
    if command.patch.is_empty() {
        return Err(DomainError::Validation("no fields to update".to_owned()));
    }

    let mut account = repo
        .find_by_id(caller.user_id)
        .await?
        .ok_or(DomainError::UserNotFound(caller.user_id))?;
    account.apply_profile_patch(&command.patch)?;

    if let Some(holder) = repo.find_by_login(&account.login).await?
        && holder.id != account.id
    {
        return Err(DomainError::Validation(format!(
            "login '{}' is already taken",
            account.login
        )));
    }
    repo.update(&account).await?;

    info!(user_id = %account.id, login = %account.login, "profile updated");
    Ok(account.profile())
}
