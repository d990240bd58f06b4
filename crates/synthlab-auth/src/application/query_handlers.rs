//! Query handlers for the Accounts & Access context.

use synthlab_core::error::DomainError;

use crate::domain::account::UserProfile;
use crate::repository::UserRepository;
use crate::revocation::RevocationGate;
use crate::token::VerifiedToken;

/// Returns the profile of the token's bearer.
///
/// # Errors
///
/// Returns `DomainError::Unauthenticated` for a revoked token and
/// `DomainError::UserNotFound` if the account no longer exists.
pub async fn get_profile(
    token: &VerifiedToken,
    gate: &RevocationGate,
    repo: &dyn UserRepository,
) -> Result<UserProfile, DomainError> {
    let caller = gate.admit(token).await?;
    repo.find_by_id(caller.user_id)
        .await?
        .map(|account| account.profile())
        .ok_or(DomainError::UserNotFound(caller.user_id))
}
