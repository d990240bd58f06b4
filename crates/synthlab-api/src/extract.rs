//! Bearer token extraction.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use synthlab_auth::token::VerifiedToken;
use synthlab_core::error::DomainError;

use crate::error::ApiError;
use crate::state::AppState;

/// A request's `Authorization: Bearer` token with its signature, issuer and
/// expiry checked.
///
/// Revocation is checked later by the use case, through the gate.
#[derive(Debug, Clone)]
pub struct Bearer(pub VerifiedToken);

fn bearer_credentials(parts: &Parts) -> Result<&str, DomainError> {
    let header = parts
        .headers
        .get(AUTHORIZATION)
        .ok_or_else(|| DomainError::Unauthenticated("missing bearer token".to_owned()))?;
    let value = header
        .to_str()
        .map_err(|_| DomainError::Unauthenticated("malformed authorization header".to_owned()))?;

    match value.split_once(' ') {
        Some((scheme, credentials))
            if scheme.eq_ignore_ascii_case("bearer") && !credentials.trim().is_empty() =>
        {
            Ok(credentials.trim())
        }
        _ => Err(DomainError::Unauthenticated(
            "authorization scheme must be Bearer".to_owned(),
        )),
    }
}

impl FromRequestParts<AppState> for Bearer {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let raw = bearer_credentials(parts)?;
        let token = state.codec.verify(raw, state.clock.as_ref())?;
        Ok(Self(token))
    }
}
