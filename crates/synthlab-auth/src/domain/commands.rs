//! Commands for the Accounts & Access context.

use synthlab_core::command::Command;
use uuid::Uuid;

use crate::domain::account::ProfilePatch;
use crate::token::VerifiedToken;

/// Command to register a new account.
#[derive(Debug, Clone)]
pub struct RegisterUser {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// Requested login name.
    pub login: String,
    /// Plain-text password; only its hash is stored.
    pub password: String,
    /// Display name. Defaults to the login when empty.
    pub display_name: String,
}

impl Command for RegisterUser {
    fn command_type(&self) -> &'static str {
        "auth.register_user"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to exchange credentials for a bearer token.
#[derive(Debug, Clone)]
pub struct LogIn {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// Login name.
    pub login: String,
    /// Plain-text password.
    pub password: String,
}

impl Command for LogIn {
    fn command_type(&self) -> &'static str {
        "auth.log_in"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to revoke the presented token.
#[derive(Debug, Clone)]
pub struct LogOut {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The token being revoked.
    pub token: VerifiedToken,
}

impl Command for LogOut {
    fn command_type(&self) -> &'static str {
        "auth.log_out"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn actor_id(&self) -> Option<Uuid> {
        Some(self.token.identity().user_id)
    }
}

/// Command to change the caller's login or display name.
#[derive(Debug, Clone)]
pub struct UpdateProfile {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The caller's token.
    pub token: VerifiedToken,
    /// Fields to change.
    pub patch: ProfilePatch,
}

impl Command for UpdateProfile {
    fn command_type(&self) -> &'static str {
        "auth.update_profile"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn actor_id(&self) -> Option<Uuid> {
        Some(self.token.identity().user_id)
    }
}
