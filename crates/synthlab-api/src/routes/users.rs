//! Routes for the Accounts & Access bounded context.

use axum::extract::State;
use axum::http::StatusCode;
use axum::{
    Json, Router,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use synthlab_auth::application::{command_handlers, query_handlers};
use synthlab_auth::domain::account::{ProfilePatch, UserProfile};
use synthlab_auth::domain::commands;
use synthlab_auth::token::IssuedToken;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::ApiError;
use crate::extract::Bearer;
use crate::state::AppState;

/// Request body for POST /register.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    /// Unique login name.
    pub login: String,
    /// Plain-text password.
    pub password: String,
    /// Name shown to other users; defaults to the login.
    #[serde(default)]
    pub display_name: String,
}

/// Request body for POST /login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Login name.
    pub login: String,
    /// Plain-text password.
    pub password: String,
}

/// Response body for POST /login.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    /// The bearer token.
    pub token: IssuedToken,
    /// The account that logged in.
    pub user: UserProfile,
}

/// POST /register
#[instrument(skip(state, request), fields(login = %request.login))]
async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserProfile>), ApiError> {
    let command = commands::RegisterUser {
        correlation_id: Uuid::new_v4(),
        login: request.login,
        password: request.password,
        display_name: request.display_name,
    };

    info!(correlation_id = %command.correlation_id, "handling register_user command");

    let profile = command_handlers::handle_register_user(
        &command,
        state.clock.as_ref(),
        state.hasher.as_ref(),
        state.users.as_ref(),
    )
    .await?;

    Ok((StatusCode::CREATED, Json(profile)))
}

/// POST /login
#[instrument(skip(state, request), fields(login = %request.login))]
async fn log_in(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let command = commands::LogIn {
        correlation_id: Uuid::new_v4(),
        login: request.login,
        password: request.password,
    };

    info!(correlation_id = %command.correlation_id, "handling log_in command");

    let outcome = command_handlers::handle_log_in(
        &command,
        state.clock.as_ref(),
        state.hasher.as_ref(),
        &state.codec,
        state.users.as_ref(),
    )
    .await?;

    Ok(Json(LoginResponse {
        token: outcome.token,
        user: outcome.user,
    }))
}

/// POST /logout
#[instrument(skip_all, fields(user_id = %token.identity().user_id))]
async fn log_out(
    State(state): State<AppState>,
    Bearer(token): Bearer,
) -> Result<StatusCode, ApiError> {
    let command = commands::LogOut {
        correlation_id: Uuid::new_v4(),
        token,
    };

    info!(correlation_id = %command.correlation_id, "handling log_out command");

    command_handlers::handle_log_out(&command, state.clock.as_ref(), &state.gate).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// GET /me
async fn me(
    State(state): State<AppState>,
    Bearer(token): Bearer,
) -> Result<Json<UserProfile>, ApiError> {
    let profile = query_handlers::get_profile(&token, &state.gate, state.users.as_ref()).await?;
    Ok(Json(profile))
}

/// PUT /me
#[instrument(skip_all, fields(user_id = %token.identity().user_id))]
async fn update_me(
    State(state): State<AppState>,
    Bearer(token): Bearer,
    Json(patch): Json<ProfilePatch>,
) -> Result<Json<UserProfile>, ApiError> {
    let command = commands::UpdateProfile {
        correlation_id: Uuid::new_v4(),
        token,
        patch,
    };

    info!(correlation_id = %command.correlation_id, "handling update_profile command");

    let profile =
        command_handlers::handle_update_profile(&command, &state.gate, state.users.as_ref())
            .await?;

    Ok(Json(profile))
}

/// Returns the router for the accounts context.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(log_in))
        .route("/logout", post(log_out))
        .route("/me", get(me).put(update_me))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::{Value, json};
    use synthlab_test_support::FailingRevocationStore;

    use super::*;
    use crate::routes::testing::{TestApp, send};

    async fn register_and_log_in(app: &Router, login: &str) -> String {
        let body = json!({ "login": login, "password": "s3cret-pass" });
        let (status, _) = send(app.clone(), "POST", "/register", None, Some(&body)).await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, json) = send(app.clone(), "POST", "/login", None, Some(&body)).await;
        assert_eq!(status, StatusCode::OK);
        json["token"]["access_token"].as_str().unwrap().to_owned()
    }

    #[tokio::test]
    async fn test_register_returns_201_with_profile() {
        // Arrange
        let app = router().with_state(TestApp::new().state);
        let body = json!({ "login": "alice", "password": "s3cret-pass", "display_name": "Alice" });

        // Act
        let (status, json) = send(app, "POST", "/register", None, Some(&body)).await;

        // Assert
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(json["login"], "alice");
        assert_eq!(json["display_name"], "Alice");
        assert_eq!(json["is_moderator"], false);
        assert!(json.get("password_hash").is_none());
    }

    #[tokio::test]
    async fn test_register_returns_400_for_taken_login() {
        // Arrange
        let app = router().with_state(TestApp::new().state);
        let body = json!({ "login": "alice", "password": "s3cret-pass" });
        send(app.clone(), "POST", "/register", None, Some(&body)).await;

        // Act
        let (status, json) = send(app, "POST", "/register", None, Some(&body)).await;

        // Assert
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "validation_error");
    }

    #[tokio::test]
    async fn test_login_returns_401_for_wrong_password() {
        // Arrange
        let app = router().with_state(TestApp::new().state);
        let body = json!({ "login": "alice", "password": "s3cret-pass" });
        send(app.clone(), "POST", "/register", None, Some(&body)).await;
        let wrong = json!({ "login": "alice", "password": "not-it" });

        // Act
        let (status, json) = send(app, "POST", "/login", None, Some(&wrong)).await;

        // Assert
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["error"], "unauthenticated");
    }

    #[tokio::test]
    async fn test_login_token_reaches_profile() {
        // Arrange
        let app = router().with_state(TestApp::new().state);
        let token = register_and_log_in(&app, "alice").await;

        // Act
        let (status, json) = send(app, "GET", "/me", Some(&token), None).await;

        // Assert
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["login"], "alice");
    }

    #[tokio::test]
    async fn test_logout_revokes_token() {
        // Arrange
        let app = router().with_state(TestApp::new().state);
        let token = register_and_log_in(&app, "alice").await;

        // Act
        let (logout_status, logout_body) =
            send(app.clone(), "POST", "/logout", Some(&token), None).await;
        let (status, json) = send(app, "GET", "/me", Some(&token), None).await;

        // Assert
        assert_eq!(logout_status, StatusCode::NO_CONTENT);
        assert_eq!(logout_body, Value::Null);
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["error"], "unauthenticated");
    }

    #[tokio::test]
    async fn test_update_me_changes_display_name() {
        // Arrange
        let app = router().with_state(TestApp::new().state);
        let token = register_and_log_in(&app, "alice").await;
        let body = json!({ "display_name": "Alice L." });

        // Act
        let (status, json) = send(app.clone(), "PUT", "/me", Some(&token), Some(&body)).await;
        let (_, me) = send(app, "GET", "/me", Some(&token), None).await;

        // Assert
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["login"], "alice");
        assert_eq!(json["display_name"], "Alice L.");
        assert_eq!(me["display_name"], "Alice L.");
    }

    #[tokio::test]
    async fn test_update_me_returns_400_for_taken_login() {
        // Arrange
        let app = router().with_state(TestApp::new().state);
        register_and_log_in(&app, "bob").await;
        let token = register_and_log_in(&app, "alice").await;
        let body = json!({ "login": "bob" });

        // Act
        let (status, json) = send(app.clone(), "PUT", "/me", Some(&token), Some(&body)).await;
        let (_, me) = send(app, "GET", "/me", Some(&token), None).await;

        // Assert
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "validation_error");
        assert_eq!(me["login"], "alice");
    }

    #[tokio::test]
    async fn test_update_me_returns_400_without_fields() {
        // Arrange
        let app = router().with_state(TestApp::new().state);
        let token = register_and_log_in(&app, "alice").await;

        // Act
        let (status, json) = send(app, "PUT", "/me", Some(&token), Some(&json!({}))).await;

        // Assert
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "validation_error");
    }

    #[tokio::test]
    async fn test_update_me_rejects_unknown_field() {
        let app = router().with_state(TestApp::new().state);
        let token = register_and_log_in(&app, "alice").await;
        let body = json!({ "is_moderator": true });

        let (status, _) = send(app, "PUT", "/me", Some(&token), Some(&body)).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_me_without_token_returns_401() {
        // Arrange
        let app = router().with_state(TestApp::new().state);

        // Act
        let (status, _) = send(app, "GET", "/me", None, None).await;

        // Assert
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_me_with_forged_token_returns_401() {
        // Arrange
        let app = router().with_state(TestApp::new().state);

        // Act
        let (status, json) = send(app, "GET", "/me", Some("not.a.jwt"), None).await;

        // Assert
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["error"], "unauthenticated");
    }

    #[tokio::test]
    async fn test_logout_returns_500_when_revocations_are_unreachable() {
        // Arrange
        let harness = TestApp::with_revocations(Arc::new(FailingRevocationStore));
        let (_, token) = harness.user_token();
        let app = router().with_state(harness.state);

        // Act
        let (status, json) = send(app, "POST", "/logout", Some(&token), None).await;

        // Assert
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["error"], "infrastructure_error");
    }
}
