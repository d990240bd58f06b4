//! Shared test helpers for API integration tests.
#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use sqlx::PgPool;
use synthlab_auth::domain::account::UserAccount;
use synthlab_auth::password::{PasswordHasher, SaltedSha256Hasher};
use synthlab_auth::repository::UserRepository;
use synthlab_auth::token::TokenCodec;
use synthlab_core::clock::Clock;
use synthlab_store::fs_image_store::FsImageStore;
use synthlab_store::pg_reaction_repository::PgReactionRepository;
use synthlab_store::pg_revocation_store::PgRevocationStore;
use synthlab_store::pg_synthesis_repository::PgSynthesisRepository;
use synthlab_store::pg_user_repository::PgUserRepository;
use synthlab_test_support::{FixedClock, fixed_now};
use tower::ServiceExt;
use uuid::Uuid;

use synthlab_api::state::{AppState, Repositories};

/// Base URL the test image store hands out.
pub const IMAGE_BASE_URL: &str = "http://localhost/images";

/// Password used for every seeded account.
pub const PASSWORD: &str = "s3cret-pass";

fn fixed_clock() -> Arc<dyn Clock> {
    Arc::new(FixedClock(fixed_now()))
}

fn test_state(pool: PgPool, image_dir: &Path) -> AppState {
    let clock = fixed_clock();
    let repositories = Repositories {
        users: Arc::new(PgUserRepository::new(pool.clone())),
        reactions: Arc::new(PgReactionRepository::new(pool.clone())),
        images: Arc::new(FsImageStore::new(image_dir, IMAGE_BASE_URL)),
        syntheses: Arc::new(PgSynthesisRepository::new(pool.clone())),
        revocations: Arc::new(PgRevocationStore::new(pool.clone(), Arc::clone(&clock))),
    };
    let codec = TokenCodec::new(
        b"integration-secret",
        "synthlab",
        chrono::Duration::hours(1),
    );
    AppState::new(pool, clock, codec, repositories, Duration::from_secs(5))
}

/// Build the full app router against `PostgreSQL` with a fixed clock. Images
/// go to a scratch directory that is never served.
pub fn build_test_app(pool: PgPool) -> Router {
    synthlab_api::app(test_state(pool, &std::env::temp_dir().join("synthlab-unused")))
}

/// Build the router as `main.rs` does, serving `/images` from `image_dir`.
pub fn build_test_app_with_images(pool: PgPool, image_dir: &Path) -> Router {
    synthlab_api::app_with_images(test_state(pool, image_dir), image_dir)
}

/// Inserts an account directly; the only way to create a moderator.
pub async fn seed_account(pool: &PgPool, login: &str, is_moderator: bool) -> Uuid {
    let account = UserAccount {
        id: Uuid::now_v7(),
        login: login.to_owned(),
        display_name: login.to_owned(),
        password_hash: SaltedSha256Hasher.hash(PASSWORD),
        is_moderator,
        created_at: fixed_now(),
    };
    PgUserRepository::new(pool.clone())
        .insert(&account)
        .await
        .unwrap();
    account.id
}

/// Logs `login` in and returns the bearer token.
pub async fn log_in(app: Router, login: &str) -> String {
    let (status, json) = post_json(
        app,
        "/api/v1/users/login",
        None,
        &json!({ "login": login, "password": PASSWORD }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login failed: {json}");
    json["token"]["access_token"].as_str().unwrap().to_owned()
}

/// Send a request and return the status and JSON body (`Null` when empty).
pub async fn send(
    app: Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<&Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(json).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if body_bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body_bytes).unwrap()
    };

    (status, json)
}

/// Send a POST request with a JSON body and return the response.
pub async fn post_json(
    app: Router,
    uri: &str,
    token: Option<&str>,
    body: &Value,
) -> (StatusCode, Value) {
    send(app, "POST", uri, token, Some(body)).await
}

/// Send a PUT request with a JSON body and return the response.
pub async fn put_json(
    app: Router,
    uri: &str,
    token: Option<&str>,
    body: &Value,
) -> (StatusCode, Value) {
    send(app, "PUT", uri, token, Some(body)).await
}

/// Send a GET request and return the response.
pub async fn get_json(app: Router, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
    send(app, "GET", uri, token, None).await
}

/// A reaction body with densities 1.0/2.0 and molar masses 100/200.
pub fn reaction_body(title: &str) -> Value {
    json!({
        "title": title,
        "details": format!("{title} details"),
        "starting_material": { "name": "source", "density": 1.0, "molar_mass": 100.0 },
        "result_material": { "name": "product", "density": 2.0, "molar_mass": 200.0 }
    })
}

/// Creates a reaction through the API and returns its id.
pub async fn create_reaction(app: Router, moderator_token: &str, title: &str) -> String {
    let (status, json) = post_json(
        app,
        "/api/v1/reactions",
        Some(moderator_token),
        &reaction_body(title),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create failed: {json}");
    json["reaction_id"].as_str().unwrap().to_owned()
}
