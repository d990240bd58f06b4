//! In-memory application state for router tests.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use sqlx::PgPool;
use synthlab_auth::revocation::RevocationStore;
use synthlab_auth::token::TokenCodec;
use synthlab_core::clock::Clock;
use synthlab_core::identity::CallerIdentity;
use synthlab_test_support::{
    FixedClock, InMemoryImageStore, InMemoryReactionRepository, InMemoryRevocationStore,
    InMemorySynthesisRepository, InMemoryUserRepository, fixed_now,
};
use tower::ServiceExt;
use uuid::Uuid;

use crate::state::{AppState, Repositories};

pub(crate) struct TestApp {
    pub state: AppState,
    pub reactions: Arc<InMemoryReactionRepository>,
    pub images: Arc<InMemoryImageStore>,
    pub syntheses: Arc<InMemorySynthesisRepository>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_revocations(Arc::new(InMemoryRevocationStore::default()))
    }

    pub fn with_revocations(revocations: Arc<dyn RevocationStore>) -> Self {
        let pool = PgPool::connect_lazy("postgres://localhost/test").unwrap();
        let clock: Arc<dyn Clock> = Arc::new(FixedClock(fixed_now()));
        let codec = TokenCodec::new(b"test-secret", "synthlab", chrono::Duration::hours(1));
        let reactions = Arc::new(InMemoryReactionRepository::default());
        let images = Arc::new(InMemoryImageStore::default());
        let syntheses = Arc::new(InMemorySynthesisRepository::default());
        let repositories = Repositories {
            users: Arc::new(InMemoryUserRepository::default()),
            reactions: reactions.clone(),
            images: images.clone(),
            syntheses: syntheses.clone(),
            revocations,
        };

        Self {
            state: AppState::new(
                pool,
                clock,
                codec,
                repositories,
                Duration::from_millis(100),
            ),
            reactions,
            images,
            syntheses,
        }
    }

    pub fn token_for(&self, identity: CallerIdentity) -> String {
        self.state
            .codec
            .issue(identity, self.state.clock.as_ref())
            .unwrap()
            .access_token
    }

    pub fn user_token(&self) -> (Uuid, String) {
        let user_id = Uuid::new_v4();
        (user_id, self.token_for(CallerIdentity::user(user_id)))
    }

    pub fn moderator_token(&self) -> (Uuid, String) {
        let user_id = Uuid::new_v4();
        (user_id, self.token_for(CallerIdentity::moderator(user_id)))
    }
}

/// Sends one request and returns the status and JSON body (`Null` when the
/// body is empty).
pub(crate) async fn send(
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
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    // Extractor rejections answer in plain text.
    let json = if body_bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body_bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&body_bytes).into_owned()))
    };

    (status, json)
}
