//! SynthLab HTTP API.
//!
//! The binary in `main.rs` wires configuration, telemetry and the
//! `PostgreSQL` adapters; everything else lives here so integration tests can
//! build the same router.

pub mod config;
pub mod error;
pub mod extract;
pub mod housekeeping;
pub mod routes;
pub mod state;
pub mod telemetry;

use std::path::Path;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Builds the full application router.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(routes::health::router())
        .nest("/api/v1/reactions", routes::reactions::router())
        .nest("/api/v1/syntheses", routes::syntheses::router())
        .nest("/api/v1/users", routes::users::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// [`app`] plus the static image directory and CORS.
pub fn app_with_images(state: AppState, image_dir: &Path) -> Router {
    // TODO: read allowed origins from a CORS_ORIGINS setting instead of permissive().
    app(state)
        .nest_service("/images", ServeDir::new(image_dir))
        .layer(CorsLayer::permissive())
}
