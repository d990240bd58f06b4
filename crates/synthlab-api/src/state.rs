//! Shared application state.

use std::sync::Arc;
use std::time::Duration;

use sqlx::PgPool;
use synthlab_auth::password::{PasswordHasher, SaltedSha256Hasher};
use synthlab_auth::repository::UserRepository;
use synthlab_auth::revocation::{RevocationGate, RevocationStore};
use synthlab_auth::token::TokenCodec;
use synthlab_catalog::application::context::CatalogContext;
use synthlab_catalog::repository::{ImageStore, ReactionRepository};
use synthlab_core::clock::Clock;
use synthlab_store::fs_image_store::FsImageStore;
use synthlab_store::pg_reaction_repository::PgReactionRepository;
use synthlab_store::pg_revocation_store::PgRevocationStore;
use synthlab_store::pg_synthesis_repository::PgSynthesisRepository;
use synthlab_store::pg_user_repository::PgUserRepository;
use synthlab_synthesis::application::context::SynthesisContext;
use synthlab_synthesis::repository::SynthesisRepository;

use crate::config::Settings;

/// The storage ports the handlers run against.
#[derive(Clone)]
pub struct Repositories {
    /// Account storage.
    pub users: Arc<dyn UserRepository>,
    /// Catalog storage.
    pub reactions: Arc<dyn ReactionRepository>,
    /// Reaction image storage.
    pub images: Arc<dyn ImageStore>,
    /// Order storage.
    pub syntheses: Arc<dyn SynthesisRepository>,
    /// Revoked token set.
    pub revocations: Arc<dyn RevocationStore>,
}

impl Repositories {
    /// `PostgreSQL` adapters plus the filesystem image store from `settings`.
    #[must_use]
    pub fn postgres(pool: &PgPool, settings: &Settings, clock: Arc<dyn Clock>) -> Self {
        Self {
            users: Arc::new(PgUserRepository::new(pool.clone())),
            reactions: Arc::new(PgReactionRepository::new(pool.clone())),
            images: Arc::new(FsImageStore::new(
                settings.image_dir.clone(),
                settings.image_base_url.clone(),
            )),
            syntheses: Arc::new(PgSynthesisRepository::new(pool.clone())),
            revocations: Arc::new(PgRevocationStore::new(pool.clone(), clock)),
        }
    }
}

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// `PostgreSQL` connection pool.
    pub db_pool: PgPool,
    /// Source of every timestamp written.
    pub clock: Arc<dyn Clock>,
    /// Issues and verifies bearer tokens.
    pub codec: Arc<TokenCodec>,
    /// Revocation check in front of every authenticated use case.
    pub gate: Arc<RevocationGate>,
    /// Password hashing for registration and login.
    pub hasher: Arc<dyn PasswordHasher>,
    /// Account storage.
    pub users: Arc<dyn UserRepository>,
    /// Catalog storage.
    pub reactions: Arc<dyn ReactionRepository>,
    /// Reaction image storage.
    pub images: Arc<dyn ImageStore>,
    /// Order storage.
    pub syntheses: Arc<dyn SynthesisRepository>,
    /// Deadline for each persistence and revocation call.
    pub persistence_timeout: Duration,
}

impl AppState {
    /// Create new application state.
    #[must_use]
    pub fn new(
        db_pool: PgPool,
        clock: Arc<dyn Clock>,
        codec: TokenCodec,
        repositories: Repositories,
        persistence_timeout: Duration,
    ) -> Self {
        Self {
            db_pool,
            clock,
            codec: Arc::new(codec),
            gate: Arc::new(RevocationGate::new(
                repositories.revocations,
                persistence_timeout,
            )),
            hasher: Arc::new(SaltedSha256Hasher),
            users: repositories.users,
            reactions: repositories.reactions,
            images: repositories.images,
            syntheses: repositories.syntheses,
            persistence_timeout,
        }
    }

    /// Production wiring from `settings`.
    #[must_use]
    pub fn from_settings(pool: PgPool, settings: &Settings, clock: Arc<dyn Clock>) -> Self {
        let codec = TokenCodec::new(
            settings.jwt_secret.as_bytes(),
            settings.jwt_issuer.clone(),
            settings.jwt_ttl,
        );
        let repositories = Repositories::postgres(&pool, settings, Arc::clone(&clock));
        Self::new(
            pool,
            clock,
            codec,
            repositories,
            settings.persistence_timeout,
        )
    }

    /// Borrows the collaborators of the catalog commands.
    #[must_use]
    pub fn catalog_ctx(&self) -> CatalogContext<'_> {
        CatalogContext {
            gate: &self.gate,
            reactions: self.reactions.as_ref(),
            images: self.images.as_ref(),
            timeout: self.persistence_timeout,
        }
    }

    /// Borrows the collaborators of the synthesis use cases.
    #[must_use]
    pub fn synthesis_ctx(&self) -> SynthesisContext<'_> {
        SynthesisContext {
            clock: self.clock.as_ref(),
            gate: &self.gate,
            orders: self.syntheses.as_ref(),
            catalog: self.reactions.as_ref(),
            timeout: self.persistence_timeout,
        }
    }
}
