//! `PostgreSQL` implementation of the `ReactionRepository` trait.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use synthlab_catalog::domain::reaction::{MaterialDescriptor, Reaction};
use synthlab_catalog::repository::ReactionRepository;
use synthlab_core::error::DomainError;
use uuid::Uuid;

use crate::error::db_error;

const COLUMNS: &str = "id, title, details, starting_name, starting_density, \
     starting_molar_mass, result_name, result_density, result_molar_mass, image_ref, is_deleted";

/// PostgreSQL-backed reaction catalog.
#[derive(Debug, Clone)]
pub struct PgReactionRepository {
    pool: PgPool,
}

impl PgReactionRepository {
    /// Creates a new `PgReactionRepository`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn reaction_from_row(row: &PgRow) -> Result<Reaction, sqlx::Error> {
    Ok(Reaction {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        details: row.try_get("details")?,
        starting_material: MaterialDescriptor {
            name: row.try_get("starting_name")?,
            density: row.try_get("starting_density")?,
            molar_mass: row.try_get("starting_molar_mass")?,
        },
        result_material: MaterialDescriptor {
            name: row.try_get("result_name")?,
            density: row.try_get("result_density")?,
            molar_mass: row.try_get("result_molar_mass")?,
        },
        image_ref: row.try_get("image_ref")?,
        is_deleted: row.try_get("is_deleted")?,
    })
}

#[async_trait]
impl ReactionRepository for PgReactionRepository {
    async fn get(&self, reaction_id: Uuid) -> Result<Reaction, DomainError> {
        self.get_including_deleted(reaction_id)
            .await?
            .filter(|r| !r.is_deleted)
            .ok_or(DomainError::ReactionNotFound(reaction_id))
    }

    async fn exists(&self, reaction_id: Uuid) -> Result<bool, DomainError> {
        sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM reactions WHERE id = $1 AND NOT is_deleted)",
        )
        .bind(reaction_id)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("reaction exists"))
    }

    async fn get_including_deleted(
        &self,
        reaction_id: Uuid,
    ) -> Result<Option<Reaction>, DomainError> {
        let row = sqlx::query(&format!("SELECT {COLUMNS} FROM reactions WHERE id = $1"))
            .bind(reaction_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("reaction load"))?;
        row.as_ref()
            .map(reaction_from_row)
            .transpose()
            .map_err(db_error("reaction decode"))
    }

    async fn find_active(&self, reaction_ids: &[Uuid]) -> Result<Vec<Reaction>, DomainError> {
        let rows = sqlx::query(&format!(
            "SELECT {COLUMNS} FROM reactions WHERE id = ANY($1) AND NOT is_deleted"
        ))
        .bind(reaction_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("reaction batch load"))?;
        rows.iter()
            .map(reaction_from_row)
            .collect::<Result<_, _>>()
            .map_err(db_error("reaction decode"))
    }

    async fn search(&self, title: Option<&str>) -> Result<Vec<Reaction>, DomainError> {
        // strpos keeps `%` and `_` in the filter literal.
        let rows = sqlx::query(&format!(
            "SELECT {COLUMNS} FROM reactions \
             WHERE NOT is_deleted AND ($1::text IS NULL OR strpos(lower(title), lower($1)) > 0) \
             ORDER BY title, id"
        ))
        .bind(title)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("reaction search"))?;
        rows.iter()
            .map(reaction_from_row)
            .collect::<Result<_, _>>()
            .map_err(db_error("reaction decode"))
    }

    async fn save(&self, reaction: &Reaction) -> Result<(), DomainError> {
        sqlx::query(
            "INSERT INTO reactions (id, title, details, starting_name, starting_density, \
                 starting_molar_mass, result_name, result_density, result_molar_mass, \
                 image_ref, is_deleted) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
             ON CONFLICT (id) DO UPDATE SET \
                 title = EXCLUDED.title, \
                 details = EXCLUDED.details, \
                 starting_name = EXCLUDED.starting_name, \
                 starting_density = EXCLUDED.starting_density, \
                 starting_molar_mass = EXCLUDED.starting_molar_mass, \
                 result_name = EXCLUDED.result_name, \
                 result_density = EXCLUDED.result_density, \
                 result_molar_mass = EXCLUDED.result_molar_mass, \
                 image_ref = EXCLUDED.image_ref, \
                 is_deleted = EXCLUDED.is_deleted",
        )
        .bind(reaction.id)
        .bind(&reaction.title)
        .bind(&reaction.details)
        .bind(&reaction.starting_material.name)
        .bind(reaction.starting_material.density)
        .bind(reaction.starting_material.molar_mass)
        .bind(&reaction.result_material.name)
        .bind(reaction.result_material.density)
        .bind(reaction.result_material.molar_mass)
        .bind(&reaction.image_ref)
        .bind(reaction.is_deleted)
        .execute(&self.pool)
        .await
        .map_err(db_error("reaction save"))?;
        Ok(())
    }
}
