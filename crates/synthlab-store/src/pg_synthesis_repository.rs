//! `PostgreSQL` implementation of the `SynthesisRepository` trait.
//!
//! Orders live in `syntheses`, their lines in `synthesis_reactions`. The
//! partial unique index on `syntheses (creator_id) WHERE status = 'draft'`
//! backs the one-draft-per-creator rule; `version` backs optimistic
//! concurrency on every other write.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgExecutor, PgPool, Postgres, Row, Transaction};
use synthlab_core::error::DomainError;
use synthlab_synthesis::domain::aggregates::{OrderLine, SynthesisOrder, SynthesisRecord};
use synthlab_synthesis::domain::status::SynthesisStatus;
use synthlab_synthesis::repository::{SynthesisFilter, SynthesisRepository};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{corrupt, db_error};

const RECORD_COLUMNS: &str =
    "id, status, creator_id, moderator_id, purity, created_at, updated_at, finished_at, version";

/// A concurrent form or delete can empty the draft slot between the
/// conditional insert and the read-back or lock.
const DRAFT_ATTEMPTS: usize = 3;

/// PostgreSQL-backed synthesis order storage.
#[derive(Debug, Clone)]
pub struct PgSynthesisRepository {
    pool: PgPool,
}

impl PgSynthesisRepository {
    /// Creates a new `PgSynthesisRepository`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn load_lines(&self, synthesis_id: Uuid) -> Result<Vec<OrderLine>, DomainError> {
        let rows = sqlx::query(
            "SELECT reaction_id, quantity, volume_sm, volume_rm, added_at \
             FROM synthesis_reactions WHERE synthesis_id = $1 \
             ORDER BY added_at, reaction_id",
        )
        .bind(synthesis_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("line load"))?;
        rows.iter().map(line_from_row).collect()
    }
}

fn record_from_row(row: &PgRow) -> Result<SynthesisRecord, DomainError> {
    let status: String = row.try_get("status").map_err(db_error("synthesis decode"))?;
    let status = status
        .parse::<SynthesisStatus>()
        .map_err(|e| corrupt("syntheses.status", e))?;
    decode_record(row, status).map_err(db_error("synthesis decode"))
}

fn decode_record(row: &PgRow, status: SynthesisStatus) -> Result<SynthesisRecord, sqlx::Error> {
    Ok(SynthesisRecord {
        id: row.try_get("id")?,
        status,
        creator_id: row.try_get("creator_id")?,
        moderator_id: row.try_get("moderator_id")?,
        purity: row.try_get("purity")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        finished_at: row.try_get("finished_at")?,
        version: row.try_get("version")?,
    })
}

fn line_from_row(row: &PgRow) -> Result<OrderLine, DomainError> {
    let quantity: i32 = row.try_get("quantity").map_err(db_error("line decode"))?;
    let quantity =
        u32::try_from(quantity).map_err(|e| corrupt("synthesis_reactions.quantity", e))?;
    decode_line(row, quantity).map_err(db_error("line decode"))
}

fn decode_line(row: &PgRow, quantity: u32) -> Result<OrderLine, sqlx::Error> {
    Ok(OrderLine {
        reaction_id: row.try_get("reaction_id")?,
        quantity,
        volume_sm: row.try_get("volume_sm")?,
        volume_rm: row.try_get("volume_rm")?,
        added_at: row.try_get("added_at")?,
    })
}

async fn current_version(
    tx: &mut Transaction<'_, Postgres>,
    synthesis_id: Uuid,
) -> Result<Option<i64>, DomainError> {
    sqlx::query_scalar("SELECT version FROM syntheses WHERE id = $1")
        .bind(synthesis_id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(db_error("version lookup"))
}

/// Inserts `record` as the creator's draft unless they already have one.
async fn insert_draft<'e>(
    executor: impl PgExecutor<'e>,
    record: &SynthesisRecord,
) -> Result<bool, DomainError> {
    let inserted = sqlx::query(
        "INSERT INTO syntheses (id, status, creator_id, created_at, updated_at, version) \
         VALUES ($1, 'draft', $2, $3, $3, 1) \
         ON CONFLICT (creator_id) WHERE status = 'draft' DO NOTHING",
    )
    .bind(record.id)
    .bind(record.creator_id)
    .bind(record.created_at)
    .execute(executor)
    .await
    .map_err(db_error("draft insert"))?
    .rows_affected();
    if inserted == 1 {
        debug!(synthesis_id = %record.id, creator_id = %record.creator_id, "draft created");
    }
    Ok(inserted == 1)
}

/// Locks the order row and checks it is still a draft.
async fn lock_draft(
    tx: &mut Transaction<'_, Postgres>,
    synthesis_id: Uuid,
) -> Result<(), DomainError> {
    let status: Option<String> =
        sqlx::query_scalar("SELECT status FROM syntheses WHERE id = $1 FOR UPDATE")
            .bind(synthesis_id)
            .fetch_optional(&mut **tx)
            .await
            .map_err(db_error("synthesis lock"))?;
    let status = status
        .ok_or(DomainError::SynthesisNotFound(synthesis_id))?
        .parse::<SynthesisStatus>()
        .map_err(|e| corrupt("syntheses.status", e))?;
    if status == SynthesisStatus::Draft {
        Ok(())
    } else {
        Err(DomainError::InvalidState {
            synthesis_id,
            status: status.as_str(),
        })
    }
}

/// Adds one unit of an active reaction to a draft the caller has locked.
async fn upsert_line(
    tx: &mut Transaction<'_, Postgres>,
    synthesis_id: Uuid,
    reaction_id: Uuid,
    at: DateTime<Utc>,
) -> Result<(), DomainError> {
    // The share lock holds off a concurrent soft delete until commit.
    let active: Option<i32> = sqlx::query_scalar(
        "SELECT 1 FROM reactions WHERE id = $1 AND NOT is_deleted FOR SHARE",
    )
    .bind(reaction_id)
    .fetch_optional(&mut **tx)
    .await
    .map_err(db_error("reaction lock"))?;
    if active.is_none() {
        return Err(DomainError::ReactionNotFound(reaction_id));
    }

    sqlx::query(
        "INSERT INTO synthesis_reactions (synthesis_id, reaction_id, quantity, added_at) \
         VALUES ($1, $2, 1, $3) \
         ON CONFLICT (synthesis_id, reaction_id) \
         DO UPDATE SET quantity = synthesis_reactions.quantity + 1",
    )
    .bind(synthesis_id)
    .bind(reaction_id)
    .bind(at)
    .execute(&mut **tx)
    .await
    .map_err(db_error("line upsert"))?;

    sqlx::query("UPDATE syntheses SET updated_at = $2, version = version + 1 WHERE id = $1")
        .bind(synthesis_id)
        .bind(at)
        .execute(&mut **tx)
        .await
        .map_err(db_error("synthesis touch"))?;
    Ok(())
}

async fn replace_lines(
    tx: &mut Transaction<'_, Postgres>,
    order: &SynthesisOrder,
) -> Result<(), DomainError> {
    sqlx::query("DELETE FROM synthesis_reactions WHERE synthesis_id = $1")
        .bind(order.id())
        .execute(&mut **tx)
        .await
        .map_err(db_error("line replace"))?;

    for line in order.lines() {
        let quantity = i32::try_from(line.quantity).map_err(|_| {
            DomainError::OutOfRange(format!("quantity {} is too large", line.quantity))
        })?;
        sqlx::query(
            "INSERT INTO synthesis_reactions \
                 (synthesis_id, reaction_id, quantity, volume_sm, volume_rm, added_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(order.id())
        .bind(line.reaction_id)
        .bind(quantity)
        .bind(line.volume_sm)
        .bind(line.volume_rm)
        .bind(line.added_at)
        .execute(&mut **tx)
        .await
        .map_err(db_error("line replace"))?;
    }
    Ok(())
}

#[async_trait]
impl SynthesisRepository for PgSynthesisRepository {
    async fn find_or_create_draft(
        &self,
        candidate: &SynthesisOrder,
    ) -> Result<SynthesisOrder, DomainError> {
        let record = candidate.record();
        for _ in 0..DRAFT_ATTEMPTS {
            insert_draft(&self.pool, record).await?;
            if let Some(draft) = self.find_draft(record.creator_id).await? {
                return Ok(draft);
            }
            warn!(creator_id = %record.creator_id, "draft left the draft state during lookup");
        }
        Err(DomainError::Infrastructure(format!(
            "could not settle a draft for creator {}",
            record.creator_id
        )))
    }

    async fn add_to_draft(
        &self,
        candidate: &SynthesisOrder,
        reaction_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<Uuid, DomainError> {
        let record = candidate.record();
        let mut tx = self.pool.begin().await.map_err(db_error("begin"))?;

        let mut draft_id = None;
        for _ in 0..DRAFT_ATTEMPTS {
            insert_draft(&mut *tx, record).await?;
            // A form or delete that commits while we wait for the lock
            // takes the row out of the draft set; the next pass inserts.
            draft_id = sqlx::query_scalar(
                "SELECT id FROM syntheses WHERE creator_id = $1 AND status = 'draft' FOR UPDATE",
            )
            .bind(record.creator_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(db_error("draft lock"))?;
            if draft_id.is_some() {
                break;
            }
            warn!(creator_id = %record.creator_id, "draft left the draft state before it was locked");
        }
        let draft_id = draft_id.ok_or_else(|| {
            DomainError::Infrastructure(format!(
                "could not settle a draft for creator {}",
                record.creator_id
            ))
        })?;

        upsert_line(&mut tx, draft_id, reaction_id, at).await?;
        tx.commit().await.map_err(db_error("commit"))?;
        Ok(draft_id)
    }

    async fn increment_line(
        &self,
        synthesis_id: Uuid,
        reaction_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        let mut tx = self.pool.begin().await.map_err(db_error("begin"))?;
        lock_draft(&mut tx, synthesis_id).await?;
        upsert_line(&mut tx, synthesis_id, reaction_id, at).await?;
        tx.commit().await.map_err(db_error("commit"))
    }

    async fn load(&self, synthesis_id: Uuid) -> Result<SynthesisOrder, DomainError> {
        let row = sqlx::query(&format!(
            "SELECT {RECORD_COLUMNS} FROM syntheses WHERE id = $1"
        ))
        .bind(synthesis_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("synthesis load"))?
        .ok_or(DomainError::SynthesisNotFound(synthesis_id))?;

        let record = record_from_row(&row)?;
        let lines = self.load_lines(synthesis_id).await?;
        Ok(SynthesisOrder::restore(record, lines))
    }

    async fn find_draft(&self, creator_id: Uuid) -> Result<Option<SynthesisOrder>, DomainError> {
        let draft_id: Option<Uuid> = sqlx::query_scalar(
            "SELECT id FROM syntheses WHERE creator_id = $1 AND status = 'draft'",
        )
        .bind(creator_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("draft lookup"))?;

        match draft_id {
            Some(id) => match self.load(id).await {
                Ok(order) if order.status() == SynthesisStatus::Draft => Ok(Some(order)),
                Ok(_) | Err(DomainError::SynthesisNotFound(_)) => Ok(None),
                Err(e) => Err(e),
            },
            None => Ok(None),
        }
    }

    async fn save(&self, order: &SynthesisOrder) -> Result<i64, DomainError> {
        let record = order.record();
        let mut tx = self.pool.begin().await.map_err(db_error("begin"))?;

        let version: Option<i64> = sqlx::query_scalar(
            "UPDATE syntheses SET status = $2, moderator_id = $3, purity = $4, \
                 updated_at = $5, finished_at = $6, version = version + 1 \
             WHERE id = $1 AND version = $7 \
             RETURNING version",
        )
        .bind(record.id)
        .bind(record.status.as_str())
        .bind(record.moderator_id)
        .bind(record.purity)
        .bind(record.updated_at)
        .bind(record.finished_at)
        .bind(record.version)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_error("synthesis update"))?;

        let Some(version) = version else {
            return match current_version(&mut tx, record.id).await? {
                Some(actual) => {
                    warn!(synthesis_id = %record.id, expected = record.version, actual, "stale synthesis save");
                    Err(DomainError::ConcurrencyConflict {
                        aggregate_id: record.id,
                        expected: record.version,
                        actual,
                    })
                }
                None => Err(DomainError::SynthesisNotFound(record.id)),
            };
        };

        replace_lines(&mut tx, order).await?;
        tx.commit().await.map_err(db_error("commit"))?;
        Ok(version)
    }

    async fn list(&self, filter: &SynthesisFilter) -> Result<Vec<SynthesisRecord>, DomainError> {
        let rows = sqlx::query(&format!(
            "SELECT {RECORD_COLUMNS} FROM syntheses \
             WHERE status NOT IN ('draft', 'deleted') \
               AND ($1::uuid IS NULL OR creator_id = $1) \
               AND ($2::text IS NULL OR status = $2) \
               AND ($3::timestamptz IS NULL OR created_at >= $3) \
               AND ($4::timestamptz IS NULL OR created_at <= $4) \
             ORDER BY created_at DESC, id"
        ))
        .bind(filter.creator_id)
        .bind(filter.status.map(SynthesisStatus::as_str))
        .bind(filter.created_from)
        .bind(filter.created_to)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("synthesis list"))?;
        rows.iter().map(record_from_row).collect()
    }
}
