//! Collaborators shared by every synthesis use case.

use std::time::Duration;

use synthlab_auth::revocation::RevocationGate;
use synthlab_catalog::repository::ReactionRepository;
use synthlab_core::clock::Clock;
use synthlab_core::deadline::bounded;
use synthlab_core::error::DomainError;
use uuid::Uuid;

use crate::application::projection::LineProjection;
use crate::application::query_handlers::SynthesisView;
use crate::domain::aggregates::SynthesisOrder;
use crate::domain::status::SynthesisStatus;
use crate::repository::SynthesisRepository;

/// The collaborators a synthesis use case runs against.
///
/// Every persistence call made through the context is bounded by
/// `timeout`; an expired deadline surfaces as `DomainError::Infrastructure`.
#[derive(Clone, Copy)]
pub struct SynthesisContext<'a> {
    /// Source of every timestamp written.
    pub clock: &'a dyn Clock,
    /// Revocation check run before anything else.
    pub gate: &'a RevocationGate,
    /// Order storage.
    pub orders: &'a dyn SynthesisRepository,
    /// Catalog lookups.
    pub catalog: &'a dyn ReactionRepository,
    /// Deadline for each persistence call.
    pub timeout: Duration,
}

impl SynthesisContext<'_> {
    /// Loads an order that has not been deleted.
    pub(crate) async fn load_active(&self, synthesis_id: Uuid) -> Result<SynthesisOrder, DomainError> {
        let order = bounded(self.timeout, "synthesis load", self.orders.load(synthesis_id)).await?;
        if order.status() == SynthesisStatus::Deleted {
            return Err(DomainError::SynthesisNotFound(synthesis_id));
        }
        Ok(order)
    }

    /// Persists `order` and records its new version.
    pub(crate) async fn save(&self, order: &mut SynthesisOrder) -> Result<(), DomainError> {
        let version = bounded(self.timeout, "synthesis save", self.orders.save(order)).await?;
        order.mark_saved(version);
        Ok(())
    }

    /// Joins `order` with the catalog.
    pub(crate) async fn project(&self, order: &SynthesisOrder) -> Result<LineProjection, DomainError> {
        bounded(
            self.timeout,
            "catalog lookup",
            LineProjection::load(order, self.catalog),
        )
        .await
    }

    /// Builds the view returned by every use case.
    pub(crate) async fn view(&self, order: &SynthesisOrder) -> Result<SynthesisView, DomainError> {
        let projection = self.project(order).await?;
        Ok(SynthesisView::build(order, &projection))
    }
}
