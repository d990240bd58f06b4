//! Routes for the Reaction Catalog bounded context.
//!
//! Reads are public. Writes require a moderator token, except
//! `add-to-draft`, which any authenticated caller may use.

use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::{
    Json, Router,
    routing::{get, post},
};
use serde::Deserialize;
use synthlab_catalog::application::query_handlers::{self, ReactionView};
use synthlab_catalog::application::command_handlers;
use synthlab_catalog::domain::commands;
use synthlab_catalog::domain::reaction::{NewReaction, ReactionPatch};
use synthlab_core::error::DomainError;
use synthlab_synthesis::application::command_handlers as synthesis_handlers;
use synthlab_synthesis::application::query_handlers::SynthesisView;
use synthlab_synthesis::domain::commands::AddReactionToDraft;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::ApiError;
use crate::extract::Bearer;
use crate::state::AppState;

/// Query string for GET /.
#[derive(Debug, Default, Deserialize)]
pub struct ReactionSearch {
    /// Case-insensitive title substring.
    pub title: Option<String>,
}

/// An uploaded image file.
struct ImageUpload {
    file_name: String,
    content_type: Option<String>,
    bytes: Vec<u8>,
}

fn bad_upload(err: impl std::fmt::Display) -> ApiError {
    ApiError(DomainError::Validation(format!("invalid multipart body: {err}")))
}

/// Takes the first multipart field that carries a file name.
async fn read_image(mut multipart: Multipart) -> Result<ImageUpload, ApiError> {
    while let Some(field) = multipart.next_field().await.map_err(bad_upload)? {
        let Some(file_name) = field.file_name().map(str::to_owned) else {
            continue;
        };
        let content_type = field.content_type().map(str::to_owned);
        let bytes = field.bytes().await.map_err(bad_upload)?;
        return Ok(ImageUpload {
            file_name,
            content_type,
            bytes: bytes.to_vec(),
        });
    }
    Err(ApiError(DomainError::Validation(
        "multipart body has no file field".to_owned(),
    )))
}

/// GET /
async fn list_reactions(
    State(state): State<AppState>,
    Query(search): Query<ReactionSearch>,
) -> Result<Json<Vec<ReactionView>>, ApiError> {
    let reactions = query_handlers::list_reactions(
        search.title.as_deref(),
        state.reactions.as_ref(),
        state.images.as_ref(),
    )
    .await?;
    Ok(Json(reactions))
}

/// GET /{id}
async fn get_reaction(
    State(state): State<AppState>,
    Path(reaction_id): Path<Uuid>,
) -> Result<Json<ReactionView>, ApiError> {
    let reaction =
        query_handlers::get_reaction(reaction_id, state.reactions.as_ref(), state.images.as_ref())
            .await?;
    Ok(Json(reaction))
}

/// POST /
#[instrument(skip_all, fields(title = %request.title))]
async fn create_reaction(
    State(state): State<AppState>,
    Bearer(token): Bearer,
    Json(request): Json<NewReaction>,
) -> Result<(StatusCode, Json<ReactionView>), ApiError> {
    let command = commands::CreateReaction {
        correlation_id: Uuid::new_v4(),
        token,
        reaction: request,
    };

    info!(correlation_id = %command.correlation_id, "handling create_reaction command");

    let reaction = command_handlers::handle_create_reaction(&command, &state.catalog_ctx()).await?;

    Ok((
        StatusCode::CREATED,
        Json(ReactionView::from_reaction(reaction, state.images.as_ref())),
    ))
}

/// PATCH /{id}
#[instrument(skip(state, token, patch))]
async fn update_reaction(
    State(state): State<AppState>,
    Path(reaction_id): Path<Uuid>,
    Bearer(token): Bearer,
    Json(patch): Json<ReactionPatch>,
) -> Result<Json<ReactionView>, ApiError> {
    let command = commands::UpdateReaction {
        correlation_id: Uuid::new_v4(),
        token,
        reaction_id,
        patch,
    };

    info!(correlation_id = %command.correlation_id, "handling update_reaction command");

    let reaction = command_handlers::handle_update_reaction(&command, &state.catalog_ctx()).await?;

    Ok(Json(ReactionView::from_reaction(
        reaction,
        state.images.as_ref(),
    )))
}

/// DELETE /{id}
#[instrument(skip(state, token))]
async fn delete_reaction(
    State(state): State<AppState>,
    Path(reaction_id): Path<Uuid>,
    Bearer(token): Bearer,
) -> Result<StatusCode, ApiError> {
    let command = commands::DeleteReaction {
        correlation_id: Uuid::new_v4(),
        token,
        reaction_id,
    };

    info!(correlation_id = %command.correlation_id, "handling delete_reaction command");

    command_handlers::handle_delete_reaction(&command, &state.catalog_ctx()).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// POST /{id}/restore
#[instrument(skip(state, token))]
async fn restore_reaction(
    State(state): State<AppState>,
    Path(reaction_id): Path<Uuid>,
    Bearer(token): Bearer,
) -> Result<Json<ReactionView>, ApiError> {
    let command = commands::RestoreReaction {
        correlation_id: Uuid::new_v4(),
        token,
        reaction_id,
    };

    info!(correlation_id = %command.correlation_id, "handling restore_reaction command");

    let reaction = command_handlers::handle_restore_reaction(&command, &state.catalog_ctx()).await?;

    Ok(Json(ReactionView::from_reaction(
        reaction,
        state.images.as_ref(),
    )))
}

/// POST /{id}/image
#[instrument(skip(state, token, multipart))]
async fn attach_image(
    State(state): State<AppState>,
    Path(reaction_id): Path<Uuid>,
    Bearer(token): Bearer,
    multipart: Multipart,
) -> Result<Json<ReactionView>, ApiError> {
    let upload = read_image(multipart).await?;
    let command = commands::AttachReactionImage {
        correlation_id: Uuid::new_v4(),
        token,
        reaction_id,
        file_name: upload.file_name,
        content_type: upload.content_type,
        bytes: upload.bytes,
    };

    info!(
        correlation_id = %command.correlation_id,
        size = command.bytes.len(),
        "handling attach_reaction_image command"
    );

    let reaction =
        command_handlers::handle_attach_reaction_image(&command, &state.catalog_ctx()).await?;

    Ok(Json(ReactionView::from_reaction(
        reaction,
        state.images.as_ref(),
    )))
}

/// POST /{id}/add-to-draft
#[instrument(skip(state, token))]
async fn add_to_draft(
    State(state): State<AppState>,
    Path(reaction_id): Path<Uuid>,
    Bearer(token): Bearer,
) -> Result<Json<SynthesisView>, ApiError> {
    let command = AddReactionToDraft {
        correlation_id: Uuid::new_v4(),
        token,
        reaction_id,
    };

    info!(correlation_id = %command.correlation_id, "handling add_reaction_to_draft command");

    let view =
        synthesis_handlers::handle_add_reaction_to_draft(&command, &state.synthesis_ctx()).await?;

    Ok(Json(view))
}

/// Returns the router for the catalog context.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_reactions).post(create_reaction))
        .route(
            "/{id}",
            get(get_reaction)
                .patch(update_reaction)
                .delete(delete_reaction),
        )
        .route("/{id}/restore", post(restore_reaction))
        .route("/{id}/image", post(attach_image))
        .route("/{id}/add-to-draft", post(add_to_draft))
}
