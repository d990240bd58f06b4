//! Routes for the Synthesis Ordering bounded context.

use axum::extract::{Path, Query, State};
use axum::{
    Json, Router,
    routing::{get, put},
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use synthlab_synthesis::application::command_handlers;
use synthlab_synthesis::application::query_handlers::{
    self, DraftSummaryView, LineView, SynthesisQuery, SynthesisSummaryView, SynthesisView,
};
use synthlab_synthesis::domain::commands;
use synthlab_synthesis::domain::lifecycle::ModerationDecision;
use synthlab_synthesis::domain::status::SynthesisStatus;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::ApiError;
use crate::extract::Bearer;
use crate::state::AppState;

/// Query string for GET /.
#[derive(Debug, Default, Deserialize)]
pub struct ListSynthesesParams {
    /// Only orders in this status.
    pub status: Option<SynthesisStatus>,
    /// Only orders created at or after this instant (RFC 3339).
    pub created_from: Option<DateTime<Utc>>,
    /// Only orders created at or before this instant (RFC 3339).
    pub created_to: Option<DateTime<Utc>>,
}

impl From<ListSynthesesParams> for SynthesisQuery {
    fn from(params: ListSynthesesParams) -> Self {
        Self {
            status: params.status,
            created_from: params.created_from,
            created_to: params.created_to,
        }
    }
}

/// Request body for PUT /{id}/purity.
#[derive(Debug, Deserialize)]
pub struct SetPurityRequest {
    /// Purity in percent, `0 < purity <= 100`.
    pub purity: f64,
}

/// Request body for PUT /{id}/moderate.
#[derive(Debug, Deserialize)]
pub struct ModerateRequest {
    /// `complete` or `reject`.
    pub decision: ModerationDecision,
}

/// Request body for PUT /{id}/lines/{reaction_id}.
#[derive(Debug, Deserialize)]
pub struct SetLineVolumeRequest {
    /// Starting-material volume.
    pub volume: f64,
}

/// GET /
async fn list_syntheses(
    State(state): State<AppState>,
    Bearer(token): Bearer,
    Query(params): Query<ListSynthesesParams>,
) -> Result<Json<Vec<SynthesisSummaryView>>, ApiError> {
    let query = SynthesisQuery::from(params);
    let syntheses = query_handlers::list_syntheses(&token, &query, &state.synthesis_ctx()).await?;
    Ok(Json(syntheses))
}

/// GET /draft
async fn draft_summary(
    State(state): State<AppState>,
    Bearer(token): Bearer,
) -> Result<Json<DraftSummaryView>, ApiError> {
    let summary = query_handlers::draft_summary(&token, &state.synthesis_ctx()).await?;
    Ok(Json(summary))
}

/// GET /{id}
async fn get_synthesis(
    State(state): State<AppState>,
    Path(synthesis_id): Path<Uuid>,
    Bearer(token): Bearer,
) -> Result<Json<SynthesisView>, ApiError> {
    let view = query_handlers::get_synthesis(&token, synthesis_id, &state.synthesis_ctx()).await?;
    Ok(Json(view))
}

/// GET /{id}/lines
async fn get_lines(
    State(state): State<AppState>,
    Path(synthesis_id): Path<Uuid>,
    Bearer(token): Bearer,
) -> Result<Json<Vec<LineView>>, ApiError> {
    let projection =
        query_handlers::lines_with_details(&token, synthesis_id, &state.synthesis_ctx()).await?;
    Ok(Json(projection.iter().map(LineView::from_detail).collect()))
}

/// PUT /{id}/purity
#[instrument(skip(state, token, request))]
async fn set_purity(
    State(state): State<AppState>,
    Path(synthesis_id): Path<Uuid>,
    Bearer(token): Bearer,
    Json(request): Json<SetPurityRequest>,
) -> Result<Json<SynthesisView>, ApiError> {
    let command = commands::SetPurity {
        correlation_id: Uuid::new_v4(),
        token,
        synthesis_id,
        purity: request.purity,
    };

    info!(correlation_id = %command.correlation_id, "handling set_purity command");

    let view = command_handlers::handle_set_purity(&command, &state.synthesis_ctx()).await?;
    Ok(Json(view))
}

/// PUT /{id}/form
#[instrument(skip(state, token))]
async fn form_synthesis(
    State(state): State<AppState>,
    Path(synthesis_id): Path<Uuid>,
    Bearer(token): Bearer,
) -> Result<Json<SynthesisView>, ApiError> {
    let command = commands::FormSynthesis {
        correlation_id: Uuid::new_v4(),
        token,
        synthesis_id,
    };

    info!(correlation_id = %command.correlation_id, "handling form_synthesis command");

    let view = command_handlers::handle_form_synthesis(&command, &state.synthesis_ctx()).await?;
    Ok(Json(view))
}

/// PUT /{id}/moderate
#[instrument(skip(state, token, request), fields(decision = ?request.decision))]
async fn moderate_synthesis(
    State(state): State<AppState>,
    Path(synthesis_id): Path<Uuid>,
    Bearer(token): Bearer,
    Json(request): Json<ModerateRequest>,
) -> Result<Json<SynthesisView>, ApiError> {
    let command = commands::ModerateSynthesis {
        correlation_id: Uuid::new_v4(),
        token,
        synthesis_id,
        decision: request.decision,
    };

    info!(correlation_id = %command.correlation_id, "handling moderate_synthesis command");

    let view =
        command_handlers::handle_moderate_synthesis(&command, &state.synthesis_ctx()).await?;
    Ok(Json(view))
}

/// DELETE /{id}
#[instrument(skip(state, token))]
async fn delete_synthesis(
    State(state): State<AppState>,
    Path(synthesis_id): Path<Uuid>,
    Bearer(token): Bearer,
) -> Result<Json<SynthesisView>, ApiError> {
    let command = commands::DeleteSynthesis {
        correlation_id: Uuid::new_v4(),
        token,
        synthesis_id,
    };

    info!(correlation_id = %command.correlation_id, "handling delete_synthesis command");

    let view = command_handlers::handle_delete_synthesis(&command, &state.synthesis_ctx()).await?;
    Ok(Json(view))
}

/// PUT /{id}/lines/{reaction_id}
#[instrument(skip(state, token, request))]
async fn set_line_volume(
    State(state): State<AppState>,
    Path((synthesis_id, reaction_id)): Path<(Uuid, Uuid)>,
    Bearer(token): Bearer,
    Json(request): Json<SetLineVolumeRequest>,
) -> Result<Json<SynthesisView>, ApiError> {
    let command = commands::SetLineVolume {
        correlation_id: Uuid::new_v4(),
        token,
        synthesis_id,
        reaction_id,
        volume: request.volume,
    };

    info!(correlation_id = %command.correlation_id, "handling set_line_volume command");

    let view = command_handlers::handle_set_line_volume(&command, &state.synthesis_ctx()).await?;
    Ok(Json(view))
}

/// DELETE /{id}/lines/{reaction_id}
#[instrument(skip(state, token))]
async fn remove_line(
    State(state): State<AppState>,
    Path((synthesis_id, reaction_id)): Path<(Uuid, Uuid)>,
    Bearer(token): Bearer,
) -> Result<Json<SynthesisView>, ApiError> {
    let command = commands::RemoveLine {
        correlation_id: Uuid::new_v4(),
        token,
        synthesis_id,
        reaction_id,
    };

    info!(correlation_id = %command.correlation_id, "handling remove_line command");

    let view = command_handlers::handle_remove_line(&command, &state.synthesis_ctx()).await?;
    Ok(Json(view))
}

/// Returns the router for the synthesis context.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_syntheses))
        .route("/draft", get(draft_summary))
        .route("/{id}", get(get_synthesis).delete(delete_synthesis))
        .route("/{id}/lines", get(get_lines))
        .route("/{id}/purity", put(set_purity))
        .route("/{id}/form", put(form_synthesis))
        .route("/{id}/moderate", put(moderate_synthesis))
        .route(
            "/{id}/lines/{reaction_id}",
            put(set_line_volume).delete(remove_line),
        )
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::{Value, json};
    use synthlab_test_support::sample_reaction;

    use super::*;
    use crate::routes::testing::{TestApp, send};

    struct Flow {
        app: Router,
        user_token: String,
        moderator_token: String,
        reaction_id: Uuid,
    }

    impl Flow {
        fn new() -> Self {
            let harness = TestApp::new();
            let (_, user_token) = harness.user_token();
            let (_, moderator_token) = harness.moderator_token();
            let reaction = sample_reaction("Aspirin synthesis");
            let reaction_id = reaction.id;
            harness.reactions.insert(reaction);
            Self {
                app: crate::app(harness.state),
                user_token,
                moderator_token,
                reaction_id,
            }
        }

        async fn call(
            &self,
            method: &str,
            uri: &str,
            token: &str,
            body: Option<&Value>,
        ) -> (StatusCode, Value) {
            send(self.app.clone(), method, uri, Some(token), body).await
        }

        async fn draft_id(&self) -> String {
            let uri = format!("/api/v1/reactions/{}/add-to-draft", self.reaction_id);
            let (status, json) = self.call("POST", &uri, &self.user_token, None).await;
            assert_eq!(status, StatusCode::OK);
            json["synthesis_id"].as_str().unwrap().to_owned()
        }

        async fn formed_id(&self) -> String {
            let id = self.draft_id().await;
            let base = format!("/api/v1/syntheses/{id}");
            self.call(
                "PUT",
                &format!("{base}/lines/{}", self.reaction_id),
                &self.user_token,
                Some(&json!({ "volume": 10.0 })),
            )
            .await;
            self.call(
                "PUT",
                &format!("{base}/purity"),
                &self.user_token,
                Some(&json!({ "purity": 50.0 })),
            )
            .await;
            let (status, json) = self
                .call("PUT", &format!("{base}/form"), &self.user_token, None)
                .await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(json["status"], "formed");
            id
        }
    }

    #[tokio::test]
    async fn test_complete_computes_result_volume() {
        // Arrange
        let flow = Flow::new();
        let id = flow.formed_id().await;

        // Act
        let (status, json) = flow
            .call(
                "PUT",
                &format!("/api/v1/syntheses/{id}/moderate"),
                &flow.moderator_token,
                Some(&json!({ "decision": "complete" })),
            )
            .await;

        // Assert
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "completed");
        assert_eq!(json["lines"][0]["volume_sm"], 10.0);
        assert_eq!(json["lines"][0]["volume_rm"], 5.0);
        assert!(json["moderator_id"].is_string());
        assert!(json["finished_at"].is_string());
    }

    #[tokio::test]
    async fn test_reject_leaves_volumes_untouched() {
        // Arrange
        let flow = Flow::new();
        let id = flow.formed_id().await;

        // Act
        let (status, json) = flow
            .call(
                "PUT",
                &format!("/api/v1/syntheses/{id}/moderate"),
                &flow.moderator_token,
                Some(&json!({ "decision": "reject" })),
            )
            .await;

        // Assert
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "rejected");
        assert_eq!(json["lines"][0]["volume_rm"], 0.0);
    }

    #[tokio::test]
    async fn test_moderate_by_regular_user_returns_403() {
        // Arrange
        let flow = Flow::new();
        let id = flow.formed_id().await;

        // Act
        let (status, json) = flow
            .call(
                "PUT",
                &format!("/api/v1/syntheses/{id}/moderate"),
                &flow.user_token,
                Some(&json!({ "decision": "complete" })),
            )
            .await;

        // Assert
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(json["error"], "forbidden");
    }

    #[tokio::test]
    async fn test_moderate_with_unknown_decision_returns_422() {
        // Arrange
        let flow = Flow::new();
        let id = flow.formed_id().await;

        // Act
        let (status, _) = flow
            .call(
                "PUT",
                &format!("/api/v1/syntheses/{id}/moderate"),
                &flow.moderator_token,
                Some(&json!({ "decision": "approve" })),
            )
            .await;

        // Assert
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_completing_a_draft_returns_409() {
        // Arrange
        let flow = Flow::new();
        let id = flow.draft_id().await;

        // Act
        let (status, json) = flow
            .call(
                "PUT",
                &format!("/api/v1/syntheses/{id}/moderate"),
                &flow.moderator_token,
                Some(&json!({ "decision": "complete" })),
            )
            .await;

        // Assert
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(json["error"], "illegal_transition");
    }

    #[tokio::test]
    async fn test_form_without_purity_returns_400() {
        // Arrange
        let flow = Flow::new();
        let id = flow.draft_id().await;

        // Act
        let (status, json) = flow
            .call(
                "PUT",
                &format!("/api/v1/syntheses/{id}/form"),
                &flow.user_token,
                None,
            )
            .await;

        // Assert
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "out_of_range");
    }

    #[tokio::test]
    async fn test_purity_above_100_returns_400() {
        // Arrange
        let flow = Flow::new();
        let id = flow.draft_id().await;

        // Act
        let (status, json) = flow
            .call(
                "PUT",
                &format!("/api/v1/syntheses/{id}/purity"),
                &flow.user_token,
                Some(&json!({ "purity": 100.5 })),
            )
            .await;

        // Assert
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "out_of_range");
    }

    #[tokio::test]
    async fn test_editing_a_formed_order_returns_409() {
        // Arrange
        let flow = Flow::new();
        let id = flow.formed_id().await;

        // Act
        let (status, json) = flow
            .call(
                "DELETE",
                &format!("/api/v1/syntheses/{id}/lines/{}", flow.reaction_id),
                &flow.user_token,
                None,
            )
            .await;

        // Assert
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(json["error"], "invalid_state");
    }

    #[tokio::test]
    async fn test_remove_line_at_quantity_one_drops_it() {
        // Arrange
        let flow = Flow::new();
        let id = flow.draft_id().await;

        // Act
        let (status, json) = flow
            .call(
                "DELETE",
                &format!("/api/v1/syntheses/{id}/lines/{}", flow.reaction_id),
                &flow.user_token,
                None,
            )
            .await;

        // Assert
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "draft");
        assert!(json["lines"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_draft_summary_counts_lines() {
        // Arrange
        let flow = Flow::new();
        let (_, empty) = flow
            .call("GET", "/api/v1/syntheses/draft", &flow.user_token, None)
            .await;
        let id = flow.draft_id().await;

        // Act
        let (status, json) = flow
            .call("GET", "/api/v1/syntheses/draft", &flow.user_token, None)
            .await;

        // Assert
        assert!(empty["draft_id"].is_null());
        assert_eq!(empty["line_count"], 0);
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["draft_id"], id);
        assert_eq!(json["line_count"], 1);
    }

    #[tokio::test]
    async fn test_lines_endpoint_returns_catalog_details() {
        // Arrange
        let flow = Flow::new();
        let id = flow.draft_id().await;

        // Act
        let (status, json) = flow
            .call(
                "GET",
                &format!("/api/v1/syntheses/{id}/lines"),
                &flow.user_token,
                None,
            )
            .await;

        // Assert
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json[0]["title"], "Aspirin synthesis");
        assert_eq!(json[0]["starting_material"]["molar_mass"], 100.0);
    }

    #[tokio::test]
    async fn test_other_users_cannot_read_a_draft() {
        // Arrange
        let harness = TestApp::new();
        let (_, owner) = harness.user_token();
        let (_, stranger) = harness.user_token();
        let reaction = sample_reaction("Aspirin synthesis");
        let reaction_id = reaction.id;
        harness.reactions.insert(reaction);
        let app = crate::app(harness.state);
        let (_, draft) = send(
            app.clone(),
            "POST",
            &format!("/api/v1/reactions/{reaction_id}/add-to-draft"),
            Some(&owner),
            None,
        )
        .await;
        let id = draft["synthesis_id"].as_str().unwrap();

        // Act
        let (status, json) = send(
            app,
            "GET",
            &format!("/api/v1/syntheses/{id}"),
            Some(&stranger),
            None,
        )
        .await;

        // Assert
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(json["error"], "forbidden");
    }

    #[tokio::test]
    async fn test_list_excludes_drafts_and_rejects_draft_filter() {
        // Arrange
        let flow = Flow::new();
        let id = flow.formed_id().await;

        // Act
        let (status, json) = flow
            .call("GET", "/api/v1/syntheses", &flow.moderator_token, None)
            .await;
        let (filter_status, filter_json) = flow
            .call(
                "GET",
                "/api/v1/syntheses?status=draft",
                &flow.moderator_token,
                None,
            )
            .await;

        // Assert
        assert_eq!(status, StatusCode::OK);
        let ids: Vec<&str> = json
            .as_array()
            .unwrap()
            .iter()
            .map(|s| s["synthesis_id"].as_str().unwrap())
            .collect();
        assert_eq!(ids, vec![id.as_str()]);
        assert_eq!(filter_status, StatusCode::BAD_REQUEST);
        assert_eq!(filter_json["error"], "validation_error");
    }

    #[tokio::test]
    async fn test_delete_then_get_returns_404() {
        // Arrange
        let flow = Flow::new();
        let id = flow.draft_id().await;
        let uri = format!("/api/v1/syntheses/{id}");

        // Act
        let (deleted, json) = flow.call("DELETE", &uri, &flow.user_token, None).await;
        let (status, _) = flow.call("GET", &uri, &flow.user_token, None).await;

        // Assert
        assert_eq!(deleted, StatusCode::OK);
        assert_eq!(json["status"], "deleted");
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
