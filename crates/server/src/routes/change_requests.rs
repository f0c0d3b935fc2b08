use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use models::change_request;
use service::change_requests::{self as svc, Decision, NewChangeRequest};

use crate::errors::JsonApiError;
use crate::state::{Actor, AppState};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/change-requests", post(create))
        .route("/change-requests/:id", get(get_one))
        .route("/change-requests/:id/decision", post(decide))
        .route("/projects/:id/change-requests", get(list))
}

#[derive(Debug, Deserialize)]
pub struct DecisionRequest {
    pub expected_version: i32,
    pub decision: Decision,
}

#[utoipa::path(
    post,
    path = "/api/change-requests",
    tag = "change_requests",
    request_body = crate::openapi::NewChangeRequestDoc,
    responses((status = 201, description = "Draft change request"), (status = 400, description = "Invalid input"))
)]
pub async fn create(
    State(state): State<AppState>,
    actor: Actor,
    Json(input): Json<NewChangeRequest>,
) -> Result<(StatusCode, Json<change_request::Model>), JsonApiError> {
    let created = svc::create_change_request(&state.db, input, actor.as_str()).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn get_one(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<change_request::Model>, JsonApiError> {
    Ok(Json(svc::get_change_request(&state.db, id).await?))
}

pub async fn list(State(state): State<AppState>, Path(project_id): Path<Uuid>) -> Result<Json<Vec<change_request::Model>>, JsonApiError> {
    Ok(Json(svc::list_change_requests(&state.db, project_id).await?))
}

#[utoipa::path(
    post,
    path = "/api/change-requests/{id}/decision",
    tag = "change_requests",
    params(("id" = Uuid, Path, description = "Change request id")),
    request_body = crate::openapi::DecisionDoc,
    responses(
        (status = 200, description = "Moved on; approval updates the project's budget and end date"),
        (status = 400, description = "Approval would leave a negative budget"),
        (status = 409, description = "Stale row version"),
        (status = 422, description = "Transition not allowed")
    )
)]
pub async fn decide(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
    Json(body): Json<DecisionRequest>,
) -> Result<Json<change_request::Model>, JsonApiError> {
    Ok(Json(svc::decide_change_request(&state.db, id, body.expected_version, body.decision, actor.as_str()).await?))
}
