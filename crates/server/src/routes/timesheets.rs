use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use models::time_entry;
use service::timesheets::{self as svc, NewTimeEntry, Review, TimeEntryFilter, TimeEntryPatch};

use crate::errors::JsonApiError;
use crate::state::{Actor, AppState};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/time-entries", get(list).post(log))
        .route("/time-entries/:id", get(get_one).patch(update).delete(delete))
        .route("/time-entries/:id/review", post(review))
}

#[derive(Debug, Deserialize)]
pub struct ReviewRequest {
    pub expected_version: i32,
    pub action: Review,
}

#[utoipa::path(
    post,
    path = "/api/time-entries",
    tag = "timesheets",
    request_body = crate::openapi::NewTimeEntryDoc,
    responses(
        (status = 201, description = "Draft entry logged"),
        (status = 400, description = "Hours out of range, outside the assignment or over 24 h that day")
    )
)]
pub async fn log(
    State(state): State<AppState>,
    actor: Actor,
    Json(input): Json<NewTimeEntry>,
) -> Result<(StatusCode, Json<time_entry::Model>), JsonApiError> {
    let created = svc::log_time(&state.db, input, actor.as_str()).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    get,
    path = "/api/time-entries",
    tag = "timesheets",
    params(
        ("project_id" = Option<Uuid>, Query, description = "Entries on this project"),
        ("employee_id" = Option<Uuid>, Query, description = "Entries of this employee"),
        ("status" = Option<String>, Query, description = "draft, submitted, approved, rejected or invoiced"),
        ("from" = Option<String>, Query, description = "First work date, YYYY-MM-DD"),
        ("to" = Option<String>, Query, description = "Last work date, YYYY-MM-DD")
    ),
    responses((status = 200, description = "Matching entries"))
)]
pub async fn list(State(state): State<AppState>, Query(filter): Query<TimeEntryFilter>) -> Result<Json<Vec<time_entry::Model>>, JsonApiError> {
    Ok(Json(svc::list_time_entries(&state.db, filter).await?))
}

pub async fn get_one(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<time_entry::Model>, JsonApiError> {
    Ok(Json(svc::get_time_entry(&state.db, id).await?))
}

#[utoipa::path(
    patch,
    path = "/api/time-entries/{id}",
    tag = "timesheets",
    params(("id" = Uuid, Path, description = "Time entry id")),
    request_body = crate::openapi::TimeEntryPatchDoc,
    responses(
        (status = 200, description = "Entry updated; a rejected entry returns to draft"),
        (status = 422, description = "Entry is no longer editable")
    )
)]
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(patch): Json<TimeEntryPatch>,
) -> Result<Json<time_entry::Model>, JsonApiError> {
    Ok(Json(svc::update_time_entry(&state.db, id, patch).await?))
}

#[utoipa::path(
    post,
    path = "/api/time-entries/{id}/review",
    tag = "timesheets",
    params(("id" = Uuid, Path, description = "Time entry id")),
    request_body = crate::openapi::ReviewDoc,
    responses((status = 200, description = "Entry moved on"), (status = 422, description = "Transition not allowed"))
)]
pub async fn review(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<ReviewRequest>,
) -> Result<Json<time_entry::Model>, JsonApiError> {
    Ok(Json(svc::review_time_entry(&state.db, id, body.expected_version, body.action).await?))
}

pub async fn delete(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<StatusCode, JsonApiError> {
    svc::delete_time_entry(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
