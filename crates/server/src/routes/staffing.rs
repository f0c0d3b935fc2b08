use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use models::actual_assignment;
use service::errors::ServiceError;
use service::staffing::domain::{AssignmentFilter, AssignmentPatch, NewAssignment, NewSlot, SlotSummary};

use crate::errors::JsonApiError;
use crate::metrics::ALLOCATION_REJECTIONS_TOTAL;
use crate::state::{Actor, AppState};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/slots", post(create_slot))
        .route("/slots/:id", get(get_slot).delete(delete_slot))
        .route("/projects/:id/slots", get(list_slots))
        .route("/assignments", get(list_assignments).post(assign))
        .route("/assignments/:id", get(get_assignment).patch(update_assignment))
        .route("/assignments/:id/end", post(end_assignment))
        .route("/assignments/:id/cancel", post(cancel_assignment))
}

#[derive(Debug, Deserialize)]
pub struct EndAssignment {
    pub end_date: NaiveDate,
}

/// Count allocation-ceiling refusals before answering.
fn count_rejection(e: ServiceError) -> JsonApiError {
    if matches!(e, ServiceError::OverAllocated(_)) {
        ALLOCATION_REJECTIONS_TOTAL.inc();
    }
    e.into()
}

#[utoipa::path(
    post,
    path = "/api/slots",
    tag = "staffing",
    request_body = crate::openapi::NewSlotDoc,
    responses(
        (status = 201, description = "Slot planned, with its budget cost"),
        (status = 400, description = "Allocation or dates out of range")
    )
)]
pub async fn create_slot(
    State(state): State<AppState>,
    actor: Actor,
    Json(input): Json<NewSlot>,
) -> Result<(StatusCode, Json<SlotSummary>), JsonApiError> {
    let slot = state.staffing.create_slot(input, actor.as_str()).await?;
    Ok((StatusCode::CREATED, Json(slot)))
}

#[utoipa::path(
    get,
    path = "/api/slots/{id}",
    tag = "staffing",
    params(("id" = Uuid, Path, description = "Slot id")),
    responses((status = 200, description = "Slot with budget cost and remaining allocation"), (status = 404, description = "Not found"))
)]
pub async fn get_slot(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<SlotSummary>, JsonApiError> {
    Ok(Json(state.staffing.get_slot(id).await?))
}

#[utoipa::path(
    get,
    path = "/api/projects/{id}/slots",
    tag = "staffing",
    params(("id" = Uuid, Path, description = "Project id")),
    responses((status = 200, description = "The project's planned team"))
)]
pub async fn list_slots(State(state): State<AppState>, Path(project_id): Path<Uuid>) -> Result<Json<Vec<SlotSummary>>, JsonApiError> {
    Ok(Json(state.staffing.list_slots(project_id).await?))
}

pub async fn delete_slot(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<StatusCode, JsonApiError> {
    state.staffing.delete_slot(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/assignments",
    tag = "staffing",
    request_body = crate::openapi::NewAssignmentDoc,
    responses(
        (status = 201, description = "Employee assigned"),
        (status = 400, description = "Allocation or dates out of range"),
        (status = 409, description = "Slot or employee allocation ceiling exceeded")
    )
)]
pub async fn assign(
    State(state): State<AppState>,
    actor: Actor,
    Json(input): Json<NewAssignment>,
) -> Result<(StatusCode, Json<actual_assignment::Model>), JsonApiError> {
    let created = state.staffing.assign_employee(input, actor.as_str()).await.map_err(count_rejection)?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    get,
    path = "/api/assignments",
    tag = "staffing",
    params(
        ("project_id" = Option<Uuid>, Query, description = "Assignments on this project"),
        ("employee_id" = Option<Uuid>, Query, description = "Assignments of this employee")
    ),
    responses((status = 200, description = "Matching assignments"), (status = 400, description = "Neither filter given"))
)]
pub async fn list_assignments(
    State(state): State<AppState>,
    Query(filter): Query<AssignmentFilter>,
) -> Result<Json<Vec<actual_assignment::Model>>, JsonApiError> {
    Ok(Json(state.staffing.list_assignments(filter).await?))
}

pub async fn get_assignment(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<actual_assignment::Model>, JsonApiError> {
    Ok(Json(state.staffing.get_assignment(id).await?))
}

#[utoipa::path(
    patch,
    path = "/api/assignments/{id}",
    tag = "staffing",
    params(("id" = Uuid, Path, description = "Assignment id")),
    request_body = crate::openapi::AssignmentPatchDoc,
    responses((status = 200, description = "Assignment updated"), (status = 409, description = "Stale version or allocation ceiling exceeded"))
)]
pub async fn update_assignment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(patch): Json<AssignmentPatch>,
) -> Result<Json<actual_assignment::Model>, JsonApiError> {
    Ok(Json(state.staffing.update_assignment(id, patch).await.map_err(count_rejection)?))
}

pub async fn end_assignment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<EndAssignment>,
) -> Result<Json<actual_assignment::Model>, JsonApiError> {
    Ok(Json(state.staffing.end_assignment(id, body.end_date).await?))
}

pub async fn cancel_assignment(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<actual_assignment::Model>, JsonApiError> {
    Ok(Json(state.staffing.cancel_assignment(id).await?))
}
