use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use uuid::Uuid;

use common::pagination::Pagination;
use common::types::Page;
use models::employee::{self, NewEmployee};
use service::employees::{self as svc, EmployeePatch};
use service::staffing::domain::Utilization;

use crate::errors::JsonApiError;
use crate::state::{Actor, AppState};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/employees", get(list).post(create))
        .route("/employees/:id", get(get_one).patch(update).delete(delete))
        .route("/employees/:id/utilization", get(utilization))
}

#[derive(Debug, Deserialize)]
pub struct UtilizationQuery {
    /// Defaults to today.
    pub date: Option<NaiveDate>,
}

#[utoipa::path(
    get,
    path = "/api/employees",
    tag = "employees",
    params(
        ("page" = Option<u32>, Query, description = "1-based page"),
        ("per_page" = Option<u32>, Query, description = "Items per page, at most 100")
    ),
    responses((status = 200, description = "One page of employees"))
)]
pub async fn list(State(state): State<AppState>, Query(paging): Query<Pagination>) -> Result<Json<Page<employee::Model>>, JsonApiError> {
    let items = svc::list_employees(&state.db, paging).await?;
    Ok(Json(super::page_of(items, paging)))
}

#[utoipa::path(
    post,
    path = "/api/employees",
    tag = "employees",
    request_body = crate::openapi::NewEmployeeDoc,
    responses(
        (status = 201, description = "Employee created"),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Employee code or email already in use")
    )
)]
pub async fn create(
    State(state): State<AppState>,
    actor: Actor,
    Json(input): Json<NewEmployee>,
) -> Result<(StatusCode, Json<employee::Model>), JsonApiError> {
    let created = svc::create_employee(&state.db, input, actor.as_str()).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    get,
    path = "/api/employees/{id}",
    tag = "employees",
    params(("id" = Uuid, Path, description = "Employee id")),
    responses((status = 200, description = "Employee"), (status = 404, description = "Not found"))
)]
pub async fn get_one(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<employee::Model>, JsonApiError> {
    Ok(Json(svc::get_employee(&state.db, id).await?))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(patch): Json<EmployeePatch>,
) -> Result<Json<employee::Model>, JsonApiError> {
    Ok(Json(svc::update_employee(&state.db, id, patch).await?))
}

pub async fn delete(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<StatusCode, JsonApiError> {
    svc::soft_delete_employee(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/employees/{id}/utilization",
    tag = "employees",
    params(
        ("id" = Uuid, Path, description = "Employee id"),
        ("date" = Option<String>, Query, description = "Day to inspect, YYYY-MM-DD; defaults to today")
    ),
    responses((status = 200, description = "Allocation of active assignments covering the day"))
)]
pub async fn utilization(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(q): Query<UtilizationQuery>,
) -> Result<Json<Utilization>, JsonApiError> {
    let on = q.date.unwrap_or_else(|| Utc::now().date_naive());
    Ok(Json(state.staffing.employee_utilization(id, on).await?))
}
