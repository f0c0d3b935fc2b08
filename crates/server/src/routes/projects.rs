use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use common::pagination::Pagination;
use common::types::Page;
use models::project::{self, ProjectStatus};
use service::projects::{self as svc, NewProject, ProjectFilter, ProjectPatch};

use crate::errors::JsonApiError;
use crate::state::{Actor, AppState};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/projects", get(list).post(create))
        .route("/projects/:id", get(get_one).patch(update).delete(delete))
        .route("/projects/:id/status", post(change_status))
}

#[derive(Debug, Deserialize)]
pub struct StatusChange {
    pub expected_version: i32,
    pub status: ProjectStatus,
}

#[utoipa::path(
    get,
    path = "/api/projects",
    tag = "projects",
    params(
        ("client_id" = Option<Uuid>, Query, description = "Only this client's projects"),
        ("status" = Option<String>, Query, description = "draft, active, on_hold, completed or cancelled"),
        ("page" = Option<u32>, Query, description = "1-based page"),
        ("per_page" = Option<u32>, Query, description = "Items per page, at most 100")
    ),
    responses((status = 200, description = "One page of projects"))
)]
pub async fn list(
    State(state): State<AppState>,
    Query(filter): Query<ProjectFilter>,
    Query(paging): Query<Pagination>,
) -> Result<Json<Page<project::Model>>, JsonApiError> {
    let items = svc::list_projects(&state.db, filter, paging).await?;
    Ok(Json(super::page_of(items, paging)))
}

#[utoipa::path(
    post,
    path = "/api/projects",
    tag = "projects",
    request_body = crate::openapi::NewProjectDoc,
    responses(
        (status = 201, description = "Project created in draft"),
        (status = 400, description = "Invalid input"),
        (status = 404, description = "Unknown client"),
        (status = 409, description = "Project code already in use")
    )
)]
pub async fn create(
    State(state): State<AppState>,
    actor: Actor,
    Json(input): Json<NewProject>,
) -> Result<(StatusCode, Json<project::Model>), JsonApiError> {
    let created = svc::create_project(&state.db, input, actor.as_str()).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    get,
    path = "/api/projects/{id}",
    tag = "projects",
    params(("id" = Uuid, Path, description = "Project id")),
    responses((status = 200, description = "Project"), (status = 404, description = "Not found"))
)]
pub async fn get_one(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<project::Model>, JsonApiError> {
    Ok(Json(svc::get_project(&state.db, id).await?))
}

#[utoipa::path(
    patch,
    path = "/api/projects/{id}",
    tag = "projects",
    params(("id" = Uuid, Path, description = "Project id")),
    request_body = crate::openapi::ProjectPatchDoc,
    responses((status = 200, description = "Project updated"), (status = 409, description = "Stale row version"))
)]
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(patch): Json<ProjectPatch>,
) -> Result<Json<project::Model>, JsonApiError> {
    Ok(Json(svc::update_project(&state.db, id, patch).await?))
}

#[utoipa::path(
    post,
    path = "/api/projects/{id}/status",
    tag = "projects",
    params(("id" = Uuid, Path, description = "Project id")),
    request_body = crate::openapi::ProjectStatusDoc,
    responses(
        (status = 200, description = "Status changed"),
        (status = 409, description = "Stale row version"),
        (status = 422, description = "Transition not allowed")
    )
)]
pub async fn change_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<StatusChange>,
) -> Result<Json<project::Model>, JsonApiError> {
    Ok(Json(svc::change_project_status(&state.db, id, body.expected_version, body.status).await?))
}

pub async fn delete(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<StatusCode, JsonApiError> {
    svc::soft_delete_project(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
