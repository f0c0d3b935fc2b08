use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use models::task::{self, TaskStatus};
use models::task_dependency;
use service::planning::tasks::{self as svc, NewTask};
use service::planning::CriticalPath;

use crate::errors::JsonApiError;
use crate::state::{Actor, AppState};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/tasks", post(create))
        .route("/tasks/:id", delete(remove))
        .route("/tasks/:id/status", post(change_status))
        .route("/tasks/:id/dependencies", post(add_dependency))
        .route("/dependencies/:id", delete(remove_dependency))
        .route("/projects/:id/tasks", get(list))
        .route("/projects/:id/dependencies", get(list_dependencies))
        .route("/projects/:id/critical-path", get(critical_path))
}

#[derive(Debug, Deserialize)]
pub struct StatusChange {
    pub status: TaskStatus,
}

#[derive(Debug, Deserialize)]
pub struct NewDependency {
    pub depends_on: Uuid,
}

#[utoipa::path(
    post,
    path = "/api/tasks",
    tag = "planning",
    request_body = crate::openapi::NewTaskDoc,
    responses((status = 201, description = "Task created in todo"), (status = 400, description = "Invalid input"))
)]
pub async fn create(
    State(state): State<AppState>,
    actor: Actor,
    Json(input): Json<NewTask>,
) -> Result<(StatusCode, Json<task::Model>), JsonApiError> {
    let created = svc::create_task(&state.db, input, actor.as_str()).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn list(State(state): State<AppState>, Path(project_id): Path<Uuid>) -> Result<Json<Vec<task::Model>>, JsonApiError> {
    Ok(Json(svc::list_tasks(&state.db, project_id).await?))
}

pub async fn change_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<StatusChange>,
) -> Result<Json<task::Model>, JsonApiError> {
    Ok(Json(svc::update_task_status(&state.db, id, body.status).await?))
}

// also drops the task's dependency edges
pub async fn remove(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<StatusCode, JsonApiError> {
    svc::delete_task(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/tasks/{id}/dependencies",
    tag = "planning",
    params(("id" = Uuid, Path, description = "Task that waits")),
    request_body = crate::openapi::NewDependencyDoc,
    responses(
        (status = 201, description = "Dependency added"),
        (status = 400, description = "Self dependency, other project or cycle"),
        (status = 409, description = "Dependency already exists")
    )
)]
pub async fn add_dependency(
    State(state): State<AppState>,
    Path(task_id): Path<Uuid>,
    Json(body): Json<NewDependency>,
) -> Result<(StatusCode, Json<task_dependency::Model>), JsonApiError> {
    let created = svc::add_dependency(&state.db, task_id, body.depends_on).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn remove_dependency(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<StatusCode, JsonApiError> {
    svc::remove_dependency(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_dependencies(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
) -> Result<Json<Vec<task_dependency::Model>>, JsonApiError> {
    Ok(Json(svc::list_dependencies(&state.db, project_id).await?))
}

#[utoipa::path(
    get,
    path = "/api/projects/{id}/critical-path",
    tag = "planning",
    params(("id" = Uuid, Path, description = "Project id")),
    responses((status = 200, description = "Longest chain of dependent tasks and every task's earliest start"))
)]
pub async fn critical_path(State(state): State<AppState>, Path(project_id): Path<Uuid>) -> Result<Json<CriticalPath>, JsonApiError> {
    Ok(Json(svc::project_critical_path(&state.db, project_id).await?))
}
