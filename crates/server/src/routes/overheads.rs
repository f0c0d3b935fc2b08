use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use models::overhead;
use service::overheads::{self as svc, NewOverhead};

use crate::errors::JsonApiError;
use crate::state::{Actor, AppState};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/overheads", get(list).post(record))
        .route("/overheads/:id", delete(remove))
}

#[derive(Debug, Default, Deserialize)]
pub struct OverheadQuery {
    /// Without it the company-wide overheads are listed.
    pub project_id: Option<Uuid>,
}

#[utoipa::path(
    post,
    path = "/api/overheads",
    tag = "overheads",
    request_body = crate::openapi::NewOverheadDoc,
    responses((status = 201, description = "Overhead booked"), (status = 400, description = "Amount must be positive"))
)]
pub async fn record(
    State(state): State<AppState>,
    actor: Actor,
    Json(input): Json<NewOverhead>,
) -> Result<(StatusCode, Json<overhead::Model>), JsonApiError> {
    let created = svc::record_overhead(&state.db, input, actor.as_str()).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    get,
    path = "/api/overheads",
    tag = "overheads",
    params(("project_id" = Option<Uuid>, Query, description = "Project; omit for company-wide overheads")),
    responses((status = 200, description = "Overheads"))
)]
pub async fn list(State(state): State<AppState>, Query(q): Query<OverheadQuery>) -> Result<Json<Vec<overhead::Model>>, JsonApiError> {
    Ok(Json(svc::list_overheads(&state.db, q.project_id).await?))
}

pub async fn remove(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<StatusCode, JsonApiError> {
    svc::delete_overhead(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
