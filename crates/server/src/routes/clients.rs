use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use uuid::Uuid;

use common::pagination::Pagination;
use common::types::Page;
use models::client::{self, NewClient};
use service::clients::{self as svc, ClientPatch};

use crate::errors::JsonApiError;
use crate::state::{Actor, AppState};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/clients", get(list).post(create))
        .route("/clients/:id", get(get_one).patch(update).delete(delete))
}

#[utoipa::path(
    get,
    path = "/api/clients",
    tag = "clients",
    params(
        ("page" = Option<u32>, Query, description = "1-based page"),
        ("per_page" = Option<u32>, Query, description = "Items per page, at most 100")
    ),
    responses((status = 200, description = "One page of clients"))
)]
pub async fn list(State(state): State<AppState>, Query(paging): Query<Pagination>) -> Result<Json<Page<client::Model>>, JsonApiError> {
    let items = svc::list_clients(&state.db, paging).await?;
    Ok(Json(super::page_of(items, paging)))
}

#[utoipa::path(
    post,
    path = "/api/clients",
    tag = "clients",
    request_body = crate::openapi::NewClientDoc,
    responses(
        (status = 201, description = "Client created"),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Duplicate client")
    )
)]
pub async fn create(
    State(state): State<AppState>,
    actor: Actor,
    Json(input): Json<NewClient>,
) -> Result<(StatusCode, Json<client::Model>), JsonApiError> {
    let created = svc::create_client(&state.db, input, actor.as_str()).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    get,
    path = "/api/clients/{id}",
    tag = "clients",
    params(("id" = Uuid, Path, description = "Client id")),
    responses((status = 200, description = "Client"), (status = 404, description = "Not found"))
)]
pub async fn get_one(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<client::Model>, JsonApiError> {
    Ok(Json(svc::get_client(&state.db, id).await?))
}

#[utoipa::path(
    patch,
    path = "/api/clients/{id}",
    tag = "clients",
    params(("id" = Uuid, Path, description = "Client id")),
    request_body = crate::openapi::ClientPatchDoc,
    responses(
        (status = 200, description = "Client updated"),
        (status = 409, description = "Stale row version")
    )
)]
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(patch): Json<ClientPatch>,
) -> Result<Json<client::Model>, JsonApiError> {
    Ok(Json(svc::update_client(&state.db, id, patch).await?))
}

// soft delete; refused while the client has running projects
pub async fn delete(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<StatusCode, JsonApiError> {
    svc::soft_delete_client(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
