use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch, post},
    Json, Router,
};
use uuid::Uuid;

use models::budget_line;
use service::costing::{self as svc, BudgetLinePatch, CostReport, LaborVariance, NewBudgetLine};

use crate::errors::JsonApiError;
use crate::state::{Actor, AppState};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/budget-lines", post(create_line))
        .route("/budget-lines/:id", patch(update_line).delete(delete_line))
        .route("/projects/:id/budget-lines", get(list_lines))
        .route("/projects/:id/labor-variance", get(labor_variance))
        .route("/projects/:id/cost-report", get(cost_report))
}

#[utoipa::path(
    post,
    path = "/api/budget-lines",
    tag = "costing",
    request_body = crate::openapi::NewBudgetLineDoc,
    responses(
        (status = 201, description = "Budget line created"),
        (status = 409, description = "The project already has a line for this category")
    )
)]
pub async fn create_line(
    State(state): State<AppState>,
    actor: Actor,
    Json(input): Json<NewBudgetLine>,
) -> Result<(StatusCode, Json<budget_line::Model>), JsonApiError> {
    let created = svc::create_budget_line(&state.db, input, actor.as_str()).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn list_lines(State(state): State<AppState>, Path(project_id): Path<Uuid>) -> Result<Json<Vec<budget_line::Model>>, JsonApiError> {
    Ok(Json(svc::list_budget_lines(&state.db, project_id).await?))
}

pub async fn update_line(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(patch): Json<BudgetLinePatch>,
) -> Result<Json<budget_line::Model>, JsonApiError> {
    Ok(Json(svc::update_budget_line(&state.db, id, patch).await?))
}

pub async fn delete_line(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<StatusCode, JsonApiError> {
    svc::delete_budget_line(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/projects/{id}/labor-variance",
    tag = "costing",
    params(("id" = Uuid, Path, description = "Project id")),
    responses((status = 200, description = "Planned slot cost against approved labor cost"))
)]
pub async fn labor_variance(State(state): State<AppState>, Path(project_id): Path<Uuid>) -> Result<Json<LaborVariance>, JsonApiError> {
    let hours = state.settings.business.standard_hours_per_month;
    Ok(Json(svc::labor_variance(&state.db, project_id, hours).await?))
}

#[utoipa::path(
    get,
    path = "/api/projects/{id}/cost-report",
    tag = "costing",
    params(("id" = Uuid, Path, description = "Project id")),
    responses((status = 200, description = "Planned and actual cost per budget category"))
)]
pub async fn cost_report(State(state): State<AppState>, Path(project_id): Path<Uuid>) -> Result<Json<CostReport>, JsonApiError> {
    let hours = state.settings.business.standard_hours_per_month;
    Ok(Json(svc::project_cost_report(&state.db, project_id, hours).await?))
}
