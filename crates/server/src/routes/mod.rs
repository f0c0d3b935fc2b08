use axum::{middleware, response::IntoResponse, routing::get, Json, Router};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use common::pagination::Pagination;
use common::types::{Health, Page};

use crate::metrics;
use crate::openapi::ApiDoc;
use crate::state::AppState;

pub mod billing;
pub mod change_requests;
pub mod clients;
pub mod costing;
pub mod employees;
pub mod overheads;
pub mod planning;
pub mod procurement;
pub mod projects;
pub mod staffing;
pub mod timesheets;

#[utoipa::path(get, path = "/health", tag = "health", responses((status = 200, description = "Service is up", body = crate::openapi::HealthResponse)))]
pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

#[utoipa::path(get, path = "/metrics", tag = "health", responses((status = 200, description = "Prometheus text exposition")))]
pub async fn metrics_export() -> impl IntoResponse {
    metrics::encode_metrics()
}

/// Wrap a listing with the paging parameters that produced it.
pub(crate) fn page_of<T>(items: Vec<T>, paging: Pagination) -> Page<T> {
    let (index, per_page) = paging.normalize();
    Page { items, page: index as u32 + 1, per_page: per_page as u32 }
}

/// Every resource router, nested under `/api`.
fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(clients::router())
        .merge(projects::router())
        .merge(employees::router())
        .merge(staffing::router())
        .merge(timesheets::router())
        .merge(costing::router())
        .merge(overheads::router())
        .merge(billing::router())
        .merge(change_requests::router())
        .merge(procurement::router())
        .merge(planning::router())
}

/// Build the full application router: health, metrics, docs and the JSON API.
pub fn build_router(state: AppState, cors: CorsLayer) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics_export))
        .nest("/api", api_routes())
        .route_layer(middleware::from_fn(metrics::track_requests))
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                // 5xx at ERROR
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
