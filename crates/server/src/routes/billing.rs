use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use models::{invoice, payment};
use service::billing::{self as svc, GenerateInvoice, InvoiceDetail, InvoiceFilter, NewPayment};

use crate::errors::JsonApiError;
use crate::metrics::{INVOICES_GENERATED_TOTAL, PAYMENTS_RECORDED_TOTAL};
use crate::state::{Actor, AppState};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/invoices", get(list).post(generate))
        .route("/invoices/:id", get(get_one))
        .route("/invoices/:id/issue", post(issue))
        .route("/invoices/:id/cancel", post(cancel))
        .route("/invoices/:id/payments", post(pay))
        .route("/reports/overdue-invoices", get(overdue))
}

#[derive(Debug, Deserialize)]
pub struct IssueRequest {
    /// Defaults to today.
    pub issue_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct OverdueQuery {
    pub as_of: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
pub struct PaymentReceipt {
    pub invoice: invoice::Model,
    pub payment: payment::Model,
}

fn today() -> NaiveDate { Utc::now().date_naive() }

#[utoipa::path(
    post,
    path = "/api/invoices",
    tag = "billing",
    request_body = crate::openapi::GenerateInvoiceDoc,
    responses(
        (status = 201, description = "Draft invoice with one line per employee"),
        (status = 400, description = "Nothing billable in the period"),
        (status = 422, description = "Project is not billable")
    )
)]
pub async fn generate(
    State(state): State<AppState>,
    actor: Actor,
    Json(input): Json<GenerateInvoice>,
) -> Result<(StatusCode, Json<InvoiceDetail>), JsonApiError> {
    let detail = svc::generate_invoice(&state.db, input, &state.settings.business, actor.as_str()).await?;
    INVOICES_GENERATED_TOTAL.inc();
    Ok((StatusCode::CREATED, Json(detail)))
}

#[utoipa::path(
    get,
    path = "/api/invoices",
    tag = "billing",
    params(
        ("project_id" = Option<Uuid>, Query, description = "Invoices of this project"),
        ("status" = Option<String>, Query, description = "draft, issued, partially_paid, paid or cancelled")
    ),
    responses((status = 200, description = "Matching invoices"))
)]
pub async fn list(State(state): State<AppState>, Query(filter): Query<InvoiceFilter>) -> Result<Json<Vec<invoice::Model>>, JsonApiError> {
    Ok(Json(svc::list_invoices(&state.db, filter).await?))
}

#[utoipa::path(
    get,
    path = "/api/invoices/{id}",
    tag = "billing",
    params(("id" = Uuid, Path, description = "Invoice id")),
    responses((status = 200, description = "Invoice with lines and payments"), (status = 404, description = "Not found"))
)]
pub async fn get_one(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<InvoiceDetail>, JsonApiError> {
    Ok(Json(svc::get_invoice(&state.db, id).await?))
}

#[utoipa::path(
    post,
    path = "/api/invoices/{id}/issue",
    tag = "billing",
    params(("id" = Uuid, Path, description = "Invoice id")),
    request_body = crate::openapi::IssueInvoiceDoc,
    responses((status = 200, description = "Issued; due date from the client's payment terms"), (status = 422, description = "Not a draft"))
)]
pub async fn issue(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<IssueRequest>,
) -> Result<Json<invoice::Model>, JsonApiError> {
    let issue_date = body.issue_date.unwrap_or_else(today);
    Ok(Json(svc::issue_invoice(&state.db, id, issue_date).await?))
}

#[utoipa::path(
    post,
    path = "/api/invoices/{id}/cancel",
    tag = "billing",
    params(("id" = Uuid, Path, description = "Invoice id")),
    responses(
        (status = 200, description = "Cancelled; its time entries are billable again"),
        (status = 409, description = "Payments were already recorded")
    )
)]
pub async fn cancel(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<invoice::Model>, JsonApiError> {
    Ok(Json(svc::cancel_invoice(&state.db, id).await?))
}

#[utoipa::path(
    post,
    path = "/api/invoices/{id}/payments",
    tag = "billing",
    params(("id" = Uuid, Path, description = "Invoice id")),
    request_body = crate::openapi::NewPaymentDoc,
    responses(
        (status = 201, description = "Payment recorded"),
        (status = 400, description = "Amount not positive or above the outstanding balance"),
        (status = 422, description = "Invoice does not accept payments")
    )
)]
pub async fn pay(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
    Json(input): Json<NewPayment>,
) -> Result<(StatusCode, Json<PaymentReceipt>), JsonApiError> {
    let (invoice, payment) = svc::record_payment(&state.db, id, input, actor.as_str()).await?;
    PAYMENTS_RECORDED_TOTAL.inc();
    Ok((StatusCode::CREATED, Json(PaymentReceipt { invoice, payment })))
}

#[utoipa::path(
    get,
    path = "/api/reports/overdue-invoices",
    tag = "billing",
    params(("as_of" = Option<String>, Query, description = "Reference day, YYYY-MM-DD; defaults to today")),
    responses((status = 200, description = "Issued or partially paid invoices past their due date"))
)]
pub async fn overdue(State(state): State<AppState>, Query(q): Query<OverdueQuery>) -> Result<Json<Vec<invoice::Model>>, JsonApiError> {
    let as_of = q.as_of.unwrap_or_else(today);
    Ok(Json(svc::overdue_invoices(&state.db, as_of).await?))
}
