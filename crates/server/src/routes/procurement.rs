use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use uuid::Uuid;

use common::pagination::Pagination;
use common::types::Page;
use models::vendor::NewVendor;
use models::{goods_receipt, purchase_order, vendor, vendor_invoice};
use service::procurement::purchase_orders::{self as orders, NewGoodsReceipt, NewPurchaseOrder, PurchaseOrderDetail, PurchaseOrderFilter};
use service::procurement::vendor_invoices::{self as bills, NewVendorInvoice, VendorInvoiceDetail, VendorInvoiceFilter};
use service::procurement::vendors::{self, VendorPatch};
use service::procurement::{MatchOutcome, Tolerances};

use crate::errors::JsonApiError;
use crate::state::{Actor, AppState};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/vendors", get(list_vendors).post(create_vendor))
        .route("/vendors/:id", get(get_vendor).patch(update_vendor).delete(delete_vendor))
        .route("/purchase-orders", get(list_orders).post(create_order))
        .route("/purchase-orders/:id", get(get_order))
        .route("/purchase-orders/:id/issue", post(issue_order))
        .route("/purchase-orders/:id/cancel", post(cancel_order))
        .route("/purchase-orders/:id/close", post(close_order))
        .route("/purchase-order-lines/:id/receipts", post(receive))
        .route("/vendor-invoices", get(list_bills).post(record_bill))
        .route("/vendor-invoices/:id", get(get_bill))
        .route("/vendor-invoices/:id/match", post(match_bill))
        .route("/vendor-invoices/:id/approve", post(approve_bill))
}

#[derive(Debug, Serialize)]
pub struct ReceiptResult {
    pub receipt: goods_receipt::Model,
    pub order: purchase_order::Model,
}

#[derive(Debug, Serialize)]
pub struct MatchResult {
    pub invoice: vendor_invoice::Model,
    #[serde(flatten)]
    pub outcome: MatchOutcome,
}

// vendors

#[utoipa::path(
    get,
    path = "/api/vendors",
    tag = "procurement",
    params(
        ("page" = Option<u32>, Query, description = "1-based page"),
        ("per_page" = Option<u32>, Query, description = "Items per page, at most 100")
    ),
    responses((status = 200, description = "One page of vendors"))
)]
pub async fn list_vendors(State(state): State<AppState>, Query(paging): Query<Pagination>) -> Result<Json<Page<vendor::Model>>, JsonApiError> {
    let items = vendors::list_vendors(&state.db, paging).await?;
    Ok(Json(super::page_of(items, paging)))
}

#[utoipa::path(
    post,
    path = "/api/vendors",
    tag = "procurement",
    request_body = crate::openapi::NewVendorDoc,
    responses((status = 201, description = "Vendor created"), (status = 400, description = "Invalid input"))
)]
pub async fn create_vendor(
    State(state): State<AppState>,
    actor: Actor,
    Json(input): Json<NewVendor>,
) -> Result<(StatusCode, Json<vendor::Model>), JsonApiError> {
    let created = vendors::create_vendor(&state.db, input, actor.as_str()).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn get_vendor(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<vendor::Model>, JsonApiError> {
    Ok(Json(vendors::get_vendor(&state.db, id).await?))
}

pub async fn update_vendor(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(patch): Json<VendorPatch>,
) -> Result<Json<vendor::Model>, JsonApiError> {
    Ok(Json(vendors::update_vendor(&state.db, id, patch).await?))
}

pub async fn delete_vendor(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<StatusCode, JsonApiError> {
    vendors::soft_delete_vendor(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// purchase orders

#[utoipa::path(
    post,
    path = "/api/purchase-orders",
    tag = "procurement",
    request_body = crate::openapi::NewPurchaseOrderDoc,
    responses(
        (status = 201, description = "Draft purchase order with its number and total"),
        (status = 400, description = "No lines, or a line with a bad quantity or price")
    )
)]
pub async fn create_order(
    State(state): State<AppState>,
    actor: Actor,
    Json(input): Json<NewPurchaseOrder>,
) -> Result<(StatusCode, Json<PurchaseOrderDetail>), JsonApiError> {
    let prefix = &state.settings.business.purchase_order_prefix;
    let created = orders::create_purchase_order(&state.db, input, prefix, actor.as_str()).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    get,
    path = "/api/purchase-orders",
    tag = "procurement",
    params(
        ("vendor_id" = Option<Uuid>, Query, description = "Orders placed with this vendor"),
        ("project_id" = Option<Uuid>, Query, description = "Orders charged to this project"),
        ("status" = Option<String>, Query, description = "draft, issued, partially_received, received, closed or cancelled")
    ),
    responses((status = 200, description = "Matching purchase orders"))
)]
pub async fn list_orders(
    State(state): State<AppState>,
    Query(filter): Query<PurchaseOrderFilter>,
) -> Result<Json<Vec<purchase_order::Model>>, JsonApiError> {
    Ok(Json(orders::list_purchase_orders(&state.db, filter).await?))
}

#[utoipa::path(
    get,
    path = "/api/purchase-orders/{id}",
    tag = "procurement",
    params(("id" = Uuid, Path, description = "Purchase order id")),
    responses((status = 200, description = "Order with lines and received quantities"), (status = 404, description = "Not found"))
)]
pub async fn get_order(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<PurchaseOrderDetail>, JsonApiError> {
    Ok(Json(orders::get_purchase_order(&state.db, id).await?))
}

pub async fn issue_order(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<purchase_order::Model>, JsonApiError> {
    Ok(Json(orders::issue_purchase_order(&state.db, id).await?))
}

pub async fn cancel_order(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<purchase_order::Model>, JsonApiError> {
    Ok(Json(orders::cancel_purchase_order(&state.db, id).await?))
}

pub async fn close_order(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<purchase_order::Model>, JsonApiError> {
    Ok(Json(orders::close_purchase_order(&state.db, id).await?))
}

#[utoipa::path(
    post,
    path = "/api/purchase-order-lines/{id}/receipts",
    tag = "procurement",
    params(("id" = Uuid, Path, description = "Purchase order line id")),
    request_body = crate::openapi::NewGoodsReceiptDoc,
    responses(
        (status = 201, description = "Goods booked; the order's receipt status is refreshed"),
        (status = 400, description = "More than ordered"),
        (status = 422, description = "Order is not open for receipts")
    )
)]
pub async fn receive(
    State(state): State<AppState>,
    actor: Actor,
    Path(line_id): Path<Uuid>,
    Json(input): Json<NewGoodsReceipt>,
) -> Result<(StatusCode, Json<ReceiptResult>), JsonApiError> {
    let (receipt, order) = orders::record_goods_receipt(&state.db, line_id, input, actor.as_str()).await?;
    Ok((StatusCode::CREATED, Json(ReceiptResult { receipt, order })))
}

// vendor invoices

#[utoipa::path(
    post,
    path = "/api/vendor-invoices",
    tag = "procurement",
    request_body = crate::openapi::NewVendorInvoiceDoc,
    responses((status = 201, description = "Vendor invoice pending a match"), (status = 400, description = "Invalid input"))
)]
pub async fn record_bill(
    State(state): State<AppState>,
    actor: Actor,
    Json(input): Json<NewVendorInvoice>,
) -> Result<(StatusCode, Json<VendorInvoiceDetail>), JsonApiError> {
    let created = bills::record_vendor_invoice(&state.db, input, actor.as_str()).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn list_bills(
    State(state): State<AppState>,
    Query(filter): Query<VendorInvoiceFilter>,
) -> Result<Json<Vec<vendor_invoice::Model>>, JsonApiError> {
    Ok(Json(bills::list_vendor_invoices(&state.db, filter).await?))
}

pub async fn get_bill(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<VendorInvoiceDetail>, JsonApiError> {
    Ok(Json(bills::get_vendor_invoice(&state.db, id).await?))
}

#[utoipa::path(
    post,
    path = "/api/vendor-invoices/{id}/match",
    tag = "procurement",
    params(("id" = Uuid, Path, description = "Vendor invoice id")),
    responses(
        (status = 200, description = "Three-way match against the order and its receipts, with any discrepancies"),
        (status = 422, description = "Invoice was already approved")
    )
)]
pub async fn match_bill(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<MatchResult>, JsonApiError> {
    let business = &state.settings.business;
    let tolerances = Tolerances { quantity_pct: business.quantity_tolerance_pct, price_pct: business.price_tolerance_pct };
    let (invoice, outcome) = bills::match_vendor_invoice(&state.db, id, tolerances).await?;
    Ok(Json(MatchResult { invoice, outcome }))
}

#[utoipa::path(
    post,
    path = "/api/vendor-invoices/{id}/approve",
    tag = "procurement",
    params(("id" = Uuid, Path, description = "Vendor invoice id")),
    responses((status = 200, description = "Approved"), (status = 422, description = "Only matched invoices can be approved"))
)]
pub async fn approve_bill(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<vendor_invoice::Model>, JsonApiError> {
    Ok(Json(bills::approve_vendor_invoice(&state.db, id).await?))
}
