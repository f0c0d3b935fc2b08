use std::collections::HashMap;

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use models::purchase_order::{self, PurchaseOrderStatus};
use models::{audit, goods_receipt, purchase_order_line, validate};

use super::vendors::get_vendor;
use crate::billing::numbering::next_purchase_order_number;
use crate::audit::update_versioned;
use crate::errors::ServiceError;
use crate::projects::get_project;

#[derive(Clone, Debug, Deserialize)]
pub struct NewOrderLine {
    pub description: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
}

#[derive(Clone, Debug, Deserialize)]
pub struct NewPurchaseOrder {
    pub vendor_id: Uuid,
    pub project_id: Option<Uuid>,
    pub order_date: NaiveDate,
    pub lines: Vec<NewOrderLine>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct NewGoodsReceipt {
    pub quantity: Decimal,
    pub received_on: NaiveDate,
    pub notes: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct OrderLineView {
    #[serde(flatten)]
    pub line: purchase_order_line::Model,
    pub received_quantity: Decimal,
}

#[derive(Clone, Debug, Serialize)]
pub struct PurchaseOrderDetail {
    #[serde(flatten)]
    pub order: purchase_order::Model,
    pub lines: Vec<OrderLineView>,
    pub total: Decimal,
}

#[derive(Clone, Copy, Debug, Default, Deserialize)]
pub struct PurchaseOrderFilter {
    pub vendor_id: Option<Uuid>,
    pub project_id: Option<Uuid>,
    pub status: Option<PurchaseOrderStatus>,
}

/// `Received` once every line has arrived in full, else `PartiallyReceived`.
pub fn receipt_status<I>(lines: I) -> PurchaseOrderStatus
where
    I: IntoIterator<Item = (Decimal, Decimal)>,
{
    let complete = lines.into_iter().all(|(ordered, received)| received >= ordered);
    if complete {
        PurchaseOrderStatus::Received
    } else {
        PurchaseOrderStatus::PartiallyReceived
    }
}

/// Create a draft purchase order with its lines.
#[instrument(skip(db, input, prefix), fields(vendor_id = %input.vendor_id))]
pub async fn create_purchase_order(
    db: &DatabaseConnection,
    input: NewPurchaseOrder,
    prefix: &str,
    actor: &str,
) -> Result<PurchaseOrderDetail, ServiceError> {
    if input.lines.is_empty() {
        return Err(ServiceError::validation("a purchase order needs at least one line"));
    }
    for l in &input.lines {
        validate::required_text("line description", &l.description, 200)?;
        validate::positive("quantity", l.quantity)?;
        validate::non_negative("unit_price", l.unit_price)?;
    }
    get_vendor(db, input.vendor_id).await?;
    if let Some(project_id) = input.project_id {
        get_project(db, project_id).await?;
    }

    let txn = db.begin().await?;
    let number = next_purchase_order_number(&txn, prefix, input.order_date.year()).await?;
    let now = audit::now();
    let order = purchase_order::ActiveModel {
        id: Set(Uuid::new_v4()),
        po_number: Set(number),
        vendor_id: Set(input.vendor_id),
        project_id: Set(input.project_id),
        status: Set(PurchaseOrderStatus::Draft),
        order_date: Set(input.order_date),
        created_by: Set(actor.to_string()),
        created_at: Set(now),
        updated_at: Set(now),
        row_version: Set(audit::INITIAL_VERSION),
    }
    .insert(&txn)
    .await?;
    let mut lines = Vec::with_capacity(input.lines.len());
    for l in input.lines {
        let line = purchase_order_line::ActiveModel {
            id: Set(Uuid::new_v4()),
            purchase_order_id: Set(order.id),
            description: Set(l.description.trim().to_string()),
            quantity: Set(l.quantity),
            unit_price: Set(l.unit_price),
        }
        .insert(&txn)
        .await?;
        lines.push(OrderLineView { line, received_quantity: Decimal::ZERO });
    }
    txn.commit().await?;
    info!(purchase_order_id = %order.id, number = %order.po_number, "purchase_order_created");
    Ok(detail(order, lines))
}

pub async fn get_purchase_order(db: &DatabaseConnection, id: Uuid) -> Result<PurchaseOrderDetail, ServiceError> {
    let order = find(db, id).await?;
    let lines = order_lines(db, id).await?;
    let received = received_by_line(db, lines.iter().map(|l| l.id)).await?;
    let views = lines
        .into_iter()
        .map(|line| OrderLineView { received_quantity: received.get(&line.id).copied().unwrap_or_default(), line })
        .collect();
    Ok(detail(order, views))
}

pub async fn list_purchase_orders(db: &DatabaseConnection, filter: PurchaseOrderFilter) -> Result<Vec<purchase_order::Model>, ServiceError> {
    let mut q = purchase_order::Entity::find();
    if let Some(v) = filter.vendor_id {
        q = q.filter(purchase_order::Column::VendorId.eq(v));
    }
    if let Some(p) = filter.project_id {
        q = q.filter(purchase_order::Column::ProjectId.eq(p));
    }
    if let Some(s) = filter.status {
        q = q.filter(purchase_order::Column::Status.eq(s));
    }
    Ok(q.order_by_asc(purchase_order::Column::PoNumber).all(db).await?)
}

pub async fn issue_purchase_order(db: &DatabaseConnection, id: Uuid) -> Result<purchase_order::Model, ServiceError> {
    let current = find(db, id).await?;
    if current.status != PurchaseOrderStatus::Draft {
        return Err(ServiceError::transition("purchase order", current.status, PurchaseOrderStatus::Issued));
    }
    set_status(db, current, PurchaseOrderStatus::Issued).await
}

/// Cancel an order nothing has been received against.
pub async fn cancel_purchase_order(db: &DatabaseConnection, id: Uuid) -> Result<purchase_order::Model, ServiceError> {
    let current = find(db, id).await?;
    if !matches!(current.status, PurchaseOrderStatus::Draft | PurchaseOrderStatus::Issued) {
        return Err(ServiceError::transition("purchase order", current.status, PurchaseOrderStatus::Cancelled));
    }
    let lines = order_lines(db, id).await?;
    if !received_by_line(db, lines.iter().map(|l| l.id)).await?.is_empty() {
        return Err(ServiceError::conflict("goods have already been received"));
    }
    set_status(db, current, PurchaseOrderStatus::Cancelled).await
}

pub async fn close_purchase_order(db: &DatabaseConnection, id: Uuid) -> Result<purchase_order::Model, ServiceError> {
    let current = find(db, id).await?;
    if current.status != PurchaseOrderStatus::Received {
        return Err(ServiceError::transition("purchase order", current.status, PurchaseOrderStatus::Closed));
    }
    set_status(db, current, PurchaseOrderStatus::Closed).await
}

/// Book goods against an order line and refresh the order's receipt status.
#[instrument(skip(db, input), fields(quantity = %input.quantity))]
pub async fn record_goods_receipt(
    db: &DatabaseConnection,
    line_id: Uuid,
    input: NewGoodsReceipt,
    actor: &str,
) -> Result<(goods_receipt::Model, purchase_order::Model), ServiceError> {
    validate::positive("quantity", input.quantity)?;
    let txn = db.begin().await?;
    let line = purchase_order_line::Entity::find_by_id(line_id)
        .one(&txn)
        .await?
        .ok_or_else(|| ServiceError::not_found("purchase order line"))?;
    let order = purchase_order::Entity::find_by_id(line.purchase_order_id)
        .one(&txn)
        .await?
        .ok_or_else(|| ServiceError::not_found("purchase order"))?;
    if !order.status.accepts_receipts() {
        return Err(ServiceError::InvalidState(format!("a {:?} purchase order takes no receipts", order.status)));
    }

    let lines = purchase_order_line::Entity::find()
        .filter(purchase_order_line::Column::PurchaseOrderId.eq(order.id))
        .all(&txn)
        .await?;
    let mut received: HashMap<Uuid, Decimal> = HashMap::new();
    for r in goods_receipt::Entity::find()
        .filter(goods_receipt::Column::PurchaseOrderLineId.is_in(lines.iter().map(|l| l.id)))
        .all(&txn)
        .await?
    {
        *received.entry(r.purchase_order_line_id).or_default() += r.quantity;
    }
    let already = received.get(&line.id).copied().unwrap_or_default();
    if already + input.quantity > line.quantity {
        return Err(ServiceError::validation(format!(
            "receiving {} would exceed the ordered {} ({} already received)",
            input.quantity, line.quantity, already
        )));
    }

    let receipt = goods_receipt::ActiveModel {
        id: Set(Uuid::new_v4()),
        purchase_order_line_id: Set(line.id),
        quantity: Set(input.quantity),
        received_on: Set(input.received_on),
        notes: Set(input.notes.filter(|n| !n.trim().is_empty())),
        created_by: Set(actor.to_string()),
        created_at: Set(audit::now()),
    }
    .insert(&txn)
    .await?;
    *received.entry(line.id).or_default() += input.quantity;

    let status = receipt_status(lines.iter().map(|l| (l.quantity, received.get(&l.id).copied().unwrap_or_default())));
    let version = order.row_version;
    let mut am: purchase_order::ActiveModel = order.into();
    am.status = Set(status);
    am.updated_at = Set(audit::now());
    am.row_version = Set(version + 1);
    let order = update_versioned(&txn, am, purchase_order::Column::RowVersion, version).await?;
    txn.commit().await?;
    info!(purchase_order_id = %order.id, receipt_id = %receipt.id, status = ?status, "goods_received");
    Ok((receipt, order))
}

pub(crate) async fn find(db: &DatabaseConnection, id: Uuid) -> Result<purchase_order::Model, ServiceError> {
    purchase_order::Entity::find_by_id(id).one(db).await?.ok_or_else(|| ServiceError::not_found("purchase order"))
}

pub(crate) async fn order_lines(db: &DatabaseConnection, order_id: Uuid) -> Result<Vec<purchase_order_line::Model>, ServiceError> {
    Ok(purchase_order_line::Entity::find()
        .filter(purchase_order_line::Column::PurchaseOrderId.eq(order_id))
        .order_by_asc(purchase_order_line::Column::Description)
        .all(db)
        .await?)
}

/// Cumulative received quantity per order line; lines with no receipts are absent.
pub(crate) async fn received_by_line<I>(db: &DatabaseConnection, line_ids: I) -> Result<HashMap<Uuid, Decimal>, ServiceError>
where
    I: IntoIterator<Item = Uuid>,
{
    let mut totals = HashMap::new();
    for r in goods_receipt::Entity::find()
        .filter(goods_receipt::Column::PurchaseOrderLineId.is_in(line_ids))
        .all(db)
        .await?
    {
        *totals.entry(r.purchase_order_line_id).or_insert(Decimal::ZERO) += r.quantity;
    }
    Ok(totals)
}

async fn set_status(db: &DatabaseConnection, current: purchase_order::Model, to: PurchaseOrderStatus) -> Result<purchase_order::Model, ServiceError> {
    let id = current.id;
    let version = current.row_version;
    let mut am: purchase_order::ActiveModel = current.into();
    am.status = Set(to);
    am.updated_at = Set(audit::now());
    am.row_version = Set(version + 1);
    let updated = update_versioned(db, am, purchase_order::Column::RowVersion, version).await?;
    info!(purchase_order_id = %id, status = ?to, "purchase_order_status_changed");
    Ok(updated)
}

fn detail(order: purchase_order::Model, lines: Vec<OrderLineView>) -> PurchaseOrderDetail {
    let total = lines.iter().map(|l| l.line.quantity * l.line.unit_price).sum();
    PurchaseOrderDetail { order, lines, total: crate::money::round2(total) }
}
