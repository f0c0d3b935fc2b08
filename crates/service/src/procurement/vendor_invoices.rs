use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use models::purchase_order::PurchaseOrderStatus;
use models::vendor_invoice::{self, VendorInvoiceStatus};
use models::{audit, validate, vendor_invoice_line};

use super::matching::{three_way_match, BilledLine, MatchOutcome, OrderedLine, Tolerances};
use super::purchase_orders::{find as find_order, order_lines, received_by_line};
use crate::audit::update_versioned;
use crate::errors::ServiceError;
use crate::money::round2;

#[derive(Clone, Debug, Deserialize)]
pub struct NewVendorInvoiceLine {
    pub purchase_order_line_id: Uuid,
    pub quantity: Decimal,
    pub unit_price: Decimal,
}

#[derive(Clone, Debug, Deserialize)]
pub struct NewVendorInvoice {
    pub vendor_id: Uuid,
    pub purchase_order_id: Uuid,
    pub vendor_reference: String,
    pub invoice_date: NaiveDate,
    pub lines: Vec<NewVendorInvoiceLine>,
}

#[derive(Clone, Debug, Serialize)]
pub struct VendorInvoiceDetail {
    #[serde(flatten)]
    pub invoice: vendor_invoice::Model,
    pub lines: Vec<vendor_invoice_line::Model>,
}

#[derive(Clone, Copy, Debug, Default, Deserialize)]
pub struct VendorInvoiceFilter {
    pub vendor_id: Option<Uuid>,
    pub purchase_order_id: Option<Uuid>,
    pub status: Option<VendorInvoiceStatus>,
}

/// Register a vendor's bill against one of its purchase orders. Starts `Pending`.
#[instrument(skip(db, input), fields(purchase_order_id = %input.purchase_order_id))]
pub async fn record_vendor_invoice(db: &DatabaseConnection, input: NewVendorInvoice, actor: &str) -> Result<VendorInvoiceDetail, ServiceError> {
    let reference = validate::required_text("vendor reference", &input.vendor_reference, 64)?;
    if input.lines.is_empty() {
        return Err(ServiceError::validation("a vendor invoice needs at least one line"));
    }
    for l in &input.lines {
        validate::positive("quantity", l.quantity)?;
        validate::non_negative("unit_price", l.unit_price)?;
    }
    let order = find_order(db, input.purchase_order_id).await?;
    if order.vendor_id != input.vendor_id {
        return Err(ServiceError::validation("purchase order belongs to another vendor"));
    }
    if matches!(order.status, PurchaseOrderStatus::Draft | PurchaseOrderStatus::Cancelled) {
        return Err(ServiceError::InvalidState(format!("a {:?} purchase order cannot be invoiced", order.status)));
    }

    let total = round2(input.lines.iter().map(|l| l.quantity * l.unit_price).sum());
    let txn = db.begin().await?;
    let now = audit::now();
    let invoice = vendor_invoice::ActiveModel {
        id: Set(Uuid::new_v4()),
        vendor_id: Set(input.vendor_id),
        purchase_order_id: Set(order.id),
        vendor_reference: Set(reference),
        invoice_date: Set(input.invoice_date),
        total: Set(total),
        status: Set(VendorInvoiceStatus::Pending),
        match_notes: Set(None),
        created_by: Set(actor.to_string()),
        created_at: Set(now),
        updated_at: Set(now),
        row_version: Set(audit::INITIAL_VERSION),
    }
    .insert(&txn)
    .await?;
    let mut lines = Vec::with_capacity(input.lines.len());
    for l in input.lines {
        let line = vendor_invoice_line::ActiveModel {
            id: Set(Uuid::new_v4()),
            vendor_invoice_id: Set(invoice.id),
            purchase_order_line_id: Set(l.purchase_order_line_id),
            quantity: Set(l.quantity),
            unit_price: Set(l.unit_price),
        }
        .insert(&txn)
        .await?;
        lines.push(line);
    }
    txn.commit().await?;
    info!(vendor_invoice_id = %invoice.id, total = %invoice.total, "vendor_invoice_recorded");
    Ok(VendorInvoiceDetail { invoice, lines })
}

pub async fn get_vendor_invoice(db: &DatabaseConnection, id: Uuid) -> Result<VendorInvoiceDetail, ServiceError> {
    let invoice = find(db, id).await?;
    let lines = invoice_lines(db, id).await?;
    Ok(VendorInvoiceDetail { invoice, lines })
}

pub async fn list_vendor_invoices(db: &DatabaseConnection, filter: VendorInvoiceFilter) -> Result<Vec<vendor_invoice::Model>, ServiceError> {
    let mut q = vendor_invoice::Entity::find();
    if let Some(v) = filter.vendor_id {
        q = q.filter(vendor_invoice::Column::VendorId.eq(v));
    }
    if let Some(po) = filter.purchase_order_id {
        q = q.filter(vendor_invoice::Column::PurchaseOrderId.eq(po));
    }
    if let Some(s) = filter.status {
        q = q.filter(vendor_invoice::Column::Status.eq(s));
    }
    Ok(q.order_by_asc(vendor_invoice::Column::InvoiceDate).all(db).await?)
}

/// Run the three-way match and store its verdict (`Matched` or `Exception`).
///
/// A pending or excepted invoice can be matched again, e.g. after more goods arrive.
#[instrument(skip(db, tolerances))]
pub async fn match_vendor_invoice(db: &DatabaseConnection, id: Uuid, tolerances: Tolerances) -> Result<(vendor_invoice::Model, MatchOutcome), ServiceError> {
    let current = find(db, id).await?;
    if !matches!(current.status, VendorInvoiceStatus::Pending | VendorInvoiceStatus::Exception) {
        return Err(ServiceError::InvalidState(format!("a {:?} vendor invoice is already settled", current.status)));
    }
    let ordered: Vec<OrderedLine> = order_lines(db, current.purchase_order_id)
        .await?
        .into_iter()
        .map(|l| OrderedLine { id: l.id, quantity: l.quantity, unit_price: l.unit_price })
        .collect();
    let received = received_by_line(db, ordered.iter().map(|l| l.id)).await?;
    let earlier = billed_elsewhere(db, current.purchase_order_id, id).await?;
    let billed: Vec<BilledLine> = invoice_lines(db, id)
        .await?
        .into_iter()
        .map(|l| BilledLine { purchase_order_line_id: l.purchase_order_line_id, quantity: l.quantity, unit_price: l.unit_price })
        .collect();

    let outcome = three_way_match(&ordered, &received, &earlier, &billed, tolerances);
    let (status, notes) = if outcome.is_matched() {
        (VendorInvoiceStatus::Matched, None)
    } else {
        let notes = serde_json::to_string(&outcome.discrepancies)?;
        (VendorInvoiceStatus::Exception, Some(notes))
    };

    let version = current.row_version;
    let mut am: vendor_invoice::ActiveModel = current.into();
    am.status = Set(status);
    am.match_notes = Set(notes);
    am.updated_at = Set(audit::now());
    am.row_version = Set(version + 1);
    let updated = update_versioned(db, am, vendor_invoice::Column::RowVersion, version).await?;
    if outcome.is_matched() {
        info!(vendor_invoice_id = %id, "vendor_invoice_matched");
    } else {
        warn!(vendor_invoice_id = %id, discrepancies = outcome.discrepancies.len(), "vendor_invoice_exception");
    }
    Ok((updated, outcome))
}

/// Approve a matched invoice for payment.
pub async fn approve_vendor_invoice(db: &DatabaseConnection, id: Uuid) -> Result<vendor_invoice::Model, ServiceError> {
    let current = find(db, id).await?;
    if current.status != VendorInvoiceStatus::Matched {
        return Err(ServiceError::transition("vendor invoice", current.status, VendorInvoiceStatus::Approved));
    }
    let version = current.row_version;
    let mut am: vendor_invoice::ActiveModel = current.into();
    am.status = Set(VendorInvoiceStatus::Approved);
    am.updated_at = Set(audit::now());
    am.row_version = Set(version + 1);
    let approved = update_versioned(db, am, vendor_invoice::Column::RowVersion, version).await?;
    info!(vendor_invoice_id = %id, "vendor_invoice_approved");
    Ok(approved)
}

async fn find(db: &DatabaseConnection, id: Uuid) -> Result<vendor_invoice::Model, ServiceError> {
    vendor_invoice::Entity::find_by_id(id).one(db).await?.ok_or_else(|| ServiceError::not_found("vendor invoice"))
}

/// Quantity per order line claimed by the order's other matched or approved invoices.
async fn billed_elsewhere(db: &DatabaseConnection, purchase_order_id: Uuid, exclude: Uuid) -> Result<HashMap<Uuid, Decimal>, ServiceError> {
    let others: Vec<Uuid> = vendor_invoice::Entity::find()
        .filter(vendor_invoice::Column::PurchaseOrderId.eq(purchase_order_id))
        .filter(vendor_invoice::Column::Status.is_in([VendorInvoiceStatus::Matched, VendorInvoiceStatus::Approved]))
        .filter(vendor_invoice::Column::Id.ne(exclude))
        .all(db)
        .await?
        .into_iter()
        .map(|i| i.id)
        .collect();
    let mut totals: HashMap<Uuid, Decimal> = HashMap::new();
    if others.is_empty() {
        return Ok(totals);
    }
    let lines = vendor_invoice_line::Entity::find()
        .filter(vendor_invoice_line::Column::VendorInvoiceId.is_in(others))
        .all(db)
        .await?;
    for l in lines {
        *totals.entry(l.purchase_order_line_id).or_default() += l.quantity;
    }
    Ok(totals)
}

async fn invoice_lines(db: &DatabaseConnection, id: Uuid) -> Result<Vec<vendor_invoice_line::Model>, ServiceError> {
    Ok(vendor_invoice_line::Entity::find()
        .filter(vendor_invoice_line::Column::VendorInvoiceId.eq(id))
        .all(db)
        .await?)
}
