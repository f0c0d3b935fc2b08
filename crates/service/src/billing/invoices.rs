use std::collections::BTreeMap;

use chrono::{Datelike, Days, NaiveDate};
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use configs::BusinessConfig;
use models::invoice::{self, InvoiceStatus};
use models::time_entry::{self, TimeEntryStatus};
use models::{audit, client, employee, invoice_line, payment, project, validate};

use super::calc::{self, BillableTime, Biller};
use super::numbering::next_invoice_number;
use crate::audit::update_versioned;
use crate::errors::ServiceError;

#[derive(Clone, Debug, Deserialize)]
pub struct GenerateInvoice {
    pub project_id: Uuid,
    pub period_from: NaiveDate,
    pub period_to: NaiveDate,
    /// Falls back to the configured default rate.
    pub tax_rate_pct: Option<Decimal>,
}

#[derive(Clone, Debug, Serialize)]
pub struct InvoiceDetail {
    #[serde(flatten)]
    pub invoice: invoice::Model,
    pub lines: Vec<invoice_line::Model>,
    pub payments: Vec<payment::Model>,
}

#[derive(Clone, Copy, Debug, Default, Deserialize)]
pub struct InvoiceFilter {
    pub project_id: Option<Uuid>,
    pub status: Option<InvoiceStatus>,
}

/// Bill a project's approved, billable and not yet invoiced time for a period.
///
/// Creates the invoice with one line per employee and marks the time entries
/// `Invoiced`, all in one transaction.
#[instrument(skip(db, input, business), fields(project_id = %input.project_id))]
pub async fn generate_invoice(
    db: &DatabaseConnection,
    input: GenerateInvoice,
    business: &BusinessConfig,
    actor: &str,
) -> Result<InvoiceDetail, ServiceError> {
    validate::date_range(input.period_from, input.period_to)?;
    let tax_rate_pct = input.tax_rate_pct.unwrap_or(business.default_tax_rate_pct);
    if tax_rate_pct < Decimal::ZERO || tax_rate_pct > Decimal::ONE_HUNDRED {
        return Err(ServiceError::validation("tax rate must be between 0 and 100"));
    }

    let txn = db.begin().await?;
    let project = project::Entity::find_by_id(input.project_id)
        .filter(project::Column::IsDeleted.eq(false))
        .one(&txn)
        .await?
        .ok_or_else(|| ServiceError::not_found("project"))?;
    if !project.status.is_billable() {
        return Err(ServiceError::InvalidState(format!("a {:?} project cannot be invoiced", project.status)));
    }

    let entries = time_entry::Entity::find()
        .filter(time_entry::Column::ProjectId.eq(project.id))
        .filter(time_entry::Column::Status.eq(TimeEntryStatus::Approved))
        .filter(time_entry::Column::Billable.eq(true))
        .filter(time_entry::Column::InvoiceId.is_null())
        .filter(time_entry::Column::WorkDate.between(input.period_from, input.period_to))
        .all(&txn)
        .await?;
    if entries.is_empty() {
        return Err(ServiceError::validation("no approved billable time in the period"));
    }

    let billers: BTreeMap<Uuid, Biller> = employee::Entity::find()
        .filter(employee::Column::Id.is_in(entries.iter().map(|e| e.employee_id)))
        .all(&txn)
        .await?
        .into_iter()
        .map(|e| (e.id, Biller { name: e.full_name, billing_rate: e.billing_rate }))
        .collect();
    let time: Vec<BillableTime> = entries.iter().map(|e| BillableTime { employee_id: e.employee_id, hours: e.hours }).collect();
    let drafts = calc::lines_per_employee(&time, &billers)
        .map_err(|id| ServiceError::NotFound(format!("employee {id} not found")))?;
    let totals = calc::totals(&drafts, tax_rate_pct);

    let number = next_invoice_number(&txn, &business.invoice_prefix, input.period_to.year()).await?;
    let now = audit::now();
    let invoice = invoice::ActiveModel {
        id: Set(Uuid::new_v4()),
        invoice_number: Set(number),
        project_id: Set(project.id),
        client_id: Set(project.client_id),
        status: Set(InvoiceStatus::Draft),
        period_from: Set(input.period_from),
        period_to: Set(input.period_to),
        issue_date: Set(None),
        due_date: Set(None),
        subtotal: Set(totals.subtotal),
        tax_rate_pct: Set(tax_rate_pct),
        tax_amount: Set(totals.tax_amount),
        total: Set(totals.total),
        amount_paid: Set(Decimal::ZERO),
        created_by: Set(actor.to_string()),
        created_at: Set(now),
        updated_at: Set(now),
        row_version: Set(audit::INITIAL_VERSION),
    }
    .insert(&txn)
    .await?;

    let mut lines = Vec::with_capacity(drafts.len());
    for d in drafts {
        let line = invoice_line::ActiveModel {
            id: Set(Uuid::new_v4()),
            invoice_id: Set(invoice.id),
            employee_id: Set(Some(d.employee_id)),
            description: Set(d.description),
            quantity: Set(d.quantity),
            unit_price: Set(d.unit_price),
            amount: Set(d.amount),
        }
        .insert(&txn)
        .await?;
        lines.push(line);
    }

    // Claim only entries nobody else invoiced in the meantime.
    let claimed = time_entry::Entity::update_many()
        .col_expr(time_entry::Column::Status, Expr::value(TimeEntryStatus::Invoiced))
        .col_expr(time_entry::Column::InvoiceId, Expr::value(Some(invoice.id)))
        .col_expr(time_entry::Column::UpdatedAt, Expr::value(now))
        .col_expr(time_entry::Column::RowVersion, Expr::col(time_entry::Column::RowVersion).add(1))
        .filter(time_entry::Column::Id.is_in(entries.iter().map(|e| e.id)))
        .filter(time_entry::Column::Status.eq(TimeEntryStatus::Approved))
        .filter(time_entry::Column::InvoiceId.is_null())
        .exec(&txn)
        .await?;
    if claimed.rows_affected != entries.len() as u64 {
        txn.rollback().await?;
        return Err(ServiceError::conflict("time entries were invoiced concurrently"));
    }
    txn.commit().await?;

    info!(invoice_id = %invoice.id, number = %invoice.invoice_number, total = %invoice.total, entries = entries.len(), "invoice_generated");
    Ok(InvoiceDetail { invoice, lines, payments: Vec::new() })
}

pub async fn get_invoice(db: &DatabaseConnection, id: Uuid) -> Result<InvoiceDetail, ServiceError> {
    let invoice = find(db, id).await?;
    let lines = invoice_line::Entity::find()
        .filter(invoice_line::Column::InvoiceId.eq(id))
        .order_by_asc(invoice_line::Column::Description)
        .all(db)
        .await?;
    let payments = payment::Entity::find()
        .filter(payment::Column::InvoiceId.eq(id))
        .order_by_asc(payment::Column::PaidOn)
        .all(db)
        .await?;
    Ok(InvoiceDetail { invoice, lines, payments })
}

pub async fn list_invoices(db: &DatabaseConnection, filter: InvoiceFilter) -> Result<Vec<invoice::Model>, ServiceError> {
    let mut q = invoice::Entity::find();
    if let Some(p) = filter.project_id {
        q = q.filter(invoice::Column::ProjectId.eq(p));
    }
    if let Some(s) = filter.status {
        q = q.filter(invoice::Column::Status.eq(s));
    }
    Ok(q.order_by_asc(invoice::Column::InvoiceNumber).all(db).await?)
}

/// Send the invoice; the due date follows the client's payment terms.
pub async fn issue_invoice(db: &DatabaseConnection, id: Uuid, issue_date: NaiveDate) -> Result<invoice::Model, ServiceError> {
    let current = find(db, id).await?;
    if current.status != InvoiceStatus::Draft {
        return Err(ServiceError::transition("invoice", current.status, InvoiceStatus::Issued));
    }
    let client = client::Entity::find_by_id(current.client_id).one(db).await?.ok_or_else(|| ServiceError::not_found("client"))?;
    let terms = u64::try_from(client.payment_terms_days).unwrap_or(0);
    let due = issue_date
        .checked_add_days(Days::new(terms))
        .ok_or_else(|| ServiceError::validation("due date out of range"))?;

    let version = current.row_version;
    let mut am: invoice::ActiveModel = current.into();
    am.status = Set(InvoiceStatus::Issued);
    am.issue_date = Set(Some(issue_date));
    am.due_date = Set(Some(due));
    am.updated_at = Set(audit::now());
    am.row_version = Set(version + 1);
    let issued = update_versioned(db, am, invoice::Column::RowVersion, version).await?;
    info!(invoice_id = %id, due_date = %due, "invoice_issued");
    Ok(issued)
}

/// Void an unpaid invoice and hand its time back for re-billing.
pub async fn cancel_invoice(db: &DatabaseConnection, id: Uuid) -> Result<invoice::Model, ServiceError> {
    let txn = db.begin().await?;
    let current = invoice::Entity::find_by_id(id).one(&txn).await?.ok_or_else(|| ServiceError::not_found("invoice"))?;
    if !current.amount_paid.is_zero() {
        return Err(ServiceError::conflict("invoice has payments"));
    }
    if !matches!(current.status, InvoiceStatus::Draft | InvoiceStatus::Issued) {
        return Err(ServiceError::transition("invoice", current.status, InvoiceStatus::Cancelled));
    }
    let now = audit::now();
    let released = time_entry::Entity::update_many()
        .col_expr(time_entry::Column::Status, Expr::value(TimeEntryStatus::Approved))
        .col_expr(time_entry::Column::InvoiceId, Expr::value(Option::<Uuid>::None))
        .col_expr(time_entry::Column::UpdatedAt, Expr::value(now))
        .col_expr(time_entry::Column::RowVersion, Expr::col(time_entry::Column::RowVersion).add(1))
        .filter(time_entry::Column::InvoiceId.eq(id))
        .exec(&txn)
        .await?;

    let version = current.row_version;
    let mut am: invoice::ActiveModel = current.into();
    am.status = Set(InvoiceStatus::Cancelled);
    am.updated_at = Set(now);
    am.row_version = Set(version + 1);
    let cancelled = update_versioned(&txn, am, invoice::Column::RowVersion, version).await?;
    txn.commit().await?;
    info!(invoice_id = %id, released = released.rows_affected, "invoice_cancelled");
    Ok(cancelled)
}

/// Issued or part-paid invoices whose due date is before `as_of`.
pub async fn overdue_invoices(db: &DatabaseConnection, as_of: NaiveDate) -> Result<Vec<invoice::Model>, ServiceError> {
    Ok(invoice::Entity::find()
        .filter(invoice::Column::Status.is_in([InvoiceStatus::Issued, InvoiceStatus::PartiallyPaid]))
        .filter(invoice::Column::DueDate.lt(as_of))
        .order_by_asc(invoice::Column::DueDate)
        .all(db)
        .await?)
}

pub(crate) async fn find(db: &DatabaseConnection, id: Uuid) -> Result<invoice::Model, ServiceError> {
    invoice::Entity::find_by_id(id).one(db).await?.ok_or_else(|| ServiceError::not_found("invoice"))
}
